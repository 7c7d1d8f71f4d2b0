//! Placement commands for a running server.
//!
//! Blocks are grouped by full block id and row `(y, z)`; contiguous runs along
//! X become a single `fill`, lone blocks a `setblock`. Coordinates are either
//! absolute (offset by an origin) or relative to the nearest player.

use crate::assign::AssignedBlock;

/// Where command coordinates are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Absolute world coordinates, block positions offset by this origin.
    Absolute([i32; 3]),
    /// `~x ~y ~z` coordinates executed at the nearest player.
    Relative,
}

/// A run of identical blocks along X.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run<'a> {
    block: &'a str,
    y: i32,
    z: i32,
    x1: i32,
    x2: i32,
}

impl Run<'_> {
    fn command(&self, origin: CommandOrigin) -> String {
        match origin {
            CommandOrigin::Absolute([ox, oy, oz]) => {
                let (x1, x2, y, z) = (ox + self.x1, ox + self.x2, oy + self.y, oz + self.z);
                if x1 == x2 {
                    format!("setblock {} {} {} {}", x1, y, z, self.block)
                } else {
                    format!("fill {} {} {} {} {} {} {}", x1, y, z, x2, y, z, self.block)
                }
            }
            CommandOrigin::Relative => {
                if self.x1 == self.x2 {
                    format!("execute at @p run setblock ~{} ~{} ~{} {}", self.x1, self.y, self.z, self.block)
                } else {
                    format!(
                        "execute at @p run fill ~{} ~{} ~{} ~{} ~{} ~{} {}",
                        self.x1, self.y, self.z, self.x2, self.y, self.z, self.block
                    )
                }
            }
        }
    }
}

fn runs<'a>(ids: &'a [(String, i32, i32, i32)]) -> Vec<Run<'a>> {
    let mut runs: Vec<Run<'a>> = Vec::new();
    for (block, y, z, x) in ids {
        match runs.last_mut() {
            Some(run) if run.block == block && run.y == *y && run.z == *z && run.x2 + 1 == *x => run.x2 = *x,
            _ => runs.push(Run {
                block,
                y: *y,
                z: *z,
                x1: *x,
                x2: *x,
            }),
        }
    }
    runs
}

/// Build placement commands, run-length encoded along X.
pub fn export_commands(blocks: &[AssignedBlock], origin: CommandOrigin) -> Vec<String> {
    let mut ids: Vec<(String, i32, i32, i32)> = blocks
        .iter()
        .map(|b| (b.full_block_id(), b.position.y, b.position.z, b.position.x))
        .collect();
    ids.sort();
    ids.dedup();

    let commands: Vec<String> = runs(&ids).iter().map(|run| run.command(origin)).collect();
    log::debug!("encoded {} blocks into {} commands", blocks.len(), commands.len());
    commands
}
