//! JSON export of assigned blocks.
//!
//! ```json
//! { "blocks": [ { "x": 0, "y": 0, "z": 0, "name": "minecraft:stone", "state": "", "shape": "full" } ] }
//! ```

use crate::assign::{AssignedBlock, ShapeTag};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One block in the exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub shape: ShapeTag,
}

impl From<&AssignedBlock> for BlockRecord {
    fn from(block: &AssignedBlock) -> Self {
        Self {
            x: block.position.x,
            y: block.position.y,
            z: block.position.z,
            name: block.block_name.clone(),
            state: block.block_state.clone(),
            shape: block.shape,
        }
    }
}

/// Top-level exported document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    pub blocks: Vec<BlockRecord>,
}

impl BlockDocument {
    pub fn from_blocks(blocks: &[AssignedBlock]) -> Self {
        Self {
            blocks: blocks.iter().map(BlockRecord::from).collect(),
        }
    }
}

/// Serialize blocks to a JSON string.
pub fn export_json(blocks: &[AssignedBlock], pretty: bool) -> Result<String> {
    let document = BlockDocument::from_blocks(blocks);
    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(json)
}

/// Write blocks as JSON to `path`.
pub fn write_json<P: AsRef<Path>>(blocks: &[AssignedBlock], path: P) -> Result<()> {
    let json = export_json(blocks, true)?;
    fs::write(path.as_ref(), json)?;
    log::info!("wrote {} blocks to {}", blocks.len(), path.as_ref().display());
    Ok(())
}

/// Parse a previously exported document.
pub fn parse_json(contents: &str) -> Result<BlockDocument> {
    Ok(serde_json::from_str(contents)?)
}
