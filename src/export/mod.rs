//! Output formats for assigned blocks.

pub mod commands;
pub mod json;

pub use commands::{export_commands, CommandOrigin};
pub use json::{export_json, parse_json, write_json, BlockDocument, BlockRecord};
