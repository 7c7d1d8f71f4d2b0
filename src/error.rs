//! Error types for the schematic voxelizer.

use thiserror::Error;

/// Result type alias using VoxelizerError.
pub type Result<T> = std::result::Result<T, VoxelizerError>;

/// Main error type for voxelization and block assignment.
#[derive(Error, Debug)]
pub enum VoxelizerError {
    /// Failed to parse JSON data (atlas files, configs).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or decode a texture image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The atlas resource could not be found.
    #[error("Atlas not found: {0}")]
    AtlasNotFound(String),

    /// The atlas resource contains no block entries.
    #[error("Atlas contains no blocks: {0}")]
    EmptyAtlas(String),

    /// An atlas entry is malformed.
    #[error("Invalid atlas entry: {0}")]
    InvalidAtlasEntry(String),

    /// The palette has no entries left after filtering against the atlas.
    #[error("Palette has no usable blocks: {0}")]
    EmptyPalette(String),

    /// Mesh data is inconsistent (bad indices, mismatched attribute lengths).
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Failed to parse a mesh file.
    #[error("Mesh parse error at line {line}: {message}")]
    MeshParse { line: usize, message: String },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled between ray batches.
    #[error("Voxelization cancelled")]
    Cancelled,

    /// Failed to export assigned blocks.
    #[error("Export error: {0}")]
    Export(String),
}
