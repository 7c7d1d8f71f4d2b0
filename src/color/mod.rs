//! Color quantization and dithering.

pub mod bin;
pub mod dither;

pub use bin::bin_color;
pub use dither::{apply_ordered, apply_random, dither, ordered_threshold, DitherMode};
