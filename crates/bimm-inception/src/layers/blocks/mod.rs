//! # Miscellaneous Blocks
pub mod conv_block;
