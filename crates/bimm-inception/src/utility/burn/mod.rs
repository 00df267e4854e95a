//! # Burn Utilities
pub mod record;
