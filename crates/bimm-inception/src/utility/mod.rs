//! # Utilities
pub mod burn;
pub mod layout;
pub mod mode;
pub mod probability;
