//! # Complete Model Families

pub mod inception;
