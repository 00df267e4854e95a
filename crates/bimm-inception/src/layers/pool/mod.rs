//! # Pooling layers with [`PaddingMode`] support.
//!
//! [`PaddingMode`]: crate::layers::padding::PaddingMode
pub mod avg_pool_2d_same;
pub mod max_pool_2d_same;
