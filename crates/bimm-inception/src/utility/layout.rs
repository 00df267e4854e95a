//! # Tensor Layout Utilities
//!
//! Models in this crate use burn's ``[batch, channels, height, width]``
//! layout; image batches are frequently ``[batch, height, width, channels]``.

use burn::prelude::{Backend, Tensor};

/// Convert ``[batch, height, width, channels]`` to ``[batch, channels, height, width]``.
pub fn channels_last_to_first<B: Backend>(input: Tensor<B, 4>) -> Tensor<B, 4> {
    input.permute([0, 3, 1, 2])
}

/// Convert ``[batch, channels, height, width]`` to ``[batch, height, width, channels]``.
pub fn channels_first_to_last<B: Backend>(input: Tensor<B, 4>) -> Tensor<B, 4> {
    input.permute([0, 2, 3, 1])
}
