//! # Forward Mode
//!
//! The training / inference mode of a forward pass is carried by the backend
//! type, not by a runtime flag: burn's `BatchNorm` and `Dropout` consult
//! [`Backend::ad_enabled`], so every layer in a single forward pass sees the
//! same mode.
//!
//! * ``Model<Autodiff<B>>`` - training; batch statistics, running statistics
//!   are updated, dropout is active.
//! * ``model.valid()`` - inference; stored running statistics, no dropout.

use burn::prelude::Backend;

/// The resolved mode of a forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// Batch statistics; running statistics are updated.
    Training,

    /// Stored running statistics.
    Inference,
}

impl ForwardMode {
    /// The mode a module on backend `B` runs in.
    pub fn of<B: Backend>() -> Self {
        if B::ad_enabled() {
            ForwardMode::Training
        } else {
            ForwardMode::Inference
        }
    }

    /// Is this the training mode?
    pub fn is_training(&self) -> bool {
        matches!(self, ForwardMode::Training)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_forward_mode() {
        assert_eq!(ForwardMode::of::<NdArray<f32>>(), ForwardMode::Inference);
        assert_eq!(
            ForwardMode::of::<Autodiff<NdArray<f32>>>(),
            ForwardMode::Training
        );
        assert!(ForwardMode::Training.is_training());
        assert!(!ForwardMode::Inference.is_training());
    }
}
