//! # Inception Block Meta
//!
//! [`InceptionBlockMeta`] is the common shape API of every block
//! (and block config) in the network; [`concat_branches`] joins
//! the parallel branches of a mixed block.

use bimm_contracts::assert_shape_contract_periodically;
use burn::prelude::{Backend, Tensor};

/// Shape API for Inception blocks and their configs.
pub trait InceptionBlockMeta {
    /// Number of input channels.
    fn in_channels(&self) -> usize;

    /// Number of output channels.
    ///
    /// For mixed blocks, the sum of the branch output channels.
    fn out_channels(&self) -> usize;

    /// Get the output resolution for a given input resolution.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: ``[in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``Some([out_height, out_width])``; or `None` if the input is too small.
    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]>;

    /// Get the output resolution for a given input resolution.
    ///
    /// This is the ``panic``-ing variant of [`InceptionBlockMeta::maybe_output_resolution`].
    ///
    /// # Panics
    ///
    /// If the input is too small.
    fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        match self.maybe_output_resolution(input_resolution) {
            Some(resolution) => resolution,
            None => panic!(
                "Input resolution {input_resolution:?} is too small for block with in_channels:{}",
                self.in_channels()
            ),
        }
    }
}

/// Resolution of a block which preserves its input resolution.
#[inline(always)]
pub(crate) fn preserved_resolution(input_resolution: [usize; 2]) -> Option<[usize; 2]> {
    if input_resolution.contains(&0) {
        None
    } else {
        Some(input_resolution)
    }
}

/// Concatenate branch outputs along the channel axis.
///
/// Branch order is preserved; it determines the channel layout.
///
/// # Arguments
///
/// - `branches`: ``[batch, branch_channels, out_height, out_width]`` tensors.
/// - `batch`: the expected batch size.
/// - `resolution`: the expected ``[out_height, out_width]``.
///
/// # Returns
///
/// ``[batch, sum(branch_channels), out_height, out_width]``
///
/// # Panics
///
/// If the branches disagree on batch or resolution.
pub fn concat_branches<B: Backend>(
    branches: Vec<Tensor<B, 4>>,
    batch: usize,
    resolution: [usize; 2],
) -> Tensor<B, 4> {
    let [out_height, out_width] = resolution;
    for branch in &branches {
        assert_shape_contract_periodically!(
            ["batch", "channels", "out_height", "out_width"],
            branch,
            &[
                ("batch", batch),
                ("out_height", out_height),
                ("out_width", out_width)
            ]
        );
    }
    Tensor::cat(branches, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_preserved_resolution() {
        assert_eq!(preserved_resolution([5, 7]), Some([5, 7]));
        assert_eq!(preserved_resolution([0, 7]), None);
    }

    #[test]
    fn test_concat_branches_order() {
        type B = NdArray<f32>;
        let device = Default::default();

        let a: Tensor<B, 4> = Tensor::zeros([2, 3, 4, 5], &device);
        let b: Tensor<B, 4> = Tensor::ones([2, 1, 4, 5], &device);

        let x = concat_branches(vec![a, b], 2, [4, 5]);
        assert_eq!(x.dims(), [2, 4, 4, 5]);
        assert_eq!(x.clone().narrow(1, 0, 3).sum().into_scalar(), 0.0);
        assert_eq!(x.narrow(1, 3, 1).sum().into_scalar(), 40.0);
    }

    #[test]
    #[should_panic]
    fn test_concat_branches_resolution_mismatch() {
        type B = NdArray<f32>;
        let device = Default::default();

        let a: Tensor<B, 4> = Tensor::zeros([1, 3, 4, 4], &device);
        let b: Tensor<B, 4> = Tensor::zeros([1, 3, 3, 3], &device);

        concat_branches(vec![a, b], 1, [4, 4]);
    }
}
