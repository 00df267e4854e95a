//! # Inception Block E
//!
//! Four-branch expanded block on the 8x8 grid; resolution is preserved.
//!
//! Branches b1 and b2 each end in a split: the same ``1x3`` and ``3x1``
//! convs are applied side by side, and their outputs are concatenated.
//! The split convs are a single pair of modules, shared by both branches.
//!
//! ```text
//! b0: conv 1x1 (320)
//! b1: conv 1x1 (384)                 -> [conv_1x3 (384), conv_3x1 (384)]
//! b2: conv 1x1 (448) -> conv 3x3 (384) -> [conv_1x3 (384), conv_3x1 (384)]
//! b3: avgpool 3x3 -> conv 1x1 (192)
//! ```
//!
//! On an autodiff backend, the shared norm layers see two batches per
//! forward pass, and update their running statistics once for each.

use crate::layers::blocks::conv_block::{AbstractConvBlockConfig, ConvBlock, ConvBlockMeta};
use crate::layers::pool::avg_pool_2d_same::{AvgPool2dSame, AvgPool2dSameConfig};
use crate::models::inception::meta::{
    InceptionBlockMeta, concat_branches, preserved_resolution,
};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::prelude::{Backend, Config, Module, Tensor};

/// Width of the shared split convs.
const SPLIT_CHANNELS: usize = 384;

/// [`InceptionBlockE`] Config.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Config, Debug)]
pub struct InceptionBlockEConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionBlockMeta for InceptionBlockEConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        320 + 2 * (2 * SPLIT_CHANNELS) + 192
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        preserved_resolution(input_resolution)
    }
}

impl InceptionBlockEConfig {
    /// Initialize an [`InceptionBlockE`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionBlockE<B> {
        let c = &self.conv;
        let in_channels = self.in_channels;
        let s = SPLIT_CHANNELS;
        InceptionBlockE {
            branch1x1: c.pointwise([in_channels, 320]).init(device),

            branch3x3_1: c.pointwise([in_channels, s]).init(device),

            branch3x3dbl_1: c.pointwise([in_channels, 448]).init(device),
            branch3x3dbl_2: c.same([448, s], [3, 3]).init(device),

            conv_1x3: c.same([s, s], [1, 3]).init(device),
            conv_3x1: c.same([s, s], [3, 1]).init(device),

            branch_pool_pool: AvgPool2dSameConfig::new([3, 3]).init(),
            branch_pool: c.pointwise([in_channels, 192]).init(device),
        }
    }
}

/// Inception Block E.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub struct InceptionBlockE<B: Backend> {
    /// b0: 1x1 conv.
    pub branch1x1: ConvBlock<B>,

    /// b1: 1x1 conv.
    pub branch3x3_1: ConvBlock<B>,

    /// b2: 1x1 conv.
    pub branch3x3dbl_1: ConvBlock<B>,
    /// b2: 3x3 conv.
    pub branch3x3dbl_2: ConvBlock<B>,

    /// b1 and b2: shared 1x3 split conv.
    pub conv_1x3: ConvBlock<B>,
    /// b1 and b2: shared 3x1 split conv.
    pub conv_3x1: ConvBlock<B>,

    /// b3: 3x3 avg pool.
    pub branch_pool_pool: AvgPool2dSame,
    /// b3: 1x1 conv.
    pub branch_pool: ConvBlock<B>,
}

impl<B: Backend> InceptionBlockMeta for InceptionBlockE<B> {
    fn in_channels(&self) -> usize {
        self.branch1x1.in_channels()
    }

    fn out_channels(&self) -> usize {
        let split = self.conv_1x3.out_channels() + self.conv_3x1.out_channels();
        self.branch1x1.out_channels() + 2 * split + self.branch_pool.out_channels()
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        preserved_resolution(input_resolution)
    }
}

impl<B: Backend> InceptionBlockE<B> {
    /// Apply the shared split convs, side by side.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, 384, height, width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, 768, height, width]``; the ``1x3`` output first.
    pub fn split_asymmetric(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, height, width] = unpack_shape_contract!(
            ["batch", "channels", "height", "width"],
            &input,
            &["batch", "height", "width"],
            &[("channels", self.conv_1x3.in_channels())]
        );
        let a = self.conv_1x3.forward(input.clone());
        let b = self.conv_3x1.forward(input);
        concat_branches(vec![a, b], batch, [height, width])
    }

    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, 2048, height, width]``
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, height, width] = unpack_shape_contract!(
            ["batch", "in_channels", "height", "width"],
            &input,
            &["batch", "height", "width"],
            &[("in_channels", self.in_channels())]
        );

        let b0 = self.branch1x1.forward(input.clone());

        let b1 = self.branch3x3_1.forward(input.clone());
        let b1 = self.split_asymmetric(b1);

        let b2 = self.branch3x3dbl_1.forward(input.clone());
        let b2 = self.branch3x3dbl_2.forward(b2);
        let b2 = self.split_asymmetric(b2);

        let b3 = self.branch_pool_pool.forward(input);
        let b3 = self.branch_pool.forward(b3);

        let x = concat_branches(vec![b0, b1, b2, b3], batch, [height, width]);

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "height", "width"],
            &x,
            &[
                ("batch", batch),
                ("out_channels", self.out_channels()),
                ("height", height),
                ("width", width)
            ]
        );

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::module::{Module, Param};
    use burn::tensor::Distribution;
    use hamcrest::prelude::*;

    #[test]
    fn test_block_e_config() {
        let config = InceptionBlockEConfig::new(1280);
        assert_eq!(config.out_channels(), 2048);
        assert_eq!(config.output_resolution([8, 8]), [8, 8]);

        assert_eq!(InceptionBlockEConfig::new(2048).out_channels(), 2048);
    }

    #[test]
    fn test_block_e_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: InceptionBlockE<B> = InceptionBlockEConfig::new(16).init(&device);
        assert_eq!(block.out_channels(), 2048);
        assert_eq!(block.conv_1x3.kernel_size(), [1, 3]);
        assert_eq!(block.conv_3x1.kernel_size(), [3, 1]);

        let input = Tensor::random([2, 16, 3, 4], Distribution::Default, &device);
        let output = block.forward(input);
        assert_eq!(output.dims(), [2, 2048, 3, 4]);
    }

    #[test]
    fn test_block_e_split_convs_counted_once() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: InceptionBlockE<B> = InceptionBlockEConfig::new(16).init(&device);

        let parts = [
            &block.branch1x1,
            &block.branch3x3_1,
            &block.branch3x3dbl_1,
            &block.branch3x3dbl_2,
            &block.conv_1x3,
            &block.conv_3x1,
            &block.branch_pool,
        ];
        let expected: usize = parts.iter().map(|p| p.num_params()).sum();
        assert_eq!(block.num_params(), expected);
    }

    #[test]
    fn test_block_e_shared_split_convs() {
        type B = NdArray<f32>;
        let device = Default::default();

        let mut block: InceptionBlockE<B> = InceptionBlockEConfig::new(8).init(&device);

        // Collapse the shared 1x3 conv to a constant:
        // zero weights, unit bias, default (identity) running stats.
        let weight_shape = block.conv_1x3.conv.weight.shape();
        block.conv_1x3.conv.weight = Param::from_tensor(Tensor::zeros(weight_shape, &device));
        block.conv_1x3.conv.bias = Some(Param::from_tensor(Tensor::ones([384], &device)));
        let expected = 1.0 / (1.0f32 + 1e-3).sqrt();

        let input = Tensor::random([1, 8, 4, 4], Distribution::Default, &device);
        let output = block.forward(input.clone());

        // b1 and b2 both route their 1x3 part through the same module.
        for offset in [320, 320 + 768] {
            let part = output.clone().narrow(1, offset, 384);
            assert_that!(part.clone().min().into_scalar(), is(close_to(expected, 1e-5)));
            assert_that!(part.max().into_scalar(), is(close_to(expected, 1e-5)));
        }

        // b0 is untouched.
        let b0 = block.branch1x1.forward(input);
        output
            .narrow(1, 0, 320)
            .to_data()
            .assert_eq(&b0.to_data(), true);
    }
}
