//! # Inception Block C
//!
//! Four-branch mixed block on the 17x17 grid, with factorized 7x7
//! convolutions (a ``1x7`` followed by a ``7x1``); resolution is preserved.
//!
//! ```text
//! b0: conv 1x1 (192)
//! b1: conv 1x1 (c7) -> conv 1x7 (c7) -> conv 7x1 (192)
//! b2: conv 1x1 (c7) -> conv 7x1 (c7) -> conv 1x7 (c7) -> conv 7x1 (c7) -> conv 1x7 (192)
//! b3: maxpool 3x3 -> conv 1x1 (192)
//! ```

use crate::layers::blocks::conv_block::{AbstractConvBlockConfig, ConvBlock, ConvBlockMeta};
use crate::layers::pool::max_pool_2d_same::{MaxPool2dSame, MaxPool2dSameConfig};
use crate::models::inception::meta::{
    InceptionBlockMeta, concat_branches, preserved_resolution,
};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`InceptionBlockC`] Config.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Config, Debug)]
pub struct InceptionBlockCConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Inner width of the factorized 7x7 branches.
    pub channels_7x7: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionBlockMeta for InceptionBlockCConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        4 * 192
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        preserved_resolution(input_resolution)
    }
}

impl InceptionBlockCConfig {
    /// Initialize an [`InceptionBlockC`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionBlockC<B> {
        let c = &self.conv;
        let in_channels = self.in_channels;
        let c7 = self.channels_7x7;
        InceptionBlockC {
            branch1x1: c.pointwise([in_channels, 192]).init(device),

            branch7x7_1: c.pointwise([in_channels, c7]).init(device),
            branch7x7_2: c.same([c7, c7], [1, 7]).init(device),
            branch7x7_3: c.same([c7, 192], [7, 1]).init(device),

            branch7x7dbl_1: c.pointwise([in_channels, c7]).init(device),
            branch7x7dbl_2: c.same([c7, c7], [7, 1]).init(device),
            branch7x7dbl_3: c.same([c7, c7], [1, 7]).init(device),
            branch7x7dbl_4: c.same([c7, c7], [7, 1]).init(device),
            branch7x7dbl_5: c.same([c7, 192], [1, 7]).init(device),

            branch_pool_pool: MaxPool2dSameConfig::new([3, 3]).init(),
            branch_pool: c.pointwise([in_channels, 192]).init(device),
        }
    }
}

/// Inception Block C.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub struct InceptionBlockC<B: Backend> {
    /// b0: 1x1 conv.
    pub branch1x1: ConvBlock<B>,

    /// b1: 1x1 conv.
    pub branch7x7_1: ConvBlock<B>,
    /// b1: 1x7 conv.
    pub branch7x7_2: ConvBlock<B>,
    /// b1: 7x1 conv.
    pub branch7x7_3: ConvBlock<B>,

    /// b2: 1x1 conv.
    pub branch7x7dbl_1: ConvBlock<B>,
    /// b2: 7x1 conv.
    pub branch7x7dbl_2: ConvBlock<B>,
    /// b2: 1x7 conv.
    pub branch7x7dbl_3: ConvBlock<B>,
    /// b2: 7x1 conv.
    pub branch7x7dbl_4: ConvBlock<B>,
    /// b2: 1x7 conv.
    pub branch7x7dbl_5: ConvBlock<B>,

    /// b3: 3x3 max pool.
    pub branch_pool_pool: MaxPool2dSame,
    /// b3: 1x1 conv.
    pub branch_pool: ConvBlock<B>,
}

impl<B: Backend> InceptionBlockMeta for InceptionBlockC<B> {
    fn in_channels(&self) -> usize {
        self.branch1x1.in_channels()
    }

    fn out_channels(&self) -> usize {
        self.branch1x1.out_channels()
            + self.branch7x7_3.out_channels()
            + self.branch7x7dbl_5.out_channels()
            + self.branch_pool.out_channels()
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        preserved_resolution(input_resolution)
    }
}

impl<B: Backend> InceptionBlockC<B> {
    /// Inner width of the factorized 7x7 branches.
    pub fn channels_7x7(&self) -> usize {
        self.branch7x7_1.out_channels()
    }

    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, 768, height, width]``
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

        let b1 = self.branch7x7_1.forward(input.clone());
        let b1 = self.branch7x7_2.forward(b1);
        let b1 = self.branch7x7_3.forward(b1);

        let b2 = self.branch7x7dbl_1.forward(input.clone());
        let b2 = self.branch7x7dbl_2.forward(b2);
        let b2 = self.branch7x7dbl_3.forward(b2);
        let b2 = self.branch7x7dbl_4.forward(b2);
        let b2 = self.branch7x7dbl_5.forward(b2);

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
    use burn::module::Module;
    use burn::tensor::Distribution;

    #[test]
    fn test_block_c_config() {
        let config = InceptionBlockCConfig::new(768, 128);
        assert_eq!(config.out_channels(), 768);
        assert_eq!(config.output_resolution([17, 17]), [17, 17]);
    }

    #[test]
    fn test_block_c_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: InceptionBlockC<B> = InceptionBlockCConfig::new(16, 8).init(&device);
        assert_eq!(block.channels_7x7(), 8);
        assert_eq!(block.out_channels(), 768);
        assert_eq!(block.branch7x7_2.kernel_size(), [1, 7]);
        assert_eq!(block.branch7x7_3.kernel_size(), [7, 1]);

        let input = Tensor::random([2, 16, 7, 5], Distribution::Default, &device);
        let output = block.forward(input);
        assert_eq!(output.dims(), [2, 768, 7, 5]);
    }

    #[test]
    fn test_block_c_factorized_params() {
        type B = NdArray<f32>;
        let device = Default::default();

        let c7 = 8;
        let block: InceptionBlockC<B> = InceptionBlockCConfig::new(16, c7).init(&device);

        // A rank-1 pair uses 2*7 taps per channel pair, not 7*7.
        let conv_1x7 = c7 * c7 * 7 + c7;
        assert_eq!(block.branch7x7_2.conv.num_params(), conv_1x7);
        assert_eq!(block.branch7x7dbl_3.conv.num_params(), conv_1x7);
    }
}
