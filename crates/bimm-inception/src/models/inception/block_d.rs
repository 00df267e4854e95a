//! # Inception Block D
//!
//! Three-branch grid reduction (17x17 -> 8x8), with a factorized 7x7
//! path ahead of the reduction.
//!
//! ```text
//! b0: conv 1x1 (192) -> conv 3x3/2 valid (320)
//! b1: conv 1x1 (192) -> conv 1x7 (192) -> conv 7x1 (192) -> conv 3x3/2 valid (192)
//! b2: maxpool 3x3/2 valid
//! ```

use crate::layers::blocks::conv_block::{AbstractConvBlockConfig, ConvBlock, ConvBlockMeta};
use crate::layers::padding::PaddingMode;
use crate::layers::pool::max_pool_2d_same::{MaxPool2dSame, MaxPool2dSameConfig};
use crate::models::inception::block_b::reduced_resolution;
use crate::models::inception::meta::{InceptionBlockMeta, concat_branches};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`InceptionBlockD`] Config.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Config, Debug)]
pub struct InceptionBlockDConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionBlockMeta for InceptionBlockDConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        320 + 192 + self.in_channels
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        reduced_resolution(input_resolution)
    }
}

impl InceptionBlockDConfig {
    /// Initialize an [`InceptionBlockD`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionBlockD<B> {
        let c = &self.conv;
        let in_channels = self.in_channels;
        InceptionBlockD {
            branch3x3_1: c.pointwise([in_channels, 192]).init(device),
            branch3x3_2: c.reduce([192, 320]).init(device),

            branch7x7x3_1: c.pointwise([in_channels, 192]).init(device),
            branch7x7x3_2: c.same([192, 192], [1, 7]).init(device),
            branch7x7x3_3: c.same([192, 192], [7, 1]).init(device),
            branch7x7x3_4: c.reduce([192, 192]).init(device),

            branch_pool: MaxPool2dSameConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingMode::Valid)
                .init(),
        }
    }
}

/// Inception Block D.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub struct InceptionBlockD<B: Backend> {
    /// b0: 1x1 conv.
    pub branch3x3_1: ConvBlock<B>,
    /// b0: 3x3/2 conv.
    pub branch3x3_2: ConvBlock<B>,

    /// b1: 1x1 conv.
    pub branch7x7x3_1: ConvBlock<B>,
    /// b1: 1x7 conv.
    pub branch7x7x3_2: ConvBlock<B>,
    /// b1: 7x1 conv.
    pub branch7x7x3_3: ConvBlock<B>,
    /// b1: 3x3/2 conv.
    pub branch7x7x3_4: ConvBlock<B>,

    /// b2: 3x3/2 max pool; passes the input channels through.
    pub branch_pool: MaxPool2dSame,
}

impl<B: Backend> InceptionBlockMeta for InceptionBlockD<B> {
    fn in_channels(&self) -> usize {
        self.branch3x3_1.in_channels()
    }

    fn out_channels(&self) -> usize {
        self.branch3x3_2.out_channels() + self.branch7x7x3_4.out_channels() + self.in_channels()
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        reduced_resolution(input_resolution)
    }
}

impl<B: Backend> InceptionBlockD<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, out_channels, (in_height - 3)/2 + 1, (in_width - 3)/2 + 1]``
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, in_height, in_width] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch", "in_height", "in_width"],
            &[("in_channels", self.in_channels())]
        );
        let [out_height, out_width] = self.output_resolution([in_height, in_width]);

        let b0 = self.branch3x3_1.forward(input.clone());
        let b0 = self.branch3x3_2.forward(b0);

        let b1 = self.branch7x7x3_1.forward(input.clone());
        let b1 = self.branch7x7x3_2.forward(b1);
        let b1 = self.branch7x7x3_3.forward(b1);
        let b1 = self.branch7x7x3_4.forward(b1);

        let b2 = self.branch_pool.forward(input);

        let x = concat_branches(vec![b0, b1, b2], batch, [out_height, out_width]);

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "out_height", "out_width"],
            &x,
            &[
                ("batch", batch),
                ("out_channels", self.out_channels()),
                ("out_height", out_height),
                ("out_width", out_width)
            ]
        );

        x
    }
}
