//! # Inception Block A
//!
//! Four-branch mixed block on the 35x35 grid; resolution is preserved.
//!
//! ```text
//! b0: conv 1x1 (64)
//! b1: conv 1x1 (48) -> conv 5x5 (64)
//! b2: conv 1x1 (64) -> conv 3x3 (96) -> conv 3x3 (96)
//! b3: avgpool 3x3 -> conv 1x1 (pool_features)
//! ```

use crate::layers::blocks::conv_block::{AbstractConvBlockConfig, ConvBlock, ConvBlockMeta};
use crate::layers::pool::avg_pool_2d_same::{AvgPool2dSame, AvgPool2dSameConfig};
use crate::models::inception::meta::{
    InceptionBlockMeta, concat_branches, preserved_resolution,
};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`InceptionBlockA`] Config.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Config, Debug)]
pub struct InceptionBlockAConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Output channels of the pool branch.
    pub pool_features: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionBlockMeta for InceptionBlockAConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        64 + 64 + 96 + self.pool_features
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        preserved_resolution(input_resolution)
    }
}

impl InceptionBlockAConfig {
    /// Initialize an [`InceptionBlockA`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionBlockA<B> {
        let c = &self.conv;
        let in_channels = self.in_channels;
        InceptionBlockA {
            branch1x1: c.pointwise([in_channels, 64]).init(device),

            branch5x5_1: c.pointwise([in_channels, 48]).init(device),
            branch5x5_2: c.same([48, 64], [5, 5]).init(device),

            branch3x3dbl_1: c.pointwise([in_channels, 64]).init(device),
            branch3x3dbl_2: c.same([64, 96], [3, 3]).init(device),
            branch3x3dbl_3: c.same([96, 96], [3, 3]).init(device),

            branch_pool_pool: AvgPool2dSameConfig::new([3, 3]).init(),
            branch_pool: c
                .pointwise([in_channels, self.pool_features])
                .init(device),
        }
    }
}

/// Inception Block A.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub struct InceptionBlockA<B: Backend> {
    /// b0: 1x1 conv.
    pub branch1x1: ConvBlock<B>,

    /// b1: 1x1 conv.
    pub branch5x5_1: ConvBlock<B>,
    /// b1: 5x5 conv.
    pub branch5x5_2: ConvBlock<B>,

    /// b2: 1x1 conv.
    pub branch3x3dbl_1: ConvBlock<B>,
    /// b2: first 3x3 conv.
    pub branch3x3dbl_2: ConvBlock<B>,
    /// b2: second 3x3 conv.
    pub branch3x3dbl_3: ConvBlock<B>,

    /// b3: 3x3 avg pool.
    pub branch_pool_pool: AvgPool2dSame,
    /// b3: 1x1 conv.
    pub branch_pool: ConvBlock<B>,
}

impl<B: Backend> InceptionBlockMeta for InceptionBlockA<B> {
    fn in_channels(&self) -> usize {
        self.branch1x1.in_channels()
    }

    fn out_channels(&self) -> usize {
        self.branch1x1.out_channels()
            + self.branch5x5_2.out_channels()
            + self.branch3x3dbl_3.out_channels()
            + self.branch_pool.out_channels()
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        preserved_resolution(input_resolution)
    }
}

impl<B: Backend> InceptionBlockA<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, out_channels, height, width]``
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

        let b1 = self.branch5x5_1.forward(input.clone());
        let b1 = self.branch5x5_2.forward(b1);

        let b2 = self.branch3x3dbl_1.forward(input.clone());
        let b2 = self.branch3x3dbl_2.forward(b2);
        let b2 = self.branch3x3dbl_3.forward(b2);

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
