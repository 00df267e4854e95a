//! # Inception Block B
//!
//! Three-branch grid reduction (35x35 -> 17x17); every branch ends in a
//! 3x3, stride-2, 'VALID' op, so all branches agree on the output size.
//!
//! ```text
//! b0: conv 3x3/2 valid (384)
//! b1: conv 1x1 (64) -> conv 3x3 (96) -> conv 3x3/2 valid (96)
//! b2: maxpool 3x3/2 valid
//! ```

use crate::layers::blocks::conv_block::{AbstractConvBlockConfig, ConvBlock, ConvBlockMeta};
use crate::layers::padding::{PaddingMode, maybe_output_resolution};
use crate::layers::pool::max_pool_2d_same::{MaxPool2dSame, MaxPool2dSameConfig};
use crate::models::inception::meta::{InceptionBlockMeta, concat_branches};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::prelude::{Backend, Config, Module, Tensor};

/// Resolution of a 3x3, stride-2, 'VALID' grid reduction.
pub(crate) fn reduced_resolution(input_resolution: [usize; 2]) -> Option<[usize; 2]> {
    maybe_output_resolution(input_resolution, [3, 3], [2, 2], PaddingMode::Valid)
}

/// [`InceptionBlockB`] Config.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Config, Debug)]
pub struct InceptionBlockBConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionBlockMeta for InceptionBlockBConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        384 + 96 + self.in_channels
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        reduced_resolution(input_resolution)
    }
}

impl InceptionBlockBConfig {
    /// Initialize an [`InceptionBlockB`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionBlockB<B> {
        let c = &self.conv;
        InceptionBlockB {
            branch3x3: c.reduce([self.in_channels, 384]).init(device),

            branch3x3dbl_1: c.pointwise([self.in_channels, 64]).init(device),
            branch3x3dbl_2: c.same([64, 96], [3, 3]).init(device),
            branch3x3dbl_3: c.reduce([96, 96]).init(device),

            branch_pool: MaxPool2dSameConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingMode::Valid)
                .init(),
        }
    }
}

/// Inception Block B.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub struct InceptionBlockB<B: Backend> {
    /// b0: 3x3/2 conv.
    pub branch3x3: ConvBlock<B>,

    /// b1: 1x1 conv.
    pub branch3x3dbl_1: ConvBlock<B>,
    /// b1: 3x3 conv.
    pub branch3x3dbl_2: ConvBlock<B>,
    /// b1: 3x3/2 conv.
    pub branch3x3dbl_3: ConvBlock<B>,

    /// b2: 3x3/2 max pool; passes the input channels through.
    pub branch_pool: MaxPool2dSame,
}

impl<B: Backend> InceptionBlockMeta for InceptionBlockB<B> {
    fn in_channels(&self) -> usize {
        self.branch3x3.in_channels()
    }

    fn out_channels(&self) -> usize {
        self.branch3x3.out_channels() + self.branch3x3dbl_3.out_channels() + self.in_channels()
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        reduced_resolution(input_resolution)
    }
}

impl<B: Backend> InceptionBlockB<B> {
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

        let b0 = self.branch3x3.forward(input.clone());

        let b1 = self.branch3x3dbl_1.forward(input.clone());
        let b1 = self.branch3x3dbl_2.forward(b1);
        let b1 = self.branch3x3dbl_3.forward(b1);

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
