//! # Input Stem
//!
//! The Inception-V3 stem reduces a raw image to a 192-channel feature map
//! at roughly 1/8 linear resolution. There is no branching:
//!
//! ```text
//! conv 3x3/2 (32) -> conv 3x3 (32) -> conv 3x3 (64) -> maxpool 3x3/2
//!   -> conv 1x1 (80) -> conv 3x3 (192) -> maxpool 3x3/2
//! ```
//!
//! Every step is 'SAME' padded.

use crate::layers::blocks::conv_block::{
    AbstractConvBlockConfig, ConvBlock, ConvBlockConfig, ConvBlockMeta,
};
use crate::layers::padding::PaddingMode;
use crate::layers::pool::max_pool_2d_same::{MaxPool2dSame, MaxPool2dSameConfig};
use crate::models::inception::meta::InceptionBlockMeta;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::prelude::{Backend, Config, Module, Tensor};

/// Output channels of the [`InceptionStem`].
pub const STEM_OUT_CHANNELS: usize = 192;

/// [`InceptionStem`] Config.
#[derive(Config, Debug)]
pub struct InceptionStemConfig {
    /// Number of input (image) channels.
    #[config(default = 3)]
    pub in_channels: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionBlockMeta for InceptionStemConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        STEM_OUT_CHANNELS
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        if input_resolution.contains(&0) {
            return None;
        }
        // Every op is 'SAME'; the three stride-2 ops each take a ceil-div.
        Some(input_resolution.map(|size| size.div_ceil(2).div_ceil(2).div_ceil(2)))
    }
}

impl InceptionStemConfig {
    fn pool(&self) -> MaxPool2dSameConfig {
        MaxPool2dSameConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingMode::Same)
    }

    /// The conv block configs, in order.
    pub fn conv_configs(&self) -> [ConvBlockConfig; 5] {
        let c = &self.conv;
        [
            c.build_config([self.in_channels, 32], [3, 3], 2, PaddingMode::Same),
            c.same([32, 32], [3, 3]),
            c.same([32, 64], [3, 3]),
            c.pointwise([64, 80]),
            c.same([80, STEM_OUT_CHANNELS], [3, 3]),
        ]
    }

    /// Initialize an [`InceptionStem`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionStem<B> {
        let [conv1, conv2, conv3, conv4, conv5] = self.conv_configs();
        InceptionStem {
            conv1: conv1.init(device),
            conv2: conv2.init(device),
            conv3: conv3.init(device),
            pool1: self.pool().init(),
            conv4: conv4.init(device),
            conv5: conv5.init(device),
            pool2: self.pool().init(),
        }
    }
}

/// Inception-V3 input stem.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub struct InceptionStem<B: Backend> {
    /// 3x3/2 conv, 32 channels.
    pub conv1: ConvBlock<B>,
    /// 3x3 conv, 32 channels.
    pub conv2: ConvBlock<B>,
    /// 3x3 conv, 64 channels.
    pub conv3: ConvBlock<B>,
    /// 3x3/2 max pool.
    pub pool1: MaxPool2dSame,
    /// 1x1 conv, 80 channels.
    pub conv4: ConvBlock<B>,
    /// 3x3 conv, 192 channels.
    pub conv5: ConvBlock<B>,
    /// 3x3/2 max pool.
    pub pool2: MaxPool2dSame,
}

impl<B: Backend> InceptionBlockMeta for InceptionStem<B> {
    fn in_channels(&self) -> usize {
        self.conv1.in_channels()
    }

    fn out_channels(&self) -> usize {
        self.conv5.out_channels()
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        InceptionStemConfig::new()
            .with_in_channels(self.in_channels())
            .maybe_output_resolution(input_resolution)
    }
}

impl<B: Backend> InceptionStem<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, 192, ceil(in_height/8), ceil(in_width/8)]``
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

        let x = self.conv1.forward(input);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.pool1.forward(x);
        let x = self.conv4.forward(x);
        let x = self.conv5.forward(x);
        let x = self.pool2.forward(x);

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

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    #[test]
    fn test_stem_config() {
        let config = InceptionStemConfig::new();
        assert_eq!(config.in_channels(), 3);
        assert_eq!(config.out_channels(), 192);

        assert_eq!(config.output_resolution([299, 299]), [38, 38]);
        assert_eq!(config.output_resolution([224, 225]), [28, 29]);
        assert_eq!(config.maybe_output_resolution([0, 10]), None);

        // The closed form agrees with the op-by-op arithmetic.
        for size in 1..100 {
            let mut resolution = [size, size];
            for conv in config.conv_configs().iter().take(3) {
                resolution = conv.output_resolution(resolution);
            }
            resolution = config.pool().output_resolution(resolution);
            for conv in config.conv_configs().iter().skip(3) {
                resolution = conv.output_resolution(resolution);
            }
            resolution = config.pool().output_resolution(resolution);
            assert_eq!(config.output_resolution([size, size]), resolution);
        }
    }

    #[test]
    fn test_stem_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let stem: InceptionStem<B> = InceptionStemConfig::new().init(&device);
        assert_eq!(stem.in_channels(), 3);
        assert_eq!(stem.out_channels(), 192);
        assert_eq!(stem.conv4.kernel_size(), [1, 1]);

        let input = Tensor::random([2, 3, 35, 30], Distribution::Default, &device);
        let output = stem.forward(input);
        assert_eq!(output.dims(), [2, 192, 5, 4]);
    }
}
