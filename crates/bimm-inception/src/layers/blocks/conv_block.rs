//! # `ConvBlock` - conv/norm/relu block.
//!
//! A [`ConvBlock`] module is:
//! * a [`Conv2d`] layer, with [`PaddingMode`] padding,
//! * a [`BatchNorm`] layer,
//! * a [`Relu`] activation.
//!
//! The normalization statistics source follows the backend:
//! on an autodiff backend the batch statistics are used, and the
//! running statistics are updated; on the [`AutodiffModule::valid`]
//! copy, the stored running statistics are used.
//!
//! [`AutodiffModule::valid`]: burn::module::AutodiffModule::valid

use crate::layers::padding::{PaddingMode, expect_output_resolution, pad_same};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};

/// The default [`BatchNormConfig`] for a [`ConvBlock`].
///
/// ``epsilon=1e-3``, ``momentum=0.01`` (a ``0.99`` running-average decay).
///
/// `num_features` is a placeholder; it is matched to the conv at init.
pub fn default_norm_config() -> BatchNormConfig {
    BatchNormConfig::new(0)
        .with_epsilon(1e-3)
        .with_momentum(0.01)
}

/// Abstract policy for [`ConvBlock`] Config.
///
/// Carries the settings shared by every conv in a network,
/// and can be lifted to a [`ConvBlockConfig`] for a concrete conv shape.
#[derive(Config, Debug)]
pub struct AbstractConvBlockConfig {
    /// The [`BatchNorm`] config.
    #[config(default = "default_norm_config()")]
    pub norm: BatchNormConfig,

    /// Whether the convolutions carry a bias term.
    #[config(default = true)]
    pub bias: bool,
}

impl AbstractConvBlockConfig {
    /// Build a [`ConvBlockConfig`].
    ///
    /// # Arguments
    ///
    /// - `channels`: ``[in_channels, out_channels]``.
    /// - `kernel_size`: ``[kernel_height, kernel_width]``.
    /// - `stride`: the stride, for both dimensions.
    /// - `padding`: the padding mode.
    pub fn build_config(
        &self,
        channels: [usize; 2],
        kernel_size: [usize; 2],
        stride: usize,
        padding: PaddingMode,
    ) -> ConvBlockConfig {
        ConvBlockConfig {
            in_channels: channels[0],
            out_channels: channels[1],
            kernel_size,
            stride,
            padding,
            bias: self.bias,
            norm: self.norm.clone(),
        }
    }

    /// Build a stride-1 'SAME' [`ConvBlockConfig`].
    pub fn same(
        &self,
        channels: [usize; 2],
        kernel_size: [usize; 2],
    ) -> ConvBlockConfig {
        self.build_config(channels, kernel_size, 1, PaddingMode::Same)
    }

    /// Build a stride-1 'SAME' [`ConvBlockConfig`] with a 1x1 kernel.
    pub fn pointwise(
        &self,
        channels: [usize; 2],
    ) -> ConvBlockConfig {
        self.same(channels, [1, 1])
    }

    /// Build a 3x3, stride-2, 'VALID' grid reduction [`ConvBlockConfig`].
    pub fn reduce(
        &self,
        channels: [usize; 2],
    ) -> ConvBlockConfig {
        self.build_config(channels, [3, 3], 2, PaddingMode::Valid)
    }
}

/// [`ConvBlock`] Meta.
pub trait ConvBlockMeta {
    /// Number of input channels.
    fn in_channels(&self) -> usize;

    /// Number of output channels.
    fn out_channels(&self) -> usize;

    /// ``[kernel_height, kernel_width]``.
    fn kernel_size(&self) -> [usize; 2];

    /// The stride, for both dimensions.
    fn stride(&self) -> usize;

    /// The padding mode.
    fn padding(&self) -> PaddingMode;

    /// Get the output resolution for a given input resolution.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: ``[in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[out_height, out_width]``
    ///
    /// # Panics
    ///
    /// Under 'VALID' padding, if the kernel does not fit the input.
    fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        let stride = self.stride();
        expect_output_resolution(
            input_resolution,
            self.kernel_size(),
            [stride, stride],
            self.padding(),
        )
    }
}

/// [`ConvBlock`] Config.
///
/// Implements [`ConvBlockMeta`].
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Number of output channels.
    pub out_channels: usize,

    /// ``[kernel_height, kernel_width]``.
    pub kernel_size: [usize; 2],

    /// The stride, for both dimensions.
    #[config(default = 1)]
    pub stride: usize,

    /// The padding mode.
    #[config(default = "PaddingMode::Same")]
    pub padding: PaddingMode,

    /// Whether the convolution carries a bias term.
    #[config(default = true)]
    pub bias: bool,

    /// The [`BatchNorm`] config.
    ///
    /// `num_features` is matched to `out_channels` at init.
    #[config(default = "default_norm_config()")]
    pub norm: BatchNormConfig,
}

impl ConvBlockMeta for ConvBlockConfig {
    fn in_channels(&self) -> usize {
        self.in_channels
    }

    fn out_channels(&self) -> usize {
        self.out_channels
    }

    fn kernel_size(&self) -> [usize; 2] {
        self.kernel_size
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn padding(&self) -> PaddingMode {
        self.padding
    }
}

impl ConvBlockConfig {
    /// Initialize a [`ConvBlock`].
    ///
    /// Auto-matches the norm layer features
    /// to the conv layer's output channels.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ConvBlock<B> {
        assert!(self.stride > 0, "stride must be > 0: {self:?}");

        let conv = Conv2dConfig::new([self.in_channels, self.out_channels], self.kernel_size)
            .with_stride([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Valid)
            .with_bias(self.bias);

        let norm = BatchNormConfig {
            num_features: self.out_channels,
            ..self.norm.clone()
        };

        ConvBlock {
            conv: conv.init(device),
            norm: norm.init(device),
            act: Relu::new(),
            padding: Ignored(self.padding),
        }
    }
}

/// Sequenced conv/norm/relu block.
///
/// Implements [`ConvBlockMeta`].
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    /// Internal Conv2d layer; always unpadded.
    pub conv: Conv2d<B>,

    /// Internal Norm Layer.
    pub norm: BatchNorm<B, 2>,

    /// Activation layer.
    pub act: Relu,

    /// The padding mode, applied before `conv`.
    pub padding: Ignored<PaddingMode>,
}

impl<B: Backend> ConvBlockMeta for ConvBlock<B> {
    fn in_channels(&self) -> usize {
        self.conv.weight.shape().dims[1]
    }

    fn out_channels(&self) -> usize {
        self.conv.weight.shape().dims[0]
    }

    fn kernel_size(&self) -> [usize; 2] {
        self.conv.kernel_size
    }

    fn stride(&self) -> usize {
        self.conv.stride[0]
    }

    fn padding(&self) -> PaddingMode {
        self.padding.0
    }
}

impl<B: Backend> ConvBlock<B> {
    /// Forward Pass.
    ///
    /// ```rust,ignore
    /// let x = pad(input, self.padding);
    /// let x = self.conv.forward(x);
    /// let x = self.norm.forward(x);
    /// let x = self.act.forward(x);
    /// return x
    /// ```
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, out_channels, out_height, out_width]``
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

        let x = match self.padding.0 {
            PaddingMode::Valid => input,
            PaddingMode::Same => pad_same(
                input,
                self.conv.kernel_size,
                self.conv.stride,
                self.conv.dilation,
                0.0,
            ),
        };

        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        let x = self.act.forward(x);

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
    use bimm_contracts::assert_shape_contract;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;
    use burn::tensor::Distribution;
    use num_traits::ToPrimitive;

    #[test]
    fn test_conv_block_config() {
        let policy = AbstractConvBlockConfig::new();
        assert!(policy.bias);
        assert_eq!(policy.norm.epsilon, 1e-3);
        assert_eq!(policy.norm.momentum, 0.01);

        let config = policy.same([2, 4], [1, 7]);
        assert_eq!(config.in_channels(), 2);
        assert_eq!(config.out_channels(), 4);
        assert_eq!(config.kernel_size(), [1, 7]);
        assert_eq!(config.stride(), 1);
        assert_eq!(config.padding(), PaddingMode::Same);
        assert_eq!(config.output_resolution([17, 17]), [17, 17]);

        let config = policy.reduce([4, 8]);
        assert_eq!(config.kernel_size(), [3, 3]);
        assert_eq!(config.stride(), 2);
        assert_eq!(config.padding(), PaddingMode::Valid);
        assert_eq!(config.output_resolution([35, 35]), [17, 17]);

        let config = ConvBlockConfig::new(3, 32, [3, 3]).with_stride(2);
        assert_eq!(config.output_resolution([299, 299]), [150, 150]);
    }

    #[test]
    fn test_conv_block_meta() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: ConvBlock<B> = ConvBlockConfig::new(2, 6, [3, 1])
            .with_stride(2)
            .with_padding(PaddingMode::Valid)
            .init(&device);

        assert_eq!(block.in_channels(), 2);
        assert_eq!(block.out_channels(), 6);
        assert_eq!(block.kernel_size(), [3, 1]);
        assert_eq!(block.stride(), 2);
        assert_eq!(block.padding(), PaddingMode::Valid);
        assert_eq!(block.norm.gamma.shape().dims, [6]);
        assert!(block.conv.bias.is_some());
    }

    #[test]
    fn test_conv_block_same_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        for stride in 1..4 {
            let block: ConvBlock<B> = ConvBlockConfig::new(3, 5, [3, 3])
                .with_stride(stride)
                .init(&device);

            let input = Tensor::random([2, 3, 11, 8], Distribution::Default, &device);
            let output = block.forward(input);

            assert_shape_contract!(
                ["batch", "out_channels", "out_height", "out_width"],
                &output,
                &[
                    ("batch", 2),
                    ("out_channels", 5),
                    ("out_height", 11usize.div_ceil(stride)),
                    ("out_width", 8usize.div_ceil(stride))
                ],
            );
        }
    }

    #[test]
    fn test_conv_block_valid_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: ConvBlock<B> = ConvBlockConfig::new(3, 5, [3, 3])
            .with_stride(2)
            .with_padding(PaddingMode::Valid)
            .init(&device);

        let input = Tensor::random([1, 3, 17, 16], Distribution::Default, &device);
        let output = block.forward(input);

        // floor((17 - 3) / 2) + 1, floor((16 - 3) / 2) + 1
        assert_eq!(output.dims(), [1, 5, 8, 7]);
    }

    #[test]
    fn test_conv_block_matches_layers() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: ConvBlock<B> = ConvBlockConfig::new(2, 4, [1, 1]).init(&device);

        let input = Tensor::random([2, 2, 5, 5], Distribution::Default, &device);
        let output = block.forward(input.clone());

        let expected = {
            let x = block.conv.forward(input);
            let x = block.norm.forward(x);
            block.act.forward(x)
        };
        output.to_data().assert_eq(&expected.to_data(), true);

        let min = output.min().into_scalar().to_f64().unwrap();
        assert!(min >= 0.0);
    }

    #[test]
    #[should_panic]
    fn test_conv_block_channel_contract() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: ConvBlock<B> = ConvBlockConfig::new(2, 4, [1, 1]).init(&device);

        let input = Tensor::random([2, 3, 5, 5], Distribution::Default, &device);
        block.forward(input);
    }

    #[test]
    fn test_conv_block_training_updates_running_stats() {
        type B = Autodiff<NdArray<f32>>;
        let device = Default::default();

        let block: ConvBlock<B> = ConvBlockConfig::new(2, 4, [3, 3]).init(&device);
        let input: Tensor<B, 4> =
            Tensor::random([4, 2, 6, 6], Distribution::Normal(2.0, 1.0), &device);

        let before = block.norm.running_mean.value();
        block.forward(input.clone());
        let after = block.norm.running_mean.value();

        let delta = (after.clone() - before).abs().sum().into_scalar();
        assert!(delta.to_f64().unwrap() > 0.0);

        // The inference copy reads, but never writes, the running stats.
        let valid = block.valid();
        let valid_input = input.inner();

        let first = valid.forward(valid_input.clone());
        let second = valid.forward(valid_input);
        first.to_data().assert_eq(&second.to_data(), true);
        valid
            .norm
            .running_mean
            .value()
            .to_data()
            .assert_eq(&after.inner().to_data(), true);
    }
}
