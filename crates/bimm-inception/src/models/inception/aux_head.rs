//! # Auxiliary Classifier
//!
//! A side-branch classifier tapped off the 17x17 grid; it only
//! contributes a training signal, and is skipped on the main path.
//!
//! ```text
//! avgpool 5x5/3 -> conv 1x1 (128) -> conv 5x5 (768) -> global avgpool -> linear
//! ```

use crate::layers::blocks::conv_block::{AbstractConvBlockConfig, ConvBlock, ConvBlockMeta};
use crate::layers::padding::PaddingMode;
use crate::layers::pool::avg_pool_2d_same::{AvgPool2dSame, AvgPool2dSameConfig};
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`InceptionAux`] Config.
#[derive(Config, Debug)]
pub struct InceptionAuxConfig {
    /// Number of input channels.
    pub in_channels: usize,

    /// Number of output classes.
    pub num_classes: usize,

    /// Conv block policy.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionAuxConfig {
    /// Initialize an [`InceptionAux`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionAux<B> {
        assert!(self.num_classes > 0, "num_classes must be > 0");
        InceptionAux {
            pool: AvgPool2dSameConfig::new([5, 5])
                .with_strides([3, 3])
                .with_padding(PaddingMode::Same)
                .init(),
            conv0: self.conv.pointwise([self.in_channels, 128]).init(device),
            conv1: self.conv.same([128, 768], [5, 5]).init(device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(768, self.num_classes).init(device),
        }
    }
}

/// Inception-V3 auxiliary classifier head.
#[derive(Module, Debug)]
pub struct InceptionAux<B: Backend> {
    /// 5x5/3 'SAME' avg pool.
    pub pool: AvgPool2dSame,

    /// 1x1 conv, 128 channels.
    pub conv0: ConvBlock<B>,

    /// 5x5 conv, 768 channels.
    pub conv1: ConvBlock<B>,

    /// Collapse to ``1x1``.
    pub global_pool: AdaptiveAvgPool2d,

    /// Logit projection; no activation.
    pub fc: Linear<B>,
}

impl<B: Backend> InceptionAux<B> {
    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.conv0.in_channels()
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc.weight.shape().dims[1]
    }

    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, height, width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, num_classes]`` logits.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "height", "width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())]
        );

        let x = self.pool.forward(input);
        let x = self.conv0.forward(x);
        let x = self.conv1.forward(x);
        let x = self.global_pool.forward(x);
        // [B, C, 1, 1] -> [B, C]
        let x = x.flatten(1, 3);
        let x = self.fc.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "num_classes"],
            &x,
            &[("batch", batch), ("num_classes", self.num_classes())]
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
    fn test_aux_head_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let num_classes = 10;
        for in_channels in [4, 16] {
            let head: InceptionAux<B> =
                InceptionAuxConfig::new(in_channels, num_classes).init(&device);
            assert_eq!(head.in_channels(), in_channels);
            assert_eq!(head.num_classes(), num_classes);

            for resolution in [[5, 5], [17, 17], [9, 6]] {
                let input = Tensor::random(
                    [2, in_channels, resolution[0], resolution[1]],
                    Distribution::Default,
                    &device,
                );
                let output = head.forward(input);
                assert_eq!(output.dims(), [2, num_classes]);
            }
        }
    }

    #[test]
    fn test_aux_head_layers() {
        type B = NdArray<f32>;
        let device = Default::default();

        let head: InceptionAux<B> = InceptionAuxConfig::new(8, 3).init(&device);
        assert_eq!(head.conv0.out_channels(), 128);
        assert_eq!(head.conv1.out_channels(), 768);
        assert_eq!(head.conv1.kernel_size(), [5, 5]);
        assert_eq!(head.pool.output_resolution([17, 17]), [6, 6]);
    }
}
