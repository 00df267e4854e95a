//! # `MaxPool2dSame`
//!
//! A [`MaxPool2d`] wrapper with TensorFlow-style [`PaddingMode`].
//!
//! 'SAME' padding fills with `-inf`, so padded cells never win a window.

use crate::layers::padding::{PaddingMode, expect_output_resolution, pad_same};
use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::PaddingConfig2d;
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::prelude::{Backend, Tensor};

/// [`MaxPool2dSame`] Config.
#[derive(Config, Debug)]
pub struct MaxPool2dSameConfig {
    /// The size of the window.
    pub kernel_size: [usize; 2],

    /// The strides of the window.
    #[config(default = "[1, 1]")]
    pub strides: [usize; 2],

    /// The padding mode.
    #[config(default = "PaddingMode::Same")]
    pub padding: PaddingMode,
}

impl MaxPool2dSameConfig {
    /// Initialize a [`MaxPool2dSame`].
    pub fn init(&self) -> MaxPool2dSame {
        MaxPool2dSame {
            pool: MaxPool2dConfig::new(self.kernel_size)
                .with_strides(self.strides)
                .with_padding(PaddingConfig2d::Valid)
                .init(),
            padding: Ignored(self.padding),
        }
    }

    /// Predict the ``[height, width]`` output resolution.
    pub fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        expect_output_resolution(input_resolution, self.kernel_size, self.strides, self.padding)
    }
}

/// Max pooling with TensorFlow-style 'SAME' / 'VALID' padding.
#[derive(Module, Clone, Debug)]
pub struct MaxPool2dSame {
    /// Inner unpadded pool.
    pub pool: MaxPool2d,

    /// The padding mode.
    pub padding: Ignored<PaddingMode>,
}

impl MaxPool2dSame {
    /// Predict the ``[height, width]`` output resolution.
    pub fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        expect_output_resolution(
            input_resolution,
            self.pool.kernel_size,
            self.pool.stride,
            self.padding.0,
        )
    }

    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, channels, out_height, out_width]``
    pub fn forward<B: Backend>(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let x = match self.padding.0 {
            PaddingMode::Valid => input,
            PaddingMode::Same => pad_same(
                input,
                self.pool.kernel_size,
                self.pool.stride,
                [1, 1],
                f32::NEG_INFINITY,
            ),
        };
        self.pool.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    #[test]
    fn test_same_max_pool_shapes() {
        type B = NdArray<f32>;
        let device = Default::default();

        let pool = MaxPool2dSameConfig::new([3, 3])
            .with_strides([2, 2])
            .init();
        assert_eq!(pool.output_resolution([75, 74]), [38, 37]);

        let input: Tensor<B, 4> = Tensor::random([2, 3, 75, 74], Distribution::Default, &device);
        let output = pool.forward(input);
        assert_eq!(output.dims(), [2, 3, 38, 37]);
    }

    #[test]
    fn test_same_max_pool_ignores_padding() {
        type B = NdArray<f32>;
        let device = Default::default();

        let pool = MaxPool2dSameConfig::new([3, 3]).init();

        let input: Tensor<B, 4> = Tensor::ones([1, 2, 5, 5], &device).neg();
        let output = pool.forward(input.clone());

        // Zero padding would leak `0.0` into the border windows.
        output.to_data().assert_eq(&input.to_data(), true);
    }

    #[test]
    fn test_valid_max_pool_matches_burn() {
        type B = NdArray<f32>;
        let device = Default::default();

        let config = MaxPool2dSameConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingMode::Valid);
        let pool = config.init();
        assert_eq!(config.output_resolution([17, 17]), [8, 8]);

        let reference = MaxPool2dConfig::new([3, 3]).with_strides([2, 2]).init();

        let input: Tensor<B, 4> = Tensor::random([1, 4, 17, 17], Distribution::Default, &device);
        let output = pool.forward(input.clone());
        assert_eq!(output.dims(), [1, 4, 8, 8]);
        output
            .to_data()
            .assert_eq(&reference.forward(input).to_data(), true);
    }
}
