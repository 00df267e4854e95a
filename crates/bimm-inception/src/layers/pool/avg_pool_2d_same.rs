//! # `AvgPool2dSame`
//!
//! An [`AvgPool2d`] wrapper with TensorFlow-style [`PaddingMode`].
//!
//! Under 'SAME' padding, padded cells are excluded from the mean:
//!
//! ```text
//! out = pool(pad(x, 0)) / pool(pad(ones_like(x), 0))
//! ```

use crate::layers::padding::{PaddingMode, expect_output_resolution, pad_same};
use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::PaddingConfig2d;
use burn::nn::pool::{AvgPool2d, AvgPool2dConfig};
use burn::prelude::{Backend, Tensor};

/// [`AvgPool2dSame`] Config.
#[derive(Config, Debug)]
pub struct AvgPool2dSameConfig {
    /// The size of the window.
    pub kernel_size: [usize; 2],

    /// The strides of the window.
    #[config(default = "[1, 1]")]
    pub strides: [usize; 2],

    /// The padding mode.
    #[config(default = "PaddingMode::Same")]
    pub padding: PaddingMode,
}

impl AvgPool2dSameConfig {
    /// Initialize an [`AvgPool2dSame`].
    pub fn init(&self) -> AvgPool2dSame {
        AvgPool2dSame {
            pool: AvgPool2dConfig::new(self.kernel_size)
                .with_strides(self.strides)
                .with_padding(PaddingConfig2d::Valid)
                .with_count_include_pad(true)
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

/// Average pooling with TensorFlow-style 'SAME' / 'VALID' padding.
#[derive(Module, Clone, Debug)]
pub struct AvgPool2dSame {
    /// Inner unpadded pool.
    pub pool: AvgPool2d,

    /// The padding mode.
    pub padding: Ignored<PaddingMode>,
}

impl AvgPool2dSame {
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
        match self.padding.0 {
            PaddingMode::Valid => self.pool.forward(input),
            PaddingMode::Same => {
                let kernel_size = self.pool.kernel_size;
                let stride = self.pool.stride;

                let counts = pad_same(input.ones_like(), kernel_size, stride, [1, 1], 0.0);
                let x = pad_same(input, kernel_size, stride, [1, 1], 0.0);

                self.pool.forward(x) / self.pool.forward(counts)
            }
        }
    }
}
