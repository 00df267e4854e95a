//! # Padding Modes
//!
//! TensorFlow-style "same" / "valid" padding for convolution and pooling.
//!
//! Burn's [`burn::nn::PaddingConfig2d::Same`] only matches the input size
//! for `stride=1`; the layers in this crate instead compute the padding
//! dynamically from the input size, and pad asymmetrically when the total
//! padding is odd (the extra row/column goes at the bottom/right).

use burn::prelude::{Backend, Tensor};
use serde::{Deserialize, Serialize};

/// Padding policy for a convolution or pooling window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingMode {
    /// Pad so that ``out_size = ceil(in_size / stride)``.
    #[default]
    Same,

    /// No padding; ``out_size = floor((in_size - kernel) / stride) + 1``.
    Valid,
}

/// Calculate the total TensorFlow-like 'SAME' padding along one dimension.
///
/// ```text
/// pad = max((ceil(size / stride) - 1) * stride + (kernel_size - 1) * dilation + 1 - size, 0)
/// ```
pub fn same_padding(
    size: usize,
    kernel_size: usize,
    stride: usize,
    dilation: usize,
) -> usize {
    assert!(stride > 0, "stride must be > 0");
    let out = size.div_ceil(stride).max(1);
    ((out - 1) * stride + (kernel_size - 1) * dilation + 1).saturating_sub(size)
}

/// Split a total padding into ``(before, after)``.
///
/// The odd pixel goes after.
#[inline(always)]
pub fn split_padding(total: usize) -> (usize, usize) {
    (total / 2, total - total / 2)
}

/// Dynamically pad an ``[batch, channels, height, width]`` tensor with 'SAME' padding.
///
/// # Arguments
///
/// - `input`: the input tensor.
/// - `kernel_size`: ``[kernel_height, kernel_width]``.
/// - `stride`: ``[stride_height, stride_width]``.
/// - `dilation`: ``[dilation_height, dilation_width]``.
/// - `value`: the fill value.
///
/// # Returns
///
/// The padded tensor; or the input, unchanged, if no padding is needed.
pub fn pad_same<B: Backend>(
    input: Tensor<B, 4>,
    kernel_size: [usize; 2],
    stride: [usize; 2],
    dilation: [usize; 2],
    value: f32,
) -> Tensor<B, 4> {
    let [_, _, ih, iw] = input.dims();
    let pad_h = same_padding(ih, kernel_size[0], stride[0], dilation[0]);
    let pad_w = same_padding(iw, kernel_size[1], stride[1], dilation[1]);
    if pad_h == 0 && pad_w == 0 {
        return input;
    }
    let (top, bottom) = split_padding(pad_h);
    let (left, right) = split_padding(pad_w);
    input.pad((left, right, top, bottom), value)
}

/// Predict the output size of a window operation along one dimension.
///
/// # Arguments
///
/// - `size`: the input size.
/// - `kernel_size`: the window size, must be > 0.
/// - `stride`: the window stride, must be > 0.
/// - `mode`: the padding mode.
///
/// # Returns
///
/// The output size; or `None` if the window does not fit.
pub fn maybe_output_size(
    size: usize,
    kernel_size: usize,
    stride: usize,
    mode: PaddingMode,
) -> Option<usize> {
    assert!(kernel_size > 0);
    assert!(stride > 0);

    if size == 0 {
        return None;
    }
    match mode {
        PaddingMode::Same => Some(size.div_ceil(stride)),
        PaddingMode::Valid => {
            if size < kernel_size {
                None
            } else {
                Some((size - kernel_size) / stride + 1)
            }
        }
    }
}

/// Predict the output size of a window operation along one dimension.
///
/// This is the ``panic``-ing variant of [`maybe_output_size`].
///
/// # Panics
///
/// If the window does not fit.
pub fn expect_output_size(
    size: usize,
    kernel_size: usize,
    stride: usize,
    mode: PaddingMode,
) -> usize {
    match maybe_output_size(size, kernel_size, stride, mode) {
        Some(x) => x,
        None => panic!(
            "No legal output size for window with:\n size:{size}\n kernel_size:{kernel_size}\n stride:{stride}\n mode:{mode:?}",
        ),
    }
}

/// Predict the ``[height, width]`` output resolution of a 2d window operation.
///
/// The generalization of [`maybe_output_size`] to two dimensions.
pub fn maybe_output_resolution(
    input_resolution: [usize; 2],
    kernel_size: [usize; 2],
    stride: [usize; 2],
    mode: PaddingMode,
) -> Option<[usize; 2]> {
    Some([
        maybe_output_size(input_resolution[0], kernel_size[0], stride[0], mode)?,
        maybe_output_size(input_resolution[1], kernel_size[1], stride[1], mode)?,
    ])
}

/// Predict the ``[height, width]`` output resolution of a 2d window operation.
///
/// This is the ``panic``-ing variant of [`maybe_output_resolution`].
///
/// # Panics
///
/// If the window does not fit.
pub fn expect_output_resolution(
    input_resolution: [usize; 2],
    kernel_size: [usize; 2],
    stride: [usize; 2],
    mode: PaddingMode,
) -> [usize; 2] {
    match maybe_output_resolution(input_resolution, kernel_size, stride, mode) {
        Some(shape) => shape,
        None => panic!(
            "No legal output resolution for window with:\n input_resolution:{input_resolution:?}\n kernel_size:{kernel_size:?}\n stride:{stride:?}\n mode:{mode:?}",
        ),
    }
}
