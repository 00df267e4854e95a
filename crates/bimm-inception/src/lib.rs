#![warn(missing_docs)]
//!# bimm-inception - Burn Inception-V3
//!
//! ## Notable Components
//!
//! * [`layers`] - reusable neural network modules.
//!   * [`layers::blocks::conv_block`] - ``Conv2d + BatchNorm2d + Relu`` block.
//!   * [`layers::padding`] - 'SAME' / 'VALID' padding arithmetic.
//!   * [`layers::pool`] - 'SAME' padded max and average pooling.
//! * [`models`] - complete model families.
//!   * [`models::inception`] - The Inception-V3 Model.
//! * [`utility`] - layout, mode, probability and record helpers.
//!
//! ## Training and Inference
//!
//! The forward mode is carried by the backend; see [`utility::mode`].
//! A model on an ``Autodiff<B>`` backend trains, and its
//! ``valid()`` copy runs inference.

/// Test-only macro import.
#[cfg(test)]
#[allow(unused_imports)]
#[macro_use]
extern crate hamcrest;

pub mod layers;
pub mod models;
pub mod utility;
