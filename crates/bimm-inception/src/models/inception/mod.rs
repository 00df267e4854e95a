//! # Inception-V3
//!
//! The Inception-V3 image classifier, built from a conv/norm/relu
//! [`ConvBlock`](crate::layers::blocks::conv_block::ConvBlock) and five
//! mixed block variants.
//!
//! * [`inception_model`] - the assembled network, and its config.
//! * [`stem`] - the un-branched input stem.
//! * [`block_a`] .. [`block_e`] - the mixed block variants.
//! * [`blocks`] - a wrapper enum over the mixed block variants.
//! * [`aux_head`] - the auxiliary classifier.
//! * [`meta`] - the shared block shape API.

pub mod aux_head;
pub mod block_a;
pub mod block_b;
pub mod block_c;
pub mod block_d;
pub mod block_e;
pub mod blocks;
pub mod inception_model;
pub mod meta;
pub mod stem;
