//! # Inception Block Wrapper
//!
//! [`InceptionBlock`] wraps the five mixed block variants, so that a
//! network trunk can be held as a single ``Vec``:
//! * [`Mixed`] - [`InceptionBlockA`]
//! * [`GridReduction`] - [`InceptionBlockB`]
//! * [`Factorized`] - [`InceptionBlockC`]
//! * [`FactorizedReduction`] - [`InceptionBlockD`]
//! * [`Expanded`] - [`InceptionBlockE`]
//!
//! [`Mixed`]: InceptionBlock::Mixed
//! [`GridReduction`]: InceptionBlock::GridReduction
//! [`Factorized`]: InceptionBlock::Factorized
//! [`FactorizedReduction`]: InceptionBlock::FactorizedReduction
//! [`Expanded`]: InceptionBlock::Expanded

use crate::models::inception::block_a::{InceptionBlockA, InceptionBlockAConfig};
use crate::models::inception::block_b::{InceptionBlockB, InceptionBlockBConfig};
use crate::models::inception::block_c::{InceptionBlockC, InceptionBlockCConfig};
use crate::models::inception::block_d::{InceptionBlockD, InceptionBlockDConfig};
use crate::models::inception::block_e::{InceptionBlockE, InceptionBlockEConfig};
use crate::models::inception::meta::InceptionBlockMeta;
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`InceptionBlock`] Config.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Config, Debug)]
pub enum InceptionBlockConfig {
    /// [`InceptionBlockA`] Config.
    Mixed(InceptionBlockAConfig),

    /// [`InceptionBlockB`] Config.
    GridReduction(InceptionBlockBConfig),

    /// [`InceptionBlockC`] Config.
    Factorized(InceptionBlockCConfig),

    /// [`InceptionBlockD`] Config.
    FactorizedReduction(InceptionBlockDConfig),

    /// [`InceptionBlockE`] Config.
    Expanded(InceptionBlockEConfig),
}

impl From<InceptionBlockAConfig> for InceptionBlockConfig {
    fn from(config: InceptionBlockAConfig) -> Self {
        Self::Mixed(config)
    }
}

impl From<InceptionBlockBConfig> for InceptionBlockConfig {
    fn from(config: InceptionBlockBConfig) -> Self {
        Self::GridReduction(config)
    }
}

impl From<InceptionBlockCConfig> for InceptionBlockConfig {
    fn from(config: InceptionBlockCConfig) -> Self {
        Self::Factorized(config)
    }
}

impl From<InceptionBlockDConfig> for InceptionBlockConfig {
    fn from(config: InceptionBlockDConfig) -> Self {
        Self::FactorizedReduction(config)
    }
}

impl From<InceptionBlockEConfig> for InceptionBlockConfig {
    fn from(config: InceptionBlockEConfig) -> Self {
        Self::Expanded(config)
    }
}

impl InceptionBlockMeta for InceptionBlockConfig {
    fn in_channels(&self) -> usize {
        match self {
            Self::Mixed(config) => config.in_channels(),
            Self::GridReduction(config) => config.in_channels(),
            Self::Factorized(config) => config.in_channels(),
            Self::FactorizedReduction(config) => config.in_channels(),
            Self::Expanded(config) => config.in_channels(),
        }
    }

    fn out_channels(&self) -> usize {
        match self {
            Self::Mixed(config) => config.out_channels(),
            Self::GridReduction(config) => config.out_channels(),
            Self::Factorized(config) => config.out_channels(),
            Self::FactorizedReduction(config) => config.out_channels(),
            Self::Expanded(config) => config.out_channels(),
        }
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        match self {
            Self::Mixed(config) => config.maybe_output_resolution(input_resolution),
            Self::GridReduction(config) => config.maybe_output_resolution(input_resolution),
            Self::Factorized(config) => config.maybe_output_resolution(input_resolution),
            Self::FactorizedReduction(config) => config.maybe_output_resolution(input_resolution),
            Self::Expanded(config) => config.maybe_output_resolution(input_resolution),
        }
    }
}

impl InceptionBlockConfig {
    /// Short name of the block variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mixed(_) => "A",
            Self::GridReduction(_) => "B",
            Self::Factorized(_) => "C",
            Self::FactorizedReduction(_) => "D",
            Self::Expanded(_) => "E",
        }
    }

    /// Initialize an [`InceptionBlock`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionBlock<B> {
        match self {
            Self::Mixed(config) => config.init(device).into(),
            Self::GridReduction(config) => config.init(device).into(),
            Self::Factorized(config) => config.init(device).into(),
            Self::FactorizedReduction(config) => config.init(device).into(),
            Self::Expanded(config) => config.init(device).into(),
        }
    }
}

/// Inception Block Wrapper.
///
/// Implements [`InceptionBlockMeta`].
#[derive(Module, Debug)]
pub enum InceptionBlock<B: Backend> {
    /// [`InceptionBlockA`] block.
    Mixed(InceptionBlockA<B>),

    /// [`InceptionBlockB`] block.
    GridReduction(InceptionBlockB<B>),

    /// [`InceptionBlockC`] block.
    Factorized(InceptionBlockC<B>),

    /// [`InceptionBlockD`] block.
    FactorizedReduction(InceptionBlockD<B>),

    /// [`InceptionBlockE`] block.
    Expanded(InceptionBlockE<B>),
}

impl<B: Backend> From<InceptionBlockA<B>> for InceptionBlock<B> {
    fn from(block: InceptionBlockA<B>) -> Self {
        Self::Mixed(block)
    }
}

impl<B: Backend> From<InceptionBlockB<B>> for InceptionBlock<B> {
    fn from(block: InceptionBlockB<B>) -> Self {
        Self::GridReduction(block)
    }
}

impl<B: Backend> From<InceptionBlockC<B>> for InceptionBlock<B> {
    fn from(block: InceptionBlockC<B>) -> Self {
        Self::Factorized(block)
    }
}

impl<B: Backend> From<InceptionBlockD<B>> for InceptionBlock<B> {
    fn from(block: InceptionBlockD<B>) -> Self {
        Self::FactorizedReduction(block)
    }
}

impl<B: Backend> From<InceptionBlockE<B>> for InceptionBlock<B> {
    fn from(block: InceptionBlockE<B>) -> Self {
        Self::Expanded(block)
    }
}

impl<B: Backend> InceptionBlockMeta for InceptionBlock<B> {
    fn in_channels(&self) -> usize {
        match self {
            Self::Mixed(block) => block.in_channels(),
            Self::GridReduction(block) => block.in_channels(),
            Self::Factorized(block) => block.in_channels(),
            Self::FactorizedReduction(block) => block.in_channels(),
            Self::Expanded(block) => block.in_channels(),
        }
    }

    fn out_channels(&self) -> usize {
        match self {
            Self::Mixed(block) => block.out_channels(),
            Self::GridReduction(block) => block.out_channels(),
            Self::Factorized(block) => block.out_channels(),
            Self::FactorizedReduction(block) => block.out_channels(),
            Self::Expanded(block) => block.out_channels(),
        }
    }

    fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        match self {
            Self::Mixed(block) => block.maybe_output_resolution(input_resolution),
            Self::GridReduction(block) => block.maybe_output_resolution(input_resolution),
            Self::Factorized(block) => block.maybe_output_resolution(input_resolution),
            Self::FactorizedReduction(block) => block.maybe_output_resolution(input_resolution),
            Self::Expanded(block) => block.maybe_output_resolution(input_resolution),
        }
    }
}

impl<B: Backend> InceptionBlock<B> {
    /// Forward Pass.
    ///
    /// The contract depends upon the wrapped block;
    /// see [`InceptionBlockMeta`] for the shape API.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        match self {
            Self::Mixed(block) => block.forward(input),
            Self::GridReduction(block) => block.forward(input),
            Self::Factorized(block) => block.forward(input),
            Self::FactorizedReduction(block) => block.forward(input),
            Self::Expanded(block) => block.forward(input),
        }
    }
}
