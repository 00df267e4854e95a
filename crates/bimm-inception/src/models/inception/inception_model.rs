//! # Inception-V3 Core Model
//!
//! [`InceptionV3Config`] implements [`Config`], and provides
//! [`InceptionV3Config::init`] to initialize an [`InceptionV3`];
//! and [`InceptionV3Config::stage_plan`] to plan the network's shapes
//! without allocating any weights.
//!
//! [`InceptionV3`] implements [`Module`], and provides:
//! * [`InceptionV3::forward`] - main-path logits,
//! * [`InceptionV3::forward_with_aux`] - main-path and auxiliary logits,
//! * [`InceptionV3::forward_features`] - pre-pooling features.
//!
//! The auxiliary head is tapped off the last 17x17 block; it never feeds
//! the main path, so dropping it ([`InceptionV3::without_aux`]) leaves
//! the main-path logits unchanged.

use crate::layers::blocks::conv_block::AbstractConvBlockConfig;
use crate::models::inception::aux_head::{InceptionAux, InceptionAuxConfig};
use crate::models::inception::block_a::InceptionBlockAConfig;
use crate::models::inception::block_b::InceptionBlockBConfig;
use crate::models::inception::block_c::InceptionBlockCConfig;
use crate::models::inception::block_d::InceptionBlockDConfig;
use crate::models::inception::block_e::InceptionBlockEConfig;
use crate::models::inception::blocks::{InceptionBlock, InceptionBlockConfig};
use crate::models::inception::meta::InceptionBlockMeta;
use crate::models::inception::stem::{InceptionStem, InceptionStemConfig};
use crate::utility::mode::ForwardMode;
use crate::utility::probability::expect_probability;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::{Backend, Config, Module, Tensor};

/// Number of ImageNet classes.
pub const IMAGENET_CLASSES: usize = 1000;

/// Channels of the final feature map.
pub const FEATURE_CHANNELS: usize = 2048;

/// Stage names, in order: the stem, then one per mixed block.
pub const STAGE_NAMES: [&str; 12] = [
    "stem", "mixed_5b", "mixed_5c", "mixed_5d", "mixed_6a", "mixed_6b", "mixed_6c", "mixed_6d",
    "mixed_6e", "mixed_7a", "mixed_7b", "mixed_7c",
];

/// One planned stage of an [`InceptionV3`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    /// Stage name.
    pub name: &'static str,

    /// Block kind; ``"stem"`` or the block variant letter.
    pub kind: &'static str,

    /// Number of output channels.
    pub out_channels: usize,

    /// ``[out_height, out_width]``.
    pub resolution: [usize; 2],
}

/// [`InceptionV3`] Config.
#[derive(Config, Debug)]
pub struct InceptionV3Config {
    /// Number of classification classes.
    pub num_classes: usize,

    /// Number of input (image) channels.
    #[config(default = 3)]
    pub in_channels: usize,

    /// Build the auxiliary classifier head.
    #[config(default = true)]
    pub aux_logits: bool,

    /// Dropout probability before the final linear layer.
    #[config(default = 0.2)]
    pub dropout: f64,

    /// Conv block policy, shared by every conv in the network.
    #[config(default = "AbstractConvBlockConfig::new()")]
    pub conv: AbstractConvBlockConfig,
}

impl InceptionV3Config {
    /// The ImageNet prefab: 1000 classes, with the auxiliary head.
    pub fn imagenet() -> Self {
        Self::new(IMAGENET_CLASSES)
    }

    /// The stem config.
    pub fn stem_config(&self) -> InceptionStemConfig {
        InceptionStemConfig::new()
            .with_in_channels(self.in_channels)
            .with_conv(self.conv.clone())
    }

    /// The block configs ahead of the auxiliary tap: the 35x35 and 17x17 grids.
    pub fn trunk_configs(&self) -> Vec<InceptionBlockConfig> {
        let c = self.conv.clone();
        let stem = self.stem_config().out_channels();
        vec![
            InceptionBlockAConfig::new(stem, 32).with_conv(c.clone()).into(),
            InceptionBlockAConfig::new(256, 64).with_conv(c.clone()).into(),
            InceptionBlockAConfig::new(288, 64).with_conv(c.clone()).into(),
            InceptionBlockBConfig::new(288).with_conv(c.clone()).into(),
            InceptionBlockCConfig::new(768, 128).with_conv(c.clone()).into(),
            InceptionBlockCConfig::new(768, 160).with_conv(c.clone()).into(),
            InceptionBlockCConfig::new(768, 160).with_conv(c.clone()).into(),
            InceptionBlockCConfig::new(768, 192).with_conv(c).into(),
        ]
    }

    /// The block configs after the auxiliary tap: the 8x8 grid.
    pub fn tail_configs(&self) -> Vec<InceptionBlockConfig> {
        let c = self.conv.clone();
        vec![
            InceptionBlockDConfig::new(768).with_conv(c.clone()).into(),
            InceptionBlockEConfig::new(1280).with_conv(c.clone()).into(),
            InceptionBlockEConfig::new(FEATURE_CHANNELS).with_conv(c).into(),
        ]
    }

    /// The auxiliary head config; `None` if disabled.
    pub fn aux_config(&self) -> Option<InceptionAuxConfig> {
        if !self.aux_logits {
            return None;
        }
        let tap = self
            .trunk_configs()
            .last()
            .map(|c| c.out_channels())
            .unwrap_or_default();
        Some(InceptionAuxConfig::new(tap, self.num_classes).with_conv(self.conv.clone()))
    }

    /// Plan the stages for a given input resolution.
    ///
    /// # Arguments
    ///
    /// - `input_resolution`: ``[in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// One [`StagePlan`] per stage; or `None` if the input is too small
    /// for any stage.
    pub fn stage_plan(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<Vec<StagePlan>> {
        let stem = self.stem_config();
        let mut resolution = stem.maybe_output_resolution(input_resolution)?;
        let mut plan = vec![StagePlan {
            name: STAGE_NAMES[0],
            kind: "stem",
            out_channels: stem.out_channels(),
            resolution,
        }];

        let blocks = self.trunk_configs().into_iter().chain(self.tail_configs());
        for (name, block) in STAGE_NAMES[1..].iter().zip(blocks) {
            resolution = block.maybe_output_resolution(resolution)?;
            plan.push(StagePlan {
                name: *name,
                kind: block.kind(),
                out_channels: block.out_channels(),
                resolution,
            });
        }

        Some(plan)
    }

    /// Get the feature map resolution for a given input resolution.
    ///
    /// # Returns
    ///
    /// ``Some([out_height, out_width])``; or `None` if the input is too small.
    pub fn maybe_output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> Option<[usize; 2]> {
        self.stage_plan(input_resolution)?
            .last()
            .map(|stage| stage.resolution)
    }

    /// Get the feature map resolution for a given input resolution.
    ///
    /// # Panics
    ///
    /// If the input is too small.
    pub fn output_resolution(
        &self,
        input_resolution: [usize; 2],
    ) -> [usize; 2] {
        match self.maybe_output_resolution(input_resolution) {
            Some(resolution) => resolution,
            None => panic!(
                "Input resolution {input_resolution:?} is too small; the minimum is {:?}",
                self.min_input_resolution()
            ),
        }
    }

    /// The smallest square input resolution the network accepts.
    pub fn min_input_resolution(&self) -> [usize; 2] {
        let mut size = 1;
        while self.maybe_output_resolution([size, size]).is_none() {
            size += 1;
        }
        [size, size]
    }

    /// Initialize an [`InceptionV3`] model.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> InceptionV3<B> {
        assert!(self.num_classes > 0, "num_classes must be > 0");
        let dropout = expect_probability(self.dropout);

        let init_blocks = |configs: Vec<InceptionBlockConfig>, offset: usize| {
            configs
                .iter()
                .enumerate()
                .map(|(idx, config)| {
                    tracing::debug!(
                        stage = STAGE_NAMES[offset + idx],
                        kind = config.kind(),
                        in_channels = config.in_channels(),
                        out_channels = config.out_channels(),
                        "init block"
                    );
                    config.init(device)
                })
                .collect::<Vec<_>>()
        };

        let stem = self.stem_config().init(device);
        let trunk_configs = self.trunk_configs();
        let tail_offset = 1 + trunk_configs.len();
        let trunk = init_blocks(trunk_configs, 1);
        let tail = init_blocks(self.tail_configs(), tail_offset);

        let aux = self.aux_config().map(|config| {
            tracing::debug!(
                in_channels = config.in_channels,
                num_classes = config.num_classes,
                "init aux head"
            );
            config.init(device)
        });

        tracing::debug!(
            num_classes = self.num_classes,
            dropout,
            aux = aux.is_some(),
            "init inception_v3"
        );

        InceptionV3 {
            stem,
            trunk,
            aux,
            tail,
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dropout: DropoutConfig::new(dropout).init(),
            fc: LinearConfig::new(FEATURE_CHANNELS, self.num_classes).init(device),
        }
    }
}

/// Output of [`InceptionV3::forward_with_aux`].
#[derive(Debug, Clone)]
pub struct InceptionV3Output<B: Backend> {
    /// Main-path logits; ``[batch, num_classes]``.
    pub logits: Tensor<B, 2>,

    /// Auxiliary logits; ``[batch, num_classes]``, when the head is present.
    pub aux_logits: Option<Tensor<B, 2>>,
}

/// Inception-V3 model.
#[derive(Module, Debug)]
pub struct InceptionV3<B: Backend> {
    /// Input stem.
    pub stem: InceptionStem<B>,

    /// Blocks ahead of the auxiliary tap.
    pub trunk: Vec<InceptionBlock<B>>,

    /// Optional auxiliary classifier.
    pub aux: Option<InceptionAux<B>>,

    /// Blocks after the auxiliary tap.
    pub tail: Vec<InceptionBlock<B>>,

    /// Collapse to ``1x1``.
    pub global_pool: AdaptiveAvgPool2d,

    /// Pre-classifier dropout.
    pub dropout: Dropout,

    /// Logit projection.
    pub fc: Linear<B>,
}

impl<B: Backend> InceptionV3<B> {
    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.stem.in_channels()
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc.weight.shape().dims[1]
    }

    /// Does the model carry an auxiliary head?
    pub fn has_aux(&self) -> bool {
        self.aux.is_some()
    }

    /// Drop the auxiliary head.
    pub fn without_aux(self) -> Self {
        Self { aux: None, ..self }
    }

    /// Stem and trunk; the features at the auxiliary tap.
    fn forward_trunk(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let x = self.stem.forward(input);
        self.trunk.iter().fold(x, |x, block| block.forward(x))
    }

    fn forward_tail(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        self.tail.iter().fold(input, |x, block| block.forward(x))
    }

    fn forward_head(
        &self,
        features: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let x = self.global_pool.forward(features);
        // [B, C, 1, 1] -> [B, C]
        let x = x.flatten(1, 3);
        let x = self.dropout.forward(x);
        self.fc.forward(x)
    }

    /// Forward Pass, to the final feature map.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, 2048, out_height, out_width]``
    pub fn forward_features(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())]
        );

        let x = self.forward_trunk(input);
        let x = self.forward_tail(x);

        assert_shape_contract_periodically!(
            ["batch", "channels", "out_height", "out_width"],
            &x,
            &[("batch", batch), ("channels", FEATURE_CHANNELS)]
        );

        x
    }

    /// Forward Pass, main path only.
    ///
    /// The auxiliary head is never evaluated.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, num_classes]`` logits.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        let features = self.forward_features(input);
        self.forward_head(features)
    }

    /// Forward Pass, with the auxiliary head.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// An [`InceptionV3Output`]; `aux_logits` is `None` when the model has no
    /// auxiliary head.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn forward_with_aux(
        &self,
        input: Tensor<B, 4>,
    ) -> InceptionV3Output<B> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())]
        );
        tracing::trace!(mode = ?ForwardMode::of::<B>(), batch, "forward_with_aux");

        let x = self.forward_trunk(input);
        let aux_logits = self.aux.as_ref().map(|aux| aux.forward(x.clone()));
        let x = self.forward_tail(x);
        let logits = self.forward_head(x);

        assert_shape_contract_periodically!(
            ["batch", "num_classes"],
            &logits,
            &[("batch", batch), ("num_classes", self.num_classes())]
        );

        InceptionV3Output { logits, aux_logits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;
    use burn::tensor::Distribution;

    #[test]
    fn test_imagenet_config() {
        let config = InceptionV3Config::imagenet();
        assert_eq!(config.num_classes, 1000);
        assert_eq!(config.in_channels, 3);
        assert!(config.aux_logits);
        assert_eq!(config.dropout, 0.2);

        let aux = config.aux_config().unwrap();
        assert_eq!(aux.in_channels, 768);
        assert_eq!(aux.num_classes, 1000);

        assert!(config.with_aux_logits(false).aux_config().is_none());
    }

    #[test]
    fn test_stage_plan_299() {
        let config = InceptionV3Config::imagenet();
        let plan = config.stage_plan([299, 299]).unwrap();

        let summary: Vec<(&str, usize, usize)> = plan
            .iter()
            .map(|s| (s.name, s.out_channels, s.resolution[0]))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("stem", 192, 38),
                ("mixed_5b", 256, 38),
                ("mixed_5c", 288, 38),
                ("mixed_5d", 288, 38),
                ("mixed_6a", 768, 18),
                ("mixed_6b", 768, 18),
                ("mixed_6c", 768, 18),
                ("mixed_6d", 768, 18),
                ("mixed_6e", 768, 18),
                ("mixed_7a", 1280, 8),
                ("mixed_7b", 2048, 8),
                ("mixed_7c", 2048, 8),
            ]
        );

        let kinds: String = plan[1..].iter().map(|s| s.kind).collect();
        assert_eq!(kinds, "AAABCCCCDEE");

        assert_eq!(config.output_resolution([299, 299]), [8, 8]);
    }

    #[test]
    fn test_block_channels_chain() {
        let config = InceptionV3Config::imagenet();
        let blocks: Vec<_> = config
            .trunk_configs()
            .into_iter()
            .chain(config.tail_configs())
            .collect();

        let mut channels = config.stem_config().out_channels();
        for block in &blocks {
            assert_eq!(block.in_channels(), channels);
            channels = block.out_channels();
        }
        assert_eq!(channels, FEATURE_CHANNELS);
    }

    #[test]
    fn test_min_input_resolution() {
        let config = InceptionV3Config::new(10);
        assert_eq!(config.min_input_resolution(), [49, 49]);
        assert_eq!(config.maybe_output_resolution([48, 48]), None);
        assert_eq!(config.maybe_output_resolution([49, 49]), Some([1, 1]));
        assert_eq!(config.maybe_output_resolution([75, 75]), Some([1, 1]));
        assert!(config.stage_plan([48, 299]).is_none());
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn test_output_resolution_too_small() {
        InceptionV3Config::new(10).output_resolution([32, 32]);
    }

    #[test]
    #[should_panic(expected = "Probability must be in [0, 1]")]
    fn test_bad_dropout() {
        type B = NdArray<f32>;
        let device = Default::default();
        let _model: InceptionV3<B> = InceptionV3Config::new(10).with_dropout(1.5).init(&device);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = InceptionV3Config::new(17)
            .with_aux_logits(false)
            .with_dropout(0.5)
            .with_conv(AbstractConvBlockConfig::new().with_bias(false));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inception_v3.json");
        config.save(&path).unwrap();

        let loaded = InceptionV3Config::load(&path).unwrap();
        assert_eq!(loaded.num_classes, 17);
        assert_eq!(loaded.in_channels, 3);
        assert!(!loaded.aux_logits);
        assert_eq!(loaded.dropout, 0.5);
        assert!(!loaded.conv.bias);
        assert_eq!(loaded.conv.norm.epsilon, config.conv.norm.epsilon);
        assert_eq!(loaded.conv.norm.momentum, config.conv.norm.momentum);
    }

    #[test]
    fn test_forward_inference() {
        type B = NdArray<f32>;
        let device = Default::default();

        let num_classes = 5;
        let model: InceptionV3<B> = InceptionV3Config::new(num_classes).init(&device);
        assert_eq!(model.in_channels(), 3);
        assert_eq!(model.num_classes(), num_classes);
        assert!(model.has_aux());
        assert_eq!(model.trunk.len(), 8);
        assert_eq!(model.tail.len(), 3);

        let input = Tensor::random([2, 3, 49, 49], Distribution::Default, &device);

        let features = model.forward_features(input.clone());
        assert_eq!(features.dims(), [2, FEATURE_CHANNELS, 1, 1]);

        let logits = model.forward(input.clone());
        assert_eq!(logits.dims(), [2, num_classes]);

        let output = model.forward_with_aux(input.clone());
        output.logits.to_data().assert_eq(&logits.to_data(), true);
        assert_eq!(output.aux_logits.unwrap().dims(), [2, num_classes]);

        // Dropping the head leaves the main path untouched.
        let model = model.without_aux();
        assert!(!model.has_aux());
        model
            .forward(input.clone())
            .to_data()
            .assert_eq(&logits.to_data(), true);
        assert!(model.forward_with_aux(input).aux_logits.is_none());
    }

    #[test]
    fn test_forward_training() {
        type B = Autodiff<NdArray<f32>>;
        let device = Default::default();

        let model: InceptionV3<B> = InceptionV3Config::new(3).with_dropout(0.0).init(&device);

        let input = Tensor::random([2, 3, 49, 57], Distribution::Default, &device);
        let output = model.forward_with_aux(input);
        assert_eq!(output.logits.dims(), [2, 3]);
        assert_eq!(output.aux_logits.unwrap().dims(), [2, 3]);

        let valid = model.valid();
        assert!(valid.has_aux());
        assert_eq!(valid.num_classes(), 3);
    }
}
