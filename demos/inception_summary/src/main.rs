#![recursion_limit = "256"]

use anyhow::anyhow;
use bimm_inception::models::inception::inception_model::{InceptionV3, InceptionV3Config};
use bimm_inception::models::inception::meta::InceptionBlockMeta;
use bimm_inception::utility::burn::record::summarize_record;
use bimm_inception::utility::layout::channels_last_to_first;
use burn::backend::NdArray;
use burn::module::Module;
use burn::prelude::{Config, Tensor};
use burn::tensor::Distribution;
use clap::{Parser, arg};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON model config; defaults to the ImageNet prefab.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of classes.
    #[arg(long)]
    num_classes: Option<usize>,

    /// Drop the auxiliary head.
    #[arg(long, default_value_t = false)]
    no_aux: bool,

    /// Square input resolution.
    #[arg(long, default_value = "299")]
    resolution: usize,

    /// Batch size of the random forward pass.
    #[arg(long, default_value = "1")]
    batch_size: usize,

    /// Run one random forward pass.
    #[arg(long, default_value_t = false)]
    forward: bool,

    /// Feed the forward pass a ``[batch, height, width, channels]`` batch.
    #[arg(long, default_value_t = false)]
    channels_last: bool,

    /// Write the resolved config to this path.
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Print the parameter shapes of the model record.
    #[arg(long, default_value_t = false)]
    dump_record: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    type B = NdArray<f32>;
    let device = Default::default();

    let mut config = match &args.config {
        Some(path) => InceptionV3Config::load(path)
            .map_err(|e| anyhow!("Failed to load config {}: {e:?}", path.display()))?,
        None => InceptionV3Config::imagenet(),
    };
    if let Some(num_classes) = args.num_classes {
        config.num_classes = num_classes;
    }
    if args.no_aux {
        config.aux_logits = false;
    }

    if let Some(path) = &args.save_config {
        config.save(path)?;
        tracing::info!(path = %path.display(), "saved config");
    }

    let resolution = [args.resolution, args.resolution];
    let plan = config.stage_plan(resolution).ok_or_else(|| {
        anyhow!(
            "Input resolution {resolution:?} is too small; the minimum is {:?}",
            config.min_input_resolution()
        )
    })?;

    let model: InceptionV3<B> = config.init(&device);

    println!(
        "{:<10} {:<5} {:>8} {:>12} {:>12}",
        "stage", "kind", "channels", "resolution", "params"
    );
    let params: Vec<usize> = std::iter::once(model.stem.num_params())
        .chain(model.trunk.iter().map(|b| b.num_params()))
        .chain(model.tail.iter().map(|b| b.num_params()))
        .collect();
    for (stage, params) in plan.iter().zip(params) {
        println!(
            "{:<10} {:<5} {:>8} {:>12} {:>12}",
            stage.name,
            stage.kind,
            stage.out_channels,
            format!("{}x{}", stage.resolution[0], stage.resolution[1]),
            params
        );
    }
    if let Some(aux) = &model.aux {
        println!(
            "{:<10} {:<5} {:>8} {:>12} {:>12}",
            "aux",
            "-",
            aux.num_classes(),
            "-",
            aux.num_params()
        );
    }
    println!(
        "{:<10} {:<5} {:>8} {:>12} {:>12}",
        "fc",
        "-",
        model.num_classes(),
        "-",
        model.fc.num_params()
    );
    println!("total params: {}", model.num_params());
    println!("min input resolution: {:?}", config.min_input_resolution());

    if args.dump_record {
        let summary = summarize_record::<B, _>(model.clone().into_record())?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if args.forward {
        let in_channels = model.stem.in_channels();
        let input = if args.channels_last {
            channels_last_to_first(Tensor::random(
                [args.batch_size, args.resolution, args.resolution, in_channels],
                Distribution::Default,
                &device,
            ))
        } else {
            Tensor::random(
                [args.batch_size, in_channels, args.resolution, args.resolution],
                Distribution::Default,
                &device,
            )
        };

        let start = Instant::now();
        let output = model.forward_with_aux(input);
        tracing::info!(elapsed = ?start.elapsed(), "forward");

        println!("logits: {:?}", output.logits.dims());
        if let Some(aux_logits) = output.aux_logits {
            println!("aux_logits: {:?}", aux_logits.dims());
        }
    }

    Ok(())
}
