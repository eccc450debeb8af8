use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use lensless_core::pipeline::reconstruct_reported;

use super::{load_config, ReconOverrides};
use crate::progress::SpinnerReporter;
use crate::summary::{print_output, print_run_summary};

#[derive(Args)]
pub struct ReconstructArgs {
    /// Raw frame to reconstruct
    pub raw: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// The frame is already RGB
    #[arg(long, conflicts_with = "gray")]
    pub rgb: bool,

    /// The frame is grayscale
    #[arg(long)]
    pub gray: bool,

    /// Red gain for raw Bayer frames
    #[arg(long)]
    pub red_gain: Option<f64>,

    /// Blue gain for raw Bayer frames
    #[arg(long)]
    pub blue_gain: Option<f64>,

    /// Save intermediate reconstructions
    #[arg(long)]
    pub plot: bool,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub recon: ReconOverrides,
}

pub fn run(args: &ReconstructArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    config.capture.rgb |= args.rgb;
    config.capture.gray |= args.gray;
    if args.red_gain.is_some() {
        config.camera.red_gain = args.red_gain;
    }
    if args.blue_gain.is_some() {
        config.camera.blue_gain = args.blue_gain;
    }
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    config.plot |= args.plot;
    config.save = true;
    args.recon.apply(&mut config)?;
    config.validate().context("Invalid pipeline config")?;

    print_run_summary(&config, None);

    let reporter = Arc::new(SpinnerReporter::new()?);
    let result = reconstruct_reported(&config, &args.raw, reporter.clone());
    reporter.finish();
    let output =
        result.with_context(|| format!("Failed to reconstruct {}", args.raw.display()))?;

    print_output(&output);
    Ok(())
}
