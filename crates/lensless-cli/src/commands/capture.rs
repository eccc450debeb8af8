use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use lensless_core::pipeline::capture_reported;

use super::{connect, load_config};
use crate::progress::SpinnerReporter;
use crate::summary::{print_diagnostics, print_output};

#[derive(Args)]
pub struct CaptureArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Remote username
    #[arg(long)]
    pub username: Option<String>,

    /// Remote hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// Exposure in seconds
    #[arg(long)]
    pub exp: Option<f64>,

    /// ISO
    #[arg(long)]
    pub iso: Option<u32>,

    /// Ask the camera for RGB instead of raw Bayer data
    #[arg(long, conflicts_with = "gray")]
    pub rgb: bool,

    /// Ask the camera for grayscale instead of raw Bayer data
    #[arg(long)]
    pub gray: bool,

    /// Output directory for raw.png and histogram.png
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &CaptureArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.username.is_some() {
        config.rpi.username = args.username.clone();
    }
    if args.hostname.is_some() {
        config.rpi.hostname = args.hostname.clone();
    }
    if let Some(exp) = args.exp {
        config.capture.exp = exp;
    }
    if let Some(iso) = args.iso {
        config.capture.iso = iso;
    }
    config.capture.rgb |= args.rgb;
    config.capture.gray |= args.gray;
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    config.save = true;
    config.validate().context("Invalid capture config")?;

    let shell = connect(&config)?;
    let reporter = Arc::new(SpinnerReporter::new()?);
    let result = capture_reported(&config, shell, reporter.clone());
    reporter.finish();
    let output = result.context("Capture failed")?;

    if let Some(diagnostics) = &output.diagnostics {
        print_diagnostics(diagnostics);
    }
    print_output(&output);
    Ok(())
}
