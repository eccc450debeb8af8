use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use lensless_core::pipeline::run_pipeline_reported;

use super::{connect, load_config, ReconOverrides};
use crate::progress::SpinnerReporter;
use crate::summary::{print_diagnostics, print_output, print_run_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Remote username
    #[arg(long)]
    pub username: Option<String>,

    /// Remote hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// Image to show on the remote display before capturing
    #[arg(long)]
    pub fp: Option<PathBuf>,

    /// Exposure in seconds
    #[arg(long)]
    pub exp: Option<f64>,

    /// Persist plots and the reconstruction
    #[arg(long)]
    pub save: bool,

    /// Save intermediate reconstructions
    #[arg(long)]
    pub plot: bool,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub recon: ReconOverrides,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.username.is_some() {
        config.rpi.username = args.username.clone();
    }
    if args.hostname.is_some() {
        config.rpi.hostname = args.hostname.clone();
    }
    if args.fp.is_some() {
        config.fp = args.fp.clone();
    }
    if let Some(exp) = args.exp {
        config.capture.exp = exp;
    }
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    config.save |= args.save;
    config.plot |= args.plot;
    args.recon.apply(&mut config)?;
    config.validate().context("Invalid pipeline config")?;

    let shell = connect(&config)?;
    print_run_summary(&config, Some(&shell.host().target()));

    let reporter = Arc::new(SpinnerReporter::new()?);
    let result = run_pipeline_reported(&config, shell, reporter.clone());
    reporter.finish();
    let output = result.context("Pipeline failed")?;

    if let Some(diagnostics) = &output.diagnostics {
        print_diagnostics(diagnostics);
    }
    print_output(&output);
    Ok(())
}
