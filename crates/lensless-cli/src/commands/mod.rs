pub mod capture;
pub mod config;
pub mod reconstruct;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use lensless_core::capture::SshShell;
use lensless_core::pipeline::config::PipelineConfig;
use lensless_core::recon::Algorithm;

/// Load a TOML config, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
}

/// Check credentials and resolve the host before opening the remote shell.
pub fn connect(config: &PipelineConfig) -> Result<SshShell> {
    let host = config.rpi.host()?;
    host.resolve()?;
    Ok(SshShell::new(host))
}

/// Overrides shared by every subcommand that reconstructs.
#[derive(Args)]
pub struct ReconOverrides {
    /// Calibration PSF image
    #[arg(long)]
    pub psf: Option<PathBuf>,

    /// Reconstruction algorithm (fista, admm)
    #[arg(long)]
    pub algo: Option<String>,

    /// Number of iterations for the selected algorithm
    #[arg(long)]
    pub n_iter: Option<i64>,

    /// Floating-point precision (float32, float64)
    #[arg(long)]
    pub dtype: Option<String>,

    /// Run on the accelerated backend (cpu, cpu:<threads>)
    #[arg(long)]
    pub device: Option<String>,

    /// Crop fractions of the width, e.g. 0.25,0.75
    #[arg(long, value_delimiter = ',', num_args = 2)]
    pub crop_hor: Option<Vec<f64>>,

    /// Crop fractions of the height, e.g. 0.1,0.9
    #[arg(long, value_delimiter = ',', num_args = 2)]
    pub crop_vert: Option<Vec<f64>>,
}

impl ReconOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(psf) = &self.psf {
            config.camera.psf = psf.clone();
        }
        if let Some(algo) = &self.algo {
            config.recon.algo = algo.clone();
        }
        if let Some(n_iter) = self.n_iter {
            let algorithm: Algorithm = config.recon.algo.parse()?;
            let table = match algorithm {
                Algorithm::Fista => &mut config.recon.fista,
                Algorithm::Admm => &mut config.recon.admm,
            };
            table.insert("n_iter".into(), toml::Value::Integer(n_iter));
        }
        if let Some(dtype) = &self.dtype {
            config.recon.dtype = dtype.parse()?;
        }
        if let Some(device) = &self.device {
            config.recon.use_accelerated = true;
            config.recon.device = device.clone();
        }
        if let Some(range) = &self.crop_hor {
            config.postproc.crop_hor = Some(pair(range)?);
        }
        if let Some(range) = &self.crop_vert {
            config.postproc.crop_vert = Some(pair(range)?);
        }
        Ok(())
    }
}

fn pair(values: &[f64]) -> Result<[f64; 2]> {
    match values {
        [lo, hi] => Ok([*lo, *hi]),
        _ => anyhow::bail!("expected two comma-separated fractions, got {}", values.len()),
    }
}
