use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::capture::{OutputMode, RemoteHost};
use crate::compute::Device;
use crate::error::{LenslessError, Result};
use crate::finalize::CropSpec;
use crate::frame::Precision;
use crate::io::debayer::BayerPattern;
use crate::recon::{Algorithm, AlgorithmConfig};

/// Full settings for one capture-and-reconstruct run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Image shown on the remote display before capturing. Skipped when unset.
    pub fp: Option<PathBuf>,
    /// Render intermediate reconstructions every `disp_iter` iterations.
    pub plot: bool,
    /// Persist plots and the reconstruction.
    pub save: bool,
    /// Output directory; the working directory when unset.
    pub output: Option<PathBuf>,
    pub rpi: RpiConfig,
    pub capture: CaptureConfig,
    pub camera: CameraConfig,
    pub recon: ReconConfig,
    pub postproc: CropSpec,
    pub display: DisplayConfig,
}

impl PipelineConfig {
    /// Check everything that can be checked before touching the remote host.
    pub fn validate(&self) -> Result<()> {
        OutputMode::from_flags(self.capture.rgb, self.capture.gray)?;
        if !(1..=16).contains(&self.capture.nbits_out) {
            return Err(LenslessError::Configuration(format!(
                "capture.nbits_out must be between 1 and 16, got {}",
                self.capture.nbits_out
            )));
        }
        if self.recon.downsample == 0 {
            return Err(LenslessError::Configuration(
                "recon.downsample must be at least 1".into(),
            ));
        }
        self.recon.device()?;
        self.recon.algorithm_config()?.split()?;
        self.postproc.validate()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RpiConfig {
    pub username: Option<String>,
    pub hostname: Option<String>,
    /// Interpreter that runs the remote scripts.
    pub python: String,
}

impl Default for RpiConfig {
    fn default() -> Self {
        Self {
            username: None,
            hostname: None,
            python: "~/LenslessPiCam/lensless_env/bin/python".into(),
        }
    }
}

impl RpiConfig {
    pub fn host(&self) -> Result<RemoteHost> {
        RemoteHost::new(self.username.as_deref(), self.hostname.as_deref())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub script: String,
    /// Exposure in seconds.
    pub exp: f64,
    pub iso: u32,
    pub config_pause: u32,
    pub sensor_mode: String,
    pub nbits: u8,
    pub nbits_out: u8,
    pub rgb: bool,
    pub gray: bool,
    pub legacy: bool,
    pub down: Option<u32>,
    pub awb_gains: Option<[f64; 2]>,
    /// Seconds to wait after display before capturing.
    pub delay: u64,
    /// Display gamma for `raw.png`.
    pub gamma: Option<f32>,
    /// Local file stem for the retrieved frame.
    pub raw_data_fn: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            script: "~/LenslessPiCam/scripts/measure/on_device_capture.py".into(),
            exp: 0.02,
            iso: 100,
            config_pause: 2,
            sensor_mode: "0".into(),
            nbits: 12,
            nbits_out: 12,
            rgb: false,
            gray: false,
            legacy: true,
            down: None,
            awb_gains: None,
            delay: 2,
            gamma: None,
            raw_data_fn: "raw_data".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Calibration PSF image.
    pub psf: PathBuf,
    /// White-balance overrides; camera-reported gains are used when unset.
    pub red_gain: Option<f64>,
    pub blue_gain: Option<f64>,
    pub bayer_pattern: BayerPattern,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            psf: PathBuf::from("data/psf/tape_rgb.png"),
            red_gain: None,
            blue_gain: None,
            bayer_pattern: BayerPattern::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Display gamma for `psf.png` and intermediate frames.
    pub gamma: Option<f32>,
    /// Integer PSF downsampling factor.
    pub downsample: usize,
    pub dtype: Precision,
    #[serde(alias = "use_torch")]
    pub use_accelerated: bool,
    #[serde(alias = "torch_device")]
    pub device: String,
    pub algo: String,
    pub fista: Table,
    pub admm: Table,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            gamma: None,
            downsample: 4,
            dtype: Precision::Float32,
            use_accelerated: false,
            device: "cpu".into(),
            algo: "admm".into(),
            fista: table(&[
                ("n_iter", Value::Integer(300)),
                ("disp_iter", Value::Integer(50)),
                ("tk", Value::Float(1.0)),
            ]),
            admm: table(&[
                ("n_iter", Value::Integer(5)),
                ("disp_iter", Value::Integer(1)),
                ("mu1", Value::Float(1e-6)),
                ("mu2", Value::Float(1e-5)),
                ("mu3", Value::Float(4e-5)),
                ("tau", Value::Float(1e-4)),
            ]),
        }
    }
}

impl ReconConfig {
    pub fn device(&self) -> Result<Device> {
        Device::select(self.use_accelerated, &self.device)
    }

    /// Algorithm name plus the parameter block configured for it.
    pub fn algorithm_config(&self) -> Result<AlgorithmConfig> {
        let params = match self.algo.parse::<Algorithm>()? {
            Algorithm::Fista => self.fista.clone(),
            Algorithm::Admm => self.admm.clone(),
        };
        Ok(AlgorithmConfig {
            name: self.algo.clone(),
            params,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Remote script that fits the image to the screen.
    pub script: String,
    pub screen_res: [u32; 2],
    pub brightness: u32,
    /// Quarter turns applied before display.
    pub rot90: u32,
    pub pad: u32,
    pub vshift: i32,
    pub hshift: i32,
    pub landscape: bool,
    pub image_res: Option<[u32; 2]>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            script: "~/LenslessPiCam/scripts/measure/prep_display_image.py".into(),
            screen_res: [1920, 1200],
            brightness: 100,
            rot90: 3,
            pad: 0,
            vshift: -10,
            hshift: 0,
            landscape: false,
            image_res: None,
        }
    }
}

fn table(entries: &[(&str, Value)]) -> Table {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
