use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{REMOTE_CAPTURE_STEM, REMOTE_DISPLAY_PATH};
use crate::error::{LenslessError, Result};
use crate::pipeline::config::{CaptureConfig, DisplayConfig};

use super::command::{format_float, format_list, ArgStyle, CommandBuilder};

/// Representation the remote script delivers. Exactly one is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Raw Bayer mosaic, demosaiced and white-balanced locally.
    #[default]
    Bayer,
    Rgb,
    Gray,
}

impl OutputMode {
    /// Resolve from the `rgb` / `gray` settings flags.
    pub fn from_flags(rgb: bool, gray: bool) -> Result<Self> {
        match (rgb, gray) {
            (true, true) => Err(LenslessError::Configuration(
                "capture.rgb and capture.gray are mutually exclusive".into(),
            )),
            (true, false) => Ok(Self::Rgb),
            (false, true) => Ok(Self::Gray),
            (false, false) => Ok(Self::Bayer),
        }
    }

    pub fn is_bayer(self) -> bool {
        self == Self::Bayer
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bayer => write!(f, "Bayer"),
            Self::Rgb => write!(f, "RGB"),
            Self::Gray => write!(f, "Grayscale"),
        }
    }
}

/// Everything needed to render one remote capture command.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureRequest {
    /// Remote interpreter invocation.
    pub interpreter: String,
    /// Remote capture script path.
    pub script: String,
    /// Output file stem the script writes under the remote home.
    pub remote_stem: String,
    /// Exposure time in seconds.
    pub exposure: f64,
    pub iso: u32,
    pub sensor_mode: String,
    /// Sensor bit depth; above 8 requests 16-bit output.
    pub nbits: u8,
    pub nbits_out: u8,
    /// Seconds the script waits after configuring the camera.
    pub config_pause: u32,
    pub mode: OutputMode,
    pub legacy: bool,
    pub down: Option<u32>,
    pub awb_gains: Option<[f64; 2]>,
}

impl CaptureRequest {
    pub fn from_config(interpreter: &str, config: &CaptureConfig) -> Result<Self> {
        Ok(Self {
            interpreter: interpreter.to_string(),
            script: config.script.clone(),
            remote_stem: REMOTE_CAPTURE_STEM.to_string(),
            exposure: config.exp,
            iso: config.iso,
            sensor_mode: config.sensor_mode.clone(),
            nbits: config.nbits,
            nbits_out: config.nbits_out,
            config_pause: config.config_pause,
            mode: OutputMode::from_flags(config.rgb, config.gray)?,
            legacy: config.legacy,
            down: config.down,
            awb_gains: config.awb_gains,
        })
    }

    pub fn sixteen_bit(&self) -> bool {
        self.nbits > 8
    }

    /// The command, argument by argument.
    pub fn command(&self) -> CommandBuilder {
        CommandBuilder::new(&self.interpreter)
            .positional(&self.script)
            .switch("bayer", self.mode.is_bayer())
            .arg("fn", &self.remote_stem)
            .arg("exp", format_float(self.exposure))
            .arg("iso", self.iso)
            .arg("config_pause", self.config_pause)
            .arg("sensor_mode", &self.sensor_mode)
            .arg("nbits_out", self.nbits_out)
            .switch("sixteen", self.sixteen_bit())
            .switch("rgb", self.mode == OutputMode::Rgb)
            .switch("legacy", self.legacy)
            .switch("gray", self.mode == OutputMode::Gray)
            .opt("down", self.down.filter(|&d| d > 0))
            .opt("awb_gains", self.awb_gains.map(|g| format_list(&g)))
    }

    /// Path of the produced frame on the remote host.
    pub fn remote_file(&self) -> String {
        format!("~/{}.png", self.remote_stem)
    }
}

/// Copy-and-show request for the remote display.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayRequest {
    pub interpreter: String,
    /// Local image to show.
    pub image: PathBuf,
    /// Where the raw image is uploaded before preparation.
    pub upload_path: String,
    pub settings: DisplayConfig,
}

impl DisplayRequest {
    pub fn new(interpreter: &str, image: PathBuf, settings: &DisplayConfig) -> Self {
        Self {
            interpreter: interpreter.to_string(),
            image,
            upload_path: "~/tmp_display.png".to_string(),
            settings: settings.clone(),
        }
    }

    /// Remote preparation command; writes the screen-ready image to the display path.
    pub fn command(&self) -> CommandBuilder {
        let s = &self.settings;
        CommandBuilder::new(&self.interpreter)
            .style(ArgStyle::LongFlag)
            .positional(&s.script)
            .arg("fp", &self.upload_path)
            .arg("pad", s.pad)
            .arg("vshift", s.vshift)
            .arg("hshift", s.hshift)
            .arg("screen_res", format!("{} {}", s.screen_res[0], s.screen_res[1]))
            .arg("brightness", s.brightness)
            .arg("rot90", s.rot90)
            .switch("landscape", s.landscape)
            .opt(
                "image_res",
                s.image_res.map(|[w, h]| format!("{w} {h}")),
            )
            .arg("output_path", REMOTE_DISPLAY_PATH)
    }
}
