use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, Array4, ArrayD, Axis, Ix3, ScalarOperand};
use num_traits::{Float, NumAssign};
use rustfft::FftNum;
use serde::{Deserialize, Serialize};

use crate::error::{LenslessError, Result};

/// Floating-point element type the typed half of the pipeline runs in.
///
/// Implemented for `f32` and `f64` only; [`Precision`] picks one at runtime.
pub trait Real: FftNum + Float + NumAssign + ScalarOperand + fmt::Display {
    /// Convert an `f64` constant into this precision.
    fn real(v: f64) -> Self {
        Self::from_f64(v).unwrap_or_else(Self::nan)
    }

    /// Widen to `f64` for logging and display.
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl Real for f32 {}
impl Real for f64 {}

/// Floating-point precision of the prepared data and the reconstruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Precision {
    #[default]
    Float32,
    Float64,
}

impl FromStr for Precision {
    type Err = LenslessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            other => Err(LenslessError::Configuration(format!(
                "dtype must be float32 or float64, got '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for Precision {
    type Error = LenslessError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Precision> for String {
    fn from(p: Precision) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}

/// A decoded sensor frame before preparation.
///
/// `data` is either `(height, width)` for single-channel captures or
/// `(height, width, channels)`. Values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: ArrayD<f32>,
    /// Bit depth of the samples in the source file.
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: ArrayD<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn height(&self) -> usize {
        self.data.shape().first().copied().unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.data.shape().get(1).copied().unwrap_or(0)
    }

    /// Channel count: the last axis, or 1 for a bare `(height, width)` plane.
    pub fn channels(&self) -> usize {
        match self.data.ndim() {
            0..=2 => 1,
            n => self.data.shape()[n - 1],
        }
    }

    /// View as `(height, width, channels)`.
    pub fn to_hwc(&self) -> Result<Array3<f32>> {
        let data = match self.data.ndim() {
            2 => self.data.clone().insert_axis(Axis(2)),
            3 => self.data.clone(),
            n => {
                return Err(LenslessError::ShapeMismatch(format!(
                    "expected a 2-D or 3-D frame, got rank {n}"
                )))
            }
        };
        data.into_dimensionality::<Ix3>()
            .map_err(|e| LenslessError::ShapeMismatch(e.to_string()))
    }
}

/// Background level subtracted from the measurement during preparation.
#[derive(Clone, Debug, PartialEq)]
pub enum Background {
    Scalar(f32),
    PerChannel(Vec<f32>),
}

impl Default for Background {
    fn default() -> Self {
        Self::Scalar(0.0)
    }
}

impl Background {
    /// Expand to one level per channel, validating the channel count.
    pub fn per_channel(&self, channels: usize) -> Result<Vec<f32>> {
        match self {
            Self::Scalar(v) => Ok(vec![*v; channels]),
            Self::PerChannel(levels) if levels.len() == channels => Ok(levels.clone()),
            Self::PerChannel(levels) if levels.len() == 1 => Ok(vec![levels[0]; channels]),
            Self::PerChannel(levels) => Err(LenslessError::ShapeMismatch(format!(
                "background has {} levels but the frame has {channels} channel(s)",
                levels.len()
            ))),
        }
    }
}

/// Calibration point-spread function, shape `(depth, height, width, channels)`.
#[derive(Clone, Debug)]
pub struct Psf {
    pub data: Array4<f32>,
    /// Background level estimated from the PSF image before normalization.
    pub background: Background,
}

impl Psf {
    pub fn dim(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }
}
