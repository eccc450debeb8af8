use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use ndarray::{s, Array4};
use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::{debug, info};

use crate::compute::{execute, ComputeBackend, Tensor};
use crate::error::{LenslessError, Result};
use crate::frame::Real;
use crate::io::image_io::save_image;

use super::admm::{Admm, AdmmParams};
use super::fista::{Fista, FistaParams};
use super::Reconstructor;

/// Supported reconstruction algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Fista,
    Admm,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Self::Fista, Self::Admm];

    /// Instantiate the solver with its parameter block (without `disp_iter`).
    pub fn configure<T: Real>(
        self,
        psf: Tensor<T>,
        params: Table,
        backend: Arc<dyn ComputeBackend>,
    ) -> Result<Configured<T>> {
        let parallel = backend.is_accelerated();
        let kernel = psf.data();
        let solver: Box<dyn Reconstructor<T>> = match self {
            Self::Fista => {
                let params: FistaParams = parse_params(self, params)?;
                debug!(?params, "FISTA parameters");
                execute(backend.as_ref(), || {
                    Ok(Box::new(Fista::new(kernel, params, parallel)) as Box<dyn Reconstructor<T>>)
                })?
            }
            Self::Admm => {
                let params: AdmmParams = parse_params(self, params)?;
                debug!(?params, "ADMM parameters");
                execute(backend.as_ref(), || {
                    Ok(Box::new(Admm::new(kernel, params, parallel)) as Box<dyn Reconstructor<T>>)
                })?
            }
        };
        Ok(Configured {
            algorithm: self,
            psf_dim: psf.dim(),
            solver,
            backend,
        })
    }
}

impl FromStr for Algorithm {
    type Err = LenslessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fista" => Ok(Self::Fista),
            "admm" => Ok(Self::Admm),
            _ => {
                let supported: Vec<String> = Self::ALL.iter().map(|a| a.to_string()).collect();
                Err(LenslessError::Configuration(format!(
                    "unsupported algorithm '{s}' (supported: {})",
                    supported.join(", ")
                )))
            }
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fista => write!(f, "fista"),
            Self::Admm => write!(f, "admm"),
        }
    }
}

fn parse_params<P: DeserializeOwned>(algorithm: Algorithm, params: Table) -> Result<P> {
    Value::Table(params).try_into().map_err(|e| {
        LenslessError::Configuration(format!("invalid {algorithm} parameters: {e}"))
    })
}

/// Algorithm name plus its parameter mapping, as configured.
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmConfig {
    pub name: String,
    pub params: Table,
}

impl AlgorithmConfig {
    /// Resolve the algorithm and pull `disp_iter` out of the parameters.
    pub fn split(&self) -> Result<(Algorithm, usize, Table)> {
        let algorithm: Algorithm = self.name.parse()?;
        let mut params = self.params.clone();
        let disp_iter = match params.remove("disp_iter") {
            Some(Value::Integer(n)) => usize::try_from(n).map_err(|_| {
                LenslessError::Configuration(format!(
                    "disp_iter must be a non-negative integer, got {n}"
                ))
            })?,
            Some(other) => {
                return Err(LenslessError::Configuration(format!(
                    "disp_iter must be a non-negative integer, got {other}"
                )))
            }
            None => {
                return Err(LenslessError::Configuration(format!(
                    "missing parameter 'disp_iter' for {algorithm}"
                )))
            }
        };
        Ok((algorithm, disp_iter, params))
    }
}

/// Presentation options for a run. They never change the numeric result.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Display gamma for saved intermediates.
    pub gamma: Option<f32>,
    /// Collect an intermediate estimate every `disp_iter` iterations.
    pub plot: bool,
    /// Directory intermediates are written to as `<iteration>.png`.
    pub save: Option<PathBuf>,
}

/// A snapshot of the estimate taken during a run.
#[derive(Clone, Debug)]
pub struct Intermediate<T> {
    pub iteration: usize,
    pub image: Array4<T>,
}

/// Outcome of a run, consumed once by the finalizer.
#[derive(Debug)]
pub enum ReconstructionResult<T> {
    Final(Tensor<T>),
    WithIntermediates {
        intermediates: Vec<Intermediate<T>>,
        final_image: Tensor<T>,
    },
}

impl<T> ReconstructionResult<T> {
    pub fn into_final(self) -> Tensor<T> {
        match self {
            Self::Final(image) => image,
            Self::WithIntermediates { final_image, .. } => final_image,
        }
    }

    pub fn intermediates(&self) -> &[Intermediate<T>] {
        match self {
            Self::Final(_) => &[],
            Self::WithIntermediates { intermediates, .. } => intermediates,
        }
    }
}

/// A solver with its PSF, waiting for data.
pub struct Configured<T: Real> {
    algorithm: Algorithm,
    psf_dim: (usize, usize, usize, usize),
    solver: Box<dyn Reconstructor<T>>,
    backend: Arc<dyn ComputeBackend>,
}

impl<T: Real> Configured<T> {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Bind a prepared `(1, h, w, c)` measurement matching the PSF.
    pub fn bind(mut self, data: Tensor<T>) -> Result<DataBound<T>> {
        let (depth, h, w, c) = data.dim();
        let (_, ph, pw, pc) = self.psf_dim;
        if (h, w, c) != (ph, pw, pc) {
            return Err(LenslessError::ShapeMismatch(format!(
                "data is {h}x{w}x{c} but the PSF is {ph}x{pw}x{pc}"
            )));
        }
        if depth != 1 {
            return Err(LenslessError::ShapeMismatch(format!(
                "data must hold a single measurement, got depth {depth}"
            )));
        }
        self.solver.set_data(data.data());
        Ok(DataBound {
            algorithm: self.algorithm,
            solver: self.solver,
            backend: self.backend,
        })
    }
}

/// A solver bound to a measurement, ready to iterate.
pub struct DataBound<T: Real> {
    algorithm: Algorithm,
    solver: Box<dyn Reconstructor<T>>,
    backend: Arc<dyn ComputeBackend>,
}

impl<T: Real> DataBound<T> {
    /// Iterate to completion on the backend.
    pub fn run(mut self, options: &RunOptions, disp_iter: usize) -> Result<ReconstructionResult<T>> {
        let n_iter = self.solver.n_iter();
        info!(
            algorithm = self.solver.name(),
            n_iter,
            backend = self.backend.name(),
            "Reconstructing"
        );

        let start = Instant::now();
        let solver = &mut self.solver;
        let intermediates = execute(self.backend.as_ref(), || {
            let mut intermediates = Vec::new();
            for iteration in 1..=n_iter {
                solver.step();
                if disp_iter == 0 || iteration % disp_iter != 0 {
                    continue;
                }
                debug!(iteration, "Reconstruction progress");
                if options.plot {
                    let image = solver.image();
                    if let Some(dir) = &options.save {
                        let path = dir.join(format!("{iteration}.png"));
                        save_image(image.slice(s![0, .., .., ..]), &path, options.gamma)?;
                    }
                    intermediates.push(Intermediate { iteration, image });
                }
            }
            Ok(intermediates)
        })?;
        let final_image = Tensor::on(self.solver.image(), self.backend.as_ref());
        info!(
            algorithm = %self.algorithm,
            elapsed_s = start.elapsed().as_secs_f64(),
            "Processing time"
        );

        Ok(if options.plot {
            ReconstructionResult::WithIntermediates {
                intermediates,
                final_image,
            }
        } else {
            ReconstructionResult::Final(final_image)
        })
    }
}

/// Parse, configure, bind and run in one go.
pub fn dispatch<T: Real>(
    config: &AlgorithmConfig,
    psf: Tensor<T>,
    data: Tensor<T>,
    backend: Arc<dyn ComputeBackend>,
    options: &RunOptions,
) -> Result<ReconstructionResult<T>> {
    let (algorithm, disp_iter, params) = config.split()?;
    info!(%algorithm, disp_iter, "Dispatching reconstruction");
    algorithm
        .configure(psf, params, backend)?
        .bind(data)?
        .run(options, disp_iter)
}
