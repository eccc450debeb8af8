use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::Array4;
use tracing::debug;

use crate::error::{LenslessError, Result};
use crate::frame::Real;

use super::cpu::{HostBackend, ParallelBackend};

/// Where prepared tensors live and reconstruction work executes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Device {
    /// Plain host arrays, sequential execution.
    #[default]
    Host,
    /// Dedicated CPU thread pool. `None` uses one thread per core.
    Cpu { threads: Option<usize> },
}

impl Device {
    /// Resolve the configured device, falling back to the host when
    /// acceleration is disabled.
    pub fn select(use_accelerated: bool, device: &str) -> Result<Self> {
        if use_accelerated {
            device.parse()
        } else {
            Ok(Self::Host)
        }
    }
}

impl FromStr for Device {
    type Err = LenslessError;

    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || {
            LenslessError::Configuration(format!(
                "unsupported compute device '{s}' (supported: host, cpu, cpu:<threads>)"
            ))
        };
        match s.trim() {
            "host" => Ok(Self::Host),
            "cpu" => Ok(Self::Cpu { threads: None }),
            other => {
                let threads = other
                    .strip_prefix("cpu:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(unsupported)?;
                Ok(Self::Cpu {
                    threads: Some(threads),
                })
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Cpu { threads: None } => write!(f, "cpu"),
            Self::Cpu { threads: Some(n) } => write!(f, "cpu:{n}"),
        }
    }
}

/// Execution capability shared by the preparer and the reconstructors.
pub trait ComputeBackend: Send + Sync {
    fn name(&self) -> &str;

    fn device(&self) -> &Device;

    /// Whether FFT row/column passes should be split across threads.
    fn is_accelerated(&self) -> bool;

    /// Run `job` inside this backend's execution context.
    fn install(&self, job: &mut (dyn FnMut() + Send));
}

/// Create the backend for `device`. Called once per run.
pub fn create_backend(device: &Device) -> Result<Arc<dyn ComputeBackend>> {
    let backend: Arc<dyn ComputeBackend> = match device {
        Device::Host => Arc::new(HostBackend::default()),
        Device::Cpu { threads } => Arc::new(ParallelBackend::new(*threads)?),
    };
    debug!(backend = backend.name(), device = %backend.device(), "Compute backend ready");
    Ok(backend)
}

/// Run a fallible job on `backend` and hand back its result.
pub fn execute<R, F>(backend: &dyn ComputeBackend, job: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> Result<R> + Send,
{
    let mut job = Some(job);
    let mut outcome = None;
    backend.install(&mut || {
        if let Some(job) = job.take() {
            outcome = Some(job());
        }
    });
    outcome.unwrap_or_else(|| {
        Err(LenslessError::Backend(format!(
            "{} did not run the submitted job",
            backend.name()
        )))
    })
}

/// An array placed on a compute device.
#[derive(Clone, Debug)]
pub struct Tensor<T> {
    data: Array4<T>,
    device: Device,
}

impl<T: Real> Tensor<T> {
    /// Wrap a host array without moving it.
    pub fn host(data: Array4<T>) -> Self {
        Self {
            data,
            device: Device::Host,
        }
    }

    /// Tag an array produced on `backend` with its device.
    pub fn on(data: Array4<T>, backend: &dyn ComputeBackend) -> Self {
        Self {
            data,
            device: backend.device().clone(),
        }
    }

    /// Cast to precision `U` and place on `backend`'s device.
    pub fn to<U: Real>(self, backend: &dyn ComputeBackend) -> Tensor<U> {
        Tensor::on(self.data.mapv(|v| U::real(v.as_f64())), backend)
    }

    /// Move back to host-addressable form.
    pub fn to_host(self) -> Array4<T> {
        self.data
    }

    pub fn data(&self) -> &Array4<T> {
        &self.data
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn dim(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }
}
