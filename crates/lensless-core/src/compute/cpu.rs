use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{LenslessError, Result};

use super::{ComputeBackend, Device};

/// Host backend: plain ndarray buffers, everything on the calling thread.
#[derive(Default)]
pub struct HostBackend {
    device: Device,
}

impl ComputeBackend for HostBackend {
    fn name(&self) -> &str {
        "Host/ndarray"
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_accelerated(&self) -> bool {
        false
    }

    fn install(&self, job: &mut (dyn FnMut() + Send)) {
        job()
    }
}

/// Accelerated backend: a dedicated Rayon pool that FFT passes fan out on.
pub struct ParallelBackend {
    pool: ThreadPool,
    device: Device,
}

impl ParallelBackend {
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("lensless-compute-{i}"));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| LenslessError::Backend(format!("failed to build thread pool: {e}")))?;
        Ok(Self {
            pool,
            device: Device::Cpu { threads },
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl ComputeBackend for ParallelBackend {
    fn name(&self) -> &str {
        "CPU/Rayon"
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn is_accelerated(&self) -> bool {
        true
    }

    fn install(&self, job: &mut (dyn FnMut() + Send)) {
        self.pool.install(move || job())
    }
}
