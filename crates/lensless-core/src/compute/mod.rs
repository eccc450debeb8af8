mod backend;
pub mod cpu;
pub mod fft;

pub use backend::{create_backend, execute, ComputeBackend, Device, Tensor};
pub use fft::FftPlans;
