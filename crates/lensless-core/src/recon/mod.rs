pub mod admm;
pub mod convolve;
mod dispatch;
pub mod fista;

use ndarray::Array4;

use crate::frame::Real;

pub use dispatch::{
    dispatch, Algorithm, AlgorithmConfig, Configured, DataBound, Intermediate,
    ReconstructionResult, RunOptions,
};

/// An iterative solver over a fixed PSF.
///
/// `set_data` resets the iterates, so a solver can be reused for several
/// measurements of the same scene geometry.
pub trait Reconstructor<T: Real>: Send {
    fn name(&self) -> &'static str;

    /// Iterations a full run performs.
    fn n_iter(&self) -> usize;

    /// Bind a `(1, h, w, c)` measurement and reset the iterates.
    fn set_data(&mut self, data: &Array4<T>);

    /// Advance by one iteration.
    fn step(&mut self);

    /// Current estimate cropped to `(depth, h, w, c)`, negatives clipped.
    fn image(&self) -> Array4<T>;
}
