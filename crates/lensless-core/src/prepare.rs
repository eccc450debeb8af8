use std::sync::Arc;

use ndarray::{s, Array3, Array4, ArrayD, ArrayView3, Axis, Ix4};
use num_traits::Float;
use tracing::{debug, info};

use crate::compute::{ComputeBackend, Tensor};
use crate::error::{LenslessError, Result};
use crate::frame::{Frame, Psf, Real};

/// Brings a loaded frame and a PSF into the tensor layout the reconstructors
/// expect, on one backend.
pub struct DataPreparer {
    backend: Arc<dyn ComputeBackend>,
}

impl DataPreparer {
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    /// Return `(data, psf)` as `(d, h, w, c)` tensors in precision `T`.
    ///
    /// The measurement has the PSF's background subtracted, is clipped to
    /// `[0, max]`, resized to the PSF's spatial size when needed and scaled
    /// to unit L2 norm. The PSF is only cast and placed.
    pub fn prepare<T: Real>(&self, frame: &Frame, psf: &Psf) -> Result<(Tensor<T>, Tensor<T>)> {
        let mut data = promote(frame.data.mapv(|v| T::real(f64::from(v))))?;
        let (depth, h, w, c) = data.dim();

        let levels = psf.background.per_channel(c)?;
        for (ch, &level) in levels.iter().enumerate() {
            let level = T::real(f64::from(level));
            data.index_axis_mut(Axis(3), ch).mapv_inplace(|v| v - level);
        }
        let zero = T::zero();
        let max = data.fold(T::neg_infinity(), |m, &v| m.max(v)).max(zero);
        data.mapv_inplace(|v| v.max(zero).min(max));

        let (_, ph, pw, pc) = psf.dim();
        if c != pc {
            return Err(LenslessError::ShapeMismatch(format!(
                "frame has {c} channel(s) but the PSF has {pc}"
            )));
        }
        if (h, w) != (ph, pw) {
            debug!(from = ?(h, w), to = ?(ph, pw), "Resizing measurement to PSF");
            let mut resized = Array4::<T>::zeros((depth, ph, pw, c));
            for (d, plane) in data.axis_iter(Axis(0)).enumerate() {
                resized
                    .slice_mut(s![d, .., .., ..])
                    .assign(&resize(plane, (ph, pw)));
            }
            data = resized;
        }

        let norm = Float::sqrt(data.fold(zero, |acc, &v| acc + v * v));
        if norm > zero {
            data.mapv_inplace(|v| v / norm);
        }

        let backend = self.backend.as_ref();
        let data = Tensor::on(data, backend);
        let psf = Tensor::host(psf.data.clone()).to::<T>(backend);
        info!(
            shape = ?data.dim(),
            device = %data.device(),
            "Prepared measurement"
        );
        Ok((data, psf))
    }
}

/// Bring a rank 2, 3 or 4 array to `(d, h, w, c)`.
fn promote<T: Real>(data: ArrayD<T>) -> Result<Array4<T>> {
    let data = match data.ndim() {
        2 => data.insert_axis(Axis(0)).insert_axis(Axis(3)),
        3 => data.insert_axis(Axis(0)),
        4 => data,
        n => {
            return Err(LenslessError::ShapeMismatch(format!(
                "frame must have rank 2, 3 or 4, got {n}"
            )))
        }
    };
    data.into_dimensionality::<Ix4>()
        .map_err(|e| LenslessError::ShapeMismatch(e.to_string()))
}

/// Source index range covering output index `i` when mapping `n` samples to `m`.
///
/// Shrinking averages a box; growing picks the nearest sample.
fn source_span(i: usize, n: usize, m: usize) -> (usize, usize) {
    let start = i * n / m;
    if m >= n {
        return (start, start + 1);
    }
    let end = ((i + 1) * n).div_ceil(m).clamp(start + 1, n);
    (start, end)
}

/// Area-averaging resize of a `(h, w, c)` image to `(height, width)`.
pub fn resize<T: Real>(image: ArrayView3<T>, (height, width): (usize, usize)) -> Array3<T> {
    let (h, w, c) = image.dim();
    Array3::from_shape_fn((height, width, c), |(r, col, ch)| {
        let (r0, r1) = source_span(r, h, height);
        let (c0, c1) = source_span(col, w, width);
        let block = image.slice(s![r0..r1, c0..c1, ch]);
        block.sum() / T::real(block.len() as f64)
    })
}
