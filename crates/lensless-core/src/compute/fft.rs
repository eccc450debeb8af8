use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use num_complex::Complex;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::consts::PARALLEL_LINE_THRESHOLD;
use crate::frame::Real;

/// Planned 2-D FFTs for one plane size.
///
/// Row and column passes run sequentially, or fanned out over the current
/// Rayon pool when `parallel` is set and the plane is large enough.
pub struct FftPlans<T: Real> {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<T>>,
    col_forward: Arc<dyn Fft<T>>,
    row_inverse: Arc<dyn Fft<T>>,
    col_inverse: Arc<dyn Fft<T>>,
}

impl<T: Real> FftPlans<T> {
    pub fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            height,
            width,
            row_forward: planner.plan_fft_forward(width),
            col_forward: planner.plan_fft_forward(height),
            row_inverse: planner.plan_fft_inverse(width),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Forward transform of a real plane.
    pub fn forward(&self, plane: ArrayView2<T>, parallel: bool) -> Array2<Complex<T>> {
        let mut work = plane.mapv(|v| Complex::new(v, T::zero()));
        process_rows(&mut work, &self.row_forward, parallel);
        process_cols(&mut work, &self.col_forward, parallel);
        work
    }

    /// Inverse transform, returning the real part normalized by `1/(h*w)`.
    pub fn inverse_real(&self, mut work: Array2<Complex<T>>, parallel: bool) -> Array2<T> {
        process_cols(&mut work, &self.col_inverse, parallel);
        process_rows(&mut work, &self.row_inverse, parallel);
        let scale = T::one() / T::real((self.height * self.width) as f64);
        work.mapv(|c| c.re * scale)
    }
}

fn process_rows<T: Real>(data: &mut Array2<Complex<T>>, plan: &Arc<dyn Fft<T>>, parallel: bool) {
    let h = data.nrows();
    if parallel && h >= PARALLEL_LINE_THRESHOLD {
        let view = data.view();
        let processed: Vec<Vec<Complex<T>>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut line = view.row(row).to_vec();
                plan.process(&mut line);
                line
            })
            .collect();
        for (row, line) in processed.into_iter().enumerate() {
            for (dst, src) in data.row_mut(row).iter_mut().zip(line) {
                *dst = src;
            }
        }
    } else {
        for row in 0..h {
            let mut line = data.row(row).to_vec();
            plan.process(&mut line);
            for (dst, src) in data.row_mut(row).iter_mut().zip(line) {
                *dst = src;
            }
        }
    }
}

fn process_cols<T: Real>(data: &mut Array2<Complex<T>>, plan: &Arc<dyn Fft<T>>, parallel: bool) {
    let w = data.ncols();
    if parallel && w >= PARALLEL_LINE_THRESHOLD {
        let view = data.view();
        let processed: Vec<Vec<Complex<T>>> = (0..w)
            .into_par_iter()
            .map(|col| {
                let mut line = view.column(col).to_vec();
                plan.process(&mut line);
                line
            })
            .collect();
        for (col, line) in processed.into_iter().enumerate() {
            for (dst, src) in data.column_mut(col).iter_mut().zip(line) {
                *dst = src;
            }
        }
    } else {
        for col in 0..w {
            let mut line = data.column(col).to_vec();
            plan.process(&mut line);
            for (dst, src) in data.column_mut(col).iter_mut().zip(line) {
                *dst = src;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn forward_then_inverse_recovers_plane() {
        let plane = Array2::from_shape_fn((8, 6), |(r, c)| (r * 6 + c) as f64 * 0.1);
        let plans = FftPlans::<f64>::new(8, 6);
        let spectrum = plans.forward(plane.view(), false);
        let back = plans.inverse_real(spectrum, false);
        for (a, b) in plane.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let n = PARALLEL_LINE_THRESHOLD;
        let plane = Array2::from_shape_fn((n, n), |(r, c)| ((r * 7 + c * 3) % 11) as f32);
        let plans = FftPlans::<f32>::new(n, n);
        let seq = plans.forward(plane.view(), false);
        let par = plans.forward(plane.view(), true);
        for (a, b) in seq.iter().zip(par.iter()) {
            assert!((a - b).norm() < 1e-3);
        }
    }

    #[test]
    fn dc_term_is_plane_sum() {
        let plane = Array2::<f32>::from_elem((4, 4), 0.5);
        let plans = FftPlans::<f32>::new(4, 4);
        let spectrum = plans.forward(plane.view(), false);
        assert!((spectrum[[0, 0]].re - 8.0).abs() < 1e-5);
        assert!(spectrum[[1, 1]].norm() < 1e-5);
    }
}
