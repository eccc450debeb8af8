use ndarray::{s, Array2, Array3, Array4, ArrayView2, Zip};
use num_complex::Complex;

use crate::compute::FftPlans;
use crate::frame::Real;

/// Linear convolution with a 4-D PSF on a zero-padded grid.
///
/// Estimates live on a `(depth, 2h, 2w, channels)` grid; the sensor window is
/// the centred `(h, w)` block. The forward model sums over depth.
pub struct Convolver<T: Real> {
    depth: usize,
    height: usize,
    width: usize,
    channels: usize,
    padded: (usize, usize),
    offset: (usize, usize),
    plans: FftPlans<T>,
    /// PSF spectra indexed by `depth * channels + channel`.
    spectra: Vec<Array2<Complex<T>>>,
    parallel: bool,
}

impl<T: Real> Convolver<T> {
    pub fn new(psf: &Array4<T>, parallel: bool) -> Self {
        let (depth, height, width, channels) = psf.dim();
        let padded = (2 * height, 2 * width);
        let offset = ((padded.0 - height) / 2, (padded.1 - width) / 2);
        let plans = FftPlans::new(padded.0, padded.1);

        let mut spectra = Vec::with_capacity(depth * channels);
        for d in 0..depth {
            for c in 0..channels {
                let mut kernel = Array2::<T>::zeros(padded);
                kernel
                    .slice_mut(s![offset.0..offset.0 + height, offset.1..offset.1 + width])
                    .assign(&psf.slice(s![d, .., .., c]));
                let kernel = ifftshift(&kernel);
                spectra.push(plans.forward(kernel.view(), parallel));
            }
        }

        Self {
            depth,
            height,
            width,
            channels,
            padded,
            offset,
            plans,
            spectra,
            parallel,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(height, width)` of the sensor window.
    pub fn sensor_dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn padded_dim(&self) -> (usize, usize) {
        self.padded
    }

    /// Shape of an estimate on the padded grid.
    pub fn estimate_dim(&self) -> (usize, usize, usize, usize) {
        (self.depth, self.padded.0, self.padded.1, self.channels)
    }

    pub fn spectrum(&self, depth: usize, channel: usize) -> &Array2<Complex<T>> {
        &self.spectra[depth * self.channels + channel]
    }

    pub fn fft(&self, plane: ArrayView2<T>) -> Array2<Complex<T>> {
        self.plans.forward(plane, self.parallel)
    }

    pub fn ifft(&self, spectrum: Array2<Complex<T>>) -> Array2<T> {
        self.plans.inverse_real(spectrum, self.parallel)
    }

    /// 1 inside the sensor window, 0 in the padding. Shape `(2h, 2w, 1)` so it
    /// broadcasts over channels.
    pub fn sensor_mask(&self) -> Array3<T> {
        let mut mask = Array3::<T>::zeros((self.padded.0, self.padded.1, 1));
        mask.slice_mut(s![
            self.offset.0..self.offset.0 + self.height,
            self.offset.1..self.offset.1 + self.width,
            ..
        ])
        .fill(T::one());
        mask
    }

    /// Embed a `(1, h, w, c)` measurement into the padded grid.
    pub fn pad_measurement(&self, data: &Array4<T>) -> Array3<T> {
        let mut padded = Array3::<T>::zeros((self.padded.0, self.padded.1, self.channels));
        padded
            .slice_mut(s![
                self.offset.0..self.offset.0 + self.height,
                self.offset.1..self.offset.1 + self.width,
                ..
            ])
            .assign(&data.slice(s![0, .., .., ..]));
        padded
    }

    /// Cut the sensor window out of a padded estimate.
    pub fn crop_estimate(&self, estimate: &Array4<T>) -> Array4<T> {
        estimate
            .slice(s![
                ..,
                self.offset.0..self.offset.0 + self.height,
                self.offset.1..self.offset.1 + self.width,
                ..
            ])
            .to_owned()
    }

    /// `sum_d h_d * x_d` per channel, on the padded grid.
    pub fn forward(&self, estimate: &Array4<T>) -> Array3<T> {
        let mut out = Array3::<T>::zeros((self.padded.0, self.padded.1, self.channels));
        for c in 0..self.channels {
            let mut acc = Array2::<Complex<T>>::zeros(self.padded);
            for d in 0..self.depth {
                let spectrum = self.fft(estimate.slice(s![d, .., .., c]));
                Zip::from(&mut acc)
                    .and(&spectrum)
                    .and(self.spectrum(d, c))
                    .for_each(|a, &x, &h| *a += x * h);
            }
            out.slice_mut(s![.., .., c]).assign(&self.ifft(acc));
        }
        out
    }

    /// Adjoint of [`forward`](Self::forward): correlate each channel with every depth plane.
    pub fn adjoint(&self, residual: &Array3<T>) -> Array4<T> {
        let mut out = Array4::<T>::zeros(self.estimate_dim());
        for c in 0..self.channels {
            let spectrum = self.fft(residual.slice(s![.., .., c]));
            for d in 0..self.depth {
                let product = Zip::from(&spectrum)
                    .and(self.spectrum(d, c))
                    .map_collect(|&x, &h| x * h.conj());
                out.slice_mut(s![d, .., .., c]).assign(&self.ifft(product));
            }
        }
        out
    }

    /// Largest eigenvalue of the normal operator, `max_f sum_d |H_d(f)|^2`.
    pub fn gram_max(&self) -> T {
        let mut best = T::zero();
        for c in 0..self.channels {
            let mut gram = Array2::<T>::zeros(self.padded);
            for d in 0..self.depth {
                Zip::from(&mut gram)
                    .and(self.spectrum(d, c))
                    .for_each(|g, h| *g += h.norm_sqr());
            }
            best = gram.iter().fold(best, |m, &v| m.max(v));
        }
        best
    }
}

/// Move the centre sample of each axis to index 0.
fn ifftshift<T: Real>(plane: &Array2<T>) -> Array2<T> {
    let (h, w) = plane.dim();
    Array2::from_shape_fn((h, w), |(r, c)| plane[[(r + h / 2) % h, (c + w / 2) % w]])
}
