use ndarray::{s, Array2, Array3, Array4, Axis, Zip};
use num_traits::Float;
use serde::Deserialize;

use crate::frame::Real;

use super::convolve::Convolver;
use super::Reconstructor;

/// ADMM parameters. `disp_iter` is handled by the dispatcher.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AdmmParams {
    pub n_iter: usize,
    /// Penalty on the sensor crop split.
    pub mu1: f64,
    /// Penalty on the total-variation split.
    pub mu2: f64,
    /// Penalty on the non-negativity split.
    pub mu3: f64,
    /// Total-variation weight.
    pub tau: f64,
}

impl Default for AdmmParams {
    fn default() -> Self {
        Self {
            n_iter: 5,
            mu1: 1e-6,
            mu2: 1e-5,
            mu3: 4e-5,
            tau: 1e-4,
        }
    }
}

/// Finite-difference axes of the total-variation prior: rows, then columns.
const TV_AXES: [Axis; 2] = [Axis(1), Axis(2)];

/// Primal/dual variables carried between iterations.
struct State<T> {
    estimate: Array4<T>,
    forward: Array3<T>,
    psi: [Array4<T>; 2],
    xi: Array3<T>,
    eta: [Array4<T>; 2],
    rho: Array4<T>,
}

impl<T: Real> State<T> {
    fn zeros(conv: &Convolver<T>) -> Self {
        let est = conv.estimate_dim();
        let (ph, pw) = conv.padded_dim();
        let meas = (ph, pw, conv.channels());
        Self {
            estimate: Array4::zeros(est),
            forward: Array3::zeros(meas),
            psi: [Array4::zeros(est), Array4::zeros(est)],
            xi: Array3::zeros(meas),
            eta: [Array4::zeros(est), Array4::zeros(est)],
            rho: Array4::zeros(est),
        }
    }
}

/// ADMM with a total-variation prior, a non-negativity split and a sensor
/// crop split.
///
/// The estimate update solves its normal equations per depth plane, i.e. the
/// coupling between depth planes is dropped from the inverse.
pub struct Admm<T: Real> {
    conv: Convolver<T>,
    n_iter: usize,
    mu1: T,
    mu2: T,
    mu3: T,
    tau: T,
    /// `1 / (mask + mu1)`, shape `(2h, 2w, 1)`.
    x_divmat: Array3<T>,
    /// `1 / (mu1 |H|^2 + mu2 PsiT Psi + mu3)` per `depth * channels + channel`.
    r_divmat: Vec<Array2<T>>,
    padded_data: Array3<T>,
    state: State<T>,
}

impl<T: Real> Admm<T> {
    pub fn new(psf: &Array4<T>, params: AdmmParams, parallel: bool) -> Self {
        let conv = Convolver::new(psf, parallel);
        let mu1 = T::real(params.mu1);
        let mu2 = T::real(params.mu2);
        let mu3 = T::real(params.mu3);

        let x_divmat = conv.sensor_mask().mapv(|m| T::one() / (m + mu1));

        let (ph, pw) = conv.padded_dim();
        let tv_gram = Array2::from_shape_fn((ph, pw), |(k, l)| {
            T::real(laplacian_eigenvalue(k, ph) + laplacian_eigenvalue(l, pw))
        });
        let mut r_divmat = Vec::with_capacity(conv.depth() * conv.channels());
        for d in 0..conv.depth() {
            for c in 0..conv.channels() {
                r_divmat.push(
                    Zip::from(conv.spectrum(d, c))
                        .and(&tv_gram)
                        .map_collect(|h, &p| T::one() / (mu1 * h.norm_sqr() + mu2 * p + mu3)),
                );
            }
        }

        let (_, _, _, channels) = conv.estimate_dim();
        let state = State::zeros(&conv);
        Self {
            padded_data: Array3::zeros((ph, pw, channels)),
            conv,
            n_iter: params.n_iter,
            mu1,
            mu2,
            mu3,
            tau: T::real(params.tau),
            x_divmat,
            r_divmat,
            state,
        }
    }
}

impl<T: Real> Reconstructor<T> for Admm<T> {
    fn name(&self) -> &'static str {
        "ADMM"
    }

    fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn set_data(&mut self, data: &Array4<T>) {
        self.padded_data = self.conv.pad_measurement(data);
        self.state = State::zeros(&self.conv);
    }

    fn step(&mut self) {
        let (mu1, mu2, mu3) = (self.mu1, self.mu2, self.mu3);
        let zero = T::zero();
        let threshold = self.tau / mu2;
        let st = &mut self.state;

        // Split variables.
        let u = [0, 1].map(|i| {
            Zip::from(&st.psi[i])
                .and(&st.eta[i])
                .map_collect(|&p, &e| soft_threshold(p + e / mu2, threshold))
        });
        let mut x = &st.xi + &(&st.forward * mu1) + &self.padded_data;
        Zip::from(&mut x)
            .and_broadcast(&self.x_divmat)
            .for_each(|v, &m| *v *= m);
        let w = Zip::from(&st.rho)
            .and(&st.estimate)
            .map_collect(|&r, &e| (r / mu3 + e).max(zero));

        // Estimate update.
        let mut rk = &w * mu3 - &st.rho;
        for (i, axis) in TV_AXES.into_iter().enumerate() {
            let v = &u[i] * mu2 - &st.eta[i];
            rk += &diff_adjoint(&v, axis);
        }
        rk += &self.conv.adjoint(&(&x * mu1 - &st.xi));

        let channels = self.conv.channels();
        let mut estimate = Array4::zeros(rk.dim());
        for d in 0..self.conv.depth() {
            for c in 0..channels {
                let mut spectrum = self.conv.fft(rk.slice(s![d, .., .., c]));
                Zip::from(&mut spectrum)
                    .and(&self.r_divmat[d * channels + c])
                    .for_each(|z, &r| *z = *z * r);
                estimate
                    .slice_mut(s![d, .., .., c])
                    .assign(&self.conv.ifft(spectrum));
            }
        }
        let forward = self.conv.forward(&estimate);
        let psi = TV_AXES.map(|axis| diff(&estimate, axis));

        // Dual updates.
        Zip::from(&mut st.xi)
            .and(&forward)
            .and(&x)
            .for_each(|xi, &f, &xv| *xi += mu1 * (f - xv));
        for i in 0..2 {
            Zip::from(&mut st.eta[i])
                .and(&psi[i])
                .and(&u[i])
                .for_each(|eta, &p, &uv| *eta += mu2 * (p - uv));
        }
        Zip::from(&mut st.rho)
            .and(&estimate)
            .and(&w)
            .for_each(|rho, &e, &wv| *rho += mu3 * (e - wv));

        st.estimate = estimate;
        st.forward = forward;
        st.psi = psi;
    }

    fn image(&self) -> Array4<T> {
        let zero = T::zero();
        self.conv
            .crop_estimate(&self.state.estimate)
            .mapv(|v| v.max(zero))
    }
}

/// Eigenvalue of the circular second-difference operator at frequency `k` of `n`.
fn laplacian_eigenvalue(k: usize, n: usize) -> f64 {
    2.0 - 2.0 * (std::f64::consts::TAU * k as f64 / n as f64).cos()
}

fn soft_threshold<T: Real>(v: T, threshold: T) -> T {
    Float::signum(v) * (Float::abs(v) - threshold).max(T::zero())
}

fn shifted_index(i: usize, n: usize, forward: bool) -> usize {
    if forward {
        (i + 1) % n
    } else {
        (i + n - 1) % n
    }
}

/// Circular forward difference `x[i+1] - x[i]` along `axis`.
fn diff<T: Real>(x: &Array4<T>, axis: Axis) -> Array4<T> {
    let n = x.len_of(axis);
    Array4::from_shape_fn(x.dim(), |(d, r, c, ch)| {
        let (nr, nc) = if axis == Axis(1) {
            (shifted_index(r, n, true), c)
        } else {
            (r, shifted_index(c, n, true))
        };
        x[[d, nr, nc, ch]] - x[[d, r, c, ch]]
    })
}

/// Adjoint of [`diff`]: `u[i-1] - u[i]` along `axis`.
fn diff_adjoint<T: Real>(u: &Array4<T>, axis: Axis) -> Array4<T> {
    let n = u.len_of(axis);
    Array4::from_shape_fn(u.dim(), |(d, r, c, ch)| {
        let (pr, pc) = if axis == Axis(1) {
            (shifted_index(r, n, false), c)
        } else {
            (r, shifted_index(c, n, false))
        };
        u[[d, pr, pc, ch]] - u[[d, r, c, ch]]
    })
}
