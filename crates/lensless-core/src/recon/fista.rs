use ndarray::{Array3, Array4, Zip};
use serde::Deserialize;

use crate::consts::{EPSILON, FISTA_STEP_SCALE};
use crate::frame::Real;

use super::convolve::Convolver;
use super::Reconstructor;

/// FISTA parameters. `disp_iter` is handled by the dispatcher.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FistaParams {
    pub n_iter: usize,
    /// Initial momentum.
    pub tk: f64,
}

impl Default for FistaParams {
    fn default() -> Self {
        Self {
            n_iter: 300,
            tk: 1.0,
        }
    }
}

/// Accelerated proximal gradient descent with a non-negativity prox.
pub struct Fista<T: Real> {
    conv: Convolver<T>,
    params: FistaParams,
    alpha: T,
    mask: Array3<T>,
    padded_data: Array3<T>,
    estimate: Array4<T>,
    momentum_point: Array4<T>,
    tk: T,
}

impl<T: Real> Fista<T> {
    pub fn new(psf: &Array4<T>, params: FistaParams, parallel: bool) -> Self {
        let conv = Convolver::new(psf, parallel);
        let lipschitz = conv.gram_max().max(T::real(EPSILON));
        let alpha = T::real(FISTA_STEP_SCALE) / lipschitz;
        let mask = conv.sensor_mask();
        let (ph, pw) = conv.padded_dim();
        let padded_data = Array3::zeros((ph, pw, conv.channels()));
        let estimate = Array4::zeros(conv.estimate_dim());
        let tk = T::real(params.tk);
        Self {
            momentum_point: estimate.clone(),
            conv,
            params,
            alpha,
            mask,
            padded_data,
            estimate,
            tk,
        }
    }

    pub fn step_size(&self) -> T {
        self.alpha
    }
}

impl<T: Real> Reconstructor<T> for Fista<T> {
    fn name(&self) -> &'static str {
        "FISTA"
    }

    fn n_iter(&self) -> usize {
        self.params.n_iter
    }

    fn set_data(&mut self, data: &Array4<T>) {
        self.padded_data = self.conv.pad_measurement(data);
        self.estimate.fill(T::zero());
        self.momentum_point.fill(T::zero());
        self.tk = T::real(self.params.tk);
    }

    fn step(&mut self) {
        let mut residual = self.conv.forward(&self.momentum_point);
        Zip::from(&mut residual)
            .and_broadcast(&self.mask)
            .and(&self.padded_data)
            .for_each(|r, &m, &b| *r = m * *r - b);
        let grad = self.conv.adjoint(&residual);

        let alpha = self.alpha;
        let zero = T::zero();
        let next = Zip::from(&self.momentum_point)
            .and(&grad)
            .map_collect(|&y, &g| (y - alpha * g).max(zero));

        let two = T::real(2.0);
        let t_next = (T::one() + (T::one() + T::real(4.0) * self.tk * self.tk).sqrt()) / two;
        let beta = (self.tk - T::one()) / t_next;
        self.momentum_point = Zip::from(&next)
            .and(&self.estimate)
            .map_collect(|&n, &p| n + beta * (n - p));
        self.estimate = next;
        self.tk = t_next;
    }

    fn image(&self) -> Array4<T> {
        let zero = T::zero();
        self.conv.crop_estimate(&self.estimate).mapv(|v| v.max(zero))
    }
}
