use std::path::Path;

use ndarray::{s, Array3, Axis};
use tracing::info;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, PSF_BACKGROUND_WINDOW};
use crate::error::{LenslessError, Result};
use crate::frame::{Background, Psf};
use crate::prepare::resize;

use super::image_io::load_image;

/// Load a calibration PSF.
///
/// Per channel: estimate the background from a corner window, subtract it and
/// clip at zero. Then downsample by `downsample`, collapse to one channel when
/// `gray` is set, and normalize to unit L2 norm. The returned PSF carries the
/// estimated background so it can be subtracted from measurements.
pub fn load_psf(path: &Path, downsample: usize, gray: bool) -> Result<Psf> {
    if downsample == 0 {
        return Err(LenslessError::Configuration(
            "PSF downsampling factor must be at least 1".into(),
        ));
    }
    let mut psf = load_image(path)?.to_hwc()?;
    let (h, w, c) = psf.dim();

    let (start, end) = PSF_BACKGROUND_WINDOW;
    let (r1, c1) = (end.min(h), end.min(w));
    let mut levels = Vec::with_capacity(c);
    for ch in 0..c {
        let level = if start < r1 && start < c1 {
            psf.slice(s![start..r1, start..c1, ch]).mean().unwrap_or(0.0)
        } else {
            0.0
        };
        psf.index_axis_mut(Axis(2), ch)
            .mapv_inplace(|v| (v - level).max(0.0));
        levels.push(level);
    }

    if downsample > 1 {
        let target = ((h / downsample).max(1), (w / downsample).max(1));
        psf = resize(psf.view(), target);
    }
    let (psf, levels) = if gray && c == 3 {
        (luminance(&psf), vec![weighted(&levels)])
    } else {
        (psf, levels)
    };

    let norm = psf.iter().map(|v| v * v).sum::<f32>().sqrt();
    let psf = if norm > 0.0 { psf / norm } else { psf };

    info!(
        path = %path.display(),
        shape = ?psf.dim(),
        background = ?levels,
        "Loaded PSF"
    );
    Ok(Psf {
        data: psf.insert_axis(Axis(0)),
        background: Background::PerChannel(levels),
    })
}

fn weighted(rgb: &[f32]) -> f32 {
    LUMINANCE_R * rgb[0] + LUMINANCE_G * rgb[1] + LUMINANCE_B * rgb[2]
}

fn luminance(rgb: &Array3<f32>) -> Array3<f32> {
    let (h, w, _) = rgb.dim();
    Array3::from_shape_fn((h, w, 1), |(r, c, _)| {
        weighted(&[rgb[[r, c, 0]], rgb[[r, c, 1]], rgb[[r, c, 2]]])
    })
}
