use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{ArrayView3, Axis};

use crate::consts::{HISTOGRAM_BINS, HISTOGRAM_HEIGHT};
use crate::error::Result;

/// Display gamma on a [0, 1] value: `v^(1/gamma)`.
///
/// gamma > 1.0 brightens midtones, gamma < 1.0 darkens them. Non-positive
/// gammas leave the value unchanged.
pub fn gamma_correct(v: f32, gamma: f32) -> f32 {
    if gamma <= 0.0 {
        return v;
    }
    v.clamp(0.0, 1.0).powf(1.0 / gamma)
}

/// Per-channel counts over [0, 1] in [`HISTOGRAM_BINS`] bins.
pub fn histogram(image: ArrayView3<f32>) -> Vec<Vec<u64>> {
    image
        .axis_iter(Axis(2))
        .map(|plane| {
            let mut counts = vec![0u64; HISTOGRAM_BINS];
            for &v in plane.iter() {
                let bin = (v.clamp(0.0, 1.0) * (HISTOGRAM_BINS - 1) as f32).round() as usize;
                counts[bin] += 1;
            }
            counts
        })
        .collect()
}

/// Render per-channel histograms as overlaid bar charts, one bin per column.
///
/// Single-channel images draw in white; RGB draws each channel in its colour.
pub fn render_histogram(image: ArrayView3<f32>) -> RgbImage {
    let counts = histogram(image);
    let peak = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f32;
    let mut img = RgbImage::new(HISTOGRAM_BINS as u32, HISTOGRAM_HEIGHT);

    for (channel, bins) in counts.iter().enumerate() {
        for (x, &count) in bins.iter().enumerate() {
            let bar = ((count as f32 / peak) * HISTOGRAM_HEIGHT as f32).round() as u32;
            for y in HISTOGRAM_HEIGHT.saturating_sub(bar)..HISTOGRAM_HEIGHT {
                let Rgb(px) = img.get_pixel_mut(x as u32, y);
                if counts.len() == 1 {
                    *px = [255, 255, 255];
                } else if channel < 3 {
                    px[channel] = 255;
                }
            }
        }
    }
    img
}

/// Write the histogram of `image` to `path` as PNG.
pub fn save_histogram(image: ArrayView3<f32>, path: &Path) -> Result<()> {
    render_histogram(image).save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn histogram_counts_every_pixel() {
        let img = Array3::from_shape_fn((4, 4, 3), |(r, c, ch)| (r + c + ch) as f32 / 9.0);
        let counts = histogram(img.view());
        assert_eq!(counts.len(), 3);
        assert!(counts.iter().all(|bins| bins.iter().sum::<u64>() == 16));
    }

    #[test]
    fn saturated_pixels_land_in_last_bin() {
        let img = Array3::from_elem((2, 3, 1), 1.5_f32);
        assert_eq!(histogram(img.view())[0][HISTOGRAM_BINS - 1], 6);
    }

    #[test]
    fn gamma_of_one_is_identity() {
        assert!((gamma_correct(0.3, 1.0) - 0.3).abs() < 1e-6);
        assert!(gamma_correct(0.25, 2.0) > 0.25);
    }

    #[test]
    fn histogram_image_has_fixed_size() {
        let img = Array3::from_elem((3, 3, 1), 0.5_f32);
        let rendered = render_histogram(img.view());
        assert_eq!(rendered.dimensions(), (HISTOGRAM_BINS as u32, HISTOGRAM_HEIGHT));
        assert_eq!(rendered.get_pixel(128, HISTOGRAM_HEIGHT - 1).0, [255, 255, 255]);
    }
}
