use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use ndarray::{Array2, ArrayView3, Axis};
use tracing::debug;

use crate::capture::WhiteBalance;
use crate::error::{LenslessError, Result};
use crate::frame::{Frame, Real};
use crate::viz::gamma_correct;

use super::debayer::{demosaic, BayerPattern};

fn bit_depth(img: &DynamicImage) -> u8 {
    match img {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => 16,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => 32,
        _ => 8,
    }
}

/// Load an image file as `(h, w)` for grayscale or `(h, w, 3)` for colour,
/// scaled to [0, 1].
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let depth = bit_depth(&img);
    let (w, h) = (img.width() as usize, img.height() as usize);

    let data = if img.color().has_color() {
        let rgb = img.to_rgb32f();
        ndarray::Array3::from_shape_vec((h, w, 3), rgb.into_raw())
            .map_err(|e| LenslessError::ShapeMismatch(e.to_string()))?
            .into_dyn()
    } else {
        let gray = img.to_luma32f();
        Array2::from_shape_vec((h, w), gray.into_raw())
            .map_err(|e| LenslessError::ShapeMismatch(e.to_string()))?
            .into_dyn()
    };
    debug!(path = %path.display(), h, w, bit_depth = depth, "Loaded image");
    Ok(Frame::new(data, depth))
}

/// Load a raw Bayer capture and demosaic it to RGB.
///
/// 16-bit samples are scaled by `2^nbits_out - 1`, the largest value the
/// sensor writes; other encodings use their own full scale.
pub fn load_bayer(
    path: &Path,
    pattern: BayerPattern,
    gains: WhiteBalance,
    nbits_out: u8,
) -> Result<Frame> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let samples: Vec<f32> = match &img {
        DynamicImage::ImageLuma16(buf) => {
            let full_scale = ((1u32 << nbits_out.clamp(1, 16)) - 1) as f32;
            buf.as_raw().iter().map(|&v| v as f32 / full_scale).collect()
        }
        other => other.to_luma32f().into_raw(),
    };
    let raw = Array2::from_shape_vec((h, w), samples)
        .map_err(|e| LenslessError::ShapeMismatch(e.to_string()))?;
    debug!(
        path = %path.display(),
        %pattern,
        red_gain = gains.red,
        blue_gain = gains.blue,
        "Demosaicing raw capture"
    );
    let rgb = demosaic(&raw, pattern, gains);
    Ok(Frame::new(rgb.into_dyn(), nbits_out))
}

/// Save a `(h, w, c)` image as 8-bit PNG, scaled by its maximum and with an
/// optional display gamma. `c` must be 1 or 3.
pub fn save_image<T: Real>(image: ArrayView3<T>, path: &Path, gamma: Option<f32>) -> Result<()> {
    let (h, w, c) = image.dim();
    let max = image.fold(0.0_f32, |m, &v| m.max(v.as_f64() as f32));
    let scale = if max > 0.0 { 1.0 / max } else { 1.0 };
    let level = |v: T| -> u8 {
        let v = (v.as_f64() as f32 * scale).clamp(0.0, 1.0);
        let v = match gamma {
            Some(g) => gamma_correct(v, g),
            None => v,
        };
        (v * 255.0).round() as u8
    };

    match c {
        1 => {
            let plane = image.index_axis(Axis(2), 0);
            let img = GrayImage::from_fn(w as u32, h as u32, |x, y| {
                Luma([level(plane[[y as usize, x as usize]])])
            });
            img.save_with_format(path, ImageFormat::Png)?;
        }
        3 => {
            let img = RgbImage::from_fn(w as u32, h as u32, |x, y| {
                let (row, col) = (y as usize, x as usize);
                Rgb([
                    level(image[[row, col, 0]]),
                    level(image[[row, col, 1]]),
                    level(image[[row, col, 2]]),
                ])
            });
            img.save_with_format(path, ImageFormat::Png)?;
        }
        other => {
            return Err(LenslessError::ShapeMismatch(format!(
                "cannot encode an image with {other} channels"
            )))
        }
    }
    debug!(path = %path.display(), h, w, channels = c, "Saved image");
    Ok(())
}
