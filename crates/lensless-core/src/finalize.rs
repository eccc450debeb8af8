use ndarray::{Array, Array3, ArrayView, Axis, Dimension, Slice};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LenslessError, Result};
use crate::frame::Real;
use crate::recon::ReconstructionResult;

/// Optional crop applied to the reconstruction, as fractions of each axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropSpec {
    /// `[start, end]` fractions of the width (axis 1).
    pub crop_hor: Option<[f64; 2]>,
    /// `[start, end]` fractions of the height (axis 0).
    pub crop_vert: Option<[f64; 2]>,
}

impl CropSpec {
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [("crop_hor", self.crop_hor), ("crop_vert", self.crop_vert)] {
            if let Some([lo, hi]) = range {
                let in_unit = (0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi);
                if !in_unit || lo > hi {
                    return Err(LenslessError::Configuration(format!(
                        "postproc.{name} must satisfy 0 <= start <= end <= 1, got [{lo}, {hi}]"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.crop_hor.is_none() && self.crop_vert.is_none()
    }
}

fn crop_axis<A, D>(image: &mut ArrayView<'_, A, D>, axis: Axis, [lo, hi]: [f64; 2])
where
    D: Dimension,
{
    let n = image.len_of(axis) as f64;
    let (start, end) = ((lo * n) as usize, (hi * n) as usize);
    image.slice_axis_inplace(axis, Slice::from(start..end));
}

/// Crop any array of rank >= 2: horizontal on axis 1 first, then vertical on
/// axis 0. Fractions are truncated to indices.
pub fn apply_crop<A, D>(image: ArrayView<'_, A, D>, spec: &CropSpec) -> Result<Array<A, D>>
where
    A: Clone,
    D: Dimension,
{
    spec.validate()?;
    if image.ndim() < 2 {
        return Err(LenslessError::ShapeMismatch(format!(
            "cannot crop an array of rank {}",
            image.ndim()
        )));
    }
    let mut view = image;
    if let Some(range) = spec.crop_hor {
        crop_axis(&mut view, Axis(1), range);
    }
    if let Some(range) = spec.crop_vert {
        crop_axis(&mut view, Axis(0), range);
    }
    Ok(view.to_owned())
}

/// Take the final estimate, select depth 0, move it to the host and crop.
pub fn finalize<T: Real>(result: ReconstructionResult<T>, spec: &CropSpec) -> Result<Array3<T>> {
    let estimate = result.into_final().to_host();
    if estimate.len_of(Axis(0)) == 0 {
        return Err(LenslessError::ShapeMismatch(
            "reconstruction has no depth planes".into(),
        ));
    }
    let image = estimate.index_axis_move(Axis(0), 0);
    let cropped = apply_crop(image.view(), spec)?;
    debug!(shape = ?cropped.dim(), "Finalized reconstruction");
    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn horizontal_crop_keeps_middle_columns() {
        let img = Array2::from_shape_fn((100, 200), |(_, c)| c as u32);
        let spec = CropSpec {
            crop_hor: Some([0.25, 0.75]),
            crop_vert: None,
        };
        let out = apply_crop(img.view(), &spec).unwrap();
        assert_eq!(out.dim(), (100, 100));
        assert_eq!(out[[0, 0]], 50);
        assert_eq!(out[[99, 99]], 149);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let spec = CropSpec {
            crop_hor: None,
            crop_vert: Some([0.8, 0.2]),
        };
        assert!(matches!(spec.validate(), Err(LenslessError::Configuration(_))));
    }
}
