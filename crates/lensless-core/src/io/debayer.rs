use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::capture::WhiteBalance;

/// Colour filter layout of the sensor, named by the 2x2 cell at (0, 0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BayerPattern {
    #[default]
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

impl BayerPattern {
    /// `(row_parity, col_parity)` of the red sample within the 2x2 cell.
    fn red_position(self) -> (usize, usize) {
        match self {
            Self::Rggb => (0, 0),
            Self::Grbg => (0, 1),
            Self::Gbrg => (1, 0),
            Self::Bggr => (1, 1),
        }
    }
}

impl std::fmt::Display for BayerPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rggb => write!(f, "RGGB"),
            Self::Grbg => write!(f, "GRBG"),
            Self::Gbrg => write!(f, "GBRG"),
            Self::Bggr => write!(f, "BGGR"),
        }
    }
}

/// Bilinear demosaic of a normalized mosaic into `(h, w, 3)` RGB, then apply
/// the red/blue gains and clamp to [0, 1].
pub fn demosaic(raw: &Array2<f32>, pattern: BayerPattern, gains: WhiteBalance) -> Array3<f32> {
    let (h, w) = raw.dim();
    let (r_row, r_col) = pattern.red_position();
    let mut rgb = Array3::<f32>::zeros((h, w, 3));

    for row in 0..h {
        let ri = row as isize;
        let is_red_row = (row % 2) == r_row;
        for col in 0..w {
            let ci = col as isize;
            let is_red_col = (col % 2) == r_col;

            let (r, g, b) = match (is_red_row, is_red_col) {
                (true, true) => (raw[[row, col]], avg_cross(raw, ri, ci), avg_diagonal(raw, ri, ci)),
                // Green on a red row
                (true, false) => (
                    avg_horizontal(raw, ri, ci),
                    raw[[row, col]],
                    avg_vertical(raw, ri, ci),
                ),
                // Green on a blue row
                (false, true) => (
                    avg_vertical(raw, ri, ci),
                    raw[[row, col]],
                    avg_horizontal(raw, ri, ci),
                ),
                (false, false) => (avg_diagonal(raw, ri, ci), avg_cross(raw, ri, ci), raw[[row, col]]),
            };
            rgb[[row, col, 0]] = (r * gains.red as f32).clamp(0.0, 1.0);
            rgb[[row, col, 1]] = g.clamp(0.0, 1.0);
            rgb[[row, col, 2]] = (b * gains.blue as f32).clamp(0.0, 1.0);
        }
    }
    rgb
}

/// Clamped indexing into the mosaic.
#[inline]
fn px(raw: &Array2<f32>, row: isize, col: isize) -> f32 {
    let (h, w) = raw.dim();
    let r = row.clamp(0, h as isize - 1) as usize;
    let c = col.clamp(0, w as isize - 1) as usize;
    raw[[r, c]]
}

#[inline]
fn avg_cross(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r - 1, c) + px(raw, r + 1, c) + px(raw, r, c - 1) + px(raw, r, c + 1)) * 0.25
}

#[inline]
fn avg_diagonal(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r - 1, c - 1)
        + px(raw, r - 1, c + 1)
        + px(raw, r + 1, c - 1)
        + px(raw, r + 1, c + 1))
        * 0.25
}

#[inline]
fn avg_horizontal(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r, c - 1) + px(raw, r, c + 1)) * 0.5
}

#[inline]
fn avg_vertical(raw: &Array2<f32>, r: isize, c: isize) -> f32 {
    (px(raw, r - 1, c) + px(raw, r + 1, c)) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: WhiteBalance = WhiteBalance { red: 1.0, blue: 1.0 };

    #[test]
    fn flat_mosaic_stays_flat() {
        let raw = Array2::from_elem((6, 6), 0.4_f32);
        let rgb = demosaic(&raw, BayerPattern::Rggb, UNIT);
        assert!(rgb.iter().all(|&v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn gains_scale_red_and_blue_only() {
        let raw = Array2::from_elem((4, 4), 0.25_f32);
        let rgb = demosaic(&raw, BayerPattern::Bggr, WhiteBalance { red: 2.0, blue: 3.0 });
        assert!((rgb[[1, 1, 0]] - 0.5).abs() < 1e-6);
        assert!((rgb[[1, 1, 1]] - 0.25).abs() < 1e-6);
        assert!((rgb[[1, 1, 2]] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn red_sites_follow_pattern() {
        let mut raw = Array2::<f32>::zeros((4, 4));
        raw[[2, 1]] = 1.0;
        let rgb = demosaic(&raw, BayerPattern::Grbg, UNIT);
        assert_eq!(rgb[[2, 1, 0]], 1.0);
        assert_eq!(rgb[[2, 1, 1]], 0.0);
    }
}
