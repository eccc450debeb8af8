mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array3, Axis};

use common::{write_bayer_png, write_gray_png, write_psf_png, write_rgb_png};
use lensless_core::capture::WhiteBalance;
use lensless_core::error::LenslessError;
use lensless_core::frame::Background;
use lensless_core::io::debayer::BayerPattern;
use lensless_core::io::image_io::{load_bayer, load_image, save_image};
use lensless_core::io::psf::load_psf;
use lensless_core::viz::{histogram, save_histogram};

const UNITY: WhiteBalance = WhiteBalance {
    red: 1.0,
    blue: 1.0,
};

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

#[test]
fn test_load_rgb_and_gray() {
    let dir = tempfile::tempdir().unwrap();
    let rgb = dir.path().join("rgb.png");
    let gray = dir.path().join("gray.png");
    write_rgb_png(&rgb, 12, 8);
    write_gray_png(&gray, 12, 8);

    let frame = load_image(&rgb).unwrap();
    assert_eq!(frame.data.shape(), &[8, 12, 3]);
    assert_eq!(frame.channels(), 3);
    assert_eq!(frame.original_bit_depth, 8);

    let frame = load_image(&gray).unwrap();
    assert_eq!(frame.data.shape(), &[8, 12]);
    assert_eq!(frame.channels(), 1);
    assert!(frame.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_image(&dir.path().join("absent.png")).is_err());
}

#[test]
fn test_load_bayer_demosaics_to_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.png");
    write_bayer_png(&raw, 16, 12);

    let frame = load_bayer(&raw, BayerPattern::Rggb, UNITY, 12).unwrap();
    assert_eq!(frame.data.shape(), &[12, 16, 3]);
    assert_eq!(frame.original_bit_depth, 12);
    // 12-bit samples scaled by 4095 stay within [0, 1].
    assert!(frame.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert!(frame.data.iter().any(|&v| v > 0.5));
}

#[test]
fn test_white_balance_gains_scale_red() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.png");
    write_bayer_png(&raw, 16, 16);

    let plain = load_bayer(&raw, BayerPattern::Rggb, UNITY, 16).unwrap();
    let gains = WhiteBalance {
        red: 2.0,
        blue: 1.0,
    };
    let boosted = load_bayer(&raw, BayerPattern::Rggb, gains, 16).unwrap();
    let red = |f: &lensless_core::frame::Frame| f.data.index_axis(Axis(2), 0).sum();
    let green = |f: &lensless_core::frame::Frame| f.data.index_axis(Axis(2), 1).sum();
    assert_abs_diff_eq!(red(&boosted), 2.0 * red(&plain), epsilon = 1e-3);
    assert_abs_diff_eq!(green(&boosted), green(&plain), epsilon = 1e-6);
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

#[test]
fn test_save_scales_to_max() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    let image = Array3::from_shape_fn((4, 4, 1), |(y, x, _)| (y * 4 + x) as f64 * 1e-3);
    save_image(image.view(), &path, None).unwrap();

    let reloaded = load_image(&path).unwrap();
    assert_abs_diff_eq!(reloaded.data[[3, 3]], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(reloaded.data[[0, 0]], 0.0, epsilon = 1e-6);
}

#[test]
fn test_save_rejects_two_channels() {
    let dir = tempfile::tempdir().unwrap();
    let image = Array3::<f32>::zeros((4, 4, 2));
    let err = save_image(image.view(), &dir.path().join("x.png"), None).unwrap_err();
    assert!(matches!(err, LenslessError::ShapeMismatch(_)));
}

#[test]
fn test_histogram_counts_every_pixel() {
    let image = Array3::from_shape_fn((8, 8, 3), |(y, x, _)| (y * 8 + x) as f32 / 64.0);
    let counts = histogram(image.view());
    assert_eq!(counts.len(), 3);
    for channel in &counts {
        assert_eq!(channel.iter().sum::<u64>(), 64);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("histogram.png");
    save_histogram(image.view(), &path).unwrap();
    assert!(path.exists());
}

// ---------------------------------------------------------------------------
// PSF
// ---------------------------------------------------------------------------

#[test]
fn test_psf_downsampled_and_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("psf.png");
    write_psf_png(&path, 64);

    let psf = load_psf(&path, 4, false).unwrap();
    assert_eq!(psf.dim(), (1, 16, 16, 3));
    let norm = psf.data.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-4);
    assert!(psf.data.iter().all(|&v| v >= 0.0));

    match &psf.background {
        Background::PerChannel(levels) => {
            assert_eq!(levels.len(), 3);
            assert_abs_diff_eq!(levels[0], 10.0 / 255.0, epsilon = 1e-4);
        }
        other => panic!("unexpected background: {other:?}"),
    }
}

#[test]
fn test_gray_psf_collapses_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("psf.png");
    write_psf_png(&path, 32);

    let psf = load_psf(&path, 1, true).unwrap();
    assert_eq!(psf.dim(), (1, 32, 32, 1));
    assert_eq!(psf.background.per_channel(1).unwrap().len(), 1);
}

#[test]
fn test_zero_downsample_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("psf.png");
    write_psf_png(&path, 32);
    assert!(matches!(
        load_psf(&path, 0, false),
        Err(LenslessError::Configuration(_))
    ));
}
