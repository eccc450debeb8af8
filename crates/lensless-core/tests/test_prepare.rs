use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3, Array4, ArrayD, IxDyn};

use lensless_core::compute::cpu::HostBackend;
use lensless_core::compute::{create_backend, Device};
use lensless_core::error::LenslessError;
use lensless_core::frame::{Background, Frame, Psf};
use lensless_core::prepare::DataPreparer;

fn preparer() -> DataPreparer {
    DataPreparer::new(Arc::new(HostBackend::default()))
}

fn psf(h: usize, w: usize, c: usize) -> Psf {
    Psf {
        data: Array4::from_elem((1, h, w, c), 0.1),
        background: Background::default(),
    }
}

fn l2(data: &Array4<f64>) -> f64 {
    data.iter().map(|v| v * v).sum::<f64>().sqrt()
}

// ---------------------------------------------------------------------------
// Rank handling
// ---------------------------------------------------------------------------

#[test]
fn test_rank2_frame_gets_depth_and_channel_axes() {
    let frame = Frame::new(Array2::from_elem((6, 8), 0.5_f32).into_dyn(), 8);
    let (data, psf) = preparer().prepare::<f64>(&frame, &psf(6, 8, 1)).unwrap();
    assert_eq!(data.dim(), (1, 6, 8, 1));
    assert_eq!(psf.dim(), (1, 6, 8, 1));
}

#[test]
fn test_rank3_and_rank4_frames() {
    let rgb = Frame::new(Array3::from_elem((4, 4, 3), 0.5_f32).into_dyn(), 8);
    let (data, _) = preparer().prepare::<f32>(&rgb, &psf(4, 4, 3)).unwrap();
    assert_eq!(data.dim(), (1, 4, 4, 3));

    let stacked = Frame::new(Array4::from_elem((1, 4, 4, 3), 0.5_f32).into_dyn(), 8);
    let (data, _) = preparer().prepare::<f32>(&stacked, &psf(4, 4, 3)).unwrap();
    assert_eq!(data.dim(), (1, 4, 4, 3));
}

#[test]
fn test_rank1_and_rank5_rejected() {
    for shape in [vec![16], vec![1, 1, 4, 4, 3]] {
        let frame = Frame::new(ArrayD::from_elem(IxDyn(&shape), 0.5_f32), 8);
        let err = preparer().prepare::<f32>(&frame, &psf(4, 4, 3)).unwrap_err();
        assert!(matches!(err, LenslessError::ShapeMismatch(_)), "{shape:?}");
    }
}

#[test]
fn test_channel_mismatch_rejected() {
    let frame = Frame::new(Array3::from_elem((4, 4, 3), 0.5_f32).into_dyn(), 8);
    let err = preparer().prepare::<f32>(&frame, &psf(4, 4, 1)).unwrap_err();
    assert!(matches!(err, LenslessError::ShapeMismatch(_)));
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn test_output_has_unit_norm() {
    let data = Array3::from_shape_fn((8, 8, 3), |(y, x, c)| (y * 8 + x + c) as f32 / 200.0);
    let frame = Frame::new(data.into_dyn(), 8);
    let (prepared, _) = preparer().prepare::<f64>(&frame, &psf(8, 8, 3)).unwrap();
    assert_abs_diff_eq!(l2(prepared.data()), 1.0, epsilon = 1e-9);
}

#[test]
fn test_background_subtracted_and_clipped() {
    let mut data = Array2::from_elem((4, 4), 0.1_f32);
    data[[0, 0]] = 0.6;
    let frame = Frame::new(data.into_dyn(), 8);
    let mut psf = psf(4, 4, 1);
    psf.background = Background::PerChannel(vec![0.2]);

    let (prepared, _) = preparer().prepare::<f64>(&frame, &psf).unwrap();
    let prepared = prepared.data();
    // Only the bright pixel survives the subtraction; it carries all the energy.
    assert_abs_diff_eq!(prepared[[0, 0, 0, 0]], 1.0, epsilon = 1e-9);
    assert_eq!(prepared[[0, 1, 1, 0]], 0.0);
}

#[test]
fn test_frame_below_background_clips_to_zero() {
    let frame = Frame::new(Array2::from_elem((4, 4), 0.1_f32).into_dyn(), 8);
    let mut psf = psf(4, 4, 1);
    psf.background = Background::Scalar(0.2);

    let (prepared, _) = preparer().prepare::<f64>(&frame, &psf).unwrap();
    assert!(prepared.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_all_zero_frame_stays_zero() {
    let frame = Frame::new(Array2::<f32>::zeros((4, 4)).into_dyn(), 8);
    let (prepared, _) = preparer().prepare::<f32>(&frame, &psf(4, 4, 1)).unwrap();
    assert!(prepared.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_frame_resized_to_psf() {
    let frame = Frame::new(Array3::from_elem((16, 12, 3), 0.4_f32).into_dyn(), 8);
    let (prepared, _) = preparer().prepare::<f32>(&frame, &psf(8, 6, 3)).unwrap();
    assert_eq!(prepared.dim(), (1, 8, 6, 3));
    let first = prepared.data()[[0, 0, 0, 0]];
    assert!(prepared.data().iter().all(|&v| (v - first).abs() < 1e-6));
}

#[test]
fn test_tensors_placed_on_backend_device() {
    let backend = create_backend(&Device::Cpu { threads: Some(2) }).unwrap();
    let frame = Frame::new(Array2::from_elem((4, 4), 0.5_f32).into_dyn(), 8);
    let (data, psf) = DataPreparer::new(backend)
        .prepare::<f32>(&frame, &psf(4, 4, 1))
        .unwrap();
    assert_eq!(data.device(), &Device::Cpu { threads: Some(2) });
    assert_eq!(psf.device(), &Device::Cpu { threads: Some(2) });
}
