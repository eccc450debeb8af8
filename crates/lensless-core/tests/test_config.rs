use lensless_core::compute::Device;
use lensless_core::error::LenslessError;
use lensless_core::frame::Precision;
use lensless_core::io::debayer::BayerPattern;
use lensless_core::pipeline::config::PipelineConfig;
use lensless_core::pipeline::PipelineStage;
use lensless_core::recon::Algorithm;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_default_config_is_valid() {
    PipelineConfig::default().validate().unwrap();
}

#[test]
fn test_default_recon_settings() {
    let config = PipelineConfig::default();
    assert_eq!(config.recon.algo, "admm");
    assert_eq!(config.recon.dtype, Precision::Float32);
    assert_eq!(config.recon.downsample, 4);
    assert_eq!(config.recon.device().unwrap(), Device::Host);
    assert_eq!(config.camera.bayer_pattern, BayerPattern::Rggb);
}

#[test]
fn test_default_roundtrips_through_toml() {
    let text = toml::to_string_pretty(&PipelineConfig::default()).unwrap();
    let parsed: PipelineConfig = toml::from_str(&text).unwrap();
    parsed.validate().unwrap();
    assert_eq!(parsed.capture.exp, 0.02);
    assert_eq!(parsed.recon.admm, PipelineConfig::default().recon.admm);
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_partial_toml_keeps_defaults() {
    let config: PipelineConfig = toml::from_str(
        r#"
        save = true

        [rpi]
        username = "pi"
        hostname = "rpi.local"

        [recon]
        algo = "fista"
        dtype = "float64"

        [recon.fista]
        n_iter = 50
        disp_iter = 10

        [postproc]
        crop_hor = [0.25, 0.75]
        "#,
    )
    .unwrap();
    config.validate().unwrap();
    assert!(config.save);
    assert_eq!(config.rpi.username.as_deref(), Some("pi"));
    assert_eq!(config.recon.dtype, Precision::Float64);
    assert_eq!(config.capture.iso, 100);
    assert_eq!(config.postproc.crop_hor, Some([0.25, 0.75]));

    let algorithm = config.recon.algorithm_config().unwrap();
    let (algo, disp_iter, params) = algorithm.split().unwrap();
    assert_eq!(algo, Algorithm::Fista);
    assert_eq!(disp_iter, 10);
    assert!(!params.contains_key("disp_iter"));
}

#[test]
fn test_invalid_dtype_rejected() {
    let parsed = toml::from_str::<PipelineConfig>("[recon]\ndtype = \"float16\"\n");
    assert!(parsed.is_err());
}

#[test]
fn test_invalid_bayer_pattern_rejected() {
    let parsed = toml::from_str::<PipelineConfig>("[camera]\nbayer_pattern = \"xyzw\"\n");
    assert!(parsed.is_err());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_rgb_and_gray_conflict() {
    let mut config = PipelineConfig::default();
    config.capture.rgb = true;
    config.capture.gray = true;
    assert!(matches!(
        config.validate(),
        Err(LenslessError::Configuration(_))
    ));
}

#[test]
fn test_unsupported_algorithm() {
    let mut config = PipelineConfig::default();
    config.recon.algo = "apgd".into();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("apgd"));
}

#[test]
fn test_bad_crop_rejected() {
    let mut config = PipelineConfig::default();
    config.postproc.crop_vert = Some([0.9, 0.1]);
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_downsample_rejected() {
    let mut config = PipelineConfig::default();
    config.recon.downsample = 0;
    assert!(matches!(
        config.validate(),
        Err(LenslessError::Configuration(_))
    ));
}

#[test]
fn test_output_bit_depth_range() {
    let mut config = PipelineConfig::default();
    for nbits_out in [0, 17] {
        config.capture.nbits_out = nbits_out;
        assert!(config.validate().is_err(), "{nbits_out}");
    }
    config.capture.nbits_out = 16;
    config.validate().unwrap();
}

#[test]
fn test_device_selection() {
    let mut config = PipelineConfig::default();
    config.recon.use_accelerated = true;
    assert_eq!(config.recon.device().unwrap(), Device::Cpu { threads: None });
    config.recon.device = "cpu:4".into();
    assert_eq!(config.recon.device().unwrap(), Device::Cpu { threads: Some(4) });
    config.recon.device = "cuda:0".into();
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_credentials() {
    let config = PipelineConfig::default();
    assert!(config.rpi.host().is_err());
}

// ---------------------------------------------------------------------------
// PipelineStage Display
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_stage_display() {
    assert_eq!(PipelineStage::Capture.to_string(), "Capturing");
    assert_eq!(PipelineStage::Reconstruction.to_string(), "Reconstructing");
}
