use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ndarray::{s, Array3};
use tracing::info;

use crate::capture::{
    CaptureDiagnostics, CaptureRequest, CaptureResult, DisplayRequest, OutputMode,
    RemoteCaptureClient, RemoteShell, WhiteBalance,
};
use crate::compute::{create_backend, ComputeBackend};
use crate::consts::{
    HISTOGRAM_FILENAME, PSF_PLOT_FILENAME, RAW_PLOT_FILENAME, RECONSTRUCTED_FILENAME,
};
use crate::error::{LenslessError, Result};
use crate::finalize::finalize;
use crate::frame::{Frame, Precision, Psf, Real};
use crate::io::image_io::{load_bayer, load_image, save_image};
use crate::io::psf::load_psf;
use crate::prepare::DataPreparer;
use crate::recon::{dispatch, RunOptions};
use crate::viz::save_histogram;

use super::config::{CameraConfig, PipelineConfig};
use super::types::{NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};

/// Where a run writes its files.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSettings {
    pub plot: bool,
    pub save: bool,
    pub dir: PathBuf,
}

impl OutputSettings {
    /// Use the configured output directory, creating it, or the working directory.
    pub fn resolve(config: &PipelineConfig) -> Result<Self> {
        let dir = match &config.output {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => std::env::current_dir()?,
        };
        Ok(Self {
            plot: config.plot,
            save: config.save,
            dir,
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Display the target when configured, capture, and load the retrieved frame.
///
/// The retrieved file is removed once the frame is in memory, or on failure.
fn acquire<S: RemoteShell>(
    config: &PipelineConfig,
    settings: &OutputSettings,
    shell: S,
    reporter: &dyn ProgressReporter,
) -> Result<(Frame, CaptureDiagnostics)> {
    let client = RemoteCaptureClient::new(shell);
    let interpreter = config.rpi.python.as_str();

    if let Some(fp) = &config.fp {
        reporter.begin_stage(PipelineStage::Display);
        client.display(&DisplayRequest::new(interpreter, fp.clone(), &config.display))?;
        info!(seconds = config.capture.delay, "Waiting before capture");
        thread::sleep(Duration::from_secs(config.capture.delay));
        reporter.finish_stage();
    }

    reporter.begin_stage(PipelineStage::Capture);
    let request = CaptureRequest::from_config(interpreter, &config.capture)?;
    let local = settings.path(&format!("{}.png", config.capture.raw_data_fn));
    let capture = client.capture(&request, local)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Loading);
    let frame = load_frame(
        capture.local_file.path(),
        request.mode,
        config,
        Some(&capture),
    )?;
    Ok((frame, capture.diagnostics))
}

/// Display (optional), capture, reconstruct and finalize, reporting progress.
pub fn run_pipeline_reported<S: RemoteShell>(
    config: &PipelineConfig,
    shell: S,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;
    let settings = OutputSettings::resolve(config)?;
    let (frame, diagnostics) = acquire(config, &settings, shell, reporter.as_ref())?;
    let mut output = process(config, &frame, &settings, reporter.as_ref())?;
    output.diagnostics = Some(diagnostics);
    Ok(output)
}

/// Capture only: the returned image is the loaded raw frame. `raw.png` and
/// `histogram.png` are written when saving is enabled.
pub fn capture_reported<S: RemoteShell>(
    config: &PipelineConfig,
    shell: S,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;
    let settings = OutputSettings::resolve(config)?;
    let (frame, diagnostics) = acquire(config, &settings, shell, reporter.as_ref())?;
    let mut written = Vec::new();
    if settings.save {
        write_raw_plots(config, &frame, &settings, &mut written)?;
    }
    reporter.finish_stage();
    Ok(PipelineOutput {
        image: frame.to_hwc()?,
        diagnostics: Some(diagnostics),
        written,
    })
}

/// Run the full capture pipeline.
pub fn run_pipeline<S: RemoteShell>(config: &PipelineConfig, shell: S) -> Result<PipelineOutput> {
    run_pipeline_reported(config, shell, Arc::new(NoOpReporter))
}

/// Reconstruct a local raw frame without any remote interaction.
///
/// Bayer input takes its white balance from `camera.red_gain` and
/// `camera.blue_gain`, which must both be set.
pub fn reconstruct_reported(
    config: &PipelineConfig,
    raw: &Path,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;
    let settings = OutputSettings::resolve(config)?;
    let mode = OutputMode::from_flags(config.capture.rgb, config.capture.gray)?;

    reporter.begin_stage(PipelineStage::Loading);
    let frame = load_frame(raw, mode, config, None)?;
    process(config, &frame, &settings, reporter.as_ref())
}

pub fn reconstruct(config: &PipelineConfig, raw: &Path) -> Result<PipelineOutput> {
    reconstruct_reported(config, raw, Arc::new(NoOpReporter))
}

fn white_balance(camera: &CameraConfig, capture: Option<&CaptureResult>) -> Result<WhiteBalance> {
    match (capture, camera.red_gain, camera.blue_gain) {
        (Some(capture), red, blue) => capture.white_balance(red, blue),
        (None, Some(red), Some(blue)) => Ok(WhiteBalance { red, blue }),
        (None, _, _) => Err(LenslessError::Configuration(
            "camera.red_gain and camera.blue_gain are required for Bayer input without capture output"
                .into(),
        )),
    }
}

fn load_frame(
    path: &Path,
    mode: OutputMode,
    config: &PipelineConfig,
    capture: Option<&CaptureResult>,
) -> Result<Frame> {
    let frame = match mode {
        OutputMode::Bayer => {
            let gains = white_balance(&config.camera, capture)?;
            load_bayer(path, config.camera.bayer_pattern, gains, config.capture.nbits_out)?
        }
        OutputMode::Rgb | OutputMode::Gray => load_image(path)?,
    };
    info!(shape = ?frame.data.shape(), %mode, "Loaded raw frame");
    Ok(frame)
}

/// Everything after the frame is in memory. Expects the Loading stage open.
fn process(
    config: &PipelineConfig,
    frame: &Frame,
    settings: &OutputSettings,
    reporter: &dyn ProgressReporter,
) -> Result<PipelineOutput> {
    let mut written = Vec::new();
    if settings.save {
        write_raw_plots(config, frame, settings, &mut written)?;
    }

    let gray = config.capture.gray;
    let psf = load_psf(&config.camera.psf, config.recon.downsample, gray)?;
    if settings.save {
        let path = settings.path(PSF_PLOT_FILENAME);
        save_image(psf.data.slice(s![0, .., .., ..]), &path, config.recon.gamma)?;
        written.push(path);
    }
    reporter.finish_stage();

    let backend = create_backend(&config.recon.device()?)?;
    let image = match config.recon.dtype {
        Precision::Float32 => {
            reconstruct_typed::<f32>(config, frame, &psf, backend, settings, reporter)?
        }
        Precision::Float64 => {
            reconstruct_typed::<f64>(config, frame, &psf, backend, settings, reporter)?
        }
    };

    if settings.save {
        reporter.begin_stage(PipelineStage::Writing);
        let path = settings.path(RECONSTRUCTED_FILENAME);
        save_image(image.view(), &path, None)?;
        info!(path = %path.display(), "Saved reconstruction");
        written.push(path);
        reporter.finish_stage();
    }

    Ok(PipelineOutput {
        image,
        diagnostics: None,
        written,
    })
}

fn write_raw_plots(
    config: &PipelineConfig,
    frame: &Frame,
    settings: &OutputSettings,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let raw = frame.to_hwc()?;
    let path = settings.path(RAW_PLOT_FILENAME);
    save_image(raw.view(), &path, config.capture.gamma)?;
    written.push(path);
    let path = settings.path(HISTOGRAM_FILENAME);
    save_histogram(raw.view(), &path)?;
    written.push(path);
    Ok(())
}

fn reconstruct_typed<T: Real>(
    config: &PipelineConfig,
    frame: &Frame,
    psf: &Psf,
    backend: Arc<dyn ComputeBackend>,
    settings: &OutputSettings,
    reporter: &dyn ProgressReporter,
) -> Result<Array3<f32>> {
    reporter.begin_stage(PipelineStage::Preparation);
    let preparer = DataPreparer::new(Arc::clone(&backend));
    let (data, psf) = preparer.prepare::<T>(frame, psf)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Reconstruction);
    let options = RunOptions {
        gamma: config.recon.gamma,
        plot: settings.plot,
        save: settings.save.then(|| settings.dir.clone()),
    };
    let algorithm = config.recon.algorithm_config()?;
    let result = dispatch(&algorithm, psf, data, backend, &options)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Finalizing);
    let image = finalize(result, &config.postproc)?;
    reporter.finish_stage();
    Ok(image.mapv(|v| v.as_f64() as f32))
}
