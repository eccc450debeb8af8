#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use lensless_core::capture::{CommandOutput, RemoteShell};
use lensless_core::error::Result;
use lensless_core::pipeline::config::PipelineConfig;
use toml::Value;

/// Camera output with both white-balance gains.
pub const CAMERA_STDOUT: &str = "Exposure time: 20000\nAnalog gain: 1.0\nRed gain: 1.8\nBlue gain: 1.4\n";

/// In-memory stand-in for the capture host.
///
/// Every command is recorded. `fetch` copies `frame` to the requested local
/// path; without a frame it fails like a missing remote file.
#[derive(Default)]
pub struct FakeShell {
    pub stdout: String,
    pub stderr: String,
    pub frame: Option<PathBuf>,
    pub commands: RefCell<Vec<String>>,
    pub fetched: RefCell<Vec<(String, PathBuf)>>,
    pub pushed: RefCell<Vec<(PathBuf, String)>>,
}

impl FakeShell {
    pub fn new(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            ..Self::default()
        }
    }

    pub fn with_frame(mut self, frame: &Path) -> Self {
        self.frame = Some(frame.to_path_buf());
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    pub fn last_command(&self) -> String {
        self.commands.borrow().last().cloned().unwrap_or_default()
    }
}

impl RemoteShell for FakeShell {
    fn execute(&self, command: &str) -> Result<CommandOutput> {
        self.commands.borrow_mut().push(command.to_string());
        Ok(CommandOutput {
            stdout: self.stdout.as_bytes().to_vec(),
            stderr: self.stderr.as_bytes().to_vec(),
        })
    }

    fn fetch(&self, remote: &str, local: &Path) -> Result<()> {
        self.fetched
            .borrow_mut()
            .push((remote.to_string(), local.to_path_buf()));
        match &self.frame {
            Some(frame) => {
                fs::copy(frame, local)?;
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, remote.to_string()).into()),
        }
    }

    fn push(&self, local: &Path, remote: &str) -> Result<()> {
        self.pushed
            .borrow_mut()
            .push((local.to_path_buf(), remote.to_string()));
        Ok(())
    }
}

/// RGB image whose channels follow a smooth pattern.
pub fn write_rgb_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (20 + (x * 7 + y * 3) % 200) as u8,
            (40 + (x * 5 + y * 11) % 180) as u8,
            (10 + (x * 13 + y * 2) % 160) as u8,
        ])
    });
    img.save(path).unwrap();
}

/// Grayscale image with a gradient.
pub fn write_gray_png(path: &Path, width: u32, height: u32) {
    let img = GrayImage::from_fn(width, height, |x, y| Luma([(30 + (x * 3 + y * 5) % 200) as u8]));
    img.save(path).unwrap();
}

/// 16-bit single-channel Bayer mosaic with 12-bit samples.
pub fn write_bayer_png(path: &Path, width: u32, height: u32) {
    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(width, height, |x, y| {
        Luma([(200 + (x * 37 + y * 53) % 3500) as u16])
    });
    img.save(path).unwrap();
}

/// RGB PSF: a dim background with a few bright spots away from the top-left
/// background window.
pub fn write_psf_png(path: &Path, size: u32) {
    let spots = [(size * 5 / 8, size * 5 / 8), (size * 3 / 4, size / 2), (size / 2, size * 7 / 8)];
    let img = RgbImage::from_fn(size, size, |x, y| {
        if spots.iter().any(|&(sx, sy)| x.abs_diff(sx) <= 1 && y.abs_diff(sy) <= 1) {
            Rgb([250, 240, 230])
        } else {
            Rgb([10, 12, 8])
        }
    });
    img.save(path).unwrap();
}

/// Small, fast configuration: 64x64 PSF downsampled to 32x32, a few FISTA
/// iterations, everything written to `dir/out`.
pub fn small_config(dir: &Path) -> PipelineConfig {
    let psf = dir.join("psf.png");
    write_psf_png(&psf, 64);

    let mut config = PipelineConfig::default();
    config.rpi.username = Some("pi".into());
    config.rpi.hostname = Some("localhost".into());
    config.camera.psf = psf;
    config.capture.delay = 0;
    config.recon.downsample = 2;
    config.recon.algo = "fista".into();
    config.recon.fista.insert("n_iter".into(), Value::Integer(4));
    config.recon.fista.insert("disp_iter".into(), Value::Integer(2));
    config.recon.admm.insert("n_iter".into(), Value::Integer(2));
    config.output = Some(dir.join("out"));
    config.save = true;
    config
}
