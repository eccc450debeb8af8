use std::path::PathBuf;

use tracing::{debug, info};

use crate::consts::{BLUE_GAIN_KEY, RED_GAIN_KEY};
use crate::error::{LenslessError, Result};
use crate::io::transient::TransientFile;

use super::diagnostics::CaptureDiagnostics;
use super::request::{CaptureRequest, DisplayRequest};
use super::transport::{CommandOutput, RemoteShell};

/// Parsed outcome of one capture.
#[derive(Debug)]
pub struct CaptureResult {
    pub diagnostics: CaptureDiagnostics,
    /// Retrieved frame; deleted when this result drops.
    pub local_file: TransientFile,
}

/// Red/blue white-balance gains applied when demosaicing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WhiteBalance {
    pub red: f64,
    pub blue: f64,
}

impl CaptureResult {
    /// Explicit overrides win; otherwise read the gains the camera reported.
    pub fn white_balance(&self, red: Option<f64>, blue: Option<f64>) -> Result<WhiteBalance> {
        let red = match red {
            Some(g) => g,
            None => self.diagnostics.gain(RED_GAIN_KEY)?,
        };
        let blue = match blue {
            Some(g) => g,
            None => self.diagnostics.gain(BLUE_GAIN_KEY)?,
        };
        Ok(WhiteBalance { red, blue })
    }
}

/// Drives the capture script on the remote host.
pub struct RemoteCaptureClient<S: RemoteShell> {
    shell: S,
}

impl<S: RemoteShell> RemoteCaptureClient<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Run `command`; any stderr output is fatal.
    fn run_checked(&self, command: &str) -> Result<CommandOutput> {
        let output = self.shell.execute(command)?;
        if !output.stderr.is_empty() {
            return Err(LenslessError::RemoteExecution(output.stderr_text()));
        }
        Ok(output)
    }

    /// Trigger a capture, parse its diagnostics and retrieve the frame to
    /// `local_path`.
    pub fn capture(&self, request: &CaptureRequest, local_path: PathBuf) -> Result<CaptureResult> {
        let command = request.command().build();
        info!(command = %command, "Taking picture");

        let output = self.run_checked(&command)?;
        if output.stdout.is_empty() {
            return Err(LenslessError::RemoteExecution(format!(
                "capture produced no output (stderr: '{}')",
                output.stderr_text()
            )));
        }

        let diagnostics = CaptureDiagnostics::from_bytes(&output.stdout);
        for (key, value) in diagnostics.iter() {
            debug!(key, value, "Capture output");
        }

        let local_file = TransientFile::new(local_path);
        let remote = request.remote_file();
        info!(remote = %remote, local = %local_file.path().display(), "Copying over picture");
        self.shell.fetch(&remote, local_file.path())?;

        Ok(CaptureResult {
            diagnostics,
            local_file,
        })
    }

    /// Upload an image and prepare it for the remote screen.
    pub fn display(&self, request: &DisplayRequest) -> Result<()> {
        info!(image = %request.image.display(), "Copying over picture to display");
        self.shell.push(&request.image, &request.upload_path)?;
        let command = request.command().build();
        debug!(command = %command, "Preparing display image");
        self.run_checked(&command)?;
        Ok(())
    }
}
