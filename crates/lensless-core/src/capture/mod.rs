//! Remote capture: command assembly, execution over the remote shell,
//! diagnostic parsing and frame retrieval.

mod client;
pub mod command;
mod diagnostics;
mod request;
mod transport;

pub use client::{CaptureResult, RemoteCaptureClient, WhiteBalance};
pub use command::{ArgStyle, CommandBuilder};
pub use diagnostics::CaptureDiagnostics;
pub use request::{CaptureRequest, DisplayRequest, OutputMode};
pub use transport::{CommandOutput, RemoteHost, RemoteShell, SshShell};
