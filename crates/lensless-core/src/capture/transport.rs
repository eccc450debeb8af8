use std::io;
use std::net::ToSocketAddrs;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::consts::SSH_PORT;
use crate::error::{LenslessError, Result};

/// Raw output streams of a remote command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Stderr as text, unmodified apart from lossy UTF-8 decoding.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Command execution and file transfer against the capture host.
pub trait RemoteShell {
    /// Run `command` remotely, blocking until both streams are drained.
    fn execute(&self, command: &str) -> Result<CommandOutput>;

    /// Copy a remote file to `local`.
    fn fetch(&self, remote: &str, local: &Path) -> Result<()>;

    /// Copy `local` to the remote host.
    fn push(&self, local: &Path, remote: &str) -> Result<()>;
}

impl<S: RemoteShell + ?Sized> RemoteShell for &S {
    fn execute(&self, command: &str) -> Result<CommandOutput> {
        (**self).execute(command)
    }

    fn fetch(&self, remote: &str, local: &Path) -> Result<()> {
        (**self).fetch(remote, local)
    }

    fn push(&self, local: &Path, remote: &str) -> Result<()> {
        (**self).push(local, remote)
    }
}

/// Login on the capture host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteHost {
    pub username: String,
    pub hostname: String,
}

impl RemoteHost {
    /// Reject blank credentials.
    pub fn new(username: Option<&str>, hostname: Option<&str>) -> Result<Self> {
        let field = |value: Option<&str>, name: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| LenslessError::Configuration(format!("rpi.{name} must be set")))
        };
        Ok(Self {
            username: field(username, "username")?,
            hostname: field(hostname, "hostname")?,
        })
    }

    /// Check the hostname resolves before any remote work starts.
    pub fn resolve(&self) -> Result<()> {
        let mut addrs = (self.hostname.as_str(), SSH_PORT).to_socket_addrs().map_err(|e| {
            LenslessError::Configuration(format!("cannot resolve host '{}': {e}", self.hostname))
        })?;
        match addrs.next() {
            Some(addr) => {
                debug!(host = %self.hostname, %addr, "Resolved capture host");
                Ok(())
            }
            None => Err(LenslessError::Configuration(format!(
                "host '{}' has no addresses",
                self.hostname
            ))),
        }
    }

    /// `user@host` as passed to ssh and scp.
    pub fn target(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }
}

/// `RemoteShell` backed by the system `ssh` and `scp` binaries.
pub struct SshShell {
    host: RemoteHost,
}

impl SshShell {
    pub fn new(host: RemoteHost) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &RemoteHost {
        &self.host
    }

    fn scp(&self, from: &str, to: &str) -> Result<()> {
        let status = Command::new("scp")
            .arg("-q")
            .arg(from)
            .arg(to)
            .stdin(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("scp {from} {to} failed: {status}")).into())
        }
    }
}

impl RemoteShell for SshShell {
    fn execute(&self, command: &str) -> Result<CommandOutput> {
        debug!(remote = %self.host.target(), command, "ssh");
        let output = Command::new("ssh")
            .arg(self.host.target())
            .arg(command)
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn fetch(&self, remote: &str, local: &Path) -> Result<()> {
        let from = format!("{}:{}", self.host.target(), remote);
        self.scp(&from, &local.to_string_lossy())
    }

    fn push(&self, local: &Path, remote: &str) -> Result<()> {
        let to = format!("{}:{}", self.host.target(), remote);
        self.scp(&local.to_string_lossy(), &to)
    }
}
