//! Host capabilities.
//!
//! Every interaction with the outside world goes through one of four narrow
//! traits, so provisioning logic can run against scripted fakes:
//!
//! - [`ToolProbe`] - is a binary on `PATH`?
//! - [`CommandRunner`] - run a subprocess and report its outcome
//! - [`Downloader`] - fetch a URL to a file
//! - [`Extractor`] - unpack an archive into a directory
//!
//! [`SystemHost`] is the real binding used by the binary.

mod download;
mod extract;
mod system;

pub use download::fetch_to_file;
pub use extract::extract_archive;
pub use system::SystemHost;

use crate::error::{FetchError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Capture stdout instead of streaming it to the terminal.
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// The command line as a user would type it.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Outcome of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// Captured stdout; empty unless `capture` was set.
    pub stdout: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: String::new(),
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            success: code == 0,
            code: Some(code),
            stdout: String::new(),
        }
    }
}

pub trait ToolProbe {
    fn has_tool(&self, name: &str) -> bool;
}

pub trait CommandRunner {
    /// Run to completion. `Err` means the process could not be started.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

pub trait Downloader {
    /// Download `url` into `dest`, returning the number of bytes written.
    /// A failed download must not leave a partial file behind.
    fn download(&self, url: &str, dest: &Path) -> std::result::Result<u64, FetchError>;
}

pub trait Extractor {
    /// Unpack `archive` into `dest`, overwriting existing files.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Everything a full provisioning run needs.
pub trait Host: ToolProbe + CommandRunner + Downloader + Extractor {}

impl<T: ToolProbe + CommandRunner + Downloader + Extractor> Host for T {}

/// Shared cancellation flag, flipped by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route Ctrl-C into this token. Can only be installed once per process.
    pub fn install_interrupt_handler(&self) -> std::result::Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, stopping after the current step");
            token.cancel();
        })
    }
}
