//! Real host bindings: `PATH` lookup, subprocesses, HTTP and archive decoding.

use super::{
    CancelToken, CommandOutput, CommandRunner, CommandSpec, Downloader, Extractor, ToolProbe,
};
use crate::error::{FetchError, ProvisionError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

pub struct SystemHost {
    download_timeout: Duration,
    cancel: CancelToken,
}

impl SystemHost {
    pub fn new(download_timeout: Duration, cancel: CancelToken) -> Self {
        Self {
            download_timeout,
            cancel,
        }
    }
}

impl ToolProbe for SystemHost {
    fn has_tool(&self, name: &str) -> bool {
        let locator = if cfg!(windows) { "where" } else { "which" };
        let found = Command::new(locator)
            .arg(name)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        debug!(tool = name, found, "probed tool");
        found
    }
}

impl CommandRunner for SystemHost {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec, cwd = ?spec.cwd, "running");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }

        let spawn_err = |source| ProvisionError::Spawn {
            command: spec.command_line(),
            source,
        };

        if spec.capture {
            let output = cmd.stderr(Stdio::null()).output().map_err(spawn_err)?;
            Ok(CommandOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            })
        } else {
            let status = cmd.status().map_err(spawn_err)?;
            Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                stdout: String::new(),
            })
        }
    }
}

impl Downloader for SystemHost {
    fn download(&self, url: &str, dest: &Path) -> std::result::Result<u64, FetchError> {
        super::fetch_to_file(url, dest, self.download_timeout, &self.cancel)
    }
}

impl Extractor for SystemHost {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        super::extract_archive(archive, dest)
    }
}
