//! Shared fixtures for integration tests.

#![allow(dead_code)]

use bootstrap_deps::error::{FetchError, Result};
use bootstrap_deps::host::{
    CommandOutput, CommandRunner, CommandSpec, Downloader, Extractor, ToolProbe, extract_archive,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A scripted host: fixed tools on PATH, commands that succeed unless they
/// match a failing prefix, and a release endpoint that either serves one
/// archive or answers 404.
pub struct FakeHost {
    tools: HashSet<String>,
    failing_prefixes: Vec<String>,
    archive: Option<Vec<u8>>,
    commands: RefCell<Vec<String>>,
    downloads: Cell<u32>,
}

impl FakeHost {
    pub fn new(tools: &[&str]) -> Self {
        Self {
            tools: tools.iter().map(|t| t.to_string()).collect(),
            failing_prefixes: Vec::new(),
            archive: None,
            commands: RefCell::new(Vec::new()),
            downloads: Cell::new(0),
        }
    }

    pub fn serving(mut self, archive: Vec<u8>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn failing(mut self, prefix: &str) -> Self {
        self.failing_prefixes.push(prefix.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub fn downloads(&self) -> u32 {
        self.downloads.get()
    }
}

impl ToolProbe for FakeHost {
    fn has_tool(&self, name: &str) -> bool {
        self.tools.contains(name)
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let line = spec.command_line();
        self.commands.borrow_mut().push(line.clone());
        if self.failing_prefixes.iter().any(|p| line.starts_with(p)) {
            Ok(CommandOutput::exit(100))
        } else {
            Ok(CommandOutput::ok())
        }
    }
}

impl Downloader for FakeHost {
    fn download(&self, _url: &str, dest: &Path) -> std::result::Result<u64, FetchError> {
        self.downloads.set(self.downloads.get() + 1);
        let archive = self.archive.as_ref().ok_or(FetchError::Status(404))?;
        fs::write(dest, archive)?;
        Ok(archive.len() as u64)
    }
}

impl Extractor for FakeHost {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        extract_archive(archive, dest)
    }
}

/// Gzipped tarball holding `files`.
pub fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (path, body) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, body.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Empty directory with git metadata.
pub fn checkout() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    dir
}
