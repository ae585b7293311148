//! Prebuilt dependency archive.
//!
//! Downloads the platform archive from the release endpoint and unpacks it
//! into `third-party/build-deps/dist/<platform_key>`. This stage never fails
//! the run: when the archive is unavailable it points at a system library
//! directory the build can use instead.
//!
//! The archive is staged in a fresh private directory under the system temp
//! dir, removed again once the stage ends.

use super::{ProvisioningResult, Stage};
use crate::config::ProvisionConfig;
use crate::error::FetchError;
use crate::host::{CancelToken, Downloader, Extractor};
use crate::platform::PlatformProfile;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub platform_key: String,
    pub url: String,
    pub destination_dir: PathBuf,
    /// `build-deps-<platform_key><ext>`; the extension selects the decoder.
    pub archive_name: String,
}

impl ArchiveSpec {
    pub fn for_profile(profile: &PlatformProfile, config: &ProvisionConfig) -> Self {
        let platform_key = profile.platform_key();
        let ext = profile.os_family().archive_extension();
        Self {
            url: release_url(&config.release_url_template, &platform_key, ext),
            destination_dir: config.dist_dir(&platform_key),
            archive_name: format!("build-deps-{}{}", platform_key, ext),
            platform_key,
        }
    }
}

pub fn release_url(template: &str, platform_key: &str, ext: &str) -> String {
    template
        .replace("{platform_key}", platform_key)
        .replace("{ext}", ext)
}

pub fn provision<H: Downloader + Extractor>(
    profile: &PlatformProfile,
    config: &ProvisionConfig,
    host: &H,
    cancel: &CancelToken,
) -> ProvisioningResult {
    let spec = ArchiveSpec::for_profile(profile, config);

    if let Err(e) = fs::create_dir_all(&spec.destination_dir) {
        return degrade(
            &spec,
            profile,
            config,
            format!("cannot create {}: {}", spec.destination_dir.display(), e),
        );
    }

    let staging = match tempfile::Builder::new().prefix("build-deps-").tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            return degrade(
                &spec,
                profile,
                config,
                format!("cannot create staging directory: {}", e),
            );
        }
    };
    let archive_path = staging.path().join(&spec.archive_name);

    println!("   {} Downloading {}", "⬇".blue(), spec.url);
    let bytes = match fetch_with_retry(host, &spec.url, &archive_path, config, cancel) {
        Ok(bytes) => bytes,
        Err(e) => {
            discard(staging);
            return degrade(&spec, profile, config, format!("download failed: {}", e));
        }
    };

    println!("   {} Extracting to {}", "📦".cyan(), spec.destination_dir.display());
    let extracted = host.extract(&archive_path, &spec.destination_dir);
    discard(staging);

    match extracted {
        Ok(()) => {
            info!(platform_key = %spec.platform_key, bytes, "prebuilt dependencies extracted");
            ProvisioningResult::ok(
                Stage::Archive,
                format!("{} extracted ({} bytes)", spec.platform_key, bytes),
            )
        }
        Err(e) => degrade(&spec, profile, config, format!("extraction failed: {}", e)),
    }
}

fn discard(staging: tempfile::TempDir) {
    let path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        debug!(path = %path.display(), error = %e, "staging directory not removed");
    }
}

fn fetch_with_retry<D: Downloader>(
    host: &D,
    url: &str,
    dest: &Path,
    config: &ProvisionConfig,
    cancel: &CancelToken,
) -> Result<u64, FetchError> {
    let policy = &config.download;
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Interrupted);
        }
        match host.download(url, dest) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                let delay = policy.backoff_for(attempt);
                warn!(attempt, error = %e, ?delay, "download failed, retrying");
                println!(
                    "   {} Attempt {}/{} failed ({}), retrying in {}s",
                    "!".yellow(),
                    attempt,
                    policy.attempts,
                    e,
                    delay.as_secs_f32()
                );
                sleep_unless_cancelled(delay, cancel);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn sleep_unless_cancelled(delay: Duration, cancel: &CancelToken) {
    let deadline = Instant::now() + delay;
    while !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

/// Archive unavailable: fall back to a system library directory.
fn degrade(
    spec: &ArchiveSpec,
    profile: &PlatformProfile,
    config: &ProvisionConfig,
    detail: String,
) -> ProvisioningResult {
    warn!(platform_key = %spec.platform_key, %detail, "prebuilt archive unavailable");
    println!("   {} Prebuilt dependencies unavailable: {}", "!".yellow(), detail);

    let candidates = config.library_candidates(profile);
    let result = ProvisioningResult::degraded(Stage::Archive, detail);
    match first_existing(&candidates) {
        Some(dir) => {
            println!("   {} Found system libraries in {}", "✓".green(), dir.display());
            result.with_advisory(format!(
                "Configure with -DFFMPEG_PREPARED_BINARIES={} to use system libraries",
                dir.display()
            ))
        }
        None => result
            .with_advisory(format!("Download {} manually", spec.url))
            .with_advisory(format!(
                "Extract it into {}",
                spec.destination_dir.display()
            )),
    }
}

fn first_existing(candidates: &[PathBuf]) -> Option<&Path> {
    candidates.iter().map(PathBuf::as_path).find(|dir| dir.is_dir())
}
