use super::CancelToken;
use crate::error::FetchError;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Stream `url` into `dest` with a progress bar.
///
/// The whole request, body included, is bounded by `timeout`. The token is
/// checked between chunks; on any failure the partial file is removed.
pub fn fetch_to_file(
    url: &str,
    dest: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<u64, FetchError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();

    debug!(url, ?timeout, "requesting archive");
    let response = agent
        .get(url)
        .header("User-Agent", concat!("bootstrap-deps/", env!("CARGO_PKG_VERSION")))
        .call()
        .map_err(map_ureq_error)?;

    let total_size = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.blue} [{elapsed_precise}] [{bar:40.green/black}] \
             {bytes}/{total_bytes} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("◐◓◑◒")
        .progress_chars("━━╸");
    let pb = ProgressBar::new(total_size);
    pb.set_style(style);

    let mut reader = response.into_body().into_reader();
    let result = copy_with_progress(&mut reader, dest, &pb, cancel);

    match &result {
        Ok(bytes) => {
            pb.finish_with_message("Download complete");
            info!(url, bytes, "archive downloaded");
        }
        Err(_) => {
            pb.abandon();
            let _ = fs::remove_file(dest);
        }
    }
    result
}

fn copy_with_progress(
    reader: &mut impl Read,
    dest: &Path,
    pb: &ProgressBar,
    cancel: &CancelToken,
) -> Result<u64, FetchError> {
    let mut file = File::create(dest)?;
    let mut buffer = [0; 8192];
    let mut written = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Interrupted);
        }
        let n = reader
            .read(&mut buffer)
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        written += n as u64;
        pb.inc(n as u64);
    }

    file.flush()?;
    Ok(written)
}

fn map_ureq_error(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(code) => FetchError::Status(code),
        ureq::Error::Io(e) => FetchError::Transport(e.to_string()),
        other => FetchError::Transport(other.to_string()),
    }
}
