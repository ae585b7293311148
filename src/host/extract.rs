use crate::error::{ProvisionError, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tar::Archive;
use tracing::debug;

/// Unpack a `.zip`, `.tar.gz` or `.tgz` archive into `target_dir`.
///
/// Existing files are overwritten, so re-extracting the same archive
/// converges to the same tree.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    fs::create_dir_all(target_dir)?;
    debug!(archive = %archive_path.display(), target = %target_dir.display(), "extracting");

    if name.ends_with(".zip") {
        extract_zip(archive_path, target_dir)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive_path, target_dir)
    } else {
        Err(ProvisionError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported archive format: {}", archive_path.display()),
        )))
    }
}

fn extract_tar_gz(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_overwrite(true);
    archive.set_preserve_permissions(true);
    archive.unpack(target_dir)?;
    Ok(())
}

fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(io::Error::other)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(io::Error::other)?;
        let outpath = match file.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => continue,
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(p) = outpath.parent()
                && !p.exists()
            {
                fs::create_dir_all(p)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }
    Ok(())
}
