use crate::error::{ProvisionError, Result};
use crate::platform::{OsFamily, PlatformProfile};
use crate::provision::Stage;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Release download template. `{platform_key}` and `{ext}` are substituted.
pub const DEFAULT_RELEASE_URL_TEMPLATE: &str =
    "https://github.com/LizardByte/build-deps/releases/latest/download/build-deps-{platform_key}{ext}";

/// Root of the extracted prebuilt tree, relative to the checkout.
pub const BUILD_DEPS_DIR: &str = "third-party/build-deps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPolicy {
    /// Upper bound for one whole request, body included.
    pub timeout: Duration,
    pub attempts: u32,
    /// Delay after the first failed attempt; doubles each retry.
    pub initial_backoff: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl DownloadPolicy {
    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Immutable settings for one provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Checkout root; all relative layout hangs off it.
    pub root: PathBuf,
    pub skip_submodules: bool,
    pub skip_packages: bool,
    pub skip_build_deps: bool,
    pub vcpkg_root: PathBuf,
    pub release_url_template: String,
    /// Replaces the per-OS library candidates when set.
    pub library_dirs: Option<Vec<PathBuf>>,
    pub download: DownloadPolicy,
}

impl ProvisionConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip_submodules: false,
            skip_packages: false,
            skip_build_deps: false,
            vcpkg_root: default_vcpkg_root(),
            release_url_template: DEFAULT_RELEASE_URL_TEMPLATE.to_string(),
            library_dirs: None,
            download: DownloadPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.release_url_template.contains("{platform_key}") {
            return Err(ProvisionError::configuration(format!(
                "release URL template must contain {{platform_key}}: {}",
                self.release_url_template
            )));
        }
        if self.download.attempts == 0 {
            return Err(ProvisionError::configuration(
                "download attempts must be at least 1",
            ));
        }
        if self.download.timeout.is_zero() {
            return Err(ProvisionError::configuration(
                "download timeout must be greater than zero",
            ));
        }
        if !self.root.is_dir() {
            return Err(ProvisionError::configuration(format!(
                "checkout root does not exist: {}",
                self.root.display()
            )));
        }
        Ok(())
    }

    pub fn skips(&self, stage: Stage) -> bool {
        match stage {
            Stage::Submodules => self.skip_submodules,
            Stage::Packages => self.skip_packages,
            Stage::Archive => self.skip_build_deps,
        }
    }

    pub fn build_deps_dir(&self) -> PathBuf {
        self.root.join(BUILD_DEPS_DIR)
    }

    /// `third-party/build-deps/dist/<platform_key>`
    pub fn dist_dir(&self, platform_key: &str) -> PathBuf {
        self.build_deps_dir().join("dist").join(platform_key)
    }

    pub fn library_candidates(&self, profile: &PlatformProfile) -> Vec<PathBuf> {
        self.library_dirs
            .clone()
            .unwrap_or_else(|| default_library_candidates(profile.os_family(), profile.arch()))
    }
}

/// `%USERPROFILE%\vcpkg` on Windows, `~/vcpkg` elsewhere.
pub fn default_vcpkg_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vcpkg")
}

/// System library directories probed when the prebuilt archive is missing.
/// First existing directory wins.
///
/// On Linux the multiarch directory for `arch` comes first, so a foreign-arch
/// multilib tree is never suggested.
pub fn default_library_candidates(os_family: OsFamily, arch: &str) -> Vec<PathBuf> {
    let common: &[&str] = match os_family {
        OsFamily::Linux => &["/usr/lib64", "/usr/local/lib", "/usr/lib"],
        OsFamily::Macos => &["/opt/homebrew/lib", "/usr/local/lib"],
        OsFamily::Unknown => &["/usr/local/lib", "/usr/lib"],
        OsFamily::Windows => &[],
    };

    let mut dirs = Vec::new();
    if os_family == OsFamily::Linux {
        dirs.push(PathBuf::from(format!("/usr/lib/{}-linux-gnu", arch)));
    }
    dirs.extend(common.iter().map(Path::new).map(Path::to_path_buf));
    dirs
}
