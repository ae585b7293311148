//! Command-line interface.
//!
//! Besides the usual GNU-style flags, the PowerShell spellings used by the
//! Windows setup script (`-SkipVcpkg`, `-VcpkgRoot <dir>`, ...) are accepted
//! case-insensitively and rewritten before clap sees them.

use crate::config::{DownloadPolicy, ProvisionConfig, default_vcpkg_root};
use crate::error::Result;
use crate::manifest::Manifest;
use crate::orchestrator::{EXIT_CONFIGURATION, EXIT_OK};
use clap::Parser;
use clap::error::ErrorKind;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "bootstrap-deps")]
#[command(
    about = "Provision submodules, system packages and prebuilt dependencies",
    version = env!("CARGO_PKG_VERSION")
)]
#[command(long_about = None)]
pub struct Cli {
    /// Do not initialize git submodules
    #[arg(long)]
    pub skip_submodules: bool,

    /// Do not install system packages (vcpkg on Windows)
    #[arg(long, visible_alias = "skip-vcpkg")]
    pub skip_packages: bool,

    /// Do not download the prebuilt dependency archive
    #[arg(long)]
    pub skip_build_deps: bool,

    /// Checkout root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// vcpkg installation directory [default: ~/vcpkg]
    #[arg(long, env = "VcpkgRoot")]
    pub vcpkg_root: Option<PathBuf>,

    /// Release URL template with {platform_key} and {ext} placeholders
    #[arg(long, env = "BUILD_DEPS_URL")]
    pub build_deps_url: Option<String>,

    /// Replace the built-in dependency manifest
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// System library directory to suggest when the archive is unavailable (repeatable)
    #[arg(long = "library-dir")]
    pub library_dirs: Vec<PathBuf>,

    /// Download timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub download_timeout: u64,

    /// Download attempts before giving up
    #[arg(long, default_value_t = 3)]
    pub download_attempts: u32,

    /// Show debug logs on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse after rewriting PowerShell-style flags.
    pub fn try_parse_normalized<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        match &self.manifest {
            Some(path) => Manifest::load(path),
            None => Manifest::embedded(),
        }
    }

    pub fn into_config(self) -> Result<ProvisionConfig> {
        let mut config = ProvisionConfig::new(self.root);
        config.skip_submodules = self.skip_submodules;
        config.skip_packages = self.skip_packages;
        config.skip_build_deps = self.skip_build_deps;
        config.vcpkg_root = self.vcpkg_root.unwrap_or_else(default_vcpkg_root);
        if let Some(template) = self.build_deps_url {
            config.release_url_template = template;
        }
        if !self.library_dirs.is_empty() {
            config.library_dirs = Some(self.library_dirs);
        }
        config.download = DownloadPolicy {
            timeout: Duration::from_secs(self.download_timeout),
            attempts: self.download_attempts,
            ..DownloadPolicy::default()
        };

        config.validate()?;
        Ok(config)
    }
}

fn powershell_alias(arg: &str) -> Option<&'static str> {
    let flag = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
    match flag.to_ascii_lowercase().as_str() {
        "skipsubmodules" => Some("--skip-submodules"),
        "skipvcpkg" => Some("--skip-vcpkg"),
        "skippackages" => Some("--skip-packages"),
        "skipbuilddeps" => Some("--skip-build-deps"),
        "vcpkgroot" => Some("--vcpkg-root"),
        _ => None,
    }
}

/// Rewrite PowerShell spellings to their long flags. The program name and
/// every other argument pass through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 {
                return arg;
            }
            match arg.to_str().and_then(powershell_alias) {
                Some(long) => OsString::from(long),
                None => arg,
            }
        })
        .collect()
}

/// Help and version are successful exits; any other parse error is a
/// configuration error.
pub fn parse_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_OK,
        _ => EXIT_CONFIGURATION,
    }
}
