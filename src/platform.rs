//! Host platform resolution.
//!
//! A [`PlatformProfile`] is resolved once per run and is read-only afterwards.
//! Package manager detection is a pure function over a [`ToolProbe`], so any
//! host can be simulated in tests.

use crate::host::{CommandRunner, CommandSpec, ToolProbe};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Linux,
    Windows,
    Macos,
    Unknown,
}

impl OsFamily {
    /// The family this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else if cfg!(windows) {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::Macos
        } else {
            OsFamily::Unknown
        }
    }

    /// Name used in platform keys, matching `uname -s` spelling.
    pub fn key_name(self) -> &'static str {
        match self {
            OsFamily::Linux => "Linux",
            OsFamily::Windows => "Windows",
            OsFamily::Macos => "Darwin",
            OsFamily::Unknown => "Unknown",
        }
    }

    pub fn archive_extension(self) -> &'static str {
        match self {
            OsFamily::Windows => ".zip",
            _ => ".tar.gz",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::Linux => "Linux",
            OsFamily::Windows => "Windows",
            OsFamily::Macos => "macOS",
            OsFamily::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Apt,
    Dnf,
    Pacman,
    Brew,
    None,
}

impl PackageManager {
    /// Detection order; first match wins.
    pub const PROBE_ORDER: [PackageManager; 4] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Pacman,
        PackageManager::Brew,
    ];

    /// Binary whose presence identifies the manager.
    ///
    /// apt is probed as `apt-get`: macOS ships an unrelated `/usr/bin/apt`.
    pub fn binary(self) -> Option<&'static str> {
        match self {
            PackageManager::Apt => Some("apt-get"),
            PackageManager::Dnf => Some("dnf"),
            PackageManager::Pacman => Some("pacman"),
            PackageManager::Brew => Some("brew"),
            PackageManager::None => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
            PackageManager::Brew => "brew",
            PackageManager::None => "none",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First manager in [`PackageManager::PROBE_ORDER`] whose binary is present.
pub fn detect_package_manager(probe: &impl ToolProbe) -> PackageManager {
    PackageManager::PROBE_ORDER
        .into_iter()
        .find(|m| m.binary().is_some_and(|bin| probe.has_tool(bin)))
        .unwrap_or(PackageManager::None)
}

/// Platform key used for archive names and the `dist/` directory.
///
/// Windows archives are only published for x86_64, so that branch ignores
/// `arch`.
pub fn platform_key(os_family: OsFamily, arch: &str) -> String {
    match os_family {
        OsFamily::Windows => "Windows-x86_64".to_string(),
        other => format!("{}-{}", other.key_name(), arch),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    os_family: OsFamily,
    arch: String,
    package_manager: PackageManager,
}

impl PlatformProfile {
    pub fn new(
        os_family: OsFamily,
        arch: impl Into<String>,
        package_manager: PackageManager,
    ) -> Self {
        Self {
            os_family,
            arch: arch.into(),
            package_manager,
        }
    }

    /// Probe the running host. Never fails: unrecognized hosts degrade to
    /// `Unknown` / `None`.
    pub fn resolve<H: ToolProbe + CommandRunner>(host: &H) -> Self {
        let os_family = OsFamily::current();
        let arch = host_arch(os_family, host);
        let package_manager = match os_family {
            OsFamily::Windows => PackageManager::None,
            _ => detect_package_manager(host),
        };

        debug!(%os_family, %arch, %package_manager, "resolved platform profile");
        Self::new(os_family, arch, package_manager)
    }

    pub fn os_family(&self) -> OsFamily {
        self.os_family
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    pub fn platform_key(&self) -> String {
        platform_key(self.os_family, &self.arch)
    }
}

/// Ask `uname -m` on POSIX hosts; fall back to the compile-time architecture.
fn host_arch(os_family: OsFamily, runner: &impl CommandRunner) -> String {
    if os_family != OsFamily::Windows
        && let Ok(output) = runner.run(&CommandSpec::new("uname").arg("-m").captured())
        && output.success
    {
        let arch = output.stdout.trim();
        if !arch.is_empty() {
            return arch.to_string();
        }
    }
    std::env::consts::ARCH.to_string()
}
