//! Dependency manifest.
//!
//! The submodule list, the logical package set and the vcpkg package list are
//! fixed configuration: embedded from `deps.toml` at build time, or replaced
//! wholesale by a file passed with `--manifest`.

use crate::error::{ProvisionError, Result};
use crate::platform::PackageManager;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const EMBEDDED: &str = include_str!("deps.toml");

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(rename = "submodule", default)]
    pub submodules: Vec<SubmoduleEntry>,
    #[serde(rename = "package", default)]
    pub packages: Vec<LogicalPackage>,
    #[serde(default)]
    pub vcpkg: VcpkgSpec,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SubmoduleEntry {
    pub path: String,
    #[serde(rename = "nested", default)]
    pub has_nested_submodules: bool,
}

impl SubmoduleEntry {
    pub fn new(path: impl Into<String>, has_nested_submodules: bool) -> Self {
        Self {
            path: path.into(),
            has_nested_submodules,
        }
    }
}

/// A manager-agnostic dependency and its per-manager package names.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogicalPackage {
    pub name: String,
    /// Category shown in manual installation advice.
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub apt: Vec<String>,
    #[serde(default)]
    pub dnf: Vec<String>,
    #[serde(default)]
    pub pacman: Vec<String>,
    #[serde(default)]
    pub brew: Vec<String>,
}

impl LogicalPackage {
    pub fn names_for(&self, manager: PackageManager) -> &[String] {
        match manager {
            PackageManager::Apt => &self.apt,
            PackageManager::Dnf => &self.dnf,
            PackageManager::Pacman => &self.pacman,
            PackageManager::Brew => &self.brew,
            PackageManager::None => &[],
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VcpkgSpec {
    #[serde(default = "default_vcpkg_repository")]
    pub repository: String,
    #[serde(default = "default_vcpkg_triplet")]
    pub triplet: String,
    #[serde(default)]
    pub packages: Vec<String>,
}

impl Default for VcpkgSpec {
    fn default() -> Self {
        Self {
            repository: default_vcpkg_repository(),
            triplet: default_vcpkg_triplet(),
            packages: Vec::new(),
        }
    }
}

fn default_vcpkg_repository() -> String {
    "https://github.com/microsoft/vcpkg.git".to_string()
}

fn default_vcpkg_triplet() -> String {
    "x64-windows".to_string()
}

impl Manifest {
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProvisionError::manifest(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for package in &self.packages {
            if package.name.trim().is_empty() {
                return Err(ProvisionError::manifest("package with empty name"));
            }
            if !seen.insert(package.name.as_str()) {
                return Err(ProvisionError::manifest(format!(
                    "duplicate package '{}'",
                    package.name
                )));
            }
        }

        for entry in &self.submodules {
            let path = Path::new(&entry.path);
            let escapes = path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir));
            if entry.path.trim().is_empty()
                || path.is_absolute()
                || entry.path.starts_with(['/', '\\'])
                || escapes
            {
                return Err(ProvisionError::manifest(format!(
                    "submodule path must be relative: '{}'",
                    entry.path
                )));
            }
        }
        Ok(())
    }
}

/// Distinct hint categories in declaration order.
pub fn manual_hints(packages: &[LogicalPackage]) -> Vec<&str> {
    let mut seen = HashSet::new();
    packages
        .iter()
        .filter_map(|p| p.hint.as_deref())
        .filter(|h| seen.insert(*h))
        .collect()
}
