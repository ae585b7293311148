//! Logical package set to OS package manager.
//!
//! The logical list is expanded through the detected manager's name map in
//! declaration order and installed with a single invocation. A failing
//! invocation fails the stage: package manager errors are systemic (broken
//! repositories, no network), so there is no per-package retry.

use super::{FailureKind, ProvisioningResult, Stage};
use crate::host::{CommandRunner, CommandSpec, ToolProbe};
use crate::manifest::{LogicalPackage, manual_hints};
use crate::platform::{PackageManager, PlatformProfile};
use colored::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// How to drive one package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManagerProfile {
    pub manager: PackageManager,
    pub install_command: Vec<String>,
    /// Prefix the install command with `sudo`.
    pub requires_elevation: bool,
    /// Logical package name to manager package names.
    pub package_name_map: HashMap<String, Vec<String>>,
}

impl PackageManagerProfile {
    pub fn for_manager(manager: PackageManager, packages: &[LogicalPackage]) -> Option<Self> {
        let (command, requires_elevation): (&[&str], bool) = match manager {
            PackageManager::Apt => (&["apt-get", "install", "-y"], true),
            PackageManager::Dnf => (&["dnf", "install", "-y"], true),
            PackageManager::Pacman => (&["pacman", "-S", "--needed", "--noconfirm"], true),
            PackageManager::Brew => (&["brew", "install"], false),
            PackageManager::None => return None,
        };

        let package_name_map = packages
            .iter()
            .map(|p| (p.name.clone(), p.names_for(manager).to_vec()))
            .collect();

        Some(Self {
            manager,
            install_command: command.iter().map(|s| s.to_string()).collect(),
            requires_elevation,
            package_name_map,
        })
    }

    /// Expand logical packages, flattening one-to-many mappings.
    ///
    /// Order follows `packages`; a manager package shared by two logical
    /// packages is listed once, at its first position.
    pub fn translate(&self, packages: &[LogicalPackage]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for package in packages {
            let Some(mapped) = self.package_name_map.get(&package.name) else {
                debug!(package = %package.name, manager = %self.manager, "no mapping");
                continue;
            };
            for name in mapped {
                if seen.insert(name.as_str()) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    fn install_spec(&self, names: &[String], elevate: bool) -> CommandSpec {
        let (program, rest) = match self.install_command.split_first() {
            Some((program, rest)) => (program.as_str(), rest),
            None => ("", &[][..]),
        };
        let spec = if elevate {
            CommandSpec::new("sudo").arg(program)
        } else {
            CommandSpec::new(program)
        };
        spec.args(rest.iter().cloned()).args(names.iter().cloned())
    }
}

pub fn install<H: CommandRunner + ToolProbe>(
    profile: &PlatformProfile,
    packages: &[LogicalPackage],
    host: &H,
) -> ProvisioningResult {
    let Some(manager_profile) =
        PackageManagerProfile::for_manager(profile.package_manager(), packages)
    else {
        return manual_install_hint(packages);
    };

    let names = manager_profile.translate(packages);
    if names.is_empty() {
        return ProvisioningResult::ok(
            Stage::Packages,
            format!("nothing to install with {}", manager_profile.manager),
        );
    }

    let elevate = manager_profile.requires_elevation && {
        let has_sudo = host.has_tool("sudo");
        if !has_sudo {
            warn!("sudo not found, running {} unelevated", manager_profile.manager);
            println!(
                "   {} sudo not found, running {} without elevation",
                "!".yellow(),
                manager_profile.manager
            );
        }
        has_sudo
    };

    let spec = manager_profile.install_spec(&names, elevate);
    println!("   {} {}", "$".dimmed(), spec.command_line().dimmed());
    info!(manager = %manager_profile.manager, count = names.len(), "installing packages");

    match host.run(&spec) {
        Ok(out) if out.success => ProvisioningResult::ok(
            Stage::Packages,
            format!("{} packages installed with {}", names.len(), manager_profile.manager),
        ),
        Ok(out) => ProvisioningResult::failed(
            Stage::Packages,
            FailureKind::PackageManager,
            format!(
                "{} exited with {}",
                manager_profile.manager,
                out.code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c))
            ),
        )
        .with_advisory(format!(
            "Fix the package manager state, then run: {}",
            spec.command_line()
        )),
        Err(e) => ProvisioningResult::failed(
            Stage::Packages,
            FailureKind::PackageManager,
            e.to_string(),
        ),
    }
}

/// No supported manager: list what to install by hand, run nothing.
fn manual_install_hint(packages: &[LogicalPackage]) -> ProvisioningResult {
    let hints = manual_hints(packages);

    println!(
        "   {} No supported package manager found (apt, dnf, pacman, brew)",
        "!".yellow()
    );
    ProvisioningResult::degraded(Stage::Packages, "no supported package manager").with_advisory(
        format!(
            "Install development packages manually for: {}",
            hints.join(", ")
        ),
    )
}
