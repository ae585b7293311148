//! Windows package set through vcpkg.
//!
//! Clone and bootstrap vcpkg under the configured root when missing, then
//! install the fixed package list. Like the OS package manager stage, any
//! failure is fatal for the stage and nothing is retried.

use super::{FailureKind, ProvisioningResult, Stage};
use crate::host::{CommandRunner, CommandSpec};
use crate::manifest::VcpkgSpec;
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn executable(root: &Path) -> PathBuf {
    root.join(if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" })
}

fn bootstrap_script(root: &Path) -> PathBuf {
    root.join(if cfg!(windows) {
        "bootstrap-vcpkg.bat"
    } else {
        "bootstrap-vcpkg.sh"
    })
}

pub fn provision(
    vcpkg_root: &Path,
    spec: &VcpkgSpec,
    runner: &impl CommandRunner,
) -> ProvisioningResult {
    match run_steps(vcpkg_root, spec, runner) {
        Ok(detail) => ProvisioningResult::ok(Stage::Packages, detail),
        Err(detail) => ProvisioningResult::failed(Stage::Packages, FailureKind::Vcpkg, detail)
            .with_advisory(format!(
                "Set VcpkgRoot to a writable directory or install the packages manually: \
                 vcpkg install --triplet {} {}",
                spec.triplet,
                spec.packages.join(" ")
            )),
    }
}

fn run_steps(
    vcpkg_root: &Path,
    spec: &VcpkgSpec,
    runner: &impl CommandRunner,
) -> Result<String, String> {
    if vcpkg_root.join(".vcpkg-root").exists() {
        println!("   {} Using vcpkg at {}", "⚡".green(), vcpkg_root.display());
    } else {
        println!("   {} Cloning vcpkg into {}", "⬇".blue(), vcpkg_root.display());
        step(
            runner,
            CommandSpec::new("git")
                .args(["clone", spec.repository.as_str()])
                .arg(vcpkg_root.to_string_lossy()),
        )?;
    }

    if !executable(vcpkg_root).exists() {
        println!("   {} Bootstrapping vcpkg", "🔨".yellow());
        step(
            runner,
            CommandSpec::new(bootstrap_script(vcpkg_root).to_string_lossy())
                .arg("-disableMetrics")
                .current_dir(vcpkg_root),
        )?;
    }

    if spec.packages.is_empty() {
        return Ok("vcpkg ready, no packages listed".to_string());
    }

    step(
        runner,
        CommandSpec::new(executable(vcpkg_root).to_string_lossy())
            .args(["install", "--triplet", spec.triplet.as_str()])
            .args(spec.packages.iter().cloned())
            .current_dir(vcpkg_root),
    )?;

    info!(count = spec.packages.len(), triplet = %spec.triplet, "vcpkg packages installed");
    Ok(format!(
        "{} packages installed with vcpkg ({})",
        spec.packages.len(),
        spec.triplet
    ))
}

fn step(runner: &impl CommandRunner, spec: CommandSpec) -> Result<(), String> {
    println!("   {} {}", "$".dimmed(), spec.command_line().dimmed());
    match runner.run(&spec) {
        Ok(out) if out.success => Ok(()),
        Ok(out) => {
            warn!(command = %spec, code = ?out.code, "vcpkg step failed");
            Err(format!("`{}` exited with {:?}", spec.command_line(), out.code))
        }
        Err(e) => Err(e.to_string()),
    }
}
