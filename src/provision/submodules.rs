//! Recursive submodule initialization.
//!
//! Three tiers, each only as needed:
//!
//! 1. one bulk `git submodule update --init --recursive`
//! 2. if that fails, the same command per entry, continuing past failures
//! 3. a recursive init inside every entry flagged as having its own nested
//!    submodules, since outer `--recursive` depth handling differs across
//!    git versions
//!
//! Per-entry failures degrade the stage. Only a checkout with no git
//! metadata at all fails it.

use super::{FailureKind, ProvisioningResult, Stage};
use crate::host::{CommandRunner, CommandSpec};
use crate::manifest::SubmoduleEntry;
use colored::*;
use git2::Repository;
use std::path::Path;
use tracing::{debug, info, warn};

const UPDATE_ARGS: [&str; 4] = ["submodule", "update", "--init", "--recursive"];

pub fn provision(
    root: &Path,
    entries: &[SubmoduleEntry],
    runner: &impl CommandRunner,
) -> ProvisioningResult {
    let repo = match Repository::open(root) {
        Ok(repo) => repo,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "no git metadata");
            println!(
                "   {} {} is not a git checkout",
                "x".red(),
                root.display()
            );
            return ProvisioningResult::failed(
                Stage::Submodules,
                FailureKind::MissingVcsMetadata,
                format!("{} has no git metadata", root.display()),
            )
            .with_advisory(
                "Clone the repository with `git clone --recursive` \
                 instead of using a source snapshot.",
            );
        }
    };

    let mut failures: Vec<String> = Vec::new();
    let bulk_ok = update(runner, root, None);

    if bulk_ok {
        println!("   {} Submodules updated", "✓".green());
    } else {
        println!(
            "   {} Bulk update failed, retrying {} entries individually",
            "!".yellow(),
            entries.len()
        );
        for entry in entries {
            if update(runner, root, Some(&entry.path)) {
                println!("   {} {}", "✓".green(), entry.path);
            } else {
                println!("   {} {}", "x".red(), entry.path);
                failures.push(entry.path.clone());
            }
        }
    }

    for entry in entries.iter().filter(|e| e.has_nested_submodules) {
        let dir = root.join(&entry.path);
        if !dir.is_dir() {
            debug!(path = %entry.path, "nested fixup skipped, directory missing");
            continue;
        }
        if update(runner, &dir, None) {
            debug!(path = %entry.path, "nested submodules initialized");
        } else {
            println!("   {} nested submodules of {}", "x".red(), entry.path);
            failures.push(format!("{} (nested)", entry.path));
        }
    }

    let mut detail = match (bulk_ok, failures.is_empty()) {
        (true, true) => "bulk update succeeded".to_string(),
        (false, true) => "recovered with per-entry updates".to_string(),
        (_, false) => format!("failed: {}", failures.join(", ")),
    };
    if let Some((populated, total)) = populated_count(&repo) {
        info!(populated, total, "submodule population");
        detail.push_str(&format!(" ({}/{} populated)", populated, total));
    }

    if failures.is_empty() {
        ProvisioningResult::ok(Stage::Submodules, detail)
    } else {
        ProvisioningResult::degraded(Stage::Submodules, detail).with_advisory(format!(
            "Re-run `git submodule update --init --recursive` once network access \
             to the failing remotes is restored ({}).",
            failures.join(", ")
        ))
    }
}

/// Run one recursive update in `cwd`, optionally scoped to `path`.
fn update(runner: &impl CommandRunner, cwd: &Path, path: Option<&str>) -> bool {
    let mut spec = CommandSpec::new("git").args(UPDATE_ARGS).current_dir(cwd);
    if let Some(path) = path {
        spec = spec.arg("--").arg(path);
    }

    match runner.run(&spec) {
        Ok(out) if out.success => true,
        Ok(out) => {
            warn!(command = %spec, code = ?out.code, "submodule update failed");
            false
        }
        Err(e) => {
            warn!(command = %spec, error = %e, "submodule update could not start");
            false
        }
    }
}

/// Registered submodules whose working tree is a usable repository.
fn populated_count(repo: &Repository) -> Option<(usize, usize)> {
    let submodules = repo.submodules().ok()?;
    let populated = submodules.iter().filter(|s| s.open().is_ok()).count();
    Some((populated, submodules.len()))
}
