//! Provisioning stages.
//!
//! Each stage returns a [`ProvisioningResult`]; results are only ever read by
//! the orchestrator for reporting, never by another stage.
//!
//! - [`submodules`] - recursive submodule init with fallback tiers
//! - [`packages`] - logical package set to OS package manager
//! - [`vcpkg`] - Windows package set through vcpkg
//! - [`archive`] - prebuilt platform archive with a degrade path

pub mod archive;
pub mod packages;
pub mod submodules;
pub mod vcpkg;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Submodules,
    Packages,
    Archive,
}

impl Stage {
    /// Execution order.
    pub const ALL: [Stage; 3] = [Stage::Submodules, Stage::Packages, Stage::Archive];

    pub fn skip_flag(self) -> &'static str {
        match self {
            Stage::Submodules => "--skip-submodules",
            Stage::Packages => "--skip-packages",
            Stage::Archive => "--skip-build-deps",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Submodules => "submodules",
            Stage::Packages => "packages",
            Stage::Archive => "archive",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Ok,
    Skipped,
    /// Finished with a usable but incomplete outcome; advisories explain the
    /// manual step that closes the gap.
    Degraded,
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageStatus::Ok => "ok",
            StageStatus::Skipped => "skipped",
            StageStatus::Degraded => "degraded",
            StageStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a stage failed hard. Drives the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The checkout has no version-control metadata at all.
    MissingVcsMetadata,
    PackageManager,
    Vcpkg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub stage: Stage,
    pub status: StageStatus,
    pub detail: String,
    pub advisories: Vec<String>,
    pub failure: Option<FailureKind>,
}

impl ProvisioningResult {
    fn with_status(stage: Stage, status: StageStatus, detail: impl Into<String>) -> Self {
        Self {
            stage,
            status,
            detail: detail.into(),
            advisories: Vec::new(),
            failure: None,
        }
    }

    pub fn ok(stage: Stage, detail: impl Into<String>) -> Self {
        Self::with_status(stage, StageStatus::Ok, detail)
    }

    pub fn skipped(stage: Stage, detail: impl Into<String>) -> Self {
        Self::with_status(stage, StageStatus::Skipped, detail)
    }

    pub fn degraded(stage: Stage, detail: impl Into<String>) -> Self {
        Self::with_status(stage, StageStatus::Degraded, detail)
    }

    pub fn failed(stage: Stage, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            failure: Some(kind),
            ..Self::with_status(stage, StageStatus::Failed, detail)
        }
    }

    pub fn with_advisory(mut self, advisory: impl Into<String>) -> Self {
        self.advisories.push(advisory.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }
}
