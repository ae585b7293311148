//! Stage sequencing and exit status.
//!
//! Stages run in a fixed order, each behind its own skip switch. No stage
//! reads another's result; the [`RunReport`] only exists for reporting.

use crate::config::ProvisionConfig;
use crate::host::{CancelToken, Host};
use crate::manifest::Manifest;
use crate::platform::{OsFamily, PlatformProfile};
use crate::provision::{
    FailureKind, ProvisioningResult, Stage, StageStatus, archive, packages, submodules, vcpkg,
};
use crate::ui;
use tracing::{debug, info};

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIGURATION: u8 = 1;
pub const EXIT_PACKAGES: u8 = 2;
pub const EXIT_MISSING_VCS: u8 = 3;
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<ProvisioningResult>,
    pub interrupted: bool,
}

impl RunReport {
    /// 130 if interrupted, otherwise the code of the first failed stage.
    pub fn exit_code(&self) -> u8 {
        if self.interrupted {
            return EXIT_INTERRUPTED;
        }
        self.results
            .iter()
            .find(|r| r.is_failed())
            .and_then(|r| r.failure)
            .map_or(EXIT_OK, |kind| match kind {
                FailureKind::MissingVcsMetadata => EXIT_MISSING_VCS,
                FailureKind::PackageManager | FailureKind::Vcpkg => EXIT_PACKAGES,
            })
    }

    pub fn result(&self, stage: Stage) -> Option<&ProvisioningResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    pub fn advisories(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .flat_map(|r| r.advisories.iter().map(String::as_str))
    }
}

pub fn run<H: Host>(
    config: &ProvisionConfig,
    manifest: &Manifest,
    profile: &PlatformProfile,
    host: &H,
    cancel: &CancelToken,
) -> RunReport {
    let mut report = RunReport::default();

    for stage in Stage::ALL {
        let result = if cancel.is_cancelled() {
            report.interrupted = true;
            ProvisioningResult::skipped(stage, "interrupted")
        } else if config.skips(stage) {
            ProvisioningResult::skipped(stage, format!("skipped by {}", stage.skip_flag()))
        } else {
            ui::print_stage_header(stage);
            run_stage(stage, config, manifest, profile, host, cancel)
        };

        debug!(%stage, status = %result.status, detail = %result.detail, "stage finished");
        if result.status != StageStatus::Skipped {
            ui::print_stage_result(&result);
        }
        report.results.push(result);
    }

    if cancel.is_cancelled() {
        report.interrupted = true;
    }
    info!(exit_code = report.exit_code(), "provisioning finished");
    report
}

fn run_stage<H: Host>(
    stage: Stage,
    config: &ProvisionConfig,
    manifest: &Manifest,
    profile: &PlatformProfile,
    host: &H,
    cancel: &CancelToken,
) -> ProvisioningResult {
    match stage {
        Stage::Submodules => submodules::provision(&config.root, &manifest.submodules, host),
        Stage::Packages if profile.os_family() == OsFamily::Windows => {
            vcpkg::provision(&config.vcpkg_root, &manifest.vcpkg, host)
        }
        Stage::Packages => packages::install(profile, &manifest.packages, host),
        Stage::Archive => archive::provision(profile, config, host, cancel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stage: Stage, kind: FailureKind) -> ProvisioningResult {
        ProvisioningResult::failed(stage, kind, "boom")
    }

    #[test]
    fn test_clean_run_exits_zero() {
        let report = RunReport {
            results: vec![
                ProvisioningResult::ok(Stage::Submodules, ""),
                ProvisioningResult::skipped(Stage::Packages, ""),
                ProvisioningResult::degraded(Stage::Archive, "").with_advisory("use system libs"),
            ],
            interrupted: false,
        };
        assert_eq!(report.exit_code(), EXIT_OK);
        assert_eq!(report.advisories().collect::<Vec<_>>(), vec!["use system libs"]);
    }

    #[test]
    fn test_first_failure_decides_exit_code() {
        let report = RunReport {
            results: vec![
                failed(Stage::Submodules, FailureKind::MissingVcsMetadata),
                failed(Stage::Packages, FailureKind::PackageManager),
            ],
            interrupted: false,
        };
        assert_eq!(report.exit_code(), EXIT_MISSING_VCS);

        let report = RunReport {
            results: vec![failed(Stage::Packages, FailureKind::Vcpkg)],
            interrupted: false,
        };
        assert_eq!(report.exit_code(), EXIT_PACKAGES);
    }

    #[test]
    fn test_interrupt_wins() {
        let report = RunReport {
            results: vec![failed(Stage::Packages, FailureKind::PackageManager)],
            interrupted: true,
        };
        assert_eq!(report.exit_code(), EXIT_INTERRUPTED);
    }

    #[test]
    fn test_result_lookup_by_stage() {
        let report = RunReport {
            results: vec![ProvisioningResult::ok(Stage::Archive, "extracted")],
            interrupted: false,
        };
        assert_eq!(report.result(Stage::Archive).unwrap().detail, "extracted");
        assert!(report.result(Stage::Packages).is_none());
    }
}
