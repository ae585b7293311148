//! End-to-end provisioning runs against a scripted host.

mod common;

use bootstrap_deps::config::ProvisionConfig;
use bootstrap_deps::host::CancelToken;
use bootstrap_deps::manifest::Manifest;
use bootstrap_deps::orchestrator::{
    self, EXIT_INTERRUPTED, EXIT_MISSING_VCS, EXIT_OK, EXIT_PACKAGES,
};
use bootstrap_deps::platform::{OsFamily, PackageManager, PlatformProfile};
use bootstrap_deps::provision::packages::PackageManagerProfile;
use bootstrap_deps::provision::{FailureKind, Stage, StageStatus};
use common::{FakeHost, checkout, tarball};
use std::fs;
use std::time::Duration;

fn linux_apt(arch: &str) -> PlatformProfile {
    PlatformProfile::new(OsFamily::Linux, arch, PackageManager::Apt)
}

fn config(root: &std::path::Path) -> ProvisionConfig {
    let mut config = ProvisionConfig::new(root);
    config.download.initial_backoff = Duration::from_millis(1);
    config.library_dirs = Some(Vec::new());
    config
}

#[test]
fn test_apt_host_with_network_provisions_everything() {
    let root = checkout();
    let manifest = Manifest::embedded().unwrap();
    let host = FakeHost::new(&["sudo", "apt-get", "git"])
        .serving(tarball(&[("lib/libavcodec.a", "codec"), ("include/opus.h", "")]));
    let profile = linux_apt("e2e-ok");
    let config = config(root.path());

    let report = orchestrator::run(&config, &manifest, &profile, &host, &CancelToken::new());

    for stage in Stage::ALL {
        assert_eq!(report.result(stage).unwrap().status, StageStatus::Ok, "{}", stage);
    }
    assert_eq!(report.exit_code(), EXIT_OK);

    let apt = PackageManagerProfile::for_manager(PackageManager::Apt, &manifest.packages).unwrap();
    let expected = format!(
        "sudo apt-get install -y {}",
        apt.translate(&manifest.packages).join(" ")
    );
    let commands = host.commands();
    assert_eq!(commands[0], "git submodule update --init --recursive");
    assert_eq!(commands[1], expected);
    assert!(expected.contains("libavcodec-dev libavformat-dev libavutil-dev libswscale-dev"));

    let dist = config.dist_dir("Linux-e2e-ok");
    assert_eq!(fs::read_to_string(dist.join("lib/libavcodec.a")).unwrap(), "codec");
}

#[test]
fn test_missing_archive_degrades_with_library_advisory() {
    let root = checkout();
    let libs = tempfile::tempdir().unwrap();
    let host = FakeHost::new(&["sudo", "apt-get"]);
    let mut config = config(root.path());
    config.library_dirs = Some(vec![libs.path().to_path_buf()]);

    let report = orchestrator::run(
        &config,
        &Manifest::embedded().unwrap(),
        &linux_apt("e2e-404"),
        &host,
        &CancelToken::new(),
    );

    let archive = report.result(Stage::Archive).unwrap();
    assert_eq!(archive.status, StageStatus::Degraded);
    assert_eq!(host.downloads(), 1);
    assert!(
        report
            .advisories()
            .any(|a| a.contains(&format!("-DFFMPEG_PREPARED_BINARIES={}", libs.path().display())))
    );
    assert_eq!(report.exit_code(), EXIT_OK);
}

#[test]
fn test_skip_switches_run_nothing() {
    let root = tempfile::tempdir().unwrap();
    let host = FakeHost::new(&["sudo", "apt-get"]);
    let mut config = config(root.path());
    config.skip_submodules = true;
    config.skip_packages = true;
    config.skip_build_deps = true;

    let report = orchestrator::run(
        &config,
        &Manifest::embedded().unwrap(),
        &linux_apt("e2e-skip"),
        &host,
        &CancelToken::new(),
    );

    assert!(host.commands().is_empty());
    assert_eq!(host.downloads(), 0);
    assert_eq!(
        report.result(Stage::Packages).unwrap().detail,
        "skipped by --skip-packages"
    );
    assert!(report.results.iter().all(|r| r.status == StageStatus::Skipped));
    assert_eq!(report.exit_code(), EXIT_OK);
}

#[test]
fn test_source_snapshot_exits_with_missing_vcs_code() {
    let root = tempfile::tempdir().unwrap();
    let host = FakeHost::new(&["sudo", "apt-get"]).serving(tarball(&[("lib/a", "")]));

    let report = orchestrator::run(
        &config(root.path()),
        &Manifest::embedded().unwrap(),
        &linux_apt("e2e-snapshot"),
        &host,
        &CancelToken::new(),
    );

    let submodules = report.result(Stage::Submodules).unwrap();
    assert_eq!(submodules.failure, Some(FailureKind::MissingVcsMetadata));
    // later stages still run
    assert_eq!(report.result(Stage::Packages).unwrap().status, StageStatus::Ok);
    assert_eq!(report.result(Stage::Archive).unwrap().status, StageStatus::Ok);
    assert_eq!(report.exit_code(), EXIT_MISSING_VCS);
}

#[test]
fn test_package_manager_failure_exits_two() {
    let root = checkout();
    let host = FakeHost::new(&["sudo", "apt-get"])
        .failing("sudo apt-get")
        .serving(tarball(&[("lib/a", "")]));

    let report = orchestrator::run(
        &config(root.path()),
        &Manifest::embedded().unwrap(),
        &linux_apt("e2e-aptfail"),
        &host,
        &CancelToken::new(),
    );

    assert_eq!(report.result(Stage::Packages).unwrap().status, StageStatus::Failed);
    assert_eq!(
        host.commands().iter().filter(|c| c.starts_with("sudo apt-get")).count(),
        1
    );
    assert_eq!(report.exit_code(), EXIT_PACKAGES);
}

#[test]
fn test_host_without_package_manager_degrades() {
    let root = checkout();
    let host = FakeHost::new(&[]).serving(tarball(&[("lib/a", "")]));
    let profile = PlatformProfile::new(OsFamily::Unknown, "e2e-nopm", PackageManager::None);

    let report = orchestrator::run(
        &config(root.path()),
        &Manifest::embedded().unwrap(),
        &profile,
        &host,
        &CancelToken::new(),
    );

    assert_eq!(report.result(Stage::Packages).unwrap().status, StageStatus::Degraded);
    assert_eq!(host.commands(), vec!["git submodule update --init --recursive"]);
    assert_eq!(report.exit_code(), EXIT_OK);
}

#[test]
fn test_windows_uses_vcpkg_for_packages() {
    let root = checkout();
    let vcpkg_root = tempfile::tempdir().unwrap();
    let host = FakeHost::new(&["git"]);
    let mut config = config(root.path());
    config.vcpkg_root = vcpkg_root.path().join("vcpkg");
    config.skip_build_deps = true;
    let profile = PlatformProfile::new(OsFamily::Windows, "x86_64", PackageManager::None);

    let report = orchestrator::run(
        &config,
        &Manifest::embedded().unwrap(),
        &profile,
        &host,
        &CancelToken::new(),
    );

    assert_eq!(report.result(Stage::Packages).unwrap().status, StageStatus::Ok);
    let commands = host.commands();
    assert!(commands[1].starts_with("git clone https://github.com/microsoft/vcpkg.git"));
    assert!(commands.last().unwrap().contains("install --triplet x64-windows"));
    assert!(!commands.iter().any(|c| c.contains("apt-get")));
}

#[test]
fn test_interrupt_skips_remaining_stages() {
    let root = checkout();
    let host = FakeHost::new(&["sudo", "apt-get"]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = orchestrator::run(
        &config(root.path()),
        &Manifest::embedded().unwrap(),
        &linux_apt("e2e-interrupt"),
        &host,
        &cancel,
    );

    assert!(host.commands().is_empty());
    assert!(report.results.iter().all(|r| r.detail == "interrupted"));
    assert_eq!(report.exit_code(), EXIT_INTERRUPTED);
}

#[test]
fn test_second_run_converges() {
    let root = checkout();
    let archive = tarball(&[("lib/libopus.a", "opus")]);
    let host = FakeHost::new(&["sudo", "apt-get"]).serving(archive);
    let config = config(root.path());
    let manifest = Manifest::embedded().unwrap();
    let profile = linux_apt("e2e-rerun");

    let first = orchestrator::run(&config, &manifest, &profile, &host, &CancelToken::new());
    let second = orchestrator::run(&config, &manifest, &profile, &host, &CancelToken::new());

    assert_eq!(first.exit_code(), EXIT_OK);
    assert_eq!(second.exit_code(), EXIT_OK);
    let dist = config.dist_dir("Linux-e2e-rerun");
    assert_eq!(fs::read_to_string(dist.join("lib/libopus.a")).unwrap(), "opus");
    assert_eq!(fs::read_dir(&dist).unwrap().count(), 1);
}
