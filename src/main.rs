//! # bootstrap-deps CLI Entry Point
//!
//! Parses flags, resolves the host platform once and hands off to the
//! orchestrator. The process exit code comes from the run report.

use anyhow::{Context, Result};
use colored::*;
use std::process::ExitCode;

use bootstrap_deps::cli::{self, Cli};
use bootstrap_deps::host::{CancelToken, SystemHost};
use bootstrap_deps::logging;
use bootstrap_deps::orchestrator::{self, EXIT_CONFIGURATION};
use bootstrap_deps::platform::PlatformProfile;
use bootstrap_deps::ui;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

fn main() -> ExitCode {
    enable_windows_utf8_console();

    let cli = match Cli::try_parse_normalized(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let code = cli::parse_exit_code(&e);
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "x".red(), e);
            ExitCode::from(EXIT_CONFIGURATION)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let manifest = cli
        .load_manifest()
        .context("Failed to load dependency manifest")?;
    let config = cli.into_config().context("Invalid configuration")?;

    let cancel = CancelToken::new();
    if let Err(e) = cancel.install_interrupt_handler() {
        tracing::warn!(error = %e, "Ctrl-C handler not installed");
    }
    let host = SystemHost::new(config.download.timeout, cancel.clone());

    ui::print_banner();
    let profile = PlatformProfile::resolve(&host);
    ui::print_profile(&profile);

    let report = orchestrator::run(&config, &manifest, &profile, &host, &cancel);

    ui::print_summary(&report);
    ui::print_next_steps(&config, &profile);

    if report.interrupted {
        println!("{} Interrupted", "x".red());
    }
    Ok(report.exit_code())
}
