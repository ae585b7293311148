//! # bootstrap-deps - build dependency provisioning
//!
//! Prepares a checkout for its first native build: git submodules, OS
//! development packages (or vcpkg on Windows) and a prebuilt platform archive.
//! Safe to re-run; every stage converges on the same state.
//!
//! ## Quick Start
//!
//! ```bash
//! # Everything
//! bootstrap-deps
//!
//! # Only the prebuilt archive
//! bootstrap-deps --skip-submodules --skip-packages
//! ```
//!
//! ## Module Organization
//!
//! - [`platform`] - OS family, architecture and package manager detection
//! - [`provision`] - the individual stages
//! - [`orchestrator`] - stage sequencing and exit status
//! - [`host`] - subprocess, download and extraction capabilities

/// Command-line parsing.
pub mod cli;

/// Run configuration (`ProvisionConfig`).
pub mod config;

/// Error types.
pub mod error;

/// Capability traits and their real implementations.
pub mod host;

/// `tracing` subscriber setup.
pub mod logging;

/// Dependency manifest (`deps.toml`).
pub mod manifest;

/// Stage sequencing.
pub mod orchestrator;

/// Host platform resolution.
pub mod platform;

/// Provisioning stages.
pub mod provision;

/// Console output.
pub mod ui;
