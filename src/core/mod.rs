//! Core business logic module
//!
//! This module contains the packaging pipeline. Process execution and
//! version-control access go through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`scanner`] - Workspace discovery
//! - [`resolver`] - Dependency resolution
//! - [`package_xml`] - ROS package manifest parsing
//! - [`module`] - Module descriptors
//! - [`fingerprint`] - Branch fingerprints and release mode
//! - [`clean`] - Stale build directory removal
//! - [`control`] - Debian metadata transforms
//! - [`builder`] - Per-module build state machine
//! - [`orchestrator`] - Whole-workspace packaging runs
//! - [`manifest`] - Run manifest
//! - [`global_config`] - Global configuration management

pub mod builder;
pub mod clean;
pub mod control;
pub mod fingerprint;
pub mod global_config;
pub mod manifest;
pub mod module;
pub mod orchestrator;
pub mod package_xml;
pub mod resolver;
pub mod scanner;
