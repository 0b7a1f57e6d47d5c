//! Rosdeb - ROS workspace to Debian package builder
//!
//! This library turns every ROS package of a catkin workspace into a
//! Debian artifact, building them in dependency order.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Packaging pipeline
//! - [`infra`] - Infrastructure layer (filesystem, processes, git)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
