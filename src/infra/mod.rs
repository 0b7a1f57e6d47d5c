//! Infrastructure layer
//!
//! Handles all I/O with the outside world: the filesystem, the git
//! repository, and external processes.

pub mod dirs;
pub mod filesystem;
pub mod git;
pub mod process;
pub mod toolchain;
