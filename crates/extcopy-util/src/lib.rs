#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for extcopy.
//!
//! This crate provides pure filesystem helpers with no logging/tracing dependencies.
//! Logging is handled by the callers to keep this library lightweight.

pub mod fs;

pub use fs::{atomic_copy_file, copy_tree, CopyOptions, CopyStats};
