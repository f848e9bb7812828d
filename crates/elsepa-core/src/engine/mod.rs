//! # Engine Module
//!
//! Everything needed to run the `elscata` program once the settings are known.
//!
//! ## Architecture
//!
//! - **Run Configuration** ([`config`]) - Locates the binary and its data directory
//!   and selects a local or container backend through [`config::RunConfigBuilder`]
//! - **Executors** ([`executor`]) - The [`executor::Executor`] trait and the local
//!   process implementation
//! - **Containers** ([`container`]) - Container lifecycle (create, start, copy, exec,
//!   kill, remove) driven through the `docker` CLI
//! - **Progress Reporting** ([`progress`]) - Callback-based progress events for UIs
//! - **Error Handling** ([`error`]) - [`error::EngineError`], wrapping every lower-level failure
//!
//! Executors block on the child process. Callers give each run its own working
//! directory.

pub mod config;
pub mod container;
pub mod error;
pub mod executor;
pub mod progress;
