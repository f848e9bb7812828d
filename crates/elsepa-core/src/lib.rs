//! # ELSEPA Core Library
//!
//! Typed settings, input generation, execution and output parsing for the
//! ELSEPA elastic scattering program `elscata`.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Units and quantities, the settings tree with its
//!   models, predicates and validation engine, and the readers and writers for the
//!   input deck, TOML settings files and the program's output tables.
//!
//! - **[`engine`]: The Execution Layer.** Locating the program, running it locally or
//!   inside a container, and reporting progress.
//!
//! - **[`workflows`]: The Public API.** A complete run: validate the settings, write
//!   the input deck, execute the program in a scratch directory and collect the
//!   parsed outputs.

pub mod core;
pub mod engine;
pub mod workflows;
