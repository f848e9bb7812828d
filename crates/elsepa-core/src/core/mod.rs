//! # Core Module
//!
//! Stateless building blocks shared by the execution engine and the workflows.
//!
//! ## Architecture
//!
//! - **Units** ([`units`]) - Dimensions, units, quantities and the unit registry
//! - **Settings** ([`settings`]) - The settings tree, field models, predicates and validation
//! - **File I/O** ([`io`]) - The input deck, TOML settings and the output tables
//! - **Program model** ([`elscata`]) - The `elscata` keywords and its output files
//!
//! Nothing in this module starts processes or touches global state; a
//! [`units::UnitRegistry`] is constructed by the caller and passed where it is
//! needed.

pub mod elscata;
pub mod io;
pub mod settings;
pub mod units;
