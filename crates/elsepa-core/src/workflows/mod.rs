//! # Workflows Module
//!
//! Complete runs of the scattering program, from a settings tree to parsed
//! results.
//!
//! ## Architecture
//!
//! - **ELSCATA Workflow** ([`elscata`]) - Parses and validates the settings against
//!   the `elscata` model, writes the input deck, runs the program in a scratch
//!   directory and collects its `.dat` files as tables or raw text.
//!
//! Backends are chosen with [`crate::engine::config::RunConfig`]; any
//! [`crate::engine::executor::Executor`] can be passed to [`elscata::run_with`].

pub mod elscata;
