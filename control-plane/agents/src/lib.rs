#![warn(missing_docs)]
//! Volume recovery agent library.
//!
//! Scans storage pools for volumes which the metadata store lost track of, validates that every
//! record those volumes depend on exists and, when asked to, recreates the missing records,
//! undoing all of the partial work should any step fail.

mod common;

/// Agent level errors.
pub use common::errors;

/// The recovery engine and its service.
pub mod recover;
