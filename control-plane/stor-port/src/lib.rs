#![allow(clippy::crate_in_macro_def)]

/// Error reporting shared by the recovery transport.
pub mod transport_api;
/// Common types for the various resources used by the recovery components.
pub mod types;
