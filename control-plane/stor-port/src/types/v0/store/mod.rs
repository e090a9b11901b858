/// Store interface and errors.
pub mod definitions;
/// Instance records.
pub mod instance;
/// Network records.
pub mod network;
/// Pool records.
pub mod pool;
/// Profile records.
pub mod profile;
/// Project records.
pub mod project;

pub use definitions::{DependencyRecords, RecoverStore, StoreError};
