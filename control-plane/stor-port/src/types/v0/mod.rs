#![allow(clippy::derive_partial_eq_without_eq)]

/// All the records which are persisted in the metadata store and the store interface.
pub mod store;
/// All the "transport" types which allow the recovery components to interact with the
/// storage backend and with the caller of the recovery endpoints.
pub mod transport;
