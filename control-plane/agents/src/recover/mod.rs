/// Collaborator interfaces of the recovery.
pub mod api;
/// Recovery configuration.
pub mod config;
mod devices;
/// Recovery runs.
pub mod engine;
mod import;
pub mod memory;
mod pools;
mod rollback;
mod scanner;
/// Recovery service and routes.
pub mod service;
mod snapshot;
mod validator;


pub use api::PoolBackend;
pub use config::{RecoverArgs, RecoverConfig};
pub use engine::{RecoverMode, Recovery};
pub use service::{RouteTable, Service};
