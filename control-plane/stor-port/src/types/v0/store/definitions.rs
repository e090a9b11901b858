use crate::types::v0::{
    store::{
        instance::InstanceSpec, network::NetworkSpec, pool::PoolSpec, profile::ProfileSpec,
        project::ProjectSpec,
    },
    transport::{CreateInstance, PoolDescriptor, PoolId},
};

/// All errors that can be returned from the metadata store.
#[derive(Debug, Clone, snafu::Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
pub enum StoreError {
    /// Failed to find an entry with the given key.
    #[snafu(display("Entry with key {} not found.", key))]
    MissingEntry { key: String },
    /// An entry with the given key already exists.
    #[snafu(display("Entry with key {} already exists.", key))]
    AlreadyExists { key: String },
    /// Failed to complete a store transaction.
    #[snafu(display("Store transaction failed, reason: '{}'", reason))]
    Transaction { reason: String },
}

impl StoreError {
    /// Whether the entry does not exist.
    pub fn is_missing_entry(&self) -> bool {
        matches!(self, Self::MissingEntry { .. })
    }
}

/// Key of the pool record with the given name.
pub fn pool_key(pool: &PoolId) -> String {
    format!("pools/{pool}")
}
/// Key of the instance record with the given name within the given project.
pub fn instance_key(project: &str, instance: &str) -> String {
    format!("projects/{project}/instances/{instance}")
}

/// The records on which the unknown volumes depend, read within a single transaction.
#[derive(Debug, Clone, Default)]
pub struct DependencyRecords {
    /// All projects.
    pub projects: Vec<ProjectSpec>,
    /// All profiles, of all projects.
    pub profiles: Vec<ProfileSpec>,
    /// All networks, of all projects and in any state.
    pub networks: Vec<NetworkSpec>,
}

/// Metadata store used by the volume recovery.
/// Reads are consistent within each call, no locking is held between calls.
#[async_trait::async_trait]
pub trait RecoverStore: Send + Sync {
    /// Read all projects, profiles and networks in one transaction.
    async fn dependency_records(&self) -> Result<DependencyRecords, StoreError>;
    /// Get the pool record with the given name.
    /// Fails with `StoreError::MissingEntry` if no such pool exists.
    async fn pool(&self, pool: &PoolId) -> Result<PoolSpec, StoreError>;
    /// Create a pool record and the pool's member records.
    async fn create_pool(&self, pool: &PoolDescriptor) -> Result<(), StoreError>;
    /// Delete the pool record with the given name.
    async fn delete_pool(&self, pool: &PoolId) -> Result<(), StoreError>;
    /// Create an instance or instance snapshot record along with its volume record.
    async fn create_instance(&self, request: &CreateInstance) -> Result<InstanceSpec, StoreError>;
    /// Delete the instance or instance snapshot record with the given name.
    async fn delete_instance(&self, project: &str, instance: &str) -> Result<(), StoreError>;
}
