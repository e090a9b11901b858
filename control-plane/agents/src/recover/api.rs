use crate::errors::BackendError;
use stor_port::types::v0::{
    store::{instance::InstanceSpec, pool::PoolSpec},
    transport::ProjectVolumes,
};

/// Storage backend of the pools being recovered.
/// Every call identifies the pool by its current spec which may be temporary, ie not recorded
/// in the metadata store.
#[async_trait::async_trait]
pub trait PoolBackend: Send + Sync {
    /// Check the pool's configuration against the schema of its driver.
    async fn validate_config(&self, pool: &PoolSpec) -> Result<(), BackendError>;
    /// Mount the pool.
    /// Returns true if this call mounted the pool or false if it was already mounted.
    async fn mount(&self, pool: &PoolSpec) -> Result<bool, BackendError>;
    /// Unmount the pool.
    async fn unmount(&self, pool: &PoolSpec) -> Result<(), BackendError>;
    /// List the volumes on the pool which have no record in the metadata store, grouped by
    /// project. Fails with `BackendError::NotImplemented` if the driver can't list them.
    async fn list_unknown_volumes(&self, pool: &PoolSpec) -> Result<ProjectVolumes, BackendError>;
    /// Recreate the mount path and symlinks of the recorded instance and its snapshots.
    async fn import_instance(
        &self,
        pool: &PoolSpec,
        instance: &InstanceSpec,
    ) -> Result<(), BackendError>;
    /// Apply the root disk quota of the instance.
    async fn set_instance_quota(
        &self,
        pool: &PoolSpec,
        instance: &InstanceSpec,
        size: Option<&str>,
        state_size: Option<&str>,
    ) -> Result<(), BackendError>;
}
