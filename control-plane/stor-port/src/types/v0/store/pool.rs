//! Definition of pool types that can be saved to the metadata store.

use crate::types::v0::transport::{ConfigMap, PoolDescriptor, PoolId, PoolStatus};
use serde::{Deserialize, Serialize};

/// Identity of a pool record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum PoolRecordId {
    /// The pool has no record in the store yet.
    #[default]
    Temporary,
    /// Row id of the pool record.
    Persisted(u64),
}

/// Specification of a pool as recorded in the metadata store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PoolSpec {
    /// Record identity.
    pub id: PoolRecordId,
    /// Name of the pool.
    pub name: PoolId,
    /// Name of the storage driver.
    pub driver: String,
    /// Free form description.
    pub description: String,
    /// Driver specific configuration.
    pub config: ConfigMap,
    /// Status of the pool.
    pub status: PoolStatus,
}

impl PoolSpec {
    /// A pool which is not recorded in the store, built from the given descriptor.
    /// It's considered as created since the pool already exists on the storage.
    pub fn temporary(pool: &PoolDescriptor) -> Self {
        Self {
            id: PoolRecordId::Temporary,
            name: pool.name.clone(),
            driver: pool.driver.clone(),
            description: pool.description.clone(),
            config: pool.config.clone(),
            status: PoolStatus::Created,
        }
    }
    /// Whether the pool has no record in the store.
    pub fn is_temporary(&self) -> bool {
        self.id == PoolRecordId::Temporary
    }
    /// The descriptor of this pool, as passed to the storage backend.
    pub fn descriptor(&self) -> PoolDescriptor {
        PoolDescriptor {
            name: self.name.clone(),
            driver: self.driver.clone(),
            description: self.description.clone(),
            config: self.config.clone(),
        }
    }
}
