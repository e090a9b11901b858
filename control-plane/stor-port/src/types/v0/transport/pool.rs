use super::*;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

rpc_impl_string_id!(PoolId, "ID of a storage pool, ie its unique name");

/// Status of a storage pool.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Display, EnumString)]
pub enum PoolStatus {
    /// Pool record exists but the pool is not yet created on all members.
    Pending,
    /// Pool has been created.
    Created,
    /// Pool creation failed.
    Errored,
    /// Status is not known.
    Unknown,
}

impl Default for PoolStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Description of a storage pool, either supplied by the user as part of a recovery request or
/// embedded in a volume's saved metadata.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PoolDescriptor {
    /// Name of the pool.
    pub name: PoolId,
    /// Name of the storage driver which manages the pool.
    pub driver: String,
    /// Free form description.
    #[serde(default)]
    pub description: String,
    /// Driver specific pool configuration.
    #[serde(default)]
    pub config: ConfigMap,
}

impl PoolDescriptor {
    /// Return a new `Self` for the given pool `name` and `driver`.
    pub fn new(name: impl Into<PoolId>, driver: &str) -> Self {
        Self {
            name: name.into(),
            driver: driver.to_string(),
            description: String::new(),
            config: ConfigMap::new(),
        }
    }
    /// Add a configuration key to the pool.
    #[must_use]
    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }
}
