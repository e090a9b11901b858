//! Definition of instance types that can be saved to the metadata store.

use crate::types::v0::transport::{
    Architecture, ConfigMap, CreateInstance, Devices, InstanceType, PoolId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Specification of an instance or instance snapshot as recorded in the metadata store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstanceSpec {
    /// Row id of the record.
    pub id: u64,
    /// Project which owns the instance.
    pub project: String,
    /// Name of the instance, `<instance>/<snapshot>` for snapshots.
    pub name: String,
    /// Pool holding the root volume.
    pub pool: PoolId,
    /// Kind of instance.
    pub instance_type: InstanceType,
    /// Cpu architecture.
    pub architecture: Architecture,
    /// Whether this is a snapshot record.
    pub snapshot: bool,
    /// Image the instance was created from.
    pub base_image: Option<String>,
    /// Instance configuration.
    pub config: ConfigMap,
    /// Devices defined on the instance itself.
    pub devices: Devices,
    /// Profiles applied to the instance, in order.
    pub profiles: Vec<String>,
    /// Free form description.
    pub description: String,
    /// Whether the instance is destroyed on shutdown.
    pub ephemeral: bool,
    /// Whether the instance has saved runtime state.
    pub stateful: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time the instance was used.
    pub last_used_at: DateTime<Utc>,
    /// Configuration of the root volume record.
    pub volume_config: ConfigMap,
}

impl InstanceSpec {
    /// Build the record with the given row id from a creation request.
    pub fn from_request(id: u64, request: &CreateInstance) -> Self {
        Self {
            id,
            project: request.project.clone(),
            name: request.name.clone(),
            pool: request.pool.clone(),
            instance_type: request.instance_type,
            architecture: request.architecture,
            snapshot: request.snapshot,
            base_image: request.base_image.clone(),
            config: request.config.clone(),
            devices: request.devices.clone(),
            profiles: request.profiles.clone(),
            description: request.description.clone(),
            ephemeral: request.ephemeral,
            stateful: request.stateful,
            created_at: request.created_at,
            last_used_at: request.last_used_at,
            volume_config: request.volume_config.clone().unwrap_or_default(),
        }
    }
}
