use super::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A storage volume as described by the metadata saved alongside it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeDescriptor {
    /// Name of the volume.
    pub name: String,
    /// Free form description.
    #[serde(default)]
    pub description: String,
    /// Volume configuration.
    #[serde(default)]
    pub config: ConfigMap,
}

/// The backup metadata found on a volume which is not known to the metadata store.
/// Carries the instance and its snapshots, the pool and the volume configuration at the time the
/// metadata was written. Any part may be missing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct VolumeBackup {
    /// The instance which owns the volume, if the volume is an instance volume.
    #[serde(rename = "container", alias = "instance", default)]
    pub instance: Option<InstanceDescriptor>,
    /// Snapshots of the instance, in the order they were taken.
    #[serde(default)]
    pub snapshots: Vec<SnapshotDescriptor>,
    /// The pool the volume was created on.
    #[serde(default)]
    pub pool: Option<PoolDescriptor>,
    /// The volume itself.
    #[serde(default)]
    pub volume: Option<VolumeDescriptor>,
}

impl VolumeBackup {
    /// Return a new backup for the given instance and snapshots.
    pub fn new_instance(instance: InstanceDescriptor, snapshots: Vec<SnapshotDescriptor>) -> Self {
        Self {
            instance: Some(instance),
            snapshots,
            ..Default::default()
        }
    }
    /// Set the pool the volume was created on.
    pub fn with_pool(mut self, pool: PoolDescriptor) -> Self {
        self.pool = Some(pool);
        self
    }
    /// Set the volume description.
    pub fn with_volume(mut self, volume: VolumeDescriptor) -> Self {
        self.volume = Some(volume);
        self
    }
    /// The instance name, if this is an instance volume.
    pub fn instance_name(&self) -> Option<&str> {
        self.instance.as_ref().map(|i| i.name.as_str())
    }
    /// The textual instance type, if this is an instance volume.
    pub fn instance_type(&self) -> Option<&str> {
        self.instance.as_ref().map(|i| i.instance_type.as_str())
    }
    /// The configuration of the volume, if known.
    pub fn volume_config(&self) -> Option<&ConfigMap> {
        self.volume.as_ref().map(|v| &v.config)
    }
}

/// Unknown volumes discovered on a pool, grouped by project name.
pub type ProjectVolumes = BTreeMap<String, Vec<VolumeBackup>>;
