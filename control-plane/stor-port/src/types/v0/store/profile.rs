use crate::types::v0::transport::{ConfigMap, Devices};
use serde::{Deserialize, Serialize};

/// Specification of a profile as recorded in the metadata store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSpec {
    /// Name of the profile.
    pub name: String,
    /// Project which owns the profile.
    pub project: String,
    /// Free form description.
    #[serde(default)]
    pub description: String,
    /// Configuration applied to the instances using the profile.
    #[serde(default)]
    pub config: ConfigMap,
    /// Devices added to the instances using the profile.
    #[serde(default)]
    pub devices: Devices,
}
