use super::*;

use serde::{Deserialize, Serialize};

/// Recover the volumes found on the given storage pools.
/// Used for both the validation and the import request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RecoverPools {
    /// Pools to scan for unknown volumes, in the order they are processed.
    pub pools: Vec<PoolDescriptor>,
}

impl RecoverPools {
    /// Return a new `Self` from the given pools.
    pub fn new(pools: Vec<PoolDescriptor>) -> Self {
        Self { pools }
    }
}

/// A volume found on a storage pool which has no record in the metadata store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnknownVolume {
    /// Name of the instance which owns the volume.
    pub name: String,
    /// Textual type of the volume's instance.
    #[serde(rename = "type")]
    pub volume_type: String,
    /// Number of instance snapshots saved with the volume.
    pub snapshot_count: usize,
    /// Project which owns the volume.
    pub project: String,
    /// Pool the volume was found on.
    pub pool: String,
}

/// Result of the validation of a recovery request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationResult {
    /// Unknown volumes found on the pools.
    pub unknown_volumes: Vec<UnknownVolume>,
    /// Dependencies of the unknown volumes which are missing, each reported once.
    pub dependency_errors: Vec<String>,
}

impl ValidationResult {
    /// Whether the unknown volumes can be imported.
    pub fn is_importable(&self) -> bool {
        self.dependency_errors.is_empty()
    }
}

/// Reply of the recovery endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecoverReply {
    /// Unknown volumes and the dependency errors which prevent importing them.
    Validation(ValidationResult),
    /// The unknown volumes were imported.
    Empty {},
}

impl RecoverReply {
    /// Get the validation result, if any.
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Validation(result) => Some(result),
            Self::Empty {} => None,
        }
    }
}

/// A missing dependency of an unknown volume.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum DependencyError {
    /// The project which owns the volume does not exist.
    Project {
        /// Name of the project.
        project: String,
    },
    /// A profile applied to the instance does not exist in its effective project.
    Profile {
        /// Name of the profile.
        profile: String,
        /// Project which owns the volume.
        project: String,
    },
    /// A network referenced by a NIC device does not exist or is not created.
    Network {
        /// Name of the network.
        network: String,
        /// Project which owns the volume.
        project: String,
    },
}

impl std::fmt::Display for DependencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project { project } => write!(f, "Project \"{project}\""),
            Self::Profile { profile, project } => {
                write!(f, "Profile \"{profile}\" in project \"{project}\"")
            }
            Self::Network { network, project } => {
                write!(f, "Network \"{network}\" in project \"{project}\"")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_result_wire_format() {
        let result = ValidationResult {
            unknown_volumes: vec![UnknownVolume {
                name: "c1".to_string(),
                volume_type: "container".to_string(),
                snapshot_count: 2,
                project: "default".to_string(),
                pool: "p1".to_string(),
            }],
            dependency_errors: vec![DependencyError::Profile {
                profile: "gpu".to_string(),
                project: "default".to_string(),
            }
            .to_string()],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "UnknownVolumes": [{
                    "name": "c1",
                    "type": "container",
                    "snapshotCount": 2,
                    "project": "default",
                    "pool": "p1"
                }],
                "DependencyErrors": ["Profile \"gpu\" in project \"default\""]
            })
        );
        assert!(!result.is_importable());

        let reply = RecoverReply::Validation(result);
        assert_eq!(serde_json::to_value(&reply).unwrap(), json);
        assert_eq!(
            serde_json::to_value(RecoverReply::Empty {}).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn dependency_error_display() {
        let project = DependencyError::Project {
            project: "p".to_string(),
        };
        assert_eq!(project.to_string(), "Project \"p\"");
        let network = DependencyError::Network {
            network: "br0".to_string(),
            project: "p".to_string(),
        };
        assert_eq!(network.to_string(), "Network \"br0\" in project \"p\"");
    }
}
