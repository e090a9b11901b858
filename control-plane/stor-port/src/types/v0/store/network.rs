use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Status of a network.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Default, Display, EnumString)]
pub enum NetworkStatus {
    /// Not yet created on all members.
    Pending,
    /// Created and usable.
    #[default]
    Created,
    /// Creation failed.
    Errored,
    /// Status is not known.
    Unknown,
}

/// Specification of a network as recorded in the metadata store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkSpec {
    /// Name of the network.
    pub name: String,
    /// Project which owns the network.
    pub project: String,
    /// Status of the network.
    #[serde(default)]
    pub status: NetworkStatus,
}

impl NetworkSpec {
    /// Whether the network is usable by instances.
    pub fn is_created(&self) -> bool {
        self.status == NetworkStatus::Created
    }
}
