use super::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// Configuration of a single device, eg: `type=disk, path=/, pool=default`.
pub type DeviceConfig = ConfigMap;

/// Device config key with the device type.
pub const DEVICE_TYPE: &str = "type";
/// Device type of a disk.
pub const DEVICE_TYPE_DISK: &str = "disk";
/// Device type of a network interface.
pub const DEVICE_TYPE_NIC: &str = "nic";

/// Named set of devices of an instance or profile.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Devices(BTreeMap<String, DeviceConfig>);

/// Failure to find exactly one root disk device.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub), context(suffix(false)))]
pub enum RootDiskError {
    #[snafu(display("No root device could be found"))]
    NoRootDisk {},
    #[snafu(display("More than one root device found: {}", devices.join(", ")))]
    MultipleRootDisks { devices: Vec<String> },
}

/// Whether the device is a root disk: a disk mounted on `/` without a source.
pub fn is_root_disk(device: &DeviceConfig) -> bool {
    device.get(DEVICE_TYPE).map(String::as_str) == Some(DEVICE_TYPE_DISK)
        && device.get("path").map(String::as_str) == Some("/")
        && device.get("source").map_or(true, String::is_empty)
}

impl Devices {
    /// Return a new empty set of devices.
    pub fn new() -> Self {
        Self::default()
    }
    /// Get the device with the given name.
    pub fn get(&self, name: &str) -> Option<&DeviceConfig> {
        self.0.get(name)
    }
    /// Get a mutable reference to the device with the given name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut DeviceConfig> {
        self.0.get_mut(name)
    }
    /// Add or replace the device with the given name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        device: DeviceConfig,
    ) -> Option<DeviceConfig> {
        self.0.insert(name.into(), device)
    }
    /// Whether a device with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
    /// Iterate over the named devices in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeviceConfig)> {
        self.0.iter()
    }
    /// Number of devices.
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// Whether there are no devices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Find the single root disk device.
    pub fn root_disk(&self) -> Result<(&str, &DeviceConfig), RootDiskError> {
        let mut roots = self.0.iter().filter(|(_, device)| is_root_disk(device));
        match (roots.next(), roots.next()) {
            (None, _) => NoRootDisk {}.fail(),
            (Some((name, device)), None) => Ok((name.as_str(), device)),
            (Some(_), Some(_)) => MultipleRootDisks {
                devices: self
                    .0
                    .iter()
                    .filter(|(_, device)| is_root_disk(device))
                    .map(|(name, _)| name.clone())
                    .collect::<Vec<_>>(),
            }
            .fail(),
        }
    }
    /// Networks referenced by the NIC devices, skipping NICs without a network.
    pub fn nic_networks(&self) -> impl Iterator<Item = &str> {
        self.0
            .values()
            .filter(|device| device.get(DEVICE_TYPE).map(String::as_str) == Some(DEVICE_TYPE_NIC))
            .filter_map(|device| device.get("network"))
            .filter(|network| !network.is_empty())
            .map(String::as_str)
    }
    /// Expand the given layers of devices, in order. A device in a later layer replaces a device
    /// with the same name from an earlier layer, eg: profiles in order followed by the instance's
    /// own devices.
    pub fn expand<'a>(layers: impl IntoIterator<Item = &'a Devices>) -> Devices {
        layers.into_iter().fold(Devices::new(), |mut expanded, layer| {
            expanded
                .0
                .extend(layer.0.iter().map(|(name, device)| (name.clone(), device.clone())));
            expanded
        })
    }
}

impl FromIterator<(String, DeviceConfig)> for Devices {
    fn from_iter<T: IntoIterator<Item = (String, DeviceConfig)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Cpu architecture of an instance.
/// Parses the canonical kernel names as well as the distribution aliases.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumString, Display, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Architecture {
    #[strum(
        to_string = "i686",
        serialize = "i386",
        serialize = "i586",
        serialize = "386",
        serialize = "x86",
        serialize = "generic_32"
    )]
    I686,
    #[strum(to_string = "x86_64", serialize = "amd64", serialize = "generic_64")]
    X86_64,
    #[strum(
        to_string = "armv7l",
        serialize = "armel",
        serialize = "armhf",
        serialize = "arm",
        serialize = "armhfp",
        serialize = "armv7a_hardfp",
        serialize = "armv7",
        serialize = "armv7a_vfpv3_hardfp"
    )]
    Armv7l,
    #[strum(to_string = "aarch64", serialize = "arm64", serialize = "arm64_generic")]
    Aarch64,
    #[strum(to_string = "ppc", serialize = "powerpc")]
    Ppc,
    #[strum(to_string = "ppc64", serialize = "powerpc64")]
    Ppc64,
    #[strum(to_string = "ppc64le", serialize = "ppc64el")]
    Ppc64le,
    #[strum(to_string = "s390x")]
    S390x,
    #[strum(to_string = "mips", serialize = "mipsel", serialize = "mipsle")]
    Mips,
    #[strum(to_string = "mips64", serialize = "mips64el", serialize = "mips64le")]
    Mips64,
    #[strum(to_string = "riscv32")]
    Riscv32,
    #[strum(to_string = "riscv64")]
    Riscv64,
}

impl From<Architecture> for String {
    fn from(arch: Architecture) -> Self {
        arch.to_string()
    }
}
impl TryFrom<String> for Architecture {
    type Error = strum::ParseError;

    fn try_from(arch: String) -> Result<Self, Self::Error> {
        arch.parse()
    }
}

/// Kind of instance.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InstanceType {
    /// System container.
    Container,
    /// Virtual machine.
    VirtualMachine,
}

/// An instance as described by the metadata saved alongside its volume.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InstanceDescriptor {
    /// Name of the instance.
    pub name: String,
    /// Free form description.
    #[serde(default)]
    pub description: String,
    /// Textual instance type, eg: `container` or `virtual-machine`.
    #[serde(rename = "type", default)]
    pub instance_type: String,
    /// Textual cpu architecture, eg: `x86_64`.
    pub architecture: String,
    /// Instance configuration.
    #[serde(default)]
    pub config: ConfigMap,
    /// Devices defined on the instance itself.
    #[serde(default)]
    pub devices: Option<Devices>,
    /// Devices of the instance expanded with the devices of its profiles.
    #[serde(default)]
    pub expanded_devices: Option<Devices>,
    /// Names of the profiles applied to the instance, in order.
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Whether the instance is destroyed on shutdown.
    #[serde(default)]
    pub ephemeral: bool,
    /// Whether the instance has saved runtime state.
    #[serde(default)]
    pub stateful: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last time the instance was started.
    #[serde(default)]
    pub last_used_at: DateTime<Utc>,
}

/// An instance snapshot as described by the metadata saved alongside its parent's volume.
/// The `name` is the snapshot's own name, without the parent instance name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SnapshotDescriptor {
    /// Name of the snapshot.
    pub name: String,
    /// Free form description.
    #[serde(default)]
    pub description: String,
    /// Textual cpu architecture, eg: `x86_64`.
    pub architecture: String,
    /// Instance configuration at the time of the snapshot.
    #[serde(default)]
    pub config: ConfigMap,
    /// Devices defined on the instance at the time of the snapshot.
    #[serde(default)]
    pub devices: Option<Devices>,
    /// Expanded devices at the time of the snapshot.
    #[serde(default)]
    pub expanded_devices: Option<Devices>,
    /// Profiles applied at the time of the snapshot.
    #[serde(default)]
    pub profiles: Vec<String>,
    /// Whether the instance was ephemeral.
    #[serde(default)]
    pub ephemeral: bool,
    /// Whether the snapshot includes runtime state.
    #[serde(default)]
    pub stateful: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last time the snapshot was used.
    #[serde(default)]
    pub last_used_at: DateTime<Utc>,
}

/// Request to create an instance or instance snapshot record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreateInstance {
    /// Project which owns the instance.
    pub project: String,
    /// Name of the instance, `<instance>/<snapshot>` for snapshots.
    pub name: String,
    /// Pool holding the instance's root volume.
    pub pool: PoolId,
    /// Kind of instance.
    pub instance_type: InstanceType,
    /// Cpu architecture.
    pub architecture: Architecture,
    /// Whether this is a snapshot record.
    pub snapshot: bool,
    /// Image the instance was created from, if known.
    pub base_image: Option<String>,
    /// Instance configuration.
    pub config: ConfigMap,
    /// Devices defined on the instance itself.
    pub devices: Devices,
    /// Names of the profiles applied to the instance, in order.
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
    /// Configuration of the instance's storage volume record, when it was saved with the volume.
    pub volume_config: Option<ConfigMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(pairs: &[(&str, &str)]) -> DeviceConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn architecture_names_and_aliases() {
        assert_eq!("x86_64".parse::<Architecture>(), Ok(Architecture::X86_64));
        assert_eq!("amd64".parse::<Architecture>(), Ok(Architecture::X86_64));
        assert_eq!("arm64".parse::<Architecture>(), Ok(Architecture::Aarch64));
        assert_eq!("ppc64el".parse::<Architecture>(), Ok(Architecture::Ppc64le));
        assert_eq!(Architecture::Armv7l.to_string(), "armv7l");
        assert!("z80".parse::<Architecture>().is_err());
        assert!("".parse::<Architecture>().is_err());
    }

    #[test]
    fn instance_type_names() {
        assert_eq!("container".parse::<InstanceType>(), Ok(InstanceType::Container));
        assert_eq!(
            "virtual-machine".parse::<InstanceType>(),
            Ok(InstanceType::VirtualMachine)
        );
        assert_eq!(InstanceType::VirtualMachine.to_string(), "virtual-machine");
        assert!("custom".parse::<InstanceType>().is_err());
    }

    #[test]
    fn root_disk_lookup() {
        let mut devices = Devices::new();
        assert_eq!(devices.root_disk(), Err(RootDiskError::NoRootDisk {}));

        devices.insert("data", device(&[("type", "disk"), ("path", "/"), ("source", "/srv")]));
        devices.insert("eth0", device(&[("type", "nic"), ("network", "lxdbr0")]));
        assert_eq!(devices.root_disk(), Err(RootDiskError::NoRootDisk {}));

        devices.insert("root", device(&[("type", "disk"), ("path", "/"), ("pool", "p1")]));
        let (name, root) = devices.root_disk().unwrap();
        assert_eq!(name, "root");
        assert_eq!(root.get("pool").unwrap(), "p1");

        devices.insert("root2", device(&[("type", "disk"), ("path", "/")]));
        assert_eq!(
            devices.root_disk(),
            Err(RootDiskError::MultipleRootDisks {
                devices: vec!["root".to_string(), "root2".to_string()]
            })
        );
    }

    #[test]
    fn expand_layers() {
        let profile: Devices = vec![
            ("root".to_string(), device(&[("type", "disk"), ("path", "/"), ("pool", "p0")])),
            ("eth0".to_string(), device(&[("type", "nic"), ("network", "lxdbr0")])),
        ]
        .into_iter()
        .collect();
        let local: Devices = vec![(
            "root".to_string(),
            device(&[("type", "disk"), ("path", "/"), ("pool", "p1")]),
        )]
        .into_iter()
        .collect();

        let expanded = Devices::expand([&profile, &local]);
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded.get("root").unwrap().get("pool").unwrap(), "p1");
        assert_eq!(expanded.nic_networks().collect::<Vec<_>>(), vec!["lxdbr0"]);
    }
}
