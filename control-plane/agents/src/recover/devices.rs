use super::config::RecoverConfig;
use stor_port::types::v0::{
    store::profile::ProfileSpec,
    transport::{DeviceConfig, Devices, PoolId, DEVICE_TYPE, DEVICE_TYPE_DISK},
};

/// Make sure the instance has a root disk on the given pool.
///
/// In order of preference:
/// 1. a local root disk is kept and moved to the pool;
/// 2. a root disk supplied by the profiles is kept if it's already on the pool;
/// 3. the root disk of the saved expanded devices is copied locally and moved to the pool;
/// 4. a new local root disk is added on the pool.
pub(crate) fn populate_root_disk(
    config: &RecoverConfig,
    pool: &PoolId,
    devices: &mut Devices,
    expanded_devices: &Devices,
    profiles: &[&ProfileSpec],
) {
    let local_root = devices.root_disk().ok().map(|(name, _)| name.to_string());
    if let Some(name) = local_root {
        if let Some(root) = devices.get_mut(&name) {
            root.insert("pool".to_string(), pool.to_string());
        }
        return;
    }

    let profile_devices = Devices::expand(profiles.iter().map(|profile| &profile.devices));
    if let Ok((name, root)) = profile_devices.root_disk() {
        if root.get("pool").map(String::as_str) == Some(pool.as_str()) {
            tracing::debug!(device = name, pool = %pool, "Root disk supplied by profiles");
            return;
        }
    }

    if let Ok((name, root)) = expanded_devices.root_disk() {
        let mut root = root.clone();
        root.insert("pool".to_string(), pool.to_string());
        devices.insert(name, root);
        return;
    }

    let name = config
        .root_device_candidates()
        .find(|candidate| !expanded_devices.contains(candidate))
        .or_else(|| config.root_device_candidates().last())
        .unwrap_or_else(|| config.root_device_name().to_string());
    let root: DeviceConfig = [
        (DEVICE_TYPE, DEVICE_TYPE_DISK),
        ("path", "/"),
        ("pool", pool.as_str()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();
    tracing::debug!(device = %name, pool = %pool, "Adding root disk");
    devices.insert(name, root);
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
    fn devices(entries: &[(&str, DeviceConfig)]) -> Devices {
        entries
            .iter()
            .map(|(name, device)| (name.to_string(), device.clone()))
            .collect()
    }
    fn root_on(pool: &str) -> DeviceConfig {
        device(&[("type", "disk"), ("path", "/"), ("pool", pool)])
    }
    fn profile(devices: Devices) -> ProfileSpec {
        ProfileSpec {
            name: "default".to_string(),
            project: "default".to_string(),
            devices,
            ..Default::default()
        }
    }

    #[test]
    fn local_root_disk_is_moved() {
        let pool = PoolId::from("p1");
        let mut local = devices(&[("rootfs", root_on("old"))]);
        populate_root_disk(&RecoverConfig::default(), &pool, &mut local, &Devices::new(), &[]);
        assert_eq!(local, devices(&[("rootfs", root_on("p1"))]));
    }

    #[test]
    fn profile_root_disk_on_pool() {
        let pool = PoolId::from("p1");
        let profile = profile(devices(&[("root", root_on("p1"))]));
        let mut local = Devices::new();
        populate_root_disk(
            &RecoverConfig::default(),
            &pool,
            &mut local,
            &Devices::new(),
            &[&profile],
        );
        assert!(local.is_empty());
    }

    #[test]
    fn expanded_root_disk_is_copied() {
        let pool = PoolId::from("p1");
        let profile = profile(devices(&[("root", root_on("other"))]));
        let expanded = devices(&[(
            "root",
            device(&[("type", "disk"), ("path", "/"), ("pool", "other"), ("size", "10GiB")]),
        )]);
        let mut local = Devices::new();
        populate_root_disk(&RecoverConfig::default(), &pool, &mut local, &expanded, &[&profile]);
        assert_eq!(
            local,
            devices(&[(
                "root",
                device(&[("type", "disk"), ("path", "/"), ("pool", "p1"), ("size", "10GiB")])
            )])
        );
    }

    #[test]
    fn new_root_disk_avoids_taken_names() {
        let pool = PoolId::from("p1");
        let expanded = devices(&[
            ("root", device(&[("type", "disk"), ("path", "/mnt"), ("source", "/srv")])),
            ("root0", device(&[("type", "nic"), ("network", "lxdbr0")])),
        ]);
        let mut local = Devices::new();
        populate_root_disk(&RecoverConfig::default(), &pool, &mut local, &expanded, &[]);
        assert_eq!(local, devices(&[("root1", root_on("p1"))]));

        let config = RecoverConfig::default().with_root_device_name("rootfs");
        let mut local = Devices::new();
        populate_root_disk(&config, &pool, &mut local, &expanded, &[]);
        assert_eq!(local, devices(&[("rootfs", root_on("p1"))]));
    }
}
