use super::snapshot::DependencySnapshot;
use indexmap::IndexSet;
use stor_port::types::v0::transport::{DependencyError, ProjectVolumes, VolumeBackup};

/// Checks that the dependencies of the unknown volumes exist.
/// Each missing dependency is reported once, in the order it was first found.
#[derive(Debug, Default)]
pub(crate) struct DependencyValidator {
    errors: IndexSet<DependencyError>,
}

impl DependencyValidator {
    /// Check the unknown volumes of a pool.
    pub(crate) fn check(&mut self, snapshot: &DependencySnapshot, volumes: &ProjectVolumes) {
        for (project, backups) in volumes {
            for backup in backups {
                self.check_volume(snapshot, project, backup);
            }
        }
    }

    fn check_volume(
        &mut self,
        snapshot: &DependencySnapshot,
        project: &str,
        backup: &VolumeBackup,
    ) {
        let Some(instance) = &backup.instance else {
            return;
        };
        let Some(project_spec) = snapshot.project(project) else {
            self.add(DependencyError::Project {
                project: project.to_string(),
            });
            return;
        };

        let profile_project = project_spec.profile_project();
        for profile in &instance.profiles {
            if !snapshot.has_profile(profile_project, profile) {
                self.add(DependencyError::Profile {
                    profile: profile.clone(),
                    project: project.to_string(),
                });
            }
        }

        let networks = instance.expanded_devices.iter().flat_map(|devices| devices.nic_networks());
        for network in networks {
            if !snapshot.has_network(network) {
                self.add(DependencyError::Network {
                    network: network.to_string(),
                    project: project.to_string(),
                });
            }
        }
    }

    fn add(&mut self, error: DependencyError) {
        if self.errors.insert(error.clone()) {
            tracing::warn!(dependency = %error, "Missing dependency");
        }
    }

    /// Whether all dependencies were found.
    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The missing dependencies, rendered for the reply.
    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stor_port::types::v0::{
        store::{
            network::NetworkSpec, profile::ProfileSpec, project::ProjectSpec, DependencyRecords,
        },
        transport::{DeviceConfig, Devices, InstanceDescriptor},
    };

    fn snapshot() -> DependencySnapshot {
        DependencySnapshot::from(DependencyRecords {
            projects: vec![ProjectSpec::new("default"), ProjectSpec::new("web")],
            profiles: vec![ProfileSpec {
                name: "base".to_string(),
                project: "default".to_string(),
                ..Default::default()
            }],
            networks: vec![NetworkSpec {
                name: "lxdbr0".to_string(),
                project: "default".to_string(),
                ..Default::default()
            }],
        })
    }

    fn backup(name: &str, profiles: &[&str], networks: &[&str]) -> VolumeBackup {
        let expanded = networks
            .iter()
            .enumerate()
            .map(|(i, network)| {
                let nic: DeviceConfig = [("type", "nic"), ("network", *network)]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (format!("eth{i}"), nic)
            })
            .collect::<Devices>();
        VolumeBackup::new_instance(
            InstanceDescriptor {
                name: name.to_string(),
                instance_type: "container".to_string(),
                architecture: "x86_64".to_string(),
                profiles: profiles.iter().map(ToString::to_string).collect(),
                expanded_devices: Some(expanded),
                ..Default::default()
            },
            vec![],
        )
    }

    #[test]
    fn dependency_errors_in_first_seen_order() {
        let snapshot = snapshot();
        let mut validator = DependencyValidator::default();
        let volumes = ProjectVolumes::from([
            (
                "default".to_string(),
                vec![
                    backup("c1", &["base", "gpu"], &["lxdbr0", "ovn0"]),
                    backup("c2", &["gpu"], &["ovn0"]),
                    VolumeBackup::default(),
                ],
            ),
            ("dev".to_string(), vec![backup("c3", &["missing"], &["missing"])]),
        ]);
        validator.check(&snapshot, &volumes);
        // a second pool reporting the same missing dependencies adds nothing
        validator.check(&snapshot, &volumes);

        assert!(!validator.is_empty());
        assert_eq!(
            validator.errors(),
            vec![
                "Profile \"gpu\" in project \"default\"",
                "Network \"ovn0\" in project \"default\"",
                "Project \"dev\"",
            ]
        );
    }

    #[test]
    fn profiles_of_project_without_profile_feature() {
        let snapshot = snapshot();
        let mut validator = DependencyValidator::default();
        let volumes = ProjectVolumes::from([(
            "web".to_string(),
            vec![backup("c1", &["base"], &["lxdbr0"]), VolumeBackup::default()],
        )]);
        validator.check(&snapshot, &volumes);
        assert!(validator.is_empty());
    }
}
