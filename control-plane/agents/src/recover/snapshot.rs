use crate::errors::{DependencyLoad, SvcError};
use snafu::ResultExt;
use std::collections::{BTreeMap, HashSet};
use stor_port::types::v0::store::{
    profile::ProfileSpec, project::ProjectSpec, DependencyRecords, RecoverStore,
};

/// The projects, profiles and networks on which the unknown volumes may depend.
/// Read once per recovery and never refreshed.
#[derive(Debug, Default)]
pub(crate) struct DependencySnapshot {
    projects: BTreeMap<String, ProjectSpec>,
    /// Profiles grouped by the project which owns them.
    profiles: BTreeMap<String, Vec<ProfileSpec>>,
    /// Names of the created networks.
    networks: HashSet<String>,
}

impl DependencySnapshot {
    /// Load the snapshot with a single store transaction.
    pub(crate) async fn load(store: &dyn RecoverStore) -> Result<Self, SvcError> {
        let records = store.dependency_records().await.context(DependencyLoad)?;
        let snapshot = Self::from(records);
        tracing::debug!(
            projects = snapshot.projects.len(),
            networks = snapshot.networks.len(),
            "Loaded recovery dependencies"
        );
        Ok(snapshot)
    }

    /// Get the project with the given name.
    pub(crate) fn project(&self, name: &str) -> Option<&ProjectSpec> {
        self.projects.get(name)
    }

    /// Whether the profile exists in the given project.
    pub(crate) fn has_profile(&self, profile_project: &str, name: &str) -> bool {
        self.project_profiles(profile_project)
            .iter()
            .any(|profile| profile.name == name)
    }

    /// Get the named profiles of the given project, in the order of the names.
    /// Names with no matching profile are skipped.
    pub(crate) fn resolve_profiles(
        &self,
        profile_project: &str,
        names: &[String],
    ) -> Vec<&ProfileSpec> {
        let profiles = self.project_profiles(profile_project);
        names
            .iter()
            .filter_map(|name| profiles.iter().find(|profile| &profile.name == name))
            .collect()
    }

    /// Whether a created network with the given name exists.
    pub(crate) fn has_network(&self, name: &str) -> bool {
        self.networks.contains(name)
    }

    fn project_profiles(&self, project: &str) -> &[ProfileSpec] {
        self.profiles.get(project).map(Vec::as_slice).unwrap_or_default()
    }
}

impl From<DependencyRecords> for DependencySnapshot {
    fn from(records: DependencyRecords) -> Self {
        let projects = records
            .projects
            .into_iter()
            .map(|project| (project.name.clone(), project))
            .collect();
        let profiles = records
            .profiles
            .into_iter()
            .fold(BTreeMap::<String, Vec<ProfileSpec>>::new(), |mut profiles, profile| {
                profiles.entry(profile.project.clone()).or_default().push(profile);
                profiles
            });
        let networks = records
            .networks
            .into_iter()
            .filter(|network| network.is_created())
            .map(|network| network.name)
            .collect();
        Self {
            projects,
            profiles,
            networks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stor_port::types::v0::store::network::{NetworkSpec, NetworkStatus};

    fn profile(name: &str, project: &str) -> ProfileSpec {
        ProfileSpec {
            name: name.to_string(),
            project: project.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn snapshot_from_records() {
        let snapshot = DependencySnapshot::from(DependencyRecords {
            projects: vec![ProjectSpec::new("default"), ProjectSpec::new("web")],
            profiles: vec![
                profile("default", "default"),
                profile("base", "default"),
                profile("gpu", "web"),
            ],
            networks: vec![
                NetworkSpec {
                    name: "lxdbr0".to_string(),
                    project: "default".to_string(),
                    status: NetworkStatus::Created,
                },
                NetworkSpec {
                    name: "ovn0".to_string(),
                    project: "default".to_string(),
                    status: NetworkStatus::Pending,
                },
            ],
        });

        assert!(snapshot.project("web").is_some());
        assert!(snapshot.project("dev").is_none());
        assert!(snapshot.has_profile("default", "base"));
        assert!(!snapshot.has_profile("default", "gpu"));
        assert!(snapshot.has_profile("web", "gpu"));
        assert!(!snapshot.has_profile("dev", "gpu"));
        assert!(snapshot.has_network("lxdbr0"));
        assert!(!snapshot.has_network("ovn0"));

        let names = vec!["base".to_string(), "missing".to_string(), "default".to_string()];
        let resolved = snapshot
            .resolve_profiles("default", &names)
            .into_iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(resolved, vec!["base", "default"]);
    }
}
