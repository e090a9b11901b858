use crate::types::v0::transport::ConfigMap;
use serde::{Deserialize, Serialize};
use utils::{DEFAULT_PROJECT, PROJECT_FEATURE_PROFILES};

/// Specification of a project as recorded in the metadata store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectSpec {
    /// Name of the project.
    pub name: String,
    /// Free form description.
    #[serde(default)]
    pub description: String,
    /// Project configuration.
    #[serde(default)]
    pub config: ConfigMap,
}

impl ProjectSpec {
    /// Return a new project with no configuration.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
    /// Whether the project holds its own profiles.
    pub fn has_profiles(&self) -> bool {
        self.config.get(PROJECT_FEATURE_PROFILES).map(String::as_str) == Some("true")
    }
    /// The project where the profiles of this project's instances are kept.
    pub fn profile_project(&self) -> &str {
        if self.has_profiles() {
            &self.name
        } else {
            DEFAULT_PROJECT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_project() {
        let mut project = ProjectSpec::new("web");
        assert_eq!(project.profile_project(), "default");
        project
            .config
            .insert(PROJECT_FEATURE_PROFILES.to_string(), "false".to_string());
        assert_eq!(project.profile_project(), "default");
        project
            .config
            .insert(PROJECT_FEATURE_PROFILES.to_string(), "true".to_string());
        assert_eq!(project.profile_project(), "web");
    }
}
