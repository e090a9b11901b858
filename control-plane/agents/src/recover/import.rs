use super::{
    api::PoolBackend,
    config::RecoverConfig,
    devices::populate_root_disk,
    pools::{PoolEntry, PoolState},
    rollback::{Compensation, Reverter},
    snapshot::DependencySnapshot,
};
use crate::errors::{
    ArchitectureParse, InstanceImport, InstanceRecordCreate, InstanceTypeParse, PoolRecordCreate,
    PoolReload, ProjectNotFound, QuotaReapply, SnapshotRecordCreate, SvcError,
};
use snafu::{OptionExt, ResultExt};
use stor_port::types::v0::{
    store::{instance::InstanceSpec, pool::PoolSpec, RecoverStore},
    transport::{
        Architecture, CreateInstance, Devices, InstanceDescriptor, InstanceType, PoolDescriptor,
        SnapshotDescriptor, VolumeBackup,
    },
};
use utils::{BASE_IMAGE_CONFIG_KEY, ROOT_DISK_SIZE, ROOT_DISK_STATE_SIZE, SNAPSHOT_DELIMITER};

/// Recreates the records of the unknown instance volumes.
pub(crate) struct Importer<'a> {
    pub(crate) store: &'a dyn RecoverStore,
    pub(crate) backend: &'a dyn PoolBackend,
    pub(crate) snapshot: &'a DependencySnapshot,
    pub(crate) config: &'a RecoverConfig,
}

impl Importer<'_> {
    /// Import the unknown instance volumes of the pool, creating the pool's record first if
    /// the pool is temporary.
    pub(crate) async fn import_pool(
        &self,
        entry: &mut PoolEntry,
        reverter: &mut Reverter,
    ) -> Result<(), SvcError> {
        let PoolEntry { state, volumes, .. } = entry;
        for (project, backups) in volumes.iter() {
            for backup in backups {
                let Some(instance) = &backup.instance else {
                    continue;
                };
                let profile_project = self
                    .snapshot
                    .project(project)
                    .context(ProjectNotFound { project })?
                    .profile_project();

                self.materialize_pool(state, backup, reverter).await?;
                let pool = state.spec().clone();

                tracing::info!(
                    pool = %pool.name,
                    project = %project,
                    instance = %instance.name,
                    snapshots = backup.snapshots.len(),
                    "Importing instance"
                );
                let created = self
                    .create_instance(&pool, project, profile_project, backup, instance, reverter)
                    .await?;
                for snapshot in &backup.snapshots {
                    self.create_snapshot(
                        &pool,
                        project,
                        profile_project,
                        instance,
                        snapshot,
                        reverter,
                    )
                    .await?;
                }

                self.backend
                    .import_instance(&pool, &created)
                    .await
                    .context(InstanceImport {
                        pool: pool.name.clone(),
                        instance: &created.name,
                    })?;

                self.reapply_quota(&pool, profile_project, &created).await?;
            }
        }
        Ok(())
    }

    /// Create the record of a temporary pool.
    /// The pool configuration saved with the volume is preferred over the requested one since
    /// it reflects the pool as it was when the volume was written.
    async fn materialize_pool(
        &self,
        state: &mut PoolState,
        backup: &VolumeBackup,
        reverter: &mut Reverter,
    ) -> Result<(), SvcError> {
        let PoolState::Temporary(spec) = state else {
            return Ok(());
        };
        let request = match &backup.pool {
            Some(saved) => PoolDescriptor {
                name: spec.name.clone(),
                driver: saved.driver.clone(),
                description: saved.description.clone(),
                config: saved.config.clone(),
            },
            None => spec.descriptor(),
        };
        tracing::info!(
            pool = %request.name,
            driver = %request.driver,
            saved = backup.pool.is_some(),
            "Creating pool record"
        );

        state.materialize();
        if let Err(error) = self.store.create_pool(&request).await {
            state.demote();
            return Err(error).context(PoolRecordCreate {
                pool: request.name.clone(),
            });
        }
        reverter.add(Compensation::DeletePoolRecord {
            pool: request.name.clone(),
        });

        let persisted = self.store.pool(&request.name).await.context(PoolReload {
            pool: request.name.clone(),
        })?;
        state.promote(persisted);
        Ok(())
    }

    async fn create_instance(
        &self,
        pool: &PoolSpec,
        project: &str,
        profile_project: &str,
        backup: &VolumeBackup,
        instance: &InstanceDescriptor,
        reverter: &mut Reverter,
    ) -> Result<InstanceSpec, SvcError> {
        let profiles = self.snapshot.resolve_profiles(profile_project, &instance.profiles);
        let mut devices = instance.devices.clone().unwrap_or_default();
        let expanded_devices = instance.expanded_devices.clone().unwrap_or_default();
        populate_root_disk(self.config, &pool.name, &mut devices, &expanded_devices, &profiles);

        let request = CreateInstance {
            project: project.to_string(),
            name: instance.name.clone(),
            pool: pool.name.clone(),
            instance_type: parse_instance_type(&instance.name, &instance.instance_type)?,
            architecture: parse_architecture(&instance.name, &instance.architecture)?,
            snapshot: false,
            base_image: instance.config.get(BASE_IMAGE_CONFIG_KEY).cloned(),
            config: instance.config.clone(),
            devices,
            profiles: instance.profiles.clone(),
            description: instance.description.clone(),
            ephemeral: instance.ephemeral,
            stateful: instance.stateful,
            created_at: instance.created_at,
            last_used_at: instance.last_used_at,
            volume_config: backup.volume_config().cloned(),
        };
        let created = self
            .store
            .create_instance(&request)
            .await
            .context(InstanceRecordCreate {
                project,
                instance: &request.name,
            })?;
        reverter.add(Compensation::DeleteInstanceRecord {
            project: project.to_string(),
            instance: request.name,
        });
        Ok(created)
    }

    async fn create_snapshot(
        &self,
        pool: &PoolSpec,
        project: &str,
        profile_project: &str,
        instance: &InstanceDescriptor,
        snapshot: &SnapshotDescriptor,
        reverter: &mut Reverter,
    ) -> Result<(), SvcError> {
        let name = format!("{}{SNAPSHOT_DELIMITER}{}", instance.name, snapshot.name);
        let profiles = self.snapshot.resolve_profiles(profile_project, &snapshot.profiles);
        let mut devices = snapshot.devices.clone().unwrap_or_default();
        let expanded_devices = snapshot.expanded_devices.clone().unwrap_or_default();
        populate_root_disk(self.config, &pool.name, &mut devices, &expanded_devices, &profiles);

        let request = CreateInstance {
            project: project.to_string(),
            name: name.clone(),
            pool: pool.name.clone(),
            instance_type: parse_instance_type(&instance.name, &instance.instance_type)?,
            architecture: parse_architecture(&name, &snapshot.architecture)?,
            snapshot: true,
            base_image: snapshot.config.get(BASE_IMAGE_CONFIG_KEY).cloned(),
            config: snapshot.config.clone(),
            devices,
            profiles: snapshot.profiles.clone(),
            description: snapshot.description.clone(),
            ephemeral: snapshot.ephemeral,
            stateful: snapshot.stateful,
            created_at: snapshot.created_at,
            last_used_at: snapshot.last_used_at,
            volume_config: None,
        };
        self.store
            .create_instance(&request)
            .await
            .context(SnapshotRecordCreate {
                project,
                instance: &instance.name,
                snapshot: &snapshot.name,
            })?;
        tracing::debug!(project = %project, snapshot = %name, "Created snapshot record");
        reverter.add(Compensation::DeleteInstanceRecord {
            project: project.to_string(),
            instance: name,
        });
        Ok(())
    }

    /// Reapply the root disk quota so the driver can reinitialize it against the new volume
    /// record, even when no size is set.
    async fn reapply_quota(
        &self,
        pool: &PoolSpec,
        profile_project: &str,
        instance: &InstanceSpec,
    ) -> Result<(), SvcError> {
        let profiles = self.snapshot.resolve_profiles(profile_project, &instance.profiles);
        let expanded = Devices::expand(
            profiles
                .iter()
                .map(|profile| &profile.devices)
                .chain(std::iter::once(&instance.devices)),
        );
        let root = match expanded.root_disk() {
            Ok((_, root)) => root,
            Err(error) => {
                tracing::warn!(
                    instance = %instance.name,
                    error = %error,
                    "Skipping root disk quota"
                );
                return Ok(());
            }
        };
        let size = root.get(ROOT_DISK_SIZE).map(String::as_str);
        self.backend
            .set_instance_quota(
                pool,
                instance,
                size,
                root.get(ROOT_DISK_STATE_SIZE).map(String::as_str),
            )
            .await
            .context(QuotaReapply {
                pool: pool.name.clone(),
                instance: &instance.name,
            })
    }
}

fn parse_architecture(instance: &str, architecture: &str) -> Result<Architecture, SvcError> {
    architecture.parse().context(ArchitectureParse {
        instance,
        architecture,
    })
}

fn parse_instance_type(instance: &str, instance_type: &str) -> Result<InstanceType, SvcError> {
    instance_type.parse().context(InstanceTypeParse {
        instance,
        instance_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_name_the_instance() {
        let error = parse_architecture("c1/snap0", "z80").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Failed parsing architecture 'z80' of instance 'c1/snap0'"
        );
        let error = parse_instance_type("c1", "custom").unwrap_err();
        assert_eq!(error.to_string(), "Invalid type 'custom' of instance 'c1'");
        assert_eq!(parse_architecture("c1", "amd64").unwrap(), Architecture::X86_64);
    }
}
