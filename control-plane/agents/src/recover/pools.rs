use super::{
    api::PoolBackend,
    rollback::{Compensate, Compensation},
};
use crate::errors::{
    InstanceRecordDelete, PoolConfigInvalid, PoolLookup, PoolMount, PoolRecordDelete, PoolUnmount,
    SvcError,
};
use indexmap::IndexMap;
use snafu::ResultExt;
use stor_port::{
    transport_api::ErrorChain,
    types::v0::{
        store::{pool::PoolSpec, RecoverStore},
        transport::{PoolDescriptor, PoolId, ProjectVolumes, UnknownVolume},
    },
};

/// State of a pool within a recovery.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PoolState {
    /// The pool was recorded in the store before the recovery started.
    Existing(PoolSpec),
    /// The pool has no record in the store.
    Temporary(PoolSpec),
    /// The pool's record is being created.
    Materializing(PoolSpec),
    /// The pool's record was created by this recovery.
    Persisted(PoolSpec),
}

impl PoolState {
    /// The current spec of the pool.
    pub(crate) fn spec(&self) -> &PoolSpec {
        match self {
            Self::Existing(spec)
            | Self::Temporary(spec)
            | Self::Materializing(spec)
            | Self::Persisted(spec) => spec,
        }
    }
    /// Whether the pool has no completed record in the store.
    pub(crate) fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_) | Self::Materializing(_))
    }
    /// Mark the temporary pool's record as being created.
    pub(crate) fn materialize(&mut self) {
        if let Self::Temporary(spec) = self {
            *self = Self::Materializing(spec.clone());
        }
    }
    /// Replace the pool's spec with its persisted record.
    pub(crate) fn promote(&mut self, persisted: PoolSpec) {
        *self = Self::Persisted(persisted);
    }
    /// Go back to a temporary pool after its record creation failed or was undone.
    pub(crate) fn demote(&mut self) {
        if let Self::Materializing(spec) | Self::Persisted(spec) = self {
            let spec = PoolSpec {
                id: Default::default(),
                ..spec.clone()
            };
            *self = Self::Temporary(spec);
        }
    }
}

/// A pool taking part in a recovery.
#[derive(Debug)]
pub(crate) struct PoolEntry {
    pub(crate) state: PoolState,
    /// Whether this recovery mounted the pool.
    pub(crate) mounted: bool,
    /// Unknown volumes found on the pool.
    pub(crate) volumes: ProjectVolumes,
}

impl PoolEntry {
    fn new(state: PoolState) -> Self {
        Self {
            state,
            mounted: false,
            volumes: Default::default(),
        }
    }
    /// The pool's name.
    pub(crate) fn name(&self) -> &PoolId {
        &self.state.spec().name
    }
    /// Mount the pool, returning whether this call performed the mount.
    pub(crate) async fn mount(&mut self, backend: &dyn PoolBackend) -> Result<bool, SvcError> {
        let ours = backend.mount(self.state.spec()).await.context(PoolMount {
            pool: self.name().clone(),
        })?;
        if ours {
            tracing::debug!(pool = %self.name(), "Mounted pool");
            self.mounted = true;
        }
        Ok(ours)
    }
    /// Unmount the pool if it was mounted by this recovery.
    pub(crate) async fn unmount(&mut self, backend: &dyn PoolBackend) -> Result<(), SvcError> {
        if !self.mounted {
            return Ok(());
        }
        backend
            .unmount(self.state.spec())
            .await
            .context(PoolUnmount {
                pool: self.name().clone(),
            })?;
        tracing::debug!(pool = %self.name(), "Unmounted pool");
        self.mounted = false;
        Ok(())
    }
}

/// Resolve the requested pool.
/// Uses the recorded pool if it exists, otherwise a temporary pool built from the request,
/// provided its driver accepts the requested configuration.
pub(crate) async fn resolve_pool(
    store: &dyn RecoverStore,
    backend: &dyn PoolBackend,
    request: &PoolDescriptor,
) -> Result<PoolState, SvcError> {
    match store.pool(&request.name).await {
        Ok(spec) => Ok(PoolState::Existing(spec)),
        Err(error) if error.is_missing_entry() => {
            let spec = PoolSpec::temporary(request);
            backend
                .validate_config(&spec)
                .await
                .context(PoolConfigInvalid {
                    pool: request.name.clone(),
                })?;
            tracing::info!(pool = %request.name, driver = %request.driver, "Using temporary pool");
            Ok(PoolState::Temporary(spec))
        }
        Err(error) => Err(error).context(PoolLookup {
            pool: request.name.clone(),
        }),
    }
}

/// The pools of a recovery, in the order they were requested.
#[derive(Debug, Default)]
pub(crate) struct PoolRegistry {
    entries: IndexMap<PoolId, PoolEntry>,
}

impl PoolRegistry {
    /// Whether the pool is already part of the recovery.
    pub(crate) fn contains(&self, pool: &PoolId) -> bool {
        self.entries.contains_key(pool)
    }
    /// Add the resolved pool to the recovery.
    pub(crate) fn insert(&mut self, state: PoolState) -> &mut PoolEntry {
        let name = state.spec().name.clone();
        self.entries.entry(name).or_insert_with(|| PoolEntry::new(state))
    }
    fn get_mut(&mut self, pool: &PoolId) -> Option<&mut PoolEntry> {
        self.entries.get_mut(pool)
    }
    /// Iterate mutably over the pools, in request order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PoolEntry> {
        self.entries.values_mut()
    }
    /// The unknown instance volumes of all pools, in request order, then project order, then
    /// the order in which they were found.
    pub(crate) fn unknown_volumes(&self) -> Vec<UnknownVolume> {
        self.entries
            .values()
            .flat_map(|entry| {
                entry.volumes.iter().flat_map(move |(project, backups)| {
                    backups.iter().filter_map(move |backup| {
                        backup.instance.as_ref().map(|instance| UnknownVolume {
                            name: instance.name.clone(),
                            volume_type: instance.instance_type.clone(),
                            snapshot_count: backup.snapshots.len(),
                            project: project.clone(),
                            pool: entry.name().to_string(),
                        })
                    })
                })
            })
            .collect()
    }
    /// Unmount the pools which this recovery mounted and which are still temporary.
    /// Failures are logged.
    pub(crate) async fn unmount_temporary(&mut self, backend: &dyn PoolBackend) {
        for entry in self.entries.values_mut() {
            if !entry.state.is_temporary() {
                continue;
            }
            if let Err(error) = entry.unmount(backend).await {
                tracing::error!(
                    pool = %entry.name(),
                    error = error.full_string(),
                    "Failed to unmount temporary pool"
                );
            }
        }
    }
}

/// Runs the compensating actions of a failed import against the store, the backend and the
/// recovery's pools.
pub(crate) struct Compensator<'a> {
    pub(crate) store: &'a dyn RecoverStore,
    pub(crate) backend: &'a dyn PoolBackend,
    pub(crate) pools: &'a mut PoolRegistry,
}

#[async_trait::async_trait]
impl Compensate for Compensator<'_> {
    async fn compensate(&mut self, action: &Compensation) -> Result<(), SvcError> {
        match action {
            Compensation::UnmountPool { pool } => match self.pools.get_mut(pool) {
                Some(entry) if matches!(entry.state, PoolState::Persisted(_)) => {
                    tracing::debug!(pool = %pool, "Leaving recorded pool mounted");
                    Ok(())
                }
                Some(entry) => entry.unmount(self.backend).await,
                None => Ok(()),
            },
            Compensation::DeletePoolRecord { pool } => {
                self.store
                    .delete_pool(pool)
                    .await
                    .context(PoolRecordDelete { pool: pool.clone() })?;
                if let Some(entry) = self.pools.get_mut(pool) {
                    entry.state.demote();
                }
                Ok(())
            }
            Compensation::DeleteInstanceRecord { project, instance } => self
                .store
                .delete_instance(project, instance)
                .await
                .context(InstanceRecordDelete {
                    project: project.clone(),
                    instance: instance.clone(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stor_port::types::v0::store::pool::PoolRecordId;

    #[test]
    fn pool_state_transitions() {
        let request = PoolDescriptor::new("p1", "dir");
        let mut state = PoolState::Temporary(PoolSpec::temporary(&request));
        assert!(state.is_temporary());

        state.materialize();
        assert!(matches!(state, PoolState::Materializing(_)));
        assert!(state.is_temporary());

        state.promote(PoolSpec {
            id: PoolRecordId::Persisted(7),
            ..PoolSpec::temporary(&request)
        });
        assert!(!state.is_temporary());
        assert_eq!(state.spec().id, PoolRecordId::Persisted(7));

        state.demote();
        assert_eq!(state, PoolState::Temporary(PoolSpec::temporary(&request)));

        let mut existing = PoolState::Existing(PoolSpec {
            id: PoolRecordId::Persisted(1),
            ..PoolSpec::temporary(&request)
        });
        existing.materialize();
        existing.demote();
        assert!(matches!(existing, PoolState::Existing(_)));
    }
}
