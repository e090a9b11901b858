use super::{
    api::PoolBackend,
    config::RecoverConfig,
    import::Importer,
    pools::{resolve_pool, Compensator, PoolRegistry},
    rollback::{Compensation, Reverter},
    scanner::scan_unknown_volumes,
    snapshot::DependencySnapshot,
    validator::DependencyValidator,
};
use crate::errors::SvcError;
use stor_port::{
    transport_api::ErrorChain,
    types::v0::{
        store::RecoverStore,
        transport::{PoolDescriptor, RecoverReply, ValidationResult},
    },
};

/// What a recovery does once the unknown volumes are validated.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RecoverMode {
    /// Report the unknown volumes and their missing dependencies.
    Validate,
    /// Recreate the records of the unknown volumes if none of their dependencies are missing.
    Import,
}

/// A single recovery run.
/// Nothing is kept between runs other than the records created by an import.
pub struct Recovery<'a> {
    store: &'a dyn RecoverStore,
    backend: &'a dyn PoolBackend,
    config: &'a RecoverConfig,
}

impl<'a> Recovery<'a> {
    /// Return a new `Self` using the given store and backend.
    pub fn new(
        store: &'a dyn RecoverStore,
        backend: &'a dyn PoolBackend,
        config: &'a RecoverConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
        }
    }

    /// Scan the given pools for unknown volumes and validate their dependencies.
    /// When importing and no dependency is missing, recreate the missing records, undoing all
    /// of them should any step fail.
    pub async fn run(
        &self,
        pools: &[PoolDescriptor],
        mode: RecoverMode,
    ) -> Result<RecoverReply, SvcError> {
        let snapshot = DependencySnapshot::load(self.store).await?;
        let mut registry = PoolRegistry::default();
        let mut reverter = Reverter::new();

        let result = self
            .scan_and_import(&snapshot, pools, mode, &mut registry, &mut reverter)
            .await;
        match &result {
            Ok(_) => reverter.commit(),
            Err(error) => {
                tracing::error!(
                    mode = %mode,
                    error = error.full_string(),
                    "Recovery failed, reverting"
                );
                let mut compensator = Compensator {
                    store: self.store,
                    backend: self.backend,
                    pools: &mut registry,
                };
                reverter.abort(&mut compensator).await;
            }
        }
        registry.unmount_temporary(self.backend).await;
        result
    }

    async fn scan_and_import(
        &self,
        snapshot: &DependencySnapshot,
        pools: &[PoolDescriptor],
        mode: RecoverMode,
        registry: &mut PoolRegistry,
        reverter: &mut Reverter,
    ) -> Result<RecoverReply, SvcError> {
        let mut validator = DependencyValidator::default();
        for request in pools {
            self.scan_pool(snapshot, request, registry, &mut validator, reverter)
                .await?;
        }

        if mode == RecoverMode::Validate || !validator.is_empty() {
            return Ok(RecoverReply::Validation(ValidationResult {
                unknown_volumes: registry.unknown_volumes(),
                dependency_errors: validator.errors(),
            }));
        }

        let importer = Importer {
            store: self.store,
            backend: self.backend,
            snapshot,
            config: self.config,
        };
        for entry in registry.iter_mut() {
            importer.import_pool(entry, reverter).await?;
        }
        tracing::info!(pools = pools.len(), "Recovery import complete");
        Ok(RecoverReply::Empty {})
    }

    /// Resolve and mount the pool, then find and validate its unknown volumes.
    async fn scan_pool(
        &self,
        snapshot: &DependencySnapshot,
        request: &PoolDescriptor,
        registry: &mut PoolRegistry,
        validator: &mut DependencyValidator,
        reverter: &mut Reverter,
    ) -> Result<(), SvcError> {
        if request.name.as_str().is_empty() {
            return Err(SvcError::InvalidPoolRequest {
                reason: "pool name must not be empty".to_string(),
            });
        }
        if registry.contains(&request.name) {
            tracing::warn!(pool = %request.name, "Ignoring duplicate pool in request");
            return Ok(());
        }

        let state = resolve_pool(self.store, self.backend, request).await?;
        let entry = registry.insert(state);
        if entry.mount(self.backend).await? {
            reverter.add(Compensation::UnmountPool {
                pool: request.name.clone(),
            });
        }

        entry.volumes = scan_unknown_volumes(self.backend, entry.state.spec()).await?;
        validator.check(snapshot, &entry.volumes);
        Ok(())
    }
}
