use super::{
    api::PoolBackend,
    config::RecoverConfig,
    engine::{RecoverMode, Recovery},
};
use std::{collections::BTreeMap, sync::Arc};
use stor_port::{
    transport_api::{ReplyError, ResourceKind},
    types::v0::{
        store::RecoverStore,
        transport::{RecoverPools, RecoverReply, ValidationResult},
    },
};
use utils::{RECOVER_IMPORT_PATH, RECOVER_VALIDATE_PATH};

/// Maps the recovery endpoint paths to their action.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: BTreeMap<&'static str, RecoverMode>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Return the table of all recovery endpoints.
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::from([
                (RECOVER_VALIDATE_PATH, RecoverMode::Validate),
                (RECOVER_IMPORT_PATH, RecoverMode::Import),
            ]),
        }
    }
    /// Get the action of the given path.
    pub fn route(&self, path: &str) -> Option<RecoverMode> {
        self.routes.get(path.trim_matches('/')).copied()
    }
    /// All the endpoint paths.
    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.keys().copied()
    }
}

/// Recovery service.
/// Runs each request to completion against the metadata store and the storage backend.
#[derive(Clone)]
pub struct Service {
    store: Arc<dyn RecoverStore>,
    backend: Arc<dyn PoolBackend>,
    config: RecoverConfig,
    routes: RouteTable,
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .finish()
    }
}

impl Service {
    /// Return a new `Self`.
    pub fn new(
        store: Arc<dyn RecoverStore>,
        backend: Arc<dyn PoolBackend>,
        config: RecoverConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            routes: RouteTable::new(),
        }
    }

    /// Get the route table of the service.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Scan the pools and report the unknown volumes and their missing dependencies.
    /// Missing dependencies are part of the result, not an error.
    pub async fn validate(&self, request: &RecoverPools) -> Result<ValidationResult, ReplyError> {
        match self.handle(RecoverMode::Validate, request).await? {
            RecoverReply::Validation(result) => Ok(result),
            RecoverReply::Empty {} => Ok(ValidationResult::default()),
        }
    }

    /// Import the unknown volumes found on the pools.
    /// Returns the validation result instead if any dependency is missing.
    pub async fn import(&self, request: &RecoverPools) -> Result<RecoverReply, ReplyError> {
        self.handle(RecoverMode::Import, request).await
    }

    /// Run the recovery action.
    #[tracing::instrument(
        level = "info",
        skip(self, request),
        fields(pools = request.pools.len()),
        err
    )]
    pub async fn handle(
        &self,
        mode: RecoverMode,
        request: &RecoverPools,
    ) -> Result<RecoverReply, ReplyError> {
        let recovery = Recovery::new(self.store.as_ref(), self.backend.as_ref(), &self.config);
        let reply = recovery.run(&request.pools, mode).await?;
        Ok(reply)
    }

    /// Route the request by its endpoint path and run it, decoding the JSON body.
    pub async fn handle_path(&self, path: &str, body: &str) -> Result<RecoverReply, ReplyError> {
        let Some(mode) = self.routes.route(path) else {
            return Err(ReplyError::not_found(
                ResourceKind::Unknown,
                format!("No recovery endpoint at '{path}'"),
                self.routes.paths().collect::<Vec<_>>().join(", "),
            ));
        };
        let request: RecoverPools = serde_json::from_str(body)
            .map_err(|error| ReplyError::deserialize_error(ResourceKind::Pool, error))?;
        self.handle(mode, &request).await
    }
}
