//! Metadata store and storage backend held in memory.
//! Used to rehearse a recovery against a captured host state, and by the tests.

use super::api::PoolBackend;
use crate::errors::BackendError;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use stor_port::types::v0::{
    store::{
        definitions::{instance_key, pool_key},
        instance::InstanceSpec,
        network::NetworkSpec,
        pool::{PoolRecordId, PoolSpec},
        profile::ProfileSpec,
        project::ProjectSpec,
        DependencyRecords, RecoverStore, StoreError,
    },
    transport::{
        CreateInstance, PoolDescriptor, PoolId, PoolStatus, ProjectVolumes, VolumeBackup,
    },
};

/// A storage driver known to the in-memory backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DriverSpec {
    /// Name of the driver, eg: `dir`.
    pub name: String,
    /// Pool configuration keys accepted by the driver.
    #[serde(default)]
    pub config_keys: Vec<String>,
    /// Whether the driver can list the unknown volumes of its pools.
    #[serde(default = "DriverSpec::default_recovery")]
    pub recovery: bool,
}

impl DriverSpec {
    /// Return a new driver which accepts the given configuration keys.
    pub fn new(name: &str, config_keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            config_keys: config_keys.iter().map(ToString::to_string).collect(),
            recovery: Self::default_recovery(),
        }
    }
    /// The driver can't list unknown volumes.
    #[must_use]
    pub fn without_recovery(mut self) -> Self {
        self.recovery = false;
        self
    }
    fn default_recovery() -> bool {
        true
    }
}

/// Captured state of a host whose metadata store lost track of some volumes.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct HostState {
    /// Projects recorded in the metadata store.
    pub projects: Vec<ProjectSpec>,
    /// Profiles recorded in the metadata store.
    pub profiles: Vec<ProfileSpec>,
    /// Networks recorded in the metadata store.
    pub networks: Vec<NetworkSpec>,
    /// Pools recorded in the metadata store.
    pub pools: Vec<PoolDescriptor>,
    /// Storage drivers.
    pub drivers: Vec<DriverSpec>,
    /// Volumes on the storage, by pool then by project.
    pub volumes: BTreeMap<PoolId, ProjectVolumes>,
    /// Pools which are already mounted.
    pub mounted: Vec<PoolId>,
}

/// An operation of the in-memory collaborators which is made to fail.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FailPoint {
    /// Reading projects, profiles and networks.
    DependencyRecords,
    /// Looking up the given pool record.
    PoolLookup(PoolId),
    /// Creating the given pool record.
    CreatePool(PoolId),
    /// Deleting the given pool record.
    DeletePool(PoolId),
    /// Creating the record of the given instance or snapshot, eg: `c1/snap0`.
    CreateInstance(String),
    /// Deleting the record of the given instance or snapshot.
    DeleteInstance(String),
    /// Validating the configuration of the given pool.
    ValidateConfig(PoolId),
    /// Mounting the given pool.
    Mount(PoolId),
    /// Unmounting the given pool.
    Unmount(PoolId),
    /// Listing the unknown volumes of the given pool.
    ListVolumes(PoolId),
    /// Importing the given instance.
    ImportInstance(String),
    /// Applying the quota of the given instance.
    SetQuota(String),
}

#[derive(Debug, Default)]
struct StoreInner {
    projects: Vec<ProjectSpec>,
    profiles: Vec<ProfileSpec>,
    networks: Vec<NetworkSpec>,
    pools: IndexMap<PoolId, PoolSpec>,
    instances: IndexMap<(String, String), InstanceSpec>,
    next_id: u64,
    fail_points: Vec<FailPoint>,
}

impl StoreInner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.fail_points.contains(&point) {
            return Err(StoreError::Transaction {
                reason: format!("injected failure at {point:?}"),
            });
        }
        Ok(())
    }
}

/// Metadata store held in memory.
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    /// Return a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
    /// Return a new store with the records of the given host.
    pub fn from_state(state: &HostState) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            inner.projects = state.projects.clone();
            inner.profiles = state.profiles.clone();
            inner.networks = state.networks.clone();
        }
        for pool in &state.pools {
            store.add_pool(pool);
        }
        store
    }
    /// Add a project record.
    pub fn add_project(&self, project: ProjectSpec) {
        self.inner.lock().projects.push(project);
    }
    /// Add a profile record.
    pub fn add_profile(&self, profile: ProfileSpec) {
        self.inner.lock().profiles.push(profile);
    }
    /// Add a network record.
    pub fn add_network(&self, network: NetworkSpec) {
        self.inner.lock().networks.push(network);
    }
    /// Add or replace a pool record.
    pub fn add_pool(&self, pool: &PoolDescriptor) -> PoolSpec {
        let mut inner = self.inner.lock();
        let spec = PoolSpec {
            id: PoolRecordId::Persisted(inner.next_id()),
            ..PoolSpec::temporary(pool)
        };
        inner.pools.insert(pool.name.clone(), spec.clone());
        spec
    }
    /// Make the given operation fail from now on.
    pub fn fail_on(&self, point: FailPoint) {
        self.inner.lock().fail_points.push(point);
    }
    /// Stop failing any operation.
    pub fn clear_fail_points(&self) {
        self.inner.lock().fail_points.clear();
    }
    /// All pool records.
    pub fn pools(&self) -> Vec<PoolSpec> {
        self.inner.lock().pools.values().cloned().collect()
    }
    /// All instance and snapshot records, in creation order.
    pub fn instances(&self) -> Vec<InstanceSpec> {
        self.inner.lock().instances.values().cloned().collect()
    }
    /// Whether the given instance has a record.
    pub fn has_instance(&self, project: &str, instance: &str) -> bool {
        self.inner
            .lock()
            .instances
            .contains_key(&(project.to_string(), instance.to_string()))
    }
}

#[async_trait::async_trait]
impl RecoverStore for MemoryStore {
    async fn dependency_records(&self) -> Result<DependencyRecords, StoreError> {
        let inner = self.inner.lock();
        inner.check(FailPoint::DependencyRecords)?;
        Ok(DependencyRecords {
            projects: inner.projects.clone(),
            profiles: inner.profiles.clone(),
            networks: inner.networks.clone(),
        })
    }

    async fn pool(&self, pool: &PoolId) -> Result<PoolSpec, StoreError> {
        let inner = self.inner.lock();
        inner.check(FailPoint::PoolLookup(pool.clone()))?;
        inner
            .pools
            .get(pool)
            .cloned()
            .ok_or_else(|| StoreError::MissingEntry {
                key: pool_key(pool),
            })
    }

    async fn create_pool(&self, pool: &PoolDescriptor) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::CreatePool(pool.name.clone()))?;
        if inner.pools.contains_key(&pool.name) {
            return Err(StoreError::AlreadyExists {
                key: pool_key(&pool.name),
            });
        }
        let spec = PoolSpec {
            id: PoolRecordId::Persisted(inner.next_id()),
            status: PoolStatus::Created,
            ..PoolSpec::temporary(pool)
        };
        inner.pools.insert(pool.name.clone(), spec);
        Ok(())
    }

    async fn delete_pool(&self, pool: &PoolId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::DeletePool(pool.clone()))?;
        inner
            .pools
            .shift_remove(pool)
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingEntry {
                key: pool_key(pool),
            })
    }

    async fn create_instance(&self, request: &CreateInstance) -> Result<InstanceSpec, StoreError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::CreateInstance(request.name.clone()))?;
        if !inner.pools.contains_key(&request.pool) {
            return Err(StoreError::MissingEntry {
                key: pool_key(&request.pool),
            });
        }
        let key = (request.project.clone(), request.name.clone());
        if inner.instances.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                key: instance_key(&request.project, &request.name),
            });
        }
        let spec = InstanceSpec::from_request(inner.next_id(), request);
        inner.instances.insert(key, spec.clone());
        Ok(spec)
    }

    async fn delete_instance(&self, project: &str, instance: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::DeleteInstance(instance.to_string()))?;
        inner
            .instances
            .shift_remove(&(project.to_string(), instance.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingEntry {
                key: instance_key(project, instance),
            })
    }
}

/// A quota applied by the in-memory backend.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QuotaCall {
    /// Pool of the instance.
    pub pool: PoolId,
    /// Name of the instance.
    pub instance: String,
    /// Size of the root volume.
    pub size: Option<String>,
    /// Size of the state volume.
    pub state_size: Option<String>,
}

#[derive(Debug, Default)]
struct BackendInner {
    drivers: BTreeMap<String, DriverSpec>,
    volumes: BTreeMap<PoolId, ProjectVolumes>,
    mounted: BTreeSet<PoolId>,
    imported: Vec<(PoolId, String)>,
    quotas: Vec<QuotaCall>,
    fail_points: Vec<FailPoint>,
}

impl BackendInner {
    fn check(&self, point: FailPoint, operation: &str) -> Result<(), BackendError> {
        if self.fail_points.contains(&point) {
            return Err(BackendError::Driver {
                operation: operation.to_string(),
                reason: format!("injected failure at {point:?}"),
            });
        }
        Ok(())
    }
    fn driver(&self, pool: &PoolSpec) -> Result<&DriverSpec, BackendError> {
        self.drivers
            .get(&pool.driver)
            .ok_or_else(|| BackendError::UnknownDriver {
                driver: pool.driver.clone(),
            })
    }
}

/// Storage backend held in memory.
/// Volumes whose instance is recorded in the paired store are not listed as unknown.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: MemoryStore,
    inner: Arc<Mutex<BackendInner>>,
}

impl MemoryBackend {
    /// Return a new backend with no drivers, paired with the given store.
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            inner: Default::default(),
        }
    }
    /// Return a new backend with the storage of the given host.
    pub fn from_state(state: &HostState, store: MemoryStore) -> Self {
        let backend = Self::new(store);
        {
            let mut inner = backend.inner.lock();
            inner.drivers = state
                .drivers
                .iter()
                .map(|driver| (driver.name.clone(), driver.clone()))
                .collect();
            inner.volumes = state.volumes.clone();
            inner.mounted = state.mounted.iter().cloned().collect();
        }
        backend
    }
    /// Add a storage driver.
    pub fn add_driver(&self, driver: DriverSpec) {
        self.inner.lock().drivers.insert(driver.name.clone(), driver);
    }
    /// Add a volume to the given pool.
    pub fn add_volume(&self, pool: &str, project: &str, volume: VolumeBackup) {
        self.inner
            .lock()
            .volumes
            .entry(pool.into())
            .or_default()
            .entry(project.to_string())
            .or_default()
            .push(volume);
    }
    /// Mark the pool as mounted.
    pub fn set_mounted(&self, pool: &str) {
        self.inner.lock().mounted.insert(pool.into());
    }
    /// Whether the pool is mounted.
    pub fn is_mounted(&self, pool: &str) -> bool {
        self.inner.lock().mounted.contains(&PoolId::from(pool))
    }
    /// Make the given operation fail from now on.
    pub fn fail_on(&self, point: FailPoint) {
        self.inner.lock().fail_points.push(point);
    }
    /// Stop failing any operation.
    pub fn clear_fail_points(&self) {
        self.inner.lock().fail_points.clear();
    }
    /// The imported instances, as (pool, instance), in import order.
    pub fn imported(&self) -> Vec<(PoolId, String)> {
        self.inner.lock().imported.clone()
    }
    /// The applied quotas, in order.
    pub fn quotas(&self) -> Vec<QuotaCall> {
        self.inner.lock().quotas.clone()
    }
}

#[async_trait::async_trait]
impl PoolBackend for MemoryBackend {
    async fn validate_config(&self, pool: &PoolSpec) -> Result<(), BackendError> {
        let inner = self.inner.lock();
        inner.check(FailPoint::ValidateConfig(pool.name.clone()), "validate config")?;
        let driver = inner.driver(pool)?;
        match pool.config.keys().find(|key| !driver.config_keys.contains(key)) {
            Some(key) => Err(BackendError::InvalidConfig {
                key: key.clone(),
                reason: format!("not supported by driver '{}'", driver.name),
            }),
            None => Ok(()),
        }
    }

    async fn mount(&self, pool: &PoolSpec) -> Result<bool, BackendError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::Mount(pool.name.clone()), "mount")?;
        inner.driver(pool)?;
        Ok(inner.mounted.insert(pool.name.clone()))
    }

    async fn unmount(&self, pool: &PoolSpec) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::Unmount(pool.name.clone()), "unmount")?;
        inner.mounted.remove(&pool.name);
        Ok(())
    }

    async fn list_unknown_volumes(&self, pool: &PoolSpec) -> Result<ProjectVolumes, BackendError> {
        let inner = self.inner.lock();
        inner.check(FailPoint::ListVolumes(pool.name.clone()), "list volumes")?;
        let driver = inner.driver(pool)?;
        if !driver.recovery {
            return Err(BackendError::NotImplemented {
                driver: driver.name.clone(),
            });
        }
        let volumes = inner.volumes.get(&pool.name).cloned().unwrap_or_default();
        Ok(volumes
            .into_iter()
            .map(|(project, backups)| {
                let unknown = backups
                    .into_iter()
                    .filter(|backup| match backup.instance_name() {
                        Some(instance) => !self.store.has_instance(&project, instance),
                        None => true,
                    })
                    .collect::<Vec<_>>();
                (project, unknown)
            })
            .filter(|(_, backups)| !backups.is_empty())
            .collect())
    }

    async fn import_instance(
        &self,
        pool: &PoolSpec,
        instance: &InstanceSpec,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::ImportInstance(instance.name.clone()), "import instance")?;
        inner.imported.push((pool.name.clone(), instance.name.clone()));
        Ok(())
    }

    async fn set_instance_quota(
        &self,
        pool: &PoolSpec,
        instance: &InstanceSpec,
        size: Option<&str>,
        state_size: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.check(FailPoint::SetQuota(instance.name.clone()), "set quota")?;
        inner.quotas.push(QuotaCall {
            pool: pool.name.clone(),
            instance: instance.name.clone(),
            size: size.map(ToString::to_string),
            state_size: state_size.map(ToString::to_string),
        });
        Ok(())
    }
}
