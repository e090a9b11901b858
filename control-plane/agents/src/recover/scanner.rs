use super::api::PoolBackend;
use crate::errors::{SvcError, VolumeScan};
use snafu::ResultExt;
use stor_port::types::v0::{store::pool::PoolSpec, transport::ProjectVolumes};

/// List the volumes of the pool which have no record in the metadata store.
/// A driver which can't list them contributes no volumes.
pub(crate) async fn scan_unknown_volumes(
    backend: &dyn PoolBackend,
    pool: &PoolSpec,
) -> Result<ProjectVolumes, SvcError> {
    match backend.list_unknown_volumes(pool).await {
        Ok(volumes) => {
            tracing::debug!(
                pool = %pool.name,
                projects = volumes.len(),
                volumes = volumes.values().map(Vec::len).sum::<usize>(),
                "Found unknown volumes"
            );
            Ok(volumes)
        }
        Err(error) if error.is_not_implemented() => {
            tracing::error!(
                pool = %pool.name,
                error = %error,
                "Pool driver hasn't implemented recovery yet, skipping"
            );
            Ok(ProjectVolumes::new())
        }
        Err(error) => Err(error).context(VolumeScan {
            pool: pool.name.clone(),
        }),
    }
}
