use snafu::{Error, Snafu};
use stor_port::{
    transport_api::{ErrorChain, ReplyError, ReplyErrorKind, ResourceKind},
    types::v0::{store::StoreError, transport::PoolId},
};

/// Errors returned by a storage backend.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
#[allow(missing_docs)]
pub enum BackendError {
    #[snafu(display("Operation not implemented by storage driver '{}'", driver))]
    NotImplemented { driver: String },
    #[snafu(display("Unknown storage driver '{}'", driver))]
    UnknownDriver { driver: String },
    #[snafu(display("Invalid value for config key '{}': {}", key, reason))]
    InvalidConfig { key: String, reason: String },
    #[snafu(display("Storage driver failed to {}: {}", operation, reason))]
    Driver { operation: String, reason: String },
}

impl BackendError {
    /// Whether the driver does not implement the operation.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// Recovery error type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(false)))]
#[allow(missing_docs)]
pub enum SvcError {
    #[snafu(display("Failed to load projects, profiles and networks"))]
    DependencyLoad { source: StoreError },
    #[snafu(display("Failed loading pool '{}'", pool))]
    PoolLookup { pool: PoolId, source: StoreError },
    #[snafu(display("Failed checking configuration of pool '{}'", pool))]
    PoolConfigInvalid { pool: PoolId, source: BackendError },
    #[snafu(display("Failed mounting pool '{}'", pool))]
    PoolMount { pool: PoolId, source: BackendError },
    #[snafu(display("Failed unmounting pool '{}'", pool))]
    PoolUnmount { pool: PoolId, source: BackendError },
    #[snafu(display("Failed checking volumes on pool '{}'", pool))]
    VolumeScan { pool: PoolId, source: BackendError },
    #[snafu(display("Failed creating record of pool '{}'", pool))]
    PoolRecordCreate { pool: PoolId, source: StoreError },
    #[snafu(display("Failed loading persisted pool '{}'", pool))]
    PoolReload { pool: PoolId, source: StoreError },
    #[snafu(display("Failed deleting record of pool '{}'", pool))]
    PoolRecordDelete { pool: PoolId, source: StoreError },
    #[snafu(display("Project '{}' not found", project))]
    ProjectNotFound { project: String },
    #[snafu(display("Failed parsing architecture '{}' of instance '{}'", architecture, instance))]
    ArchitectureParse {
        instance: String,
        architecture: String,
        source: strum::ParseError,
    },
    #[snafu(display("Invalid type '{}' of instance '{}'", instance_type, instance))]
    InstanceTypeParse {
        instance: String,
        instance_type: String,
        source: strum::ParseError,
    },
    #[snafu(display("Failed creating instance '{}' record in project '{}'", instance, project))]
    InstanceRecordCreate {
        project: String,
        instance: String,
        source: StoreError,
    },
    #[snafu(display(
        "Failed creating instance '{}' snapshot '{}' record in project '{}'",
        instance,
        snapshot,
        project
    ))]
    SnapshotRecordCreate {
        project: String,
        instance: String,
        snapshot: String,
        source: StoreError,
    },
    #[snafu(display("Failed deleting instance '{}' record in project '{}'", instance, project))]
    InstanceRecordDelete {
        project: String,
        instance: String,
        source: StoreError,
    },
    #[snafu(display("Failed importing instance '{}' on pool '{}'", instance, pool))]
    InstanceImport {
        pool: PoolId,
        instance: String,
        source: BackendError,
    },
    #[snafu(display("Failed reinitializing root disk quota of instance '{}'", instance))]
    QuotaReapply {
        pool: PoolId,
        instance: String,
        source: BackendError,
    },
    #[snafu(display("Invalid pool request: {}", reason))]
    InvalidPoolRequest { reason: String },
}

impl SvcError {
    /// The kind of resource which the error refers to.
    pub fn resource(&self) -> ResourceKind {
        match self {
            Self::DependencyLoad { .. } | Self::InvalidPoolRequest { .. } => ResourceKind::Unknown,
            Self::PoolLookup { .. }
            | Self::PoolConfigInvalid { .. }
            | Self::PoolMount { .. }
            | Self::PoolUnmount { .. }
            | Self::PoolRecordCreate { .. }
            | Self::PoolReload { .. }
            | Self::PoolRecordDelete { .. } => ResourceKind::Pool,
            Self::VolumeScan { .. } => ResourceKind::Volume,
            Self::ProjectNotFound { .. } => ResourceKind::Project,
            Self::SnapshotRecordCreate { .. } => ResourceKind::InstanceSnapshot,
            Self::ArchitectureParse { .. }
            | Self::InstanceTypeParse { .. }
            | Self::InstanceRecordCreate { .. }
            | Self::InstanceRecordDelete { .. }
            | Self::InstanceImport { .. }
            | Self::QuotaReapply { .. } => ResourceKind::Instance,
        }
    }

    fn reply_kind(&self) -> ReplyErrorKind {
        match self {
            Self::DependencyLoad { .. } => ReplyErrorKind::Unavailable,
            Self::PoolLookup { .. } | Self::PoolReload { .. } => ReplyErrorKind::Unavailable,
            Self::PoolConfigInvalid { .. }
            | Self::ArchitectureParse { .. }
            | Self::InstanceTypeParse { .. }
            | Self::InvalidPoolRequest { .. } => ReplyErrorKind::InvalidArgument,
            Self::PoolMount { .. } | Self::PoolUnmount { .. } => ReplyErrorKind::FailedMount,
            Self::ProjectNotFound { .. } => ReplyErrorKind::NotFound,
            Self::PoolRecordCreate { source, .. }
            | Self::InstanceRecordCreate { source, .. }
            | Self::SnapshotRecordCreate { source, .. }
                if matches!(source, StoreError::AlreadyExists { .. }) =>
            {
                ReplyErrorKind::AlreadyExists
            }
            Self::PoolRecordCreate { .. }
            | Self::PoolRecordDelete { .. }
            | Self::InstanceRecordCreate { .. }
            | Self::SnapshotRecordCreate { .. }
            | Self::InstanceRecordDelete { .. } => ReplyErrorKind::FailedPersist,
            Self::VolumeScan { source, .. }
            | Self::InstanceImport { source, .. }
            | Self::QuotaReapply { source, .. }
                if source.is_not_implemented() =>
            {
                ReplyErrorKind::Unimplemented
            }
            Self::VolumeScan { .. } | Self::InstanceImport { .. } | Self::QuotaReapply { .. } => {
                ReplyErrorKind::Internal
            }
        }
    }
}

impl From<SvcError> for ReplyError {
    fn from(error: SvcError) -> Self {
        #[allow(deprecated)]
        let desc = error.description().to_string();
        ReplyError {
            kind: error.reply_kind(),
            resource: error.resource(),
            source: desc,
            extra: error.full_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_error_from_svc_error() {
        let error = SvcError::PoolMount {
            pool: "p1".into(),
            source: BackendError::Driver {
                operation: "mount".to_string(),
                reason: "device busy".to_string(),
            },
        };
        let reply = ReplyError::from(error);
        assert_eq!(reply.kind, ReplyErrorKind::FailedMount);
        assert_eq!(reply.resource, ResourceKind::Pool);
        assert_eq!(
            reply.extra,
            "Failed mounting pool 'p1': Storage driver failed to mount: device busy"
        );

        let error = SvcError::InstanceRecordCreate {
            project: "default".to_string(),
            instance: "c1".to_string(),
            source: StoreError::AlreadyExists {
                key: "projects/default/instances/c1".to_string(),
            },
        };
        let reply = ReplyError::from(error);
        assert_eq!(reply.kind, ReplyErrorKind::AlreadyExists);
        assert_eq!(reply.resource, ResourceKind::Instance);
    }
}
