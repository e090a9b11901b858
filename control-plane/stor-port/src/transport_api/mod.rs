#![warn(missing_docs)]
//! Error reporting for the recovery transport.
//! The recovery endpoints reply either with their result or with a `ReplyError` which carries
//! the error kind, the resource which failed and the full error chain.

use serde::{de::StdError, Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Report error chain.
pub trait ErrorChain {
    /// Full error chain as a string separated by ':'.
    fn full_string(&self) -> String;
}

impl<T> ErrorChain for T
where
    T: std::error::Error,
{
    /// loops through the error chain and formats into a single string
    /// containing all the lower level errors.
    fn full_string(&self) -> String {
        let mut msg = format!("{self}");
        let mut opt_source = self.source();
        while let Some(source) = opt_source {
            msg = format!("{msg}: {source}");
            opt_source = source.source();
        }
        msg
    }
}

/// All the different variants of Resources.
#[derive(Serialize, Deserialize, Debug, Clone, AsRefStr, Display, Eq, PartialEq)]
pub enum ResourceKind {
    /// Unknown or unspecified resource.
    Unknown,
    /// Storage pool resource.
    Pool,
    /// Project resource.
    Project,
    /// Instance resource.
    Instance,
    /// Instance snapshot resource.
    InstanceSnapshot,
    /// Storage volume resource.
    Volume,
}

/// Error type which is returned over the transport for any operation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReplyError {
    /// error kind.
    pub kind: ReplyErrorKind,
    /// resource kind.
    pub resource: ResourceKind,
    /// last source of this error.
    pub source: String,
    /// extra information.
    pub extra: String,
}

impl StdError for ReplyError {}
impl ReplyError {
    /// For errors that can occur when deserializing a request.
    pub fn deserialize_error(resource: ResourceKind, error: impl ToString) -> Self {
        Self {
            kind: ReplyErrorKind::DeserializeReq,
            resource,
            source: error.to_string(),
            extra: "".to_string(),
        }
    }
    /// For not found errors.
    pub fn not_found(resource: ResourceKind, source: String, extra: String) -> Self {
        Self {
            kind: ReplyErrorKind::NotFound,
            resource,
            source,
            extra,
        }
    }
}

impl std::fmt::Display for ReplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}: {}{}",
            self.kind.as_ref(),
            if matches!(self.resource, ResourceKind::Unknown) {
                String::new()
            } else {
                format!("/{}", self.resource.as_ref())
            },
            self.source,
            if !self.extra.is_empty() {
                format!(": {}", self.extra)
            } else {
                String::new()
            }
        )
    }
}

/// All the different variants of `ReplyError`.
#[derive(Serialize, Deserialize, Debug, Clone, strum_macros::AsRefStr, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum ReplyErrorKind {
    DeserializeReq,
    Internal,
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Unimplemented,
    Unavailable,
    FailedPersist,
    FailedMount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[derive(Debug, snafu::Snafu)]
    enum Inner {
        #[snafu(display("disk on fire"))]
        Fire,
    }
    #[derive(Debug, snafu::Snafu)]
    enum Outer {
        #[snafu(display("Failed mounting pool 'p1'"))]
        Mount { source: Inner },
    }

    #[test]
    fn error_chain() {
        let error = Outer::Mount { source: Inner::Fire };
        assert_eq!(error.full_string(), "Failed mounting pool 'p1': disk on fire");
    }

    #[test]
    fn reply_error_display() {
        let error = ReplyError::not_found(
            ResourceKind::Pool,
            "Pool 'p1' not found".to_string(),
            String::new(),
        );
        assert_eq!(error.to_string(), "NotFound/Pool: Pool 'p1' not found");
        assert_eq!(StatusCode::from(&error), StatusCode::NOT_FOUND);

        let error = ReplyError::deserialize_error(ResourceKind::Pool, "missing field `pools`");
        assert_eq!(error.to_string(), "DeserializeReq/Pool: missing field `pools`");
        assert_eq!(StatusCode::from(&error), StatusCode::BAD_REQUEST);
    }
}
