use crate::transport_api::{ReplyError, ReplyErrorKind};
use http::StatusCode;

pub mod v0;

impl From<&ReplyError> for StatusCode {
    fn from(src: &ReplyError) -> Self {
        match &src.kind {
            ReplyErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ReplyErrorKind::DeserializeReq => StatusCode::BAD_REQUEST,
            ReplyErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ReplyErrorKind::NotFound => StatusCode::NOT_FOUND,
            ReplyErrorKind::AlreadyExists => StatusCode::UNPROCESSABLE_ENTITY,
            ReplyErrorKind::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            ReplyErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ReplyErrorKind::FailedPersist => StatusCode::INSUFFICIENT_STORAGE,
            ReplyErrorKind::FailedMount => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
