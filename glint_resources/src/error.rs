use crate::gfx::GfxError;
use thiserror::Error;

/// Why one load attempt ended without a payload
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no provider had the resource")]
    NotFound,
    #[error("blob transfer timed out")]
    Timeout,
    #[error("blob fragment arrived out of order")]
    FragmentOrder,
    #[error("content is not valid UTF-8")]
    Encoding,
    #[error("malformed content: {0}")]
    Parse(String),
    #[error("include cycle through {0}")]
    IncludeCycle(String),
    #[error("missing include {0}")]
    MissingInclude(String),
    #[error("a dependency failed to load")]
    DependencyFailed,
    #[error("load cancelled")]
    Cancelled,
    #[error("provider service stopped")]
    ServiceStopped,
    #[error(transparent)]
    Gfx(#[from] GfxError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource {id:?} is already managed as a different type")]
    TypeConflict { id: String },
}
