use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum LocatorError {
    #[error("Expected a non-empty locator string")]
    Empty,
    #[error("Locator is missing the \"://\" scheme separator")]
    MissingScheme,
    #[error("Locator scheme contains invalid characters")]
    InvalidScheme,
    #[error("Locator path must begin with '/'")]
    InvalidPath,
    #[error("Locator query argument has an empty name")]
    InvalidQuery,
}
