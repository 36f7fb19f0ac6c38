use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ProviderError {
    #[error("Provider service endpoint is no longer running")]
    ServiceStopped,
}
