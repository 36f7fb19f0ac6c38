use glint_locator::prelude::Locator;
use glint_provider::prelude::LoadPriority;
use std::time::Duration;

/// Lifecycle of one loadable resource.
///
/// `Loaded`, `Cancelled` and `Failed` are terminal; nothing moves a resource
/// out of them except an explicit new load request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    #[default]
    Created,
    Loading,
    Loaded,
    Cancelled,
    Failed,
}

impl LoadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Cancelled | Self::Failed)
    }

    pub fn is_loaded(self) -> bool {
        self == Self::Loaded
    }
}

/// Source locator and transfer settings of one load request
#[derive(Debug, Clone)]
pub struct LoadParams {
    pub locator: Locator,
    pub priority: LoadPriority,
    /// Overrides the provider-resolved transfer timeout when set
    pub timeout: Option<Duration>,
}

impl LoadParams {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            priority: LoadPriority::default(),
            timeout: None,
        }
    }

    pub fn with_priority(mut self, priority: LoadPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_created() {
        assert_eq!(LoadStatus::default(), LoadStatus::Created);
        assert!(!LoadStatus::Created.is_terminal());
        assert!(!LoadStatus::Loading.is_terminal());
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoadStatus::Loaded.is_terminal());
        assert!(LoadStatus::Cancelled.is_terminal());
        assert!(LoadStatus::Failed.is_terminal());
        assert!(LoadStatus::Loaded.is_loaded());
        assert!(!LoadStatus::Failed.is_loaded());
    }

    #[test]
    fn test_params_builder() {
        let params = LoadParams::new(Locator::parse("txt:///TestText").unwrap())
            .with_priority(LoadPriority::High)
            .with_timeout(Duration::from_secs(2));
        assert_eq!(params.priority, LoadPriority::High);
        assert_eq!(params.timeout, Some(Duration::from_secs(2)));
    }
}
