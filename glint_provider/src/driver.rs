use crate::io::SourceBlobIo;
use crate::provider::ResourceProvider;
use crate::request::LoadPriority;
use glint_locator::prelude::Locator;
use std::time::Duration;

/// Size-proportional fallback timeout: one second per KiB, floor 30 seconds
pub fn default_blob_timeout(size: u64) -> Duration {
    Duration::from_secs(size.div_ceil(1024).max(30))
}

/// Registry of providers resolving each locator by first match.
///
/// Registration order is the routing policy; providers must be registered
/// most-specific-first. Routing itself is stateless given the fixed list.
#[derive(Default)]
pub struct ProviderDriver {
    providers: Vec<Box<dyn ResourceProvider>>,
}

impl ProviderDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard in-process provider set: texture metadata, pixel images,
    /// shape geometry, and the embedded text library
    pub fn with_builtin_providers() -> Self {
        let mut driver = Self::new();
        driver.register(Box::new(crate::texture_meta::TextureMetaProvider));
        driver.register(Box::new(crate::pixel::PixelProvider));
        driver.register(Box::new(crate::shape::ShapeProvider));
        driver.register(Box::new(crate::embedded::EmbeddedProvider::builtin_text()));
        driver
    }

    pub fn register(&mut self, provider: Box<dyn ResourceProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn has_resource(&self, locator: &Locator) -> bool {
        self.find_provider_of(locator).is_some()
    }

    /// First registered provider claiming `locator`; stable across calls
    pub fn find_provider_of(&self, locator: &Locator) -> Option<&dyn ResourceProvider> {
        self.providers
            .iter()
            .map(|provider| provider.as_ref())
            .find(|provider| provider.has_resource(locator))
    }

    /// `None` is a routing miss, a normal silent outcome
    pub fn get_resource_io(&self, locator: &Locator) -> Option<Box<dyn SourceBlobIo>> {
        match self.find_provider_of(locator) {
            Some(provider) => provider.get_resource_io(locator),
            None => {
                tracing::debug!("No provider registered for {}", locator);
                None
            }
        }
    }

    pub fn get_blob_timeout(&self, locator: &Locator, size: u64) -> Duration {
        self.find_provider_of(locator)
            .and_then(|provider| provider.get_blob_timeout(locator, size))
            .unwrap_or_else(|| default_blob_timeout(size))
    }

    pub fn get_blob_priority(&self, locator: &Locator, priority: LoadPriority) -> LoadPriority {
        match self.find_provider_of(locator) {
            Some(provider) => provider.get_blob_priority(locator, priority),
            None => priority,
        }
    }

    pub fn for_each_locator(&self, callback: &mut dyn FnMut(&Locator)) {
        for provider in &self.providers {
            provider.for_each_locator(callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBlobIo;

    struct SchemeProvider {
        kind: &'static str,
        scheme: &'static str,
        content: &'static str,
    }

    impl ResourceProvider for SchemeProvider {
        fn kind(&self) -> &'static str {
            self.kind
        }

        fn has_resource(&self, locator: &Locator) -> bool {
            locator.has_scheme(self.scheme)
        }

        fn get_resource_io(&self, _locator: &Locator) -> Option<Box<dyn SourceBlobIo>> {
            Some(Box::new(MemoryBlobIo::from(self.content)))
        }

        fn get_blob_timeout(&self, _locator: &Locator, _size: u64) -> Option<Duration> {
            Some(Duration::from_secs(5))
        }
    }

    fn driver_with_two_txt_providers() -> ProviderDriver {
        let mut driver = ProviderDriver::new();
        driver.register(Box::new(SchemeProvider {
            kind: "first",
            scheme: "txt",
            content: "first",
        }));
        driver.register(Box::new(SchemeProvider {
            kind: "second",
            scheme: "txt",
            content: "second",
        }));
        driver
    }

    #[test]
    fn test_first_match_wins() {
        let driver = driver_with_two_txt_providers();
        let locator = Locator::parse("txt:///Doc").unwrap();
        let provider = driver.find_provider_of(&locator).unwrap();
        assert_eq!(provider.kind(), "first");
    }

    #[test]
    fn test_routing_is_stable() {
        let driver = driver_with_two_txt_providers();
        let locator = Locator::parse("txt:///Doc").unwrap();
        for _ in 0..8 {
            assert_eq!(driver.find_provider_of(&locator).unwrap().kind(), "first");
        }
    }

    #[test]
    fn test_routing_miss_is_silent() {
        let driver = driver_with_two_txt_providers();
        let locator = Locator::parse("ogg:///Music").unwrap();
        assert!(!driver.has_resource(&locator));
        assert!(driver.find_provider_of(&locator).is_none());
        assert!(driver.get_resource_io(&locator).is_none());
    }

    #[test]
    fn test_timeout_delegates_to_provider() {
        let driver = driver_with_two_txt_providers();
        let locator = Locator::parse("txt:///Doc").unwrap();
        assert_eq!(
            driver.get_blob_timeout(&locator, 1 << 20),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_timeout_default_heuristic() {
        let driver = driver_with_two_txt_providers();
        let locator = Locator::parse("ogg:///Music").unwrap();
        // unrouted locators get the size-proportional default
        assert_eq!(
            driver.get_blob_timeout(&locator, 100 * 1024),
            Duration::from_secs(100)
        );
        assert_eq!(driver.get_blob_timeout(&locator, 64), Duration::from_secs(30));
        assert_eq!(driver.get_blob_timeout(&locator, 0), Duration::from_secs(30));
    }

    #[test]
    fn test_priority_unrouted_unchanged() {
        let driver = ProviderDriver::new();
        let locator = Locator::parse("txt:///Doc").unwrap();
        assert_eq!(
            driver.get_blob_priority(&locator, LoadPriority::High),
            LoadPriority::High
        );
    }

    #[test]
    fn test_default_timeout_values() {
        assert_eq!(default_blob_timeout(0), Duration::from_secs(30));
        assert_eq!(default_blob_timeout(30 * 1024), Duration::from_secs(30));
        assert_eq!(default_blob_timeout(31 * 1024), Duration::from_secs(31));
        assert_eq!(default_blob_timeout(31 * 1024 + 1), Duration::from_secs(32));
    }
}
