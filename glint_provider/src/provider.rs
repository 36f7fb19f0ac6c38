use crate::io::SourceBlobIo;
use crate::request::LoadPriority;
use glint_locator::prelude::Locator;
use std::time::Duration;

/// Pluggable backend producing blobs for locators it recognizes.
///
/// `has_resource` must be a pure predicate over the locator, safe to call
/// speculatively; routing calls it on every registered provider in order.
pub trait ResourceProvider: Send {
    /// Short identifier tag for diagnostics
    fn kind(&self) -> &'static str;

    fn has_resource(&self, locator: &Locator) -> bool;

    /// Byte source for `locator`, or `None` when this provider cannot serve
    /// it after all
    fn get_resource_io(&self, locator: &Locator) -> Option<Box<dyn SourceBlobIo>>;

    /// Per-locator transfer timeout override
    fn get_blob_timeout(&self, _locator: &Locator, _size: u64) -> Option<Duration> {
        None
    }

    /// Per-locator priority adjustment
    fn get_blob_priority(&self, _locator: &Locator, priority: LoadPriority) -> LoadPriority {
        priority
    }

    /// Enumerates the synthetic/static locators this provider knows about
    fn for_each_locator(&self, _callback: &mut dyn FnMut(&Locator)) {}
}
