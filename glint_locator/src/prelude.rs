pub use super::builder::LocatorBuilder;
pub use super::error::LocatorError;
pub use super::locator::Locator;
pub use super::query::Query;
