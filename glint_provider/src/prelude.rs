pub use super::driver::ProviderDriver;
pub use super::embedded::EmbeddedProvider;
pub use super::error::ProviderError;
pub use super::io::{MemoryBlobIo, SourceBlobIo};
pub use super::pixel::PixelProvider;
pub use super::provider::ResourceProvider;
pub use super::request::{LoadPriority, RequestId};
pub use super::service::{BlobEvent, FetchRequest, ProviderClient, ProviderServer};
pub use super::shape::ShapeProvider;
pub use super::texture_meta::TextureMetaProvider;
