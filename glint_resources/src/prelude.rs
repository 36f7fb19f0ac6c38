pub use super::context::ResourceContext;
pub use super::error::{LoadError, ResourceError};
pub use super::gfx::{
    BufferHandle, GfxError, GraphicsApi, HeadlessGraphics, ProgramHandle, ShaderHandle,
    ShaderStage, TextureDesc, TextureHandle,
};
pub use super::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
pub use super::loader::ResourceLoader;
pub use super::manager::{ManagedResource, ResourceManager};
pub use super::resources::{
    BlobResource, Geometry, GeometryAttribute, GeometryResource, GlslSourceResource,
    MappedResource, ProgramResource, ShaderResource, TextResource, TextureResource,
    ValueTreeResource,
};
pub use super::status::{LoadParams, LoadStatus};
pub use glint_locator::prelude::Locator;
pub use glint_provider::prelude::{LoadPriority, RequestId};
