pub mod blob;
pub mod geometry;
pub mod glsl_source;
pub mod mapped;
pub mod program;
pub mod shader;
pub mod text;
pub mod texture;
pub mod value_tree;

pub use blob::BlobResource;
pub use geometry::{Geometry, GeometryAttribute, GeometryResource};
pub use glsl_source::GlslSourceResource;
pub use mapped::MappedResource;
pub use program::ProgramResource;
pub use shader::ShaderResource;
pub use text::TextResource;
pub use texture::TextureResource;
pub use value_tree::ValueTreeResource;
