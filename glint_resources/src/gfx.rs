use std::cell::Cell;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GfxError {
    #[error("shader compile error: {0}")]
    Compile(String),
    #[error("program link error: {0}")]
    Link(String),
    #[error("graphics allocation failed: {0}")]
    Allocation(&'static str),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

impl ShaderStage {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(Self::Vertex),
            "fragment" => Some(Self::Fragment),
            "geometry" => Some(Self::Geometry),
            "compute" => Some(Self::Compute),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
            Self::Compute => "compute",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub levels: u32,
}

/// The slice of the GL object model the resource kinds target.
///
/// Handles are opaque and only meaningful to the backend that issued them;
/// zero is never issued.
pub trait GraphicsApi {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, GfxError>;

    fn link_program(&self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, GfxError>;

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle, GfxError>;

    fn upload_texture_level(
        &self,
        texture: TextureHandle,
        level: u32,
        data: &[u8],
    ) -> Result<(), GfxError>;

    fn create_buffer(&self, data: &[u8]) -> Result<BufferHandle, GfxError>;
}

/// Backend recording object creation without a GL context
#[derive(Debug, Default)]
pub struct HeadlessGraphics {
    next_handle: Cell<u32>,
    shaders_compiled: Cell<u32>,
    programs_linked: Cell<u32>,
    textures_created: Cell<u32>,
    levels_uploaded: Cell<u32>,
    buffers_created: Cell<u32>,
}

impl HeadlessGraphics {
    fn allocate(&self) -> u32 {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        handle
    }

    pub fn shaders_compiled(&self) -> u32 {
        self.shaders_compiled.get()
    }

    pub fn programs_linked(&self) -> u32 {
        self.programs_linked.get()
    }

    pub fn textures_created(&self) -> u32 {
        self.textures_created.get()
    }

    pub fn levels_uploaded(&self) -> u32 {
        self.levels_uploaded.get()
    }

    pub fn buffers_created(&self) -> u32 {
        self.buffers_created.get()
    }
}

impl GraphicsApi for HeadlessGraphics {
    fn compile_shader(&self, _stage: ShaderStage, source: &str) -> Result<ShaderHandle, GfxError> {
        if source.trim().is_empty() {
            return Err(GfxError::Compile("empty shader source".to_string()));
        }
        self.shaders_compiled.set(self.shaders_compiled.get() + 1);
        Ok(ShaderHandle(self.allocate()))
    }

    fn link_program(&self, shaders: &[ShaderHandle]) -> Result<ProgramHandle, GfxError> {
        if shaders.is_empty() {
            return Err(GfxError::Link("no shaders attached".to_string()));
        }
        self.programs_linked.set(self.programs_linked.get() + 1);
        Ok(ProgramHandle(self.allocate()))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle, GfxError> {
        if desc.width == 0 || desc.height == 0 || desc.levels == 0 {
            return Err(GfxError::Allocation("empty texture extent"));
        }
        self.textures_created.set(self.textures_created.get() + 1);
        Ok(TextureHandle(self.allocate()))
    }

    fn upload_texture_level(
        &self,
        _texture: TextureHandle,
        _level: u32,
        data: &[u8],
    ) -> Result<(), GfxError> {
        if data.is_empty() {
            return Err(GfxError::Allocation("empty level image"));
        }
        self.levels_uploaded.set(self.levels_uploaded.get() + 1);
        Ok(())
    }

    fn create_buffer(&self, data: &[u8]) -> Result<BufferHandle, GfxError> {
        if data.is_empty() {
            return Err(GfxError::Allocation("empty buffer"));
        }
        self.buffers_created.set(self.buffers_created.get() + 1);
        Ok(BufferHandle(self.allocate()))
    }
}
