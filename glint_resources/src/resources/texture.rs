use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::gfx::{TextureDesc, TextureHandle};
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use glint_locator::prelude::Locator;
use glint_provider::prelude::RequestId;
use serde::Deserialize;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Texture built from a JSON header and the per-level pixel images it
/// references.
///
/// The header's `images` array is fetched verbatim, one request per level;
/// upload happens only after every level has arrived.
#[derive(Default)]
pub struct TextureResource {
    cell: ResourceCell,
    texture: Cell<Option<TextureHandle>>,
    desc: Cell<Option<TextureDesc>>,
}

impl TextureResource {
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture.get()
    }

    pub fn desc(&self) -> Option<TextureDesc> {
        self.desc.get()
    }
}

#[derive(Debug, Deserialize)]
struct TextureHeader {
    width: u32,
    height: u32,
    levels: u32,
    images: Vec<String>,
}

impl Loadable for TextureResource {
    fn kind(&self) -> &'static str {
        "texture"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(TextureLoadTask {
            resource: self,
            params: params.clone(),
            header_request: RequestId::INVALID,
            header: BlobAccumulator::default(),
            desc: None,
            level_fetches: HashMap::new(),
            level_data: Vec::new(),
        }))
    }
}

struct TextureLoadTask {
    resource: Rc<TextureResource>,
    params: LoadParams,
    header_request: RequestId,
    header: BlobAccumulator,
    desc: Option<TextureDesc>,
    /// Open level fetches: request id to level index and partial pixels
    level_fetches: HashMap<RequestId, (u32, BlobAccumulator)>,
    level_data: Vec<Option<Vec<u8>>>,
}

impl LoadTask for TextureLoadTask {
    fn start(
        &mut self,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        self.header_request = requests.fetch(
            self.params.locator.clone(),
            self.params.priority,
            self.params.timeout,
        );
        Ok(())
    }

    fn on_event(
        &mut self,
        event: TaskEvent<'_>,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        match event {
            TaskEvent::Chunk {
                request,
                offset,
                data,
            } => {
                if request == self.header_request {
                    self.header.append(offset, data)
                } else if let Some((_, accumulator)) = self.level_fetches.get_mut(&request) {
                    accumulator.append(offset, data)
                } else {
                    Ok(())
                }
            }
            TaskEvent::StreamDone { request } => {
                if request == self.header_request {
                    let header: TextureHeader = serde_json::from_slice(self.header.bytes())
                        .map_err(|error| LoadError::Parse(error.to_string()))?;
                    if header.images.len() != header.levels as usize {
                        return Err(LoadError::Parse(format!(
                            "header declares {} levels but lists {} images",
                            header.levels,
                            header.images.len()
                        )));
                    }
                    self.level_data = vec![None; header.images.len()];
                    for (level, image) in header.images.iter().enumerate() {
                        let locator = Locator::parse(image).map_err(|error| {
                            LoadError::Parse(format!("level image url {image:?}: {error}"))
                        })?;
                        let request =
                            requests.fetch(locator, self.params.priority, self.params.timeout);
                        self.level_fetches
                            .insert(request, (level as u32, BlobAccumulator::default()));
                    }
                    self.desc = Some(TextureDesc {
                        width: header.width,
                        height: header.height,
                        levels: header.levels,
                    });
                } else if let Some((level, accumulator)) = self.level_fetches.remove(&request) {
                    self.level_data[level as usize] = Some(accumulator.into_bytes());
                }
                Ok(())
            }
            TaskEvent::DependencyDone { .. } => Ok(()),
        }
    }

    fn finalize(self: Box<Self>, ctx: &ResourceContext) -> Result<(), LoadError> {
        let task = *self;
        let desc = task
            .desc
            .ok_or_else(|| LoadError::Parse("texture header never arrived".to_string()))?;
        let texture = ctx.gfx().create_texture(&desc)?;
        for (level, data) in task.level_data.into_iter().enumerate() {
            let data = data
                .ok_or_else(|| LoadError::Parse(format!("level {level} image never arrived")))?;
            ctx.gfx().upload_texture_level(texture, level as u32, &data)?;
        }
        task.resource.desc.set(Some(desc));
        task.resource.texture.set(Some(texture));
        Ok(())
    }
}
