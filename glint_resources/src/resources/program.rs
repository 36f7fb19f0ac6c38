use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::gfx::ProgramHandle;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::resources::shader::ShaderResource;
use crate::status::LoadParams;
use glint_locator::prelude::Locator;
use serde::Deserialize;
use std::cell::Cell;
use std::rc::Rc;

/// Linked program assembled from a JSON manifest of shader locators.
///
/// All listed shaders must load and compile; one failure cancels the whole
/// program load.
#[derive(Default)]
pub struct ProgramResource {
    cell: ResourceCell,
    program: Cell<Option<ProgramHandle>>,
}

impl ProgramResource {
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program.get()
    }
}

#[derive(Debug, Deserialize)]
struct ProgramManifest {
    shaders: Vec<ShaderEntry>,
}

#[derive(Debug, Deserialize)]
struct ShaderEntry {
    url: String,
    #[serde(default)]
    stage: Option<String>,
}

/// A manifest `stage` field is appended as a query argument unless the url
/// already carries one
fn shader_locator(entry: &ShaderEntry) -> Result<Locator, LoadError> {
    let mut url = entry.url.clone();
    if let Some(stage) = &entry.stage {
        if !url.contains("stage=") {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("stage=");
            url.push_str(stage);
        }
    }
    Locator::parse(&url).map_err(|error| LoadError::Parse(format!("shader url {url:?}: {error}")))
}

impl Loadable for ProgramResource {
    fn kind(&self) -> &'static str {
        "program"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(ProgramLoadTask {
            resource: self,
            params: params.clone(),
            manifest: BlobAccumulator::default(),
            shaders: Vec::new(),
        }))
    }
}

struct ProgramLoadTask {
    resource: Rc<ProgramResource>,
    params: LoadParams,
    manifest: BlobAccumulator,
    shaders: Vec<Rc<ShaderResource>>,
}

impl LoadTask for ProgramLoadTask {
    fn start(
        &mut self,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        requests.fetch(
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
            TaskEvent::Chunk { offset, data, .. } => self.manifest.append(offset, data),
            TaskEvent::StreamDone { .. } => {
                let manifest: ProgramManifest = serde_json::from_slice(self.manifest.bytes())
                    .map_err(|error| LoadError::Parse(error.to_string()))?;
                if manifest.shaders.is_empty() {
                    return Err(LoadError::Parse(
                        "program manifest lists no shaders".to_string(),
                    ));
                }
                for entry in &manifest.shaders {
                    let locator = shader_locator(entry)?;
                    let shader = Rc::new(ShaderResource::default());
                    let mut params =
                        LoadParams::new(locator).with_priority(self.params.priority);
                    params.timeout = self.params.timeout;
                    requests.load_dependency(shader.clone(), params);
                    self.shaders.push(shader);
                }
                Ok(())
            }
            TaskEvent::DependencyDone { .. } => Ok(()),
        }
    }

    fn finalize(self: Box<Self>, ctx: &ResourceContext) -> Result<(), LoadError> {
        let mut handles = Vec::with_capacity(self.shaders.len());
        for shader in &self.shaders {
            handles.push(shader.shader().ok_or(LoadError::DependencyFailed)?);
        }
        let program = ctx.gfx().link_program(&handles)?;
        self.resource.program.set(Some(program));
        Ok(())
    }
}
