use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::gfx::{ShaderHandle, ShaderStage};
use crate::interface::{LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests};
use crate::resources::glsl_source::GlslSourceResource;
use crate::status::LoadParams;
use glint_locator::prelude::Locator;
use std::cell::Cell;
use std::rc::Rc;

/// Compiled shader object of one stage.
///
/// The stage comes from a `?stage=` argument or a conventional path suffix;
/// a locator carrying neither is not a shader locator.
#[derive(Default)]
pub struct ShaderResource {
    cell: ResourceCell,
    stage: Cell<Option<ShaderStage>>,
    shader: Cell<Option<ShaderHandle>>,
}

impl ShaderResource {
    pub fn stage(&self) -> Option<ShaderStage> {
        self.stage.get()
    }

    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader.get()
    }
}

const STAGE_SUFFIXES: [(&str, ShaderStage); 4] = [
    (".vert", ShaderStage::Vertex),
    (".frag", ShaderStage::Fragment),
    (".geom", ShaderStage::Geometry),
    (".comp", ShaderStage::Compute),
];

fn stage_of(locator: &Locator) -> Option<ShaderStage> {
    if let Some(name) = locator.query().arg_value("stage") {
        return ShaderStage::parse(name);
    }
    STAGE_SUFFIXES
        .into_iter()
        .find(|(suffix, _)| locator.has_path_suffix(suffix))
        .map(|(_, stage)| stage)
}

impl Loadable for ShaderResource {
    fn kind(&self) -> &'static str {
        "shader"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        let stage = stage_of(&params.locator)?;
        Some(Box::new(ShaderLoadTask {
            resource: self,
            params: params.clone(),
            stage,
            source: Rc::new(GlslSourceResource::default()),
        }))
    }
}

struct ShaderLoadTask {
    resource: Rc<ShaderResource>,
    params: LoadParams,
    stage: ShaderStage,
    source: Rc<GlslSourceResource>,
}

impl LoadTask for ShaderLoadTask {
    fn start(
        &mut self,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        requests.load_dependency(self.source.clone(), self.params.clone());
        Ok(())
    }

    fn on_event(
        &mut self,
        _event: TaskEvent<'_>,
        _ctx: &ResourceContext,
        _requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        Ok(())
    }

    fn finalize(self: Box<Self>, ctx: &ResourceContext) -> Result<(), LoadError> {
        let source = self.source.source().ok_or(LoadError::DependencyFailed)?;
        let shader = ctx.gfx().compile_shader(self.stage, &source)?;
        self.resource.stage.set(Some(self.stage));
        self.resource.shader.set(Some(shader));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(locator: &str) -> Option<ShaderStage> {
        stage_of(&Locator::parse(locator).unwrap())
    }

    #[test]
    fn test_stage_from_argument() {
        assert_eq!(stage("glsl:///draw?stage=vertex"), Some(ShaderStage::Vertex));
        assert_eq!(
            stage("glsl:///draw?stage=fragment"),
            Some(ShaderStage::Fragment)
        );
        assert_eq!(stage("glsl:///draw?stage=bogus"), None);
    }

    #[test]
    fn test_stage_from_suffix() {
        assert_eq!(stage("glsl:///fog.vert"), Some(ShaderStage::Vertex));
        assert_eq!(stage("glsl:///fog.frag"), Some(ShaderStage::Fragment));
        assert_eq!(stage("glsl:///cull.comp"), Some(ShaderStage::Compute));
        assert_eq!(stage("glsl:///fog.glsl"), None);
    }

    #[test]
    fn test_argument_beats_suffix() {
        assert_eq!(
            stage("glsl:///fog.vert?stage=fragment"),
            Some(ShaderStage::Fragment)
        );
    }
}
