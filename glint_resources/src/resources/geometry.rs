use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::gfx::BufferHandle;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Vertex attribute and index buffers uploaded from a shape document
#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: String,
    pub vertex_count: u32,
    pub attributes: HashMap<String, GeometryAttribute>,
    pub index_buffer: Option<BufferHandle>,
    pub index_count: u32,
}

#[derive(Debug, Copy, Clone)]
pub struct GeometryAttribute {
    pub buffer: BufferHandle,
    pub values_per_vertex: u32,
}

/// Generated shape geometry (`shape:///unit_cube?normal=true&index=true`)
#[derive(Default)]
pub struct GeometryResource {
    cell: ResourceCell,
    geometry: RefCell<Option<Geometry>>,
}

impl GeometryResource {
    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry.borrow().clone()
    }
}

#[derive(Debug, Deserialize)]
struct ShapeAttribute {
    values_per_vertex: u32,
    data: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ShapeDoc {
    name: String,
    vertex_count: u32,
    attributes: HashMap<String, ShapeAttribute>,
    #[serde(default)]
    indices: Vec<u32>,
}

fn validate(doc: &ShapeDoc) -> Result<(), LoadError> {
    for (name, attribute) in &doc.attributes {
        let expected = doc.vertex_count as usize * attribute.values_per_vertex as usize;
        if attribute.data.len() != expected {
            return Err(LoadError::Parse(format!(
                "attribute {name:?} has {} values, expected {expected}",
                attribute.data.len()
            )));
        }
    }
    for index in &doc.indices {
        if *index >= doc.vertex_count {
            return Err(LoadError::Parse(format!(
                "index {index} out of range for {} vertices",
                doc.vertex_count
            )));
        }
    }
    Ok(())
}

impl Loadable for GeometryResource {
    fn kind(&self) -> &'static str {
        "geometry"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(GeometryLoadTask {
            resource: self,
            params: params.clone(),
            data: BlobAccumulator::default(),
        }))
    }
}

struct GeometryLoadTask {
    resource: Rc<GeometryResource>,
    params: LoadParams,
    data: BlobAccumulator,
}

impl LoadTask for GeometryLoadTask {
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
        _requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        match event {
            TaskEvent::Chunk { offset, data, .. } => self.data.append(offset, data),
            _ => Ok(()),
        }
    }

    fn finalize(self: Box<Self>, ctx: &ResourceContext) -> Result<(), LoadError> {
        let task = *self;
        let doc: ShapeDoc = serde_json::from_slice(task.data.bytes())
            .map_err(|error| LoadError::Parse(error.to_string()))?;
        validate(&doc)?;

        let mut attributes = HashMap::with_capacity(doc.attributes.len());
        for (name, attribute) in doc.attributes {
            let buffer = ctx.gfx().create_buffer(bytemuck::cast_slice(&attribute.data))?;
            attributes.insert(
                name,
                GeometryAttribute {
                    buffer,
                    values_per_vertex: attribute.values_per_vertex,
                },
            );
        }
        let index_count = doc.indices.len() as u32;
        let index_buffer = if doc.indices.is_empty() {
            None
        } else {
            Some(ctx.gfx().create_buffer(bytemuck::cast_slice(&doc.indices))?)
        };
        *task.resource.geometry.borrow_mut() = Some(Geometry {
            name: doc.name,
            vertex_count: doc.vertex_count,
            attributes,
            index_buffer,
            index_count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(document: &str) -> ShapeDoc {
        serde_json::from_str(document).unwrap()
    }

    #[test]
    fn test_shape_doc_parse() {
        let doc = parse(
            r#"{
                "name": "unit_triangle",
                "vertex_count": 3,
                "attributes": {
                    "position": {"values_per_vertex": 3, "data": [0,0,0, 1,0,0, 0,1,0]}
                },
                "indices": [0, 1, 2]
            }"#,
        );
        assert_eq!(doc.name, "unit_triangle");
        assert_eq!(doc.vertex_count, 3);
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_indices_optional() {
        let doc = parse(
            r#"{"name": "quad", "vertex_count": 1,
                "attributes": {"position": {"values_per_vertex": 3, "data": [0,0,0]}}}"#,
        );
        assert!(doc.indices.is_empty());
        assert!(validate(&doc).is_ok());
    }

    #[test]
    fn test_validate_rejects_short_attribute() {
        let doc = parse(
            r#"{"name": "quad", "vertex_count": 4,
                "attributes": {"position": {"values_per_vertex": 3, "data": [0,0,0]}}}"#,
        );
        assert!(matches!(validate(&doc), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let doc = parse(
            r#"{"name": "tri", "vertex_count": 3,
                "attributes": {"position": {"values_per_vertex": 3, "data": [0,0,0, 1,0,0, 0,1,0]}},
                "indices": [0, 1, 3]}"#,
        );
        assert!(matches!(validate(&doc), Err(LoadError::Parse(_))));
    }
}
