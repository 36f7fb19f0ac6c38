use crate::io::{MemoryBlobIo, SourceBlobIo};
use crate::provider::ResourceProvider;
use glam::Vec3;
use glint_locator::prelude::{Locator, LocatorBuilder, Query};
use serde_json::json;

const SHAPE_PATHS: [&str; 3] = ["/unit_cube", "/unit_quad", "/unit_triangle"];

/// Procedurally generated unit geometry served as JSON attribute documents.
///
/// Boolean query flags (`position`, `normal`, `uv`, `index`) select which
/// attribute arrays the document carries; `position` defaults to enabled.
pub struct ShapeProvider;

#[derive(Debug, Copy, Clone)]
struct AttribSelection {
    position: bool,
    normal: bool,
    uv: bool,
    index: bool,
}

fn flag_or(query: &Query, name: &str, default: bool) -> bool {
    if query.has_arg(name) {
        query.arg_flag(name)
    } else {
        default
    }
}

impl AttribSelection {
    fn from_query(query: &Query) -> Self {
        Self {
            position: flag_or(query, "position", true),
            normal: flag_or(query, "normal", false),
            uv: flag_or(query, "uv", false),
            index: flag_or(query, "index", false),
        }
    }
}

struct ShapeBuffers {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

fn unit_quad() -> ShapeBuffers {
    ShapeBuffers {
        positions: vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ],
        normals: vec![Vec3::Z; 4],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

fn unit_triangle() -> ShapeBuffers {
    ShapeBuffers {
        positions: vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        normals: vec![Vec3::Z; 3],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]],
        indices: vec![0, 1, 2],
    }
}

fn unit_cube() -> ShapeBuffers {
    let faces = [
        (Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_X, Vec3::Z),
        (Vec3::Y, Vec3::X),
        (Vec3::NEG_Y, Vec3::X),
        (Vec3::Z, Vec3::X),
        (Vec3::NEG_Z, Vec3::NEG_X),
    ];
    let corners = [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut buffers = ShapeBuffers {
        positions: Vec::with_capacity(24),
        normals: Vec::with_capacity(24),
        uvs: Vec::with_capacity(24),
        indices: Vec::with_capacity(36),
    };
    for (normal, tangent) in faces {
        let bitangent = normal.cross(tangent);
        let base = buffers.positions.len() as u32;
        for (s, t) in corners {
            buffers.positions.push(normal + tangent * s + bitangent * t);
            buffers.normals.push(normal);
            buffers.uvs.push([(s + 1.0) * 0.5, (t + 1.0) * 0.5]);
        }
        buffers
            .indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    buffers
}

fn flatten_vec3(values: &[Vec3]) -> Vec<f32> {
    values
        .iter()
        .flat_map(|value| value.to_array())
        .collect()
}

fn flatten_vec2(values: &[[f32; 2]]) -> Vec<f32> {
    values.iter().flatten().copied().collect()
}

fn render_document(name: &str, buffers: &ShapeBuffers, selection: AttribSelection) -> String {
    let mut attributes = serde_json::Map::new();
    if selection.position {
        attributes.insert(
            "position".to_string(),
            json!({
                "values_per_vertex": 3,
                "data": flatten_vec3(&buffers.positions),
            }),
        );
    }
    if selection.normal {
        attributes.insert(
            "normal".to_string(),
            json!({
                "values_per_vertex": 3,
                "data": flatten_vec3(&buffers.normals),
            }),
        );
    }
    if selection.uv {
        attributes.insert(
            "uv".to_string(),
            json!({
                "values_per_vertex": 2,
                "data": flatten_vec2(&buffers.uvs),
            }),
        );
    }
    let mut document = json!({
        "name": name,
        "vertex_count": buffers.positions.len(),
        "attributes": attributes,
    });
    if selection.index {
        document["indices"] = json!(buffers.indices);
    }
    document.to_string()
}

impl ResourceProvider for ShapeProvider {
    fn kind(&self) -> &'static str {
        "shape"
    }

    fn has_resource(&self, locator: &Locator) -> bool {
        locator.has_scheme("shape") && SHAPE_PATHS.contains(&locator.path())
    }

    fn get_resource_io(&self, locator: &Locator) -> Option<Box<dyn SourceBlobIo>> {
        if !self.has_resource(locator) {
            return None;
        }
        let buffers = match locator.path() {
            "/unit_cube" => unit_cube(),
            "/unit_quad" => unit_quad(),
            "/unit_triangle" => unit_triangle(),
            _ => return None,
        };
        let selection = AttribSelection::from_query(locator.query());
        let document = render_document(locator.path_identifier(), &buffers, selection);
        Some(Box::new(MemoryBlobIo::from(document)))
    }

    fn for_each_locator(&self, callback: &mut dyn FnMut(&Locator)) {
        for path in SHAPE_PATHS {
            if let Ok(locator) = LocatorBuilder::new("shape").path(path).build() {
                callback(&locator);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_document(locator: &str) -> serde_json::Value {
        let locator = Locator::parse(locator).unwrap();
        let io = ShapeProvider.get_resource_io(&locator).unwrap();
        let mut dest = vec![0u8; io.total_size() as usize];
        io.fetch_fragment(0, &mut dest);
        serde_json::from_slice(&dest).unwrap()
    }

    #[test]
    fn test_recognizes_unit_shapes() {
        for path in ["unit_cube", "unit_quad", "unit_triangle"] {
            let locator = Locator::parse(&format!("shape:///{path}")).unwrap();
            assert!(ShapeProvider.has_resource(&locator), "{path}");
        }
        let unknown = Locator::parse("shape:///torus").unwrap();
        assert!(!ShapeProvider.has_resource(&unknown));
    }

    #[test]
    fn test_cube_document_shape() {
        let doc = fetch_document("shape:///unit_cube?position=true&normal=true&index=true");
        assert_eq!(doc["name"], "unit_cube");
        assert_eq!(doc["vertex_count"], 24);
        assert_eq!(
            doc["attributes"]["position"]["data"]
                .as_array()
                .unwrap()
                .len(),
            24 * 3
        );
        assert_eq!(
            doc["attributes"]["normal"]["data"].as_array().unwrap().len(),
            24 * 3
        );
        assert_eq!(doc["indices"].as_array().unwrap().len(), 36);
    }

    #[test]
    fn test_position_default_enabled() {
        let doc = fetch_document("shape:///unit_quad");
        assert!(doc["attributes"]["position"].is_object());
        assert!(doc["attributes"].get("normal").is_none());
        assert!(doc.get("indices").is_none());
    }

    #[test]
    fn test_attributes_deselectable() {
        let doc = fetch_document("shape:///unit_quad?position=false&uv=true");
        assert!(doc["attributes"].get("position").is_none());
        assert_eq!(doc["attributes"]["uv"]["values_per_vertex"], 2);
    }

    #[test]
    fn test_triangle_indices() {
        let doc = fetch_document("shape:///unit_triangle?index=true");
        assert_eq!(doc["vertex_count"], 3);
        assert_eq!(doc["indices"], json!([0, 1, 2]));
    }

    #[test]
    fn test_cube_indices_in_range() {
        let doc = fetch_document("shape:///unit_cube?index=true");
        let vertex_count = doc["vertex_count"].as_u64().unwrap();
        for index in doc["indices"].as_array().unwrap() {
            assert!(index.as_u64().unwrap() < vertex_count);
        }
    }

    #[test]
    fn test_for_each_locator() {
        let mut seen = Vec::new();
        ShapeProvider.for_each_locator(&mut |locator| seen.push(locator.to_string()));
        assert_eq!(
            seen,
            vec![
                "shape:///unit_cube",
                "shape:///unit_quad",
                "shape:///unit_triangle"
            ]
        );
    }
}
