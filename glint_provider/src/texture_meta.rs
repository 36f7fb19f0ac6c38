use crate::io::{MemoryBlobIo, SourceBlobIo};
use crate::provider::ResourceProvider;
use glint_locator::prelude::{Locator, LocatorBuilder};
use serde_json::json;

const TEXTURE_PATHS: [&str; 2] = ["/checker", "/solid"];

/// Texture metadata documents (`eagitex:///checker?size=N&levels=L`).
///
/// The emitted JSON header carries one `eagitexi` sub-locator per level,
/// built with [`LocatorBuilder`] so consumers can re-parse them verbatim.
pub struct TextureMetaProvider;

const FORWARDED_ARGS: [&str; 4] = ["color", "color0", "color1", "div"];

impl TextureMetaProvider {
    fn render_header(&self, locator: &Locator) -> Option<String> {
        let query = locator.query();
        let size = query.arg_value_or("size", 64u32).max(1);
        let max_levels = 32 - size.leading_zeros();
        let levels = query.arg_value_or("levels", 1u32).clamp(1, max_levels);

        let mut images = Vec::with_capacity(levels as usize);
        for level in 0..levels {
            // pixel providers scale the base extent down by the level themselves
            let mut builder = LocatorBuilder::new("eagitexi")
                .path_segment(locator.path_identifier())
                .arg("level", level)
                .arg("width", size)
                .arg("height", size);
            for name in FORWARDED_ARGS {
                if let Some(value) = query.arg_value(name) {
                    builder = builder.arg(name, value);
                }
            }
            images.push(builder.build().ok()?.to_string());
        }

        let header = json!({
            "width": size,
            "height": size,
            "levels": levels,
            "channels": 4,
            "data_type": "unsigned_byte",
            "format": "rgba",
            "iformat": "rgba8",
            "images": images,
        });
        Some(header.to_string())
    }
}

impl ResourceProvider for TextureMetaProvider {
    fn kind(&self) -> &'static str {
        "texture_meta"
    }

    fn has_resource(&self, locator: &Locator) -> bool {
        locator.has_scheme("eagitex") && TEXTURE_PATHS.contains(&locator.path())
    }

    fn get_resource_io(&self, locator: &Locator) -> Option<Box<dyn SourceBlobIo>> {
        if !self.has_resource(locator) {
            return None;
        }
        let header = self.render_header(locator)?;
        Some(Box::new(MemoryBlobIo::from(header)))
    }

    fn for_each_locator(&self, callback: &mut dyn FnMut(&Locator)) {
        for path in TEXTURE_PATHS {
            if let Ok(locator) = LocatorBuilder::new("eagitex").path(path).build() {
                callback(&locator);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_header(locator: &str) -> serde_json::Value {
        let locator = Locator::parse(locator).unwrap();
        let io = TextureMetaProvider.get_resource_io(&locator).unwrap();
        let mut dest = vec![0u8; io.total_size() as usize];
        io.fetch_fragment(0, &mut dest);
        serde_json::from_slice(&dest).unwrap()
    }

    #[test]
    fn test_recognizes_texture_paths() {
        assert!(TextureMetaProvider.has_resource(&Locator::parse("eagitex:///checker").unwrap()));
        assert!(!TextureMetaProvider.has_resource(&Locator::parse("eagitex:///noise").unwrap()));
        assert!(!TextureMetaProvider.has_resource(&Locator::parse("eagitexi:///checker").unwrap()));
    }

    #[test]
    fn test_header_basic_fields() {
        let header = fetch_header("eagitex:///checker?size=64&levels=4");
        assert_eq!(header["width"], 64);
        assert_eq!(header["height"], 64);
        assert_eq!(header["levels"], 4);
        assert_eq!(header["channels"], 4);
        assert_eq!(header["images"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_image_locators_reparse() {
        let header = fetch_header("eagitex:///checker?size=64&levels=3");
        for (level, image) in header["images"].as_array().unwrap().iter().enumerate() {
            let locator = Locator::parse(image.as_str().unwrap()).unwrap();
            assert!(locator.has_scheme("eagitexi"));
            assert!(locator.has_path("/checker"));
            assert_eq!(
                locator.query().arg_value_as::<u32>("level"),
                Some(level as u32)
            );
        }
    }

    #[test]
    fn test_image_locators_carry_base_extent() {
        let header = fetch_header("eagitex:///solid?size=16&levels=5");
        for image in header["images"].as_array().unwrap() {
            let query_width = Locator::parse(image.as_str().unwrap())
                .unwrap()
                .query()
                .arg_value_as::<u32>("width");
            assert_eq!(query_width, Some(16));
        }
    }

    #[test]
    fn test_levels_clamped_to_extent() {
        let header = fetch_header("eagitex:///checker?size=4&levels=10");
        // a 4x4 texture has at most 3 levels
        assert_eq!(header["levels"], 3);
    }

    #[test]
    fn test_color_args_forwarded() {
        let header = fetch_header("eagitex:///solid?size=8&color=112233FF");
        let image = Locator::parse(header["images"][0].as_str().unwrap()).unwrap();
        assert_eq!(image.query().arg_value("color"), Some("112233FF"));
    }
}
