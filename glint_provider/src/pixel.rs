use crate::io::{MemoryBlobIo, SourceBlobIo};
use crate::provider::ResourceProvider;
use glint_locator::prelude::{Locator, Query};

const PIXEL_PATHS: [&str; 2] = ["/checker", "/solid"];

/// Raw RGBA8 pixel buffers for single texture levels
/// (`eagitexi:///checker?level=L&width=W&height=H`).
pub struct PixelProvider;

fn parse_color(hex: &str) -> Option<[u8; 4]> {
    if hex.len() != 8 {
        return None;
    }
    u32::from_str_radix(hex, 16)
        .ok()
        .map(|value| value.to_be_bytes())
}

fn color_arg(query: &Query, name: &str, default: [u8; 4]) -> Option<[u8; 4]> {
    match query.arg_value(name) {
        Some(hex) => parse_color(hex),
        None => Some(default),
    }
}

fn level_extent(extent: u32, level: u32) -> u32 {
    (extent >> level).max(1)
}

fn checker_pixels(width: u32, height: u32, div: u32, colors: [[u8; 4]; 2]) -> Vec<[u8; 4]> {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let cell = ((x / div) + (y / div)) % 2;
            pixels.push(colors[cell as usize]);
        }
    }
    pixels
}

impl PixelProvider {
    fn generate(&self, locator: &Locator) -> Option<Vec<u8>> {
        let query = locator.query();
        let level = query.arg_value_or("level", 0u32);
        let width = level_extent(query.arg_value_or("width", 64u32), level);
        let height = level_extent(query.arg_value_or("height", 64u32), level);
        let pixels = match locator.path() {
            "/checker" => {
                let div = level_extent(query.arg_value_or("div", 8u32), level);
                let color0 = color_arg(query, "color0", [0x00, 0x00, 0x00, 0xFF])?;
                let color1 = color_arg(query, "color1", [0xFF, 0xFF, 0xFF, 0xFF])?;
                checker_pixels(width, height, div, [color0, color1])
            }
            "/solid" => {
                let color = color_arg(query, "color", [0xFF, 0xFF, 0xFF, 0xFF])?;
                vec![color; (width * height) as usize]
            }
            _ => return None,
        };
        Some(bytemuck::cast_slice(&pixels).to_vec())
    }
}

impl ResourceProvider for PixelProvider {
    fn kind(&self) -> &'static str {
        "pixel"
    }

    fn has_resource(&self, locator: &Locator) -> bool {
        locator.has_scheme("eagitexi") && PIXEL_PATHS.contains(&locator.path())
    }

    fn get_resource_io(&self, locator: &Locator) -> Option<Box<dyn SourceBlobIo>> {
        if !self.has_resource(locator) {
            return None;
        }
        let bytes = self.generate(locator)?;
        Some(Box::new(MemoryBlobIo::new(bytes)))
    }
}
