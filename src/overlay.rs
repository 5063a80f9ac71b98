use std::fs;
use std::io::Cursor;

use ab_glyph::FontVec;
use image::{ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Error;
use crate::generation::RawImage;

const BANNER_FILL: Rgba<u8> = Rgba([0, 0, 0, 200]);
const TITLE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DESCRIPTION_COLOR: Rgba<u8> = Rgba([200, 200, 200, 255]);

const MAX_DESCRIPTION_CHARS: usize = 100;

static FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// Burns a dark banner with the title and description into the bottom of
/// an image. Every failure downgrades to a pass-through: the caller always
/// gets an image back, banner or not.
pub struct Overlay {
    font: Option<FontVec>,
}

impl Overlay {
    pub fn from_config(config: &Config) -> Self {
        let font = load_font(config.overlay_font.as_deref());
        if font.is_none() {
            warn!("No usable overlay font found, banners will be skipped");
        }
        Self { font }
    }

    pub fn apply(&self, image: RawImage, title: &str, description: &str) -> RawImage {
        match self.render(&image.bytes, title, description) {
            Ok(bytes) => RawImage {
                bytes,
                mime: "image/png".to_string(),
            },
            Err(e) => {
                warn!("Failed to draw banner, keeping the original image: {}", e);
                image
            }
        }
    }

    fn render(&self, bytes: &[u8], title: &str, description: &str) -> Result<Vec<u8>, Error> {
        let mut img = image::load_from_memory(bytes)?.to_rgba8();
        let font = self
            .font
            .as_ref()
            .ok_or(Error::Overlay("no font available".into()))?;
        let (width, height) = img.dimensions();

        let banner_top = height - height / 5;
        fill_banner(&mut img, banner_top);

        let title_size = height as f32 * 0.05;
        let description_size = height as f32 * 0.035;
        let pad_x = (width as f32 * 0.04) as i32;
        let pad_y = (height as f32 * 0.03) as i32;

        let title_y = banner_top as i32 + pad_y;
        draw_text_mut(&mut img, TITLE_COLOR, pad_x, title_y, title_size, font, title);
        let description_y = title_y + title_size.ceil() as i32 + pad_y / 2;
        draw_text_mut(
            &mut img,
            DESCRIPTION_COLOR,
            pad_x,
            description_y,
            description_size,
            font,
            &truncate_description(description),
        );

        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

fn load_font(configured: Option<&str>) -> Option<FontVec> {
    let candidates = configured.into_iter().chain(FONT_CANDIDATES.iter().copied());
    for path in candidates {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!("Loaded overlay font from {}", path);
                return Some(font);
            }
            Err(e) => warn!("Ignoring invalid font file {}: {}", path, e),
        }
    }
    None
}

/// Alpha-blends the banner fill over the bottom of the image, starting at
/// row `top`.
fn fill_banner(img: &mut RgbaImage, top: u32) {
    for y in top..img.height() {
        for x in 0..img.width() {
            img.get_pixel_mut(x, y).blend(&BANNER_FILL);
        }
    }
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let truncated: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    format!("{}...", truncated)
}
