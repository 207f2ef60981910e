//! Raster images embedded into a document.

use printpdf::image_crate::{self, DynamicImage, GenericImageView, RgbImage};
use tracing::warn;

use super::layout::{ImageId, ImageRef};

/// Longest side kept for embedded images; larger photos are downscaled.
const MAX_IMAGE_SIDE: u32 = 1600;

/// Decoded images for one document, addressed by [`ImageId`].
#[derive(Default)]
pub struct ImageStore {
    images: Vec<RgbImage>,
}

impl ImageStore {
    /// Decode and register an encoded image. Undecodable input is logged and
    /// skipped so one bad file never fails the whole document.
    pub fn add_encoded(&mut self, bytes: &[u8], label: &str) -> Option<ImageRef> {
        let decoded = match image_crate::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!(image = label, error = %e, "Skipping undecodable image");
                return None;
            }
        };

        let decoded = if decoded.width() > MAX_IMAGE_SIDE || decoded.height() > MAX_IMAGE_SIDE {
            decoded.thumbnail(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE)
        } else {
            decoded
        };

        Some(self.add(flatten_on_white(&decoded)))
    }

    pub fn add(&mut self, image: RgbImage) -> ImageRef {
        let image_ref = ImageRef {
            id: ImageId(self.images.len()),
            width_px: image.width(),
            height_px: image.height(),
        };
        self.images.push(image);
        image_ref
    }

    pub fn get(&self, id: ImageId) -> Option<&RgbImage> {
        self.images.get(id.0)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Composite transparency over white; PDF image XObjects here carry no alpha.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, image_crate::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
