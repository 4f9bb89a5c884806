//! Image decoding, normalisation and aspect-preserving placement.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A decoded image available to the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Absolute virtual path the Typst source loads the image from.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Where an image lands inside its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scale an image into a box without distortion and centre it.
///
/// The scale factor is `min(box_w / img_w, box_h / img_h)`.
pub fn fit_contain(img_w: f32, img_h: f32, box_x: f32, box_y: f32, box_w: f32, box_h: f32) -> Placement {
    if img_w <= 0.0 || img_h <= 0.0 {
        return Placement {
            x: box_x,
            y: box_y,
            width: 0.0,
            height: 0.0,
        };
    }
    let scale = (box_w / img_w).min(box_h / img_h);
    let width = img_w * scale;
    let height = img_h * scale;
    Placement {
        x: box_x + (box_w - width) / 2.0,
        y: box_y + (box_h - height) / 2.0,
        width,
        height,
    }
}

/// Images used by one document, each file decoded once.
///
/// Uploads are re-encoded as opaque PNG, so any accepted upload format
/// reaches the compiler in one well-supported form.
#[derive(Debug)]
pub struct ImageRegistry {
    max_pixels: u32,
    by_path: BTreeMap<PathBuf, ImageHandle>,
    files: Vec<(String, Vec<u8>)>,
}

impl ImageRegistry {
    pub fn new(max_pixels: u32) -> Self {
        Self {
            max_pixels,
            by_path: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Decode and register the image at `path`, reusing an earlier registration.
    ///
    /// The format is sniffed from the content, not the extension.
    pub fn register(&mut self, path: &Path) -> Result<ImageHandle, image::ImageError> {
        if let Some(handle) = self.by_path.get(path) {
            return Ok(handle.clone());
        }

        let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let decoded = self.bound_size(decoded);
        let (width, height) = decoded.dimensions();

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(flatten_on_white(&decoded))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let virtual_path = format!("/images/im{}.png", self.files.len() + 1);
        log::debug!(
            "registered image {} as {} ({}x{})",
            path.display(),
            virtual_path,
            width,
            height
        );

        let handle = ImageHandle {
            path: virtual_path.clone(),
            width,
            height,
        };
        self.files.push((virtual_path, png));
        self.by_path.insert(path.to_path_buf(), handle.clone());
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Encoded files keyed by virtual path, in registration order.
    pub fn into_files(self) -> Vec<(String, Vec<u8>)> {
        self.files
    }

    fn bound_size(&self, image: DynamicImage) -> DynamicImage {
        if image.width() > self.max_pixels || image.height() > self.max_pixels {
            image.thumbnail(self.max_pixels, self.max_pixels)
        } else {
            image
        }
    }
}

/// RGB copy with any transparency composited onto white.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = u32::from(pixel[3]);
        let blend = |channel: u8| ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}
