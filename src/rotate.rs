//! Image and PDF rotation.
//!
//! [`Rotator`] accepts any real angle in degrees (positive = clockwise)
//! and dispatches on the source extension:
//!
//! - Full turns (0, 360, -720, ...) are an exact identity: the source
//!   bytes are copied unchanged, so even lossy formats survive without a
//!   re-encode.
//! - Right angles rotate losslessly with exact dimension swaps.
//! - Anything else (images only) is a bilinear warp onto an expanded
//!   canvas sized to the rotated bounding box, with the corners filled by
//!   the configured background color.
//! - PDF pages rotate via the page `/Rotate` entry, which can only
//!   express right angles; other angles fail that file, not the batch.
//!
//! The output keeps the source format and file name, so rotation always
//! writes into a separate output directory.

use image::{DynamicImage, ImageBuffer, ImageFormat, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use lopdf::{Document, Object, ObjectId};
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{Background, RotateConfig};
use crate::convert::{save_raster, write_jpeg};
use crate::error::{Error, Result};
use crate::pipeline::Transform;

/// Per-file rotation transform for images and PDFs.
pub struct Rotator {
    angle: f32,
    background: Background,
}

impl Rotator {
    /// Create a rotator from the operation configuration.
    pub fn new(config: &RotateConfig) -> Self {
        Self {
            angle: config.angle,
            background: config.background,
        }
    }

    /// Create a rotator from explicit parts.
    pub fn with_angle(angle: f32, background: Background) -> Self {
        Self { angle, background }
    }

    /// Angle normalized into [0, 360).
    fn normalized(&self) -> f32 {
        self.angle.rem_euclid(360.0)
    }
}

impl Transform for Rotator {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn apply(&self, input: &Path, output: &Path) -> Result<()> {
        let normalized = self.normalized();

        // Full turn: byte-identical copy, no decode, no generation loss.
        if normalized == 0.0 {
            fs::copy(input, output).map_err(|err| Error::FailedToWrite {
                path: output.to_path_buf(),
                source: err,
            })?;
            return Ok(());
        }

        let is_pdf = input
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            rotate_pdf(input, output, self.angle)
        } else {
            rotate_image(input, output, normalized, self.background)
        }
    }
}

fn rotate_image(input: &Path, output: &Path, normalized: f32, background: Background) -> Result<()> {
    let img = image::open(input).map_err(|err| Error::from_image_error(input, err))?;
    let format = ImageFormat::from_path(input).map_err(|_| Error::unsupported(input))?;

    let rotated = if normalized == 90.0 {
        img.rotate90()
    } else if normalized == 180.0 {
        img.rotate180()
    } else if normalized == 270.0 {
        img.rotate270()
    } else {
        rotate_arbitrary(&img, normalized, background)
    };

    if format == ImageFormat::Jpeg {
        write_jpeg(&rotated, output, 100, background)
    } else {
        save_raster(&rotated, output, format)
    }
}

/// Bilinear rotation onto an expanded canvas.
///
/// The canvas is the bounding box of the rotated image; uncovered corner
/// regions take the background color.
fn rotate_arbitrary(img: &DynamicImage, degrees: f32, background: Background) -> DynamicImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let out_width = (width as f32 * cos + height as f32 * sin).ceil() as u32;
    let out_height = (width as f32 * sin + height as f32 * cos).ceil() as u32;

    // Rotate about the source center, then re-center on the larger canvas.
    let projection = Projection::translate(out_width as f32 / 2.0, out_height as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

    let mut out: RgbaImage = ImageBuffer::new(out_width, out_height);
    warp_into(
        &rgba,
        &projection,
        Interpolation::Bilinear,
        background.to_rgba(),
        &mut out,
    );

    DynamicImage::ImageRgba8(out)
}

fn rotate_pdf(input: &Path, output: &Path, angle: f32) -> Result<()> {
    if angle.rem_euclid(90.0) != 0.0 {
        return Err(Error::other(format!(
            "PDF pages only rotate in multiples of 90 degrees, got {angle}"
        )));
    }
    let delta = angle.rem_euclid(360.0) as i64;

    let mut doc =
        Document::load(input).map_err(|err| Error::failed_to_load_pdf(input, err.to_string()))?;

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    if page_ids.is_empty() {
        return Err(Error::failed_to_load_pdf(input, "PDF has no pages"));
    }

    for page_id in page_ids {
        rotate_page(&mut doc, page_id, delta)?;
    }

    let file = File::create(output).map_err(|err| Error::FailedToCreateOutput {
        path: output.to_path_buf(),
        source: err,
    })?;
    let mut writer = BufWriter::new(file);

    doc.save_to(&mut writer).map_err(|err| Error::FailedToWrite {
        path: output.to_path_buf(),
        source: std::io::Error::other(err),
    })?;

    writer.flush().map_err(|err| Error::FailedToWrite {
        path: output.to_path_buf(),
        source: err,
    })
}

/// Add a rotation delta to one page's `/Rotate` entry.
fn rotate_page(doc: &mut Document, page_id: ObjectId, delta: i64) -> Result<()> {
    let page_obj = doc
        .get_object_mut(page_id)
        .map_err(|err| Error::other(format!("Failed to get page: {err}")))?;

    if let Object::Dictionary(dict) = page_obj {
        let current = dict.get(b"Rotate").and_then(|r| r.as_i64()).unwrap_or(0);
        let rotation = (current + delta).rem_euclid(360);
        dict.set("Rotate", Object::Integer(rotation));
        Ok(())
    } else {
        Err(Error::other("Page object is not a dictionary"))
    }
}
