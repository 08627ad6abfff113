//! Image format conversion.
//!
//! [`ImageConverter`] re-encodes a raster image into the configured
//! target format. Two targets need special handling:
//!
//! - **JPEG** has no alpha channel: transparent sources are flattened
//!   onto the configured background color and encoded at the configured
//!   quality.
//! - **PDF** wraps the image as a single-page document with a DCTDecode
//!   image XObject, scaled at one point per pixel.
//!
//! All other targets go straight through the image codec, normalizing to
//! 8-bit RGBA for encoders that accept nothing else.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use crate::config::{Background, ConvertConfig, TargetFormat};
use crate::error::{Error, Result};
use crate::pipeline::Transform;

/// Per-file image format conversion transform.
pub struct ImageConverter {
    target: TargetFormat,
    quality: u8,
    background: Background,
}

impl ImageConverter {
    /// Create a converter from the operation configuration.
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            target: config.target,
            quality: config.quality,
            background: config.background,
        }
    }

    /// Create a converter from explicit parts.
    pub fn with_target(target: TargetFormat, quality: u8, background: Background) -> Self {
        Self {
            target,
            quality,
            background,
        }
    }
}

impl Transform for ImageConverter {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn apply(&self, input: &Path, output: &Path) -> Result<()> {
        let img = image::open(input).map_err(|err| Error::from_image_error(input, err))?;

        match self.target {
            TargetFormat::Jpeg => write_jpeg(&img, output, self.quality, self.background),
            TargetFormat::Pdf => write_single_page_pdf(&img, output, self.quality, self.background),
            TargetFormat::Png => save_raster(&img, output, ImageFormat::Png),
            TargetFormat::Gif => save_raster(&img, output, ImageFormat::Gif),
            TargetFormat::Tiff => save_raster(&img, output, ImageFormat::Tiff),
            TargetFormat::Bmp => save_raster(&img, output, ImageFormat::Bmp),
            TargetFormat::WebP => save_raster(&img, output, ImageFormat::WebP),
        }
    }
}

/// Flatten an image onto an opaque background, compositing by alpha.
pub(crate) fn flatten_onto(img: &DynamicImage, background: Background) -> RgbImage {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();
    let bg = background.0;

    let mut out = RgbImage::new(width, height);
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u32;
        let inv = 255 - alpha;
        let blend = |c: u8, b: u8| ((c as u32 * alpha + b as u32 * inv) / 255) as u8;
        out.put_pixel(
            x,
            y,
            Rgb([
                blend(px[0], bg[0]),
                blend(px[1], bg[1]),
                blend(px[2], bg[2]),
            ]),
        );
    }
    out
}

/// Encode a flattened JPEG at the given quality.
pub(crate) fn write_jpeg(
    img: &DynamicImage,
    output: &Path,
    quality: u8,
    background: Background,
) -> Result<()> {
    let rgb = flatten_onto(img, background);

    let file = File::create(output).map_err(|err| Error::FailedToCreateOutput {
        path: output.to_path_buf(),
        source: err,
    })?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(&rgb)
        .map_err(|err| encode_error(output, err))?;

    writer.flush().map_err(|err| Error::FailedToWrite {
        path: output.to_path_buf(),
        source: err,
    })
}

/// Save through the image codec, normalizing color depth where the
/// encoder requires 8-bit RGB(A).
pub(crate) fn save_raster(img: &DynamicImage, output: &Path, format: ImageFormat) -> Result<()> {
    let needs_rgba8 = matches!(
        format,
        ImageFormat::Gif | ImageFormat::WebP | ImageFormat::Bmp
    ) && !matches!(
        img,
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)
    );

    let result = if needs_rgba8 {
        DynamicImage::ImageRgba8(img.to_rgba8()).save_with_format(output, format)
    } else {
        img.save_with_format(output, format)
    };

    result.map_err(|err| encode_error(output, err))
}

/// Wrap an image in a one-page PDF document.
///
/// The image is embedded as a JPEG stream (DCTDecode) and the page sized
/// at one point per pixel.
fn write_single_page_pdf(
    img: &DynamicImage,
    output: &Path,
    quality: u8,
    background: Background,
) -> Result<()> {
    let rgb = flatten_onto(img, background);
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut Cursor::new(&mut jpeg), quality)
        .encode_image(&rgb)
        .map_err(|err| encode_error(output, err))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    let image_id = doc.add_object(Object::Stream(Stream::new(image_dict, jpeg)));

    let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ");
    let content_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        content.into_bytes(),
    )));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), (width as i64).into(), (height as i64).into()],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

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

/// Classify an encode-side image error.
fn encode_error(path: &Path, err: image::ImageError) -> Error {
    match err {
        image::ImageError::IoError(source) => Error::FailedToWrite {
            path: path.to_path_buf(),
            source,
        },
        other => Error::encode(path, other.to_string()),
    }
}
