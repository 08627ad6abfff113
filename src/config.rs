//! Configuration for mediabatch operations.
//!
//! This module transforms CLI arguments into validated, normalized
//! configuration values that drive each operation. It handles:
//! - Parsing of CLI-facing value types (target format, fill color)
//! - Validation of argument combinations
//! - Application of defaults

use anyhow::{Result, bail};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Image extensions accepted by discovery, lowercase without dots.
///
/// Matching is case-insensitive; files with any other extension are
/// excluded from the candidate sequence entirely.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "png", "gif", "tif", "tiff", "bmp", "webp",
];

/// Extensions accepted by the rotation operation (images plus PDF).
pub const ROTATE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "png", "gif", "tif", "tiff", "bmp", "webp", "pdf",
];

/// Extensions accepted by the TIFF compression check.
pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// A source of input files: a single file, or a directory root with an
/// optional recursive descent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// File or directory path.
    pub path: PathBuf,

    /// Descend into subdirectories when `path` is a directory.
    pub recursive: bool,
}

impl SourceSpec {
    /// Create a source specifier.
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }
}

/// Target format for image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// JPEG (lossy; alpha is flattened onto the background color).
    Jpeg,
    /// PNG (lossless).
    Png,
    /// GIF.
    Gif,
    /// TIFF (written uncompressed).
    Tiff,
    /// Windows bitmap.
    Bmp,
    /// WebP (lossless encoder).
    WebP,
    /// Single-page PDF wrapping the image.
    Pdf,
}

impl TargetFormat {
    /// Canonical output file extension, without a dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
            Self::Pdf => "pdf",
        }
    }

    /// Corresponding `image` crate format, if this target is a raster
    /// container handled by the image codec (everything except PDF).
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
            Self::Png => Some(image::ImageFormat::Png),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Tiff => Some(image::ImageFormat::Tiff),
            Self::Bmp => Some(image::ImageFormat::Bmp),
            Self::WebP => Some(image::ImageFormat::WebP),
            Self::Pdf => None,
        }
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    /// Parse a target format from an extension spelling.
    ///
    /// Accepts upper or lower case, with or without a leading dot:
    /// `jpg`, `.JPEG`, `tif`, `webp`, `pdf`, ...
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "tif" | "tiff" => Ok(Self::Tiff),
            "bmp" => Ok(Self::Bmp),
            "webp" => Ok(Self::WebP),
            "pdf" => Ok(Self::Pdf),
            _ => Err(Error::invalid_config(format!(
                "Unsupported target format: {s}. Must be one of: jpg, png, gif, tiff, bmp, webp, pdf"
            ))),
        }
    }
}

/// RGB background color used to flatten transparency and to fill the
/// expanded canvas of non-right-angle rotations.
///
/// The default is white. It is set explicitly rather than inherited from
/// a codec default so that output is deterministic across library
/// versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub [u8; 3]);

impl Default for Background {
    fn default() -> Self {
        Self([255, 255, 255])
    }
}

impl Background {
    /// The color as an `image` RGB pixel.
    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb(self.0)
    }

    /// The color as an opaque `image` RGBA pixel.
    pub fn to_rgba(self) -> image::Rgba<u8> {
        let [r, g, b] = self.0;
        image::Rgba([r, g, b, 255])
    }
}

impl FromStr for Background {
    type Err = Error;

    /// Parse a background color from a `R,G,B` triple (0-255 each).
    fn from_str(s: &str) -> crate::Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(Error::invalid_config(format!(
                "Invalid background color '{s}'. Expected R,G,B (e.g. 255,255,255)"
            )));
        }

        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                Error::invalid_config(format!(
                    "Invalid background component '{part}'. Must be 0-255"
                ))
            })?;
        }

        Ok(Self(rgb))
    }
}

/// Behavior when a computed destination path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Leave the existing file alone and record the task as skipped
    /// (default; re-runs are idempotent).
    #[default]
    Skip,
    /// Replace the existing file.
    Overwrite,
    /// Record the task as failed.
    Error,
}

/// Configuration for the image format conversion operation.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Input file or directory.
    pub source: SourceSpec,

    /// Destination root; `None` writes alongside each source file.
    pub output_dir: Option<PathBuf>,

    /// Target format to re-encode into.
    pub target: TargetFormat,

    /// JPEG quality (1-100).
    pub quality: u8,

    /// Background color for flattening transparency.
    pub background: Background,

    /// Destination collision policy.
    pub collision: CollisionPolicy,

    /// Number of parallel transforms (`None` = auto-detect).
    pub jobs: Option<usize>,

    /// Show the plan without writing anything.
    pub dry_run: bool,

    /// Suppress non-error output.
    pub quiet: bool,

    /// Show per-file detail.
    pub verbose: bool,
}

impl ConvertConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if quality is outside 1-100, jobs is zero, or
    /// quiet and verbose are both set.
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            bail!("Quality must be between 1 and 100, got {}", self.quality);
        }
        validate_common(self.jobs, self.quiet, self.verbose)
    }

    /// Effective number of parallel transform jobs.
    pub fn effective_jobs(&self) -> usize {
        effective_jobs(self.jobs)
    }
}

/// Configuration for the rotation operation.
#[derive(Debug, Clone)]
pub struct RotateConfig {
    /// Input file or directory.
    pub source: SourceSpec,

    /// Destination root. Required: rotation keeps the source file name,
    /// so writing alongside the source would target the source itself.
    pub output_dir: PathBuf,

    /// Rotation in degrees; positive rotates clockwise. Any real value is
    /// accepted for images; PDFs only support multiples of 90.
    pub angle: f32,

    /// Fill color for the expanded corners of non-right-angle rotations.
    pub background: Background,

    /// Destination collision policy.
    pub collision: CollisionPolicy,

    /// Number of parallel transforms (`None` = auto-detect).
    pub jobs: Option<usize>,

    /// Show the plan without writing anything.
    pub dry_run: bool,

    /// Suppress non-error output.
    pub quiet: bool,

    /// Show per-file detail.
    pub verbose: bool,
}

impl RotateConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle is not a finite number, jobs is
    /// zero, or quiet and verbose are both set.
    pub fn validate(&self) -> Result<()> {
        if !self.angle.is_finite() {
            bail!("Rotation angle must be a finite number of degrees");
        }
        validate_common(self.jobs, self.quiet, self.verbose)
    }

    /// Effective number of parallel transform jobs.
    pub fn effective_jobs(&self) -> usize {
        effective_jobs(self.jobs)
    }
}

/// Configuration for the PDF merge operation.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Input PDF paths, in page order. Caller-specified order is
    /// preserved exactly; it is never the filesystem traversal order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF path.
    pub output: PathBuf,

    /// Replace the output file if it already exists.
    pub overwrite: bool,

    /// Validate inputs and show the merge plan without writing.
    pub dry_run: bool,

    /// Suppress non-error output.
    pub quiet: bool,

    /// Show per-input detail.
    pub verbose: bool,
}

impl MergeConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no inputs are given, the output is listed as
    /// an input, or quiet and verbose are both set.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        for input in &self.inputs {
            if input == &self.output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    self.output.display()
                );
            }
        }

        validate_common(None, self.quiet, self.verbose)
    }
}

/// Configuration for the TIFF compression check.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Input file or directory.
    pub source: SourceSpec,

    /// Number of parallel checks (`None` = auto-detect).
    pub jobs: Option<usize>,

    /// Suppress non-error output.
    pub quiet: bool,

    /// Show per-file detail.
    pub verbose: bool,
}

impl CheckConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_common(self.jobs, self.quiet, self.verbose)
    }

    /// Effective number of parallel check jobs.
    pub fn effective_jobs(&self) -> usize {
        effective_jobs(self.jobs)
    }
}

fn validate_common(jobs: Option<usize>, quiet: bool, verbose: bool) -> Result<()> {
    if quiet && verbose {
        bail!("Cannot use both --verbose and --quiet");
    }

    if jobs == Some(0) {
        bail!("Number of jobs must be at least 1");
    }

    Ok(())
}

fn effective_jobs(jobs: Option<usize>) -> usize {
    jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}
