//! CLI argument parsing for mediabatch.
//!
//! This module defines the command-line interface structure using `clap`
//! and converts parsed arguments into validated operation configs.
//!
//! # Examples
//!
//! ```no_run
//! use mediabatch::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{
    Background, CheckConfig, CollisionPolicy, ConvertConfig, MergeConfig, RotateConfig,
    SourceSpec, TargetFormat,
};
use crate::error::Result;

/// Batch image and PDF file manipulation.
///
/// mediabatch discovers input files (a single file, or a directory with
/// optional recursion), applies a per-file transform, and reports
/// per-file outcomes without letting one bad file abort the batch.
#[derive(Parser, Debug)]
#[command(name = "mediabatch")]
#[command(version)]
#[command(about = "Batch conversion, rotation and merging for image and PDF files")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Report rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Human-readable lines and a summary.
    Human,
    /// The full report serialized as JSON on stdout.
    Json,
}

/// Available operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert images to another format
    ///
    /// Re-encodes every accepted image under the input path into the
    /// target format. JPEG targets flatten transparency onto the
    /// background color; the pdf target wraps each image in a
    /// single-page PDF.
    Convert(ConvertArgs),

    /// Rotate images and PDFs
    ///
    /// Rotates by any number of degrees (positive = clockwise). Images
    /// accept arbitrary angles; PDF pages only rotate in multiples of
    /// 90. Outputs keep the source format and name, written under
    /// --output-dir.
    Rotate(RotateArgs),

    /// Concatenate PDF files into a single document
    ///
    /// Pages appear in the order inputs are given on the command line.
    /// Any unreadable input aborts the whole merge and no output file
    /// is created.
    Merge(MergeArgs),

    /// Check TIFF files for incompatible compression
    ///
    /// Read-only: classifies each TIFF against a fixed allow-list
    /// (uncompressed, PackBits) and reports offenders. Never writes
    /// any files.
    Check(CheckArgs),
}

/// Arguments for the convert operation.
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Target format (jpg, png, gif, tiff, bmp, webp, pdf)
    #[arg(short, long, value_name = "EXT")]
    pub format: String,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Destination root (default: alongside each source file)
    ///
    /// In recursive mode the source directory structure is mirrored
    /// beneath this root.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Replace existing destination files
    #[arg(long)]
    pub overwrite: bool,

    /// Leave existing destination files alone (default)
    #[arg(long, conflicts_with = "overwrite")]
    pub skip_existing: bool,

    /// Record a failure when a destination file already exists
    #[arg(long, conflicts_with_all = ["overwrite", "skip_existing"])]
    pub error_if_exists: bool,

    /// JPEG quality, 1-100
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub quality: u8,

    /// Background color for flattened transparency, as R,G,B
    #[arg(long, value_name = "R,G,B", default_value = "255,255,255")]
    pub background: String,

    /// Number of parallel jobs (default: CPU core count)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Show the plan without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show per-file detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Report format
    #[arg(long, value_name = "MODE", default_value = "human")]
    #[arg(value_parser = ["human", "json"])]
    pub report: String,
}

impl ConvertArgs {
    /// Convert parsed arguments into a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if the format or background color cannot be
    /// parsed, or configuration validation fails.
    pub fn to_config(&self) -> Result<(ConvertConfig, ReportMode)> {
        let config = ConvertConfig {
            source: SourceSpec::new(&self.input, self.recursive),
            output_dir: self.output_dir.clone(),
            target: TargetFormat::from_str(&self.format)?,
            quality: self.quality,
            background: Background::from_str(&self.background)?,
            collision: collision_policy(self.overwrite, self.error_if_exists),
            jobs: self.jobs,
            dry_run: self.dry_run,
            quiet: self.quiet,
            verbose: self.verbose,
        };
        config.validate()?;

        Ok((config, report_mode(&self.report)))
    }
}

/// Arguments for the rotate operation.
#[derive(clap::Args, Debug)]
pub struct RotateArgs {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Rotation in degrees; positive rotates clockwise
    ///
    /// Images accept any value; PDF pages only rotate in multiples of
    /// 90. Full turns (0, 360, ...) copy the file unchanged.
    #[arg(short, long, value_name = "DEGREES", allow_hyphen_values = true)]
    pub angle: f32,

    /// Destination root (required; outputs keep their source name)
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Fill color for expanded corners, as R,G,B
    #[arg(long, value_name = "R,G,B", default_value = "255,255,255")]
    pub background: String,

    /// Replace existing destination files
    #[arg(long)]
    pub overwrite: bool,

    /// Leave existing destination files alone (default)
    #[arg(long, conflicts_with = "overwrite")]
    pub skip_existing: bool,

    /// Record a failure when a destination file already exists
    #[arg(long, conflicts_with_all = ["overwrite", "skip_existing"])]
    pub error_if_exists: bool,

    /// Number of parallel jobs (default: CPU core count)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Show the plan without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show per-file detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Report format
    #[arg(long, value_name = "MODE", default_value = "human")]
    #[arg(value_parser = ["human", "json"])]
    pub report: String,
}

impl RotateArgs {
    /// Convert parsed arguments into a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if the background color cannot be parsed or
    /// configuration validation fails.
    pub fn to_config(&self) -> Result<(RotateConfig, ReportMode)> {
        let config = RotateConfig {
            source: SourceSpec::new(&self.input, self.recursive),
            output_dir: self.output_dir.clone(),
            angle: self.angle,
            background: Background::from_str(&self.background)?,
            collision: collision_policy(self.overwrite, self.error_if_exists),
            jobs: self.jobs,
            dry_run: self.dry_run,
            quiet: self.quiet,
            verbose: self.verbose,
        };
        config.validate()?;

        Ok((config, report_mode(&self.report)))
    }
}

/// Arguments for the merge operation.
#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// Input PDF files to merge, in page order
    ///
    /// Each argument may be a literal path or a glob pattern; patterns
    /// expand in sorted order, argument order is preserved.
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Replace the output file if it already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Validate inputs and show the merge plan without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show per-input detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl MergeArgs {
    /// Convert parsed arguments into a validated config.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Resolved input paths, after glob expansion
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn to_config(&self, inputs: Vec<PathBuf>) -> Result<MergeConfig> {
        let config = MergeConfig {
            inputs,
            output: self.output.clone(),
            overwrite: self.overwrite,
            dry_run: self.dry_run,
            quiet: self.quiet,
            verbose: self.verbose,
        };
        config.validate()?;

        Ok(config)
    }
}

/// Arguments for the compression check.
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Number of parallel jobs (default: CPU core count)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show per-file detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Report format
    #[arg(long, value_name = "MODE", default_value = "human")]
    #[arg(value_parser = ["human", "json"])]
    pub report: String,
}

impl CheckArgs {
    /// Convert parsed arguments into a validated config.
    pub fn to_config(&self) -> Result<(CheckConfig, ReportMode)> {
        let config = CheckConfig {
            source: SourceSpec::new(&self.input, self.recursive),
            jobs: self.jobs,
            quiet: self.quiet,
            verbose: self.verbose,
        };
        config.validate()?;

        Ok((config, report_mode(&self.report)))
    }
}

fn collision_policy(overwrite: bool, error_if_exists: bool) -> CollisionPolicy {
    if overwrite {
        CollisionPolicy::Overwrite
    } else if error_if_exists {
        CollisionPolicy::Error
    } else {
        CollisionPolicy::Skip
    }
}

fn report_mode(report: &str) -> ReportMode {
    if report == "json" {
        ReportMode::Json
    } else {
        ReportMode::Human
    }
}
