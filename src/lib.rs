//! mediabatch - batch image and PDF file manipulation.
//!
//! This library implements a batch file-conversion pipeline: discover a
//! set of candidate input files (a single path, or a directory walk over
//! an accepted extension set), apply a per-file transform, and collect
//! per-file outcomes without aborting the batch when one file fails. The
//! specialized operations share that shape:
//!
//! - Image format conversion (including image-to-PDF wrapping)
//! - Image and PDF rotation
//! - Ordered PDF concatenation (the one non-per-file operation: any
//!   input failure aborts the whole merge)
//! - Read-only TIFF compression policy checks
//!
//! # Examples
//!
//! ## Converting a directory of images
//!
//! ```no_run
//! use mediabatch::config::{Background, CollisionPolicy, IMAGE_EXTENSIONS, SourceSpec, TargetFormat};
//! use mediabatch::convert::ImageConverter;
//! use mediabatch::discover::{DestinationNaming, discover};
//! use mediabatch::pipeline::BatchRunner;
//! use std::sync::Arc;
//!
//! # async fn example() -> mediabatch::Result<()> {
//! let spec = SourceSpec::new("photos", true);
//! let naming = DestinationNaming::with_extension(Some("webp".into()), "webp");
//! let tasks = discover(&spec, IMAGE_EXTENSIONS, &naming)?;
//!
//! let converter = ImageConverter::with_target(
//!     TargetFormat::WebP,
//!     100,
//!     Background::default(),
//! );
//! let runner = BatchRunner::new(Arc::new(converter), CollisionPolicy::Skip, 4);
//! let report = runner.run(tasks).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Merging PDFs
//!
//! ```no_run
//! use mediabatch::merge::Merger;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> mediabatch::Result<()> {
//! let merger = Merger::new();
//! let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (doc, stats) = merger.merge(&inputs).await?;
//! merger.save(doc, Path::new("merged.pdf"), false).await?;
//! println!("{} pages", stats.total_pages);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod cli;
pub mod config;
pub mod convert;
pub mod discover;
pub mod error;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod rotate;

// Re-export commonly used types
pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
