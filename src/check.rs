//! TIFF compression policy check.
//!
//! Some TIFF consumers only read a narrow set of compression schemes;
//! this check classifies files against a fixed allow-list (uncompressed
//! and PackBits) without ever writing anything. Classification is a pure
//! function of file content: the same file yields the same answer on
//! every run.
//!
//! Files that cannot be parsed as TIFF classify as `Unknown` rather than
//! failing the batch; the check is an inspection, not a validation gate.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tokio::task;

/// Compression tag values the policy accepts: uncompressed and PackBits.
pub const COMPATIBLE_COMPRESSIONS: &[u32] = &[1, 32773];

/// Classification of one file against the compression allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum CompressionClass {
    /// Every page uses an allowed compression scheme.
    Compatible,

    /// At least one page uses a disallowed scheme.
    Incompatible {
        /// Zero-based index of the first offending page.
        page: usize,
        /// Name of the offending compression scheme.
        compression: String,
    },

    /// The file could not be inspected (unreadable, not a TIFF).
    Unknown {
        /// Why inspection failed.
        reason: String,
    },
}

/// Classification result for one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCheck {
    /// Path to the inspected file.
    pub path: PathBuf,

    /// The classification.
    pub class: CompressionClass,
}

/// Aggregated result of one check invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Per-file classifications, in discovery order.
    pub results: Vec<FileCheck>,

    /// Number of compatible files.
    pub compatible: usize,

    /// Number of incompatible files.
    pub incompatible: usize,

    /// Number of files that could not be inspected.
    pub unknown: usize,

    /// Wall-clock time for the check.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl CheckReport {
    /// Build a report from ordered results.
    pub fn from_results(results: Vec<FileCheck>, elapsed: Duration) -> Self {
        let compatible = results
            .iter()
            .filter(|r| r.class == CompressionClass::Compatible)
            .count();
        let incompatible = results
            .iter()
            .filter(|r| matches!(r.class, CompressionClass::Incompatible { .. }))
            .count();
        let unknown = results.len() - compatible - incompatible;

        Self {
            results,
            compatible,
            incompatible,
            unknown,
            elapsed,
        }
    }

    /// Whether every inspected file passed.
    pub fn is_all_compatible(&self) -> bool {
        self.incompatible == 0 && self.unknown == 0
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} compatible, {} incompatible, {} unknown ({} file(s) in {:.2}s)",
            self.compatible,
            self.incompatible,
            self.unknown,
            self.results.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Classify one file against the allow-list.
///
/// Read-only and side-effect free: no file is created, modified, or
/// deleted.
pub fn classify(path: &Path) -> CompressionClass {
    match classify_inner(path) {
        Ok(class) => class,
        Err(reason) => CompressionClass::Unknown { reason },
    }
}

fn classify_inner(path: &Path) -> std::result::Result<CompressionClass, String> {
    let file = File::open(path).map_err(|err| err.to_string())?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|err| err.to_string())?;

    let mut page = 0usize;
    loop {
        // A missing Compression tag means uncompressed (tag default 1).
        let compression = match decoder.get_tag(Tag::Compression) {
            Ok(value) => value.into_u32().map_err(|err| err.to_string())?,
            Err(_) => 1,
        };

        if !COMPATIBLE_COMPRESSIONS.contains(&compression) {
            return Ok(CompressionClass::Incompatible {
                page,
                compression: compression_name(compression),
            });
        }

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(|err| err.to_string())?;
        page += 1;
    }

    Ok(CompressionClass::Compatible)
}

/// Check a batch of files with bounded concurrency.
///
/// Results come back in input order; `on_done` fires per completed file
/// in completion order.
pub async fn check_batch<F>(paths: Vec<PathBuf>, jobs: usize, mut on_done: F) -> CheckReport
where
    F: FnMut(usize, &FileCheck),
{
    let start = Instant::now();

    let work = paths.into_iter().enumerate().map(|(idx, path)| async move {
        let display_path = path.clone();
        let class = task::spawn_blocking(move || classify(&path))
            .await
            .unwrap_or_else(|err| CompressionClass::Unknown {
                reason: format!("check task panicked: {err}"),
            });

        (
            idx,
            FileCheck {
                path: display_path,
                class,
            },
        )
    });

    let mut indexed: Vec<(usize, FileCheck)> = stream::iter(work)
        .buffer_unordered(jobs.max(1))
        .inspect(|(idx, result)| on_done(*idx, result))
        .collect()
        .await;

    indexed.sort_by_key(|(idx, _)| *idx);

    let results = indexed.into_iter().map(|(_, result)| result).collect();
    CheckReport::from_results(results, start.elapsed())
}

/// Human-readable name for a TIFF compression tag value.
fn compression_name(value: u32) -> String {
    match value {
        1 => "NONE".to_string(),
        2 => "CCITT_RLE".to_string(),
        3 => "CCITT_FAX3".to_string(),
        4 => "CCITT_FAX4".to_string(),
        5 => "LZW".to_string(),
        6 | 7 => "JPEG".to_string(),
        8 | 32946 => "DEFLATE".to_string(),
        32773 => "PACKBITS".to_string(),
        other => format!("COMPRESSION({other})"),
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;
    use tiff::encoder::colortype;
    use tiff::encoder::compression::Lzw;

    fn uncompressed_tiff(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])).save(&path).unwrap();
        path
    }

    fn lzw_tiff(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let writer = std::io::BufWriter::new(File::create(&path).unwrap());
        let mut encoder = tiff::encoder::TiffEncoder::new(writer).unwrap();
        let data = vec![128u8; 4 * 4 * 3];
        encoder
            .write_image_with_compression::<colortype::RGB8, _>(4, 4, Lzw, &data)
            .unwrap();
        path
    }

    #[test]
    fn test_uncompressed_tiff_is_compatible() {
        let dir = TempDir::new().unwrap();
        let path = uncompressed_tiff(dir.path(), "plain.tiff");
        assert_eq!(classify(&path), CompressionClass::Compatible);
    }

    #[test]
    fn test_lzw_tiff_is_incompatible() {
        let dir = TempDir::new().unwrap();
        let path = lzw_tiff(dir.path(), "lzw.tiff");

        match classify(&path) {
            CompressionClass::Incompatible { page, compression } => {
                assert_eq!(page, 0);
                assert_eq!(compression, "LZW");
            }
            other => panic!("expected Incompatible, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.tif");
        fs::write(&path, b"this is not a tiff").unwrap();

        assert!(matches!(
            classify(&path),
            CompressionClass::Unknown { .. }
        ));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = lzw_tiff(dir.path(), "lzw.tiff");
        assert_eq!(classify(&path), classify(&path));
    }

    #[test]
    fn test_check_writes_nothing() {
        let dir = TempDir::new().unwrap();
        uncompressed_tiff(dir.path(), "a.tiff");
        lzw_tiff(dir.path(), "b.tiff");

        let before = fs::read_dir(dir.path()).unwrap().count();
        classify(&dir.path().join("a.tiff"));
        classify(&dir.path().join("b.tiff"));
        let after = fs::read_dir(dir.path()).unwrap().count();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_check_batch_counts() {
        let dir = TempDir::new().unwrap();
        let good = uncompressed_tiff(dir.path(), "good.tiff");
        let bad = lzw_tiff(dir.path(), "bad.tiff");
        let junk = dir.path().join("junk.tif");
        fs::write(&junk, b"nope").unwrap();

        let report = check_batch(vec![good, bad, junk], 2, |_, _| {}).await;

        assert_eq!(report.compatible, 1);
        assert_eq!(report.incompatible, 1);
        assert_eq!(report.unknown, 1);
        assert!(!report.is_all_compatible());
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(compression_name(1), "NONE");
        assert_eq!(compression_name(5), "LZW");
        assert_eq!(compression_name(32773), "PACKBITS");
        assert_eq!(compression_name(999), "COMPRESSION(999)");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = CheckReport::from_results(
            vec![FileCheck {
                path: PathBuf::from("a.tiff"),
                class: CompressionClass::Incompatible {
                    page: 0,
                    compression: "LZW".to_string(),
                },
            }],
            Duration::from_millis(10),
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("incompatible"));
        assert!(json.contains("LZW"));
    }
}
