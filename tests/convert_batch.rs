//! End-to-end tests for the conversion batch pipeline: discovery,
//! per-file error isolation, collision handling and report aggregation.

use mediabatch::config::{
    Background, CollisionPolicy, IMAGE_EXTENSIONS, SourceSpec, TargetFormat,
};
use mediabatch::convert::ImageConverter;
use mediabatch::discover::{DestinationNaming, discover};
use mediabatch::pipeline::BatchRunner;
use mediabatch::report::BatchReport;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

mod common;
use common::{write_garbage, write_png};

async fn convert_batch(
    source: SourceSpec,
    output_dir: &std::path::Path,
    target: TargetFormat,
    collision: CollisionPolicy,
) -> BatchReport {
    let naming = DestinationNaming::with_extension(
        Some(output_dir.to_path_buf()),
        target.extension(),
    );
    let tasks = discover(&source, IMAGE_EXTENSIONS, &naming).unwrap();

    let converter = ImageConverter::with_target(target, 100, Background::default());
    BatchRunner::new(Arc::new(converter), collision, 2)
        .run(tasks)
        .await
}

#[tokio::test]
async fn test_discovery_excludes_foreign_files_from_report() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    write_png(input.path(), "a.png", 6, 6);
    write_png(input.path(), "b.png", 6, 6);
    fs::write(input.path().join("notes.txt"), "not an image").unwrap();
    fs::write(input.path().join("data.csv"), "1,2,3").unwrap();

    let report = convert_batch(
        SourceSpec::new(input.path(), false),
        output.path(),
        TargetFormat::Jpeg,
        CollisionPolicy::Skip,
    )
    .await;

    // Exactly the accepted files are processed; the others appear
    // nowhere, not even as skipped.
    assert_eq!(report.total(), 2);
    assert_eq!(report.converted, 2);
    assert!(output.path().join("a.jpg").exists());
    assert!(output.path().join("b.jpg").exists());
}

#[tokio::test]
async fn test_one_corrupt_file_fails_alone() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    write_png(input.path(), "good1.png", 6, 6);
    write_garbage(input.path(), "broken.png");
    write_png(input.path(), "good2.png", 6, 6);

    let report = convert_batch(
        SourceSpec::new(input.path(), false),
        output.path(),
        TargetFormat::Bmp,
        CollisionPolicy::Skip,
    )
    .await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.converted, 2);
    assert_eq!(report.failed, 1);

    // The corrupt file left nothing behind, partial or otherwise.
    assert!(!output.path().join("broken.bmp").exists());
    assert!(!output.path().join("broken.bmp.tmp").exists());
    assert!(output.path().join("good1.bmp").exists());
    assert!(output.path().join("good2.bmp").exists());
}

#[tokio::test]
async fn test_rerun_with_skip_policy_is_idempotent() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    write_png(input.path(), "a.png", 6, 6);
    write_png(input.path(), "b.png", 6, 6);

    let first = convert_batch(
        SourceSpec::new(input.path(), false),
        output.path(),
        TargetFormat::Png,
        CollisionPolicy::Skip,
    )
    .await;
    assert_eq!(first.converted, 2);

    let second = convert_batch(
        SourceSpec::new(input.path(), false),
        output.path(),
        TargetFormat::Png,
        CollisionPolicy::Skip,
    )
    .await;

    assert_eq!(second.converted, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.failed, 0);
}

#[tokio::test]
async fn test_recursive_conversion_mirrors_tree() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    write_png(input.path(), "top.png", 6, 6);
    write_png(input.path(), "album/deep/leaf.png", 6, 6);

    let report = convert_batch(
        SourceSpec::new(input.path(), true),
        output.path(),
        TargetFormat::Jpeg,
        CollisionPolicy::Skip,
    )
    .await;

    assert_eq!(report.converted, 2);
    assert!(output.path().join("top.jpg").exists());
    assert!(
        output
            .path()
            .join("album")
            .join("deep")
            .join("leaf.jpg")
            .exists()
    );
}

#[tokio::test]
async fn test_non_recursive_ignores_subdirectories() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    write_png(input.path(), "top.png", 6, 6);
    write_png(input.path(), "album/nested.png", 6, 6);

    let report = convert_batch(
        SourceSpec::new(input.path(), false),
        output.path(),
        TargetFormat::Jpeg,
        CollisionPolicy::Skip,
    )
    .await;

    assert_eq!(report.total(), 1);
    assert!(!output.path().join("album").exists());
}

#[tokio::test]
async fn test_single_file_source() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let file = write_png(input.path(), "one.png", 6, 6);

    let report = convert_batch(
        SourceSpec::new(&file, false),
        output.path(),
        TargetFormat::WebP,
        CollisionPolicy::Skip,
    )
    .await;

    assert_eq!(report.total(), 1);
    assert_eq!(report.converted, 1);
    assert!(output.path().join("one.webp").exists());
}

#[tokio::test]
async fn test_missing_source_is_fatal() {
    let spec = SourceSpec::new("/nonexistent/photos", false);
    let naming = DestinationNaming::with_extension(None, "png");
    let result = discover(&spec, IMAGE_EXTENSIONS, &naming);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_lossless_roundtrip_preserves_pixels() {
    let input = TempDir::new().unwrap();
    let mid = TempDir::new().unwrap();
    let back = TempDir::new().unwrap();

    let original_path = write_png(input.path(), "art.png", 8, 8);
    let original = image::open(&original_path).unwrap().to_rgb8();

    convert_batch(
        SourceSpec::new(input.path(), false),
        mid.path(),
        TargetFormat::Bmp,
        CollisionPolicy::Skip,
    )
    .await;

    convert_batch(
        SourceSpec::new(mid.path(), false),
        back.path(),
        TargetFormat::Png,
        CollisionPolicy::Skip,
    )
    .await;

    let roundtripped = image::open(back.path().join("art.png")).unwrap().to_rgb8();
    assert_eq!(roundtripped.as_raw(), original.as_raw());
}
