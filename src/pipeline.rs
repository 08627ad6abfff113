//! The batch conversion pipeline.
//!
//! Every batch operation is the same shape: discover candidate files,
//! apply a per-file transform, aggregate outcomes. This module provides
//! that shape once, parameterized by a [`Transform`], instead of
//! re-implementing it per file type.
//!
//! Two guarantees matter here:
//!
//! - **Atomicity**: the transform writes to a temporary path next to the
//!   destination; the runner renames it into place only on success and
//!   deletes it on failure. A failed conversion never leaves a zero-byte
//!   or truncated file a later step could mistake for valid output.
//! - **Error isolation**: every transform error is caught at the per-file
//!   boundary and recorded; the batch always continues past a corrupt
//!   input to the next file.
//!
//! Tasks are independent and run on the blocking thread pool with bounded
//! concurrency; results are re-sorted into discovery order.

use futures::stream::{self, StreamExt};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;

use crate::config::CollisionPolicy;
use crate::discover::FileTask;
use crate::error::{Error, Result};
use crate::report::{BatchReport, TransformResult};

/// A per-file operation: produce one output file from one input file.
///
/// Implementations must either succeed, leaving a complete file at
/// `output` and the source untouched, or fail without requiring cleanup
/// at the final destination; the runner hands them a temporary output
/// path and takes care of the atomic rename and failure cleanup.
pub trait Transform: Send + Sync {
    /// Short operation name used in output.
    fn name(&self) -> &'static str;

    /// Produce `output` from `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or decoded, or the
    /// output cannot be encoded or written.
    fn apply(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Executes a discovered batch against a transform.
pub struct BatchRunner {
    transform: Arc<dyn Transform>,
    collision: CollisionPolicy,
    jobs: usize,
}

impl BatchRunner {
    /// Create a runner.
    ///
    /// # Arguments
    ///
    /// * `transform` - The per-file operation
    /// * `collision` - Destination collision policy
    /// * `jobs` - Maximum number of concurrent transforms
    pub fn new(transform: Arc<dyn Transform>, collision: CollisionPolicy, jobs: usize) -> Self {
        Self {
            transform,
            collision,
            jobs: jobs.max(1),
        }
    }

    /// Run the batch to completion.
    ///
    /// Never fails as a whole: per-file errors are classified into the
    /// report and execution continues with the next file.
    pub async fn run(&self, tasks: Vec<FileTask>) -> BatchReport {
        self.run_with_progress(tasks, |_, _| {}).await
    }

    /// Run the batch, invoking `on_done` after each task completes.
    ///
    /// The callback receives the task's discovery index and its result,
    /// in completion order; the final report is in discovery order.
    pub async fn run_with_progress<F>(&self, tasks: Vec<FileTask>, mut on_done: F) -> BatchReport
    where
        F: FnMut(usize, &TransformResult),
    {
        let start = Instant::now();

        let work = tasks.into_iter().enumerate().map(|(idx, task)| {
            let transform = Arc::clone(&self.transform);
            let collision = self.collision;

            async move {
                let source = task.source.clone();
                let destination = task.destination.clone();

                let result =
                    task::spawn_blocking(move || process_task(task, transform.as_ref(), collision))
                        .await
                        .unwrap_or_else(|err| {
                            TransformResult::failed(
                                source,
                                Some(destination),
                                format!("transform task panicked: {err}"),
                            )
                        });

                (idx, result)
            }
        });

        let mut indexed: Vec<(usize, TransformResult)> = stream::iter(work)
            .buffer_unordered(self.jobs)
            .inspect(|(idx, result)| on_done(*idx, result))
            .collect()
            .await;

        indexed.sort_by_key(|(idx, _)| *idx);

        let results = indexed.into_iter().map(|(_, result)| result).collect();
        BatchReport::from_results(results, start.elapsed())
    }
}

/// Process a single task: collision handling, then the atomic
/// transform-and-rename.
fn process_task(
    task: FileTask,
    transform: &dyn Transform,
    collision: CollisionPolicy,
) -> TransformResult {
    let FileTask {
        source,
        destination,
        ..
    } = task;

    if destination == source {
        return TransformResult::skipped(
            source,
            Some(destination),
            "destination is the source file",
        );
    }

    if destination.exists() {
        match collision {
            CollisionPolicy::Skip => {
                return TransformResult::skipped(source, Some(destination), "destination exists");
            }
            CollisionPolicy::Error => {
                return TransformResult::failed(source, Some(destination), "destination exists");
            }
            CollisionPolicy::Overwrite => {}
        }
    }

    match apply_atomic(transform, &source, &destination) {
        Ok(()) => TransformResult::converted(source, destination),
        Err(err) => TransformResult::from_error(source, Some(destination), &err),
    }
}

/// Run the transform against a temporary path and atomically place the
/// result, removing the temporary on any failure.
fn apply_atomic(transform: &dyn Transform, source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| Error::FailedToCreateOutput {
            path: parent.to_path_buf(),
            source: err,
        })?;
    }

    let tmp = temp_path(destination);

    match transform.apply(source, &tmp) {
        Ok(()) => fs::rename(&tmp, destination).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            Error::FailedToWrite {
                path: destination.to_path_buf(),
                source: err,
            }
        }),
        Err(err) => {
            let _ = fs::remove_file(&tmp);
            Err(err)
        }
    }
}

/// Temporary sibling of the destination: `photo.webp` -> `photo.webp.tmp`.
///
/// Appending rather than replacing the extension keeps temporaries of
/// distinct destinations distinct.
fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Copies the input, uppercased. Stands in for a real codec.
    struct UppercaseTransform;

    impl Transform for UppercaseTransform {
        fn name(&self) -> &'static str {
            "uppercase"
        }

        fn apply(&self, input: &Path, output: &Path) -> Result<()> {
            let content = fs::read_to_string(input)?;
            fs::write(output, content.to_uppercase())?;
            Ok(())
        }
    }

    /// Fails on inputs containing "corrupt", after writing partial output.
    struct FlakyTransform;

    impl Transform for FlakyTransform {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn apply(&self, input: &Path, output: &Path) -> Result<()> {
            let content = fs::read_to_string(input)?;
            if content.contains("corrupt") {
                // Simulate a codec that died mid-write.
                fs::write(output, b"partial")?;
                return Err(Error::decode(input, "simulated codec failure"));
            }
            fs::write(output, content)?;
            Ok(())
        }
    }

    fn make_task(dir: &Path, name: &str, content: &str, out_name: &str) -> FileTask {
        let source = dir.join(name);
        fs::write(&source, content).unwrap();
        FileTask {
            source: source.clone(),
            relative: PathBuf::from(name),
            destination: dir.join(out_name),
        }
    }

    fn runner(transform: impl Transform + 'static, collision: CollisionPolicy) -> BatchRunner {
        BatchRunner::new(Arc::new(transform), collision, 2)
    }

    #[tokio::test]
    async fn test_batch_converts_all_files() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![
            make_task(dir.path(), "a.txt", "one", "a.out"),
            make_task(dir.path(), "b.txt", "two", "b.out"),
        ];

        let report = runner(UppercaseTransform, CollisionPolicy::Skip)
            .run(tasks)
            .await;

        assert_eq!(report.converted, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.out")).unwrap(),
            "ONE"
        );
    }

    #[tokio::test]
    async fn test_one_corrupt_file_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![
            make_task(dir.path(), "a.txt", "fine", "a.out"),
            make_task(dir.path(), "b.txt", "corrupt data", "b.out"),
            make_task(dir.path(), "c.txt", "fine", "c.out"),
        ];

        let report = runner(FlakyTransform, CollisionPolicy::Skip).run(tasks).await;

        assert_eq!(report.converted, 2);
        assert_eq!(report.failed, 1);
        assert!(dir.path().join("a.out").exists());
        assert!(dir.path().join("c.out").exists());
    }

    #[tokio::test]
    async fn test_failed_transform_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![make_task(dir.path(), "b.txt", "corrupt data", "b.out")];

        let report = runner(FlakyTransform, CollisionPolicy::Skip).run(tasks).await;

        assert_eq!(report.failed, 1);
        // Neither the destination nor the temporary survives a failure.
        assert!(!dir.path().join("b.out").exists());
        assert!(!dir.path().join("b.out.tmp").exists());
    }

    #[tokio::test]
    async fn test_skip_policy_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![make_task(dir.path(), "a.txt", "one", "a.out")];

        let runner = runner(UppercaseTransform, CollisionPolicy::Skip);
        let first = runner.run(tasks.clone()).await;
        assert_eq!(first.converted, 1);

        let modified_before = fs::metadata(dir.path().join("a.out")).unwrap().modified().unwrap();

        let second = runner.run(tasks).await;
        assert_eq!(second.converted, 0);
        assert_eq!(second.skipped, 1);

        let modified_after = fs::metadata(dir.path().join("a.out")).unwrap().modified().unwrap();
        assert_eq!(modified_before, modified_after, "re-run must not rewrite");
    }

    #[tokio::test]
    async fn test_overwrite_policy_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![make_task(dir.path(), "a.txt", "fresh", "a.out")];
        fs::write(dir.path().join("a.out"), "stale").unwrap();

        let report = runner(UppercaseTransform, CollisionPolicy::Overwrite)
            .run(tasks)
            .await;

        assert_eq!(report.converted, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.out")).unwrap(),
            "FRESH"
        );
    }

    #[tokio::test]
    async fn test_error_policy_records_failure_on_collision() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![make_task(dir.path(), "a.txt", "one", "a.out")];
        fs::write(dir.path().join("a.out"), "existing").unwrap();

        let report = runner(UppercaseTransform, CollisionPolicy::Error)
            .run(tasks)
            .await;

        assert_eq!(report.failed, 1);
        // The pre-existing file is untouched.
        assert_eq!(
            fs::read_to_string(dir.path().join("a.out")).unwrap(),
            "existing"
        );
    }

    #[tokio::test]
    async fn test_destination_equal_to_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "content").unwrap();
        let tasks = vec![FileTask {
            source: source.clone(),
            relative: PathBuf::from("a.txt"),
            destination: source.clone(),
        }];

        let report = runner(UppercaseTransform, CollisionPolicy::Overwrite)
            .run(tasks)
            .await;

        assert_eq!(report.skipped, 1);
        assert_eq!(fs::read_to_string(&source).unwrap(), "content");
    }

    #[tokio::test]
    async fn test_report_preserves_discovery_order() {
        let dir = TempDir::new().unwrap();
        let tasks: Vec<FileTask> = (0..8)
            .map(|i| {
                make_task(
                    dir.path(),
                    &format!("f{i}.txt"),
                    "x",
                    &format!("f{i}.out"),
                )
            })
            .collect();

        let report = runner(UppercaseTransform, CollisionPolicy::Skip)
            .run(tasks)
            .await;

        let names: Vec<_> = report
            .results
            .iter()
            .map(|r| r.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_progress_callback_fires_per_task() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![
            make_task(dir.path(), "a.txt", "x", "a.out"),
            make_task(dir.path(), "b.txt", "x", "b.out"),
        ];

        let mut seen = 0;
        runner(UppercaseTransform, CollisionPolicy::Skip)
            .run_with_progress(tasks, |_, _| seen += 1)
            .await;

        assert_eq!(seen, 2);
    }

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("dir/photo.webp")),
            PathBuf::from("dir/photo.webp.tmp")
        );
    }
}
