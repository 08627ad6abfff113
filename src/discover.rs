//! Input discovery and destination naming.
//!
//! Turns a [`SourceSpec`] into the ordered list of files a batch will
//! process, and computes where each output lands. Directory scans accept
//! only files whose extension is in the operation's accepted set; anything
//! else is excluded from the candidate sequence entirely rather than
//! reported as a failure. Single-file sources always yield their one task,
//! letting the transform stage classify unsupported content.
//!
//! Also resolves the ordered input list for PDF merging, where argument
//! order is the page order and must never degrade to raw filesystem
//! traversal order.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SourceSpec;
use crate::error::{Error, Result};

/// One discovered input file and its computed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Source file path.
    pub source: PathBuf,

    /// Path relative to the scan root (just the file name for
    /// single-file sources). Drives mirrored output layout.
    pub relative: PathBuf,

    /// Computed destination path.
    pub destination: PathBuf,
}

/// Destination naming policy: where outputs go and which extension they
/// carry.
#[derive(Debug, Clone, Default)]
pub struct DestinationNaming {
    /// Destination root. `None` writes alongside each source file.
    pub output_dir: Option<PathBuf>,

    /// Output extension (without dot). `None` keeps the source extension,
    /// as rotation does.
    pub target_extension: Option<String>,
}

impl DestinationNaming {
    /// Naming policy that re-extensions files next to their source or
    /// under `output_dir`.
    pub fn with_extension(output_dir: Option<PathBuf>, extension: &str) -> Self {
        Self {
            output_dir,
            target_extension: Some(extension.to_string()),
        }
    }

    /// Naming policy that keeps the source file name under `output_dir`.
    pub fn mirrored(output_dir: PathBuf) -> Self {
        Self {
            output_dir: Some(output_dir),
            target_extension: None,
        }
    }

    /// Compute the destination for one source file.
    ///
    /// With an output dir, the path relative to the scan root is mirrored
    /// beneath it (preserving subdirectory depth in recursive mode);
    /// without one, the output lands next to the source. The target
    /// extension replaces the source extension when set.
    pub fn destination_for(&self, source: &Path, relative: &Path) -> PathBuf {
        let mut dest = match &self.output_dir {
            Some(dir) => dir.join(relative),
            None => source.to_path_buf(),
        };

        if let Some(ext) = &self.target_extension {
            dest.set_extension(ext);
        }

        dest
    }
}

/// Discover the files a batch will process.
///
/// # Arguments
///
/// * `spec` - Source file or directory, with the recursive flag
/// * `accepted` - Accepted extensions, lowercase without dots
/// * `naming` - Destination naming policy
///
/// # Errors
///
/// Returns [`Error::SourceNotFound`] if the source path does not exist.
/// An existing directory containing no accepted files yields an empty
/// list, which is not an error: the run then reports zero processed
/// files.
///
/// # Examples
///
/// ```no_run
/// use mediabatch::config::{IMAGE_EXTENSIONS, SourceSpec};
/// use mediabatch::discover::{DestinationNaming, discover};
///
/// # fn example() -> mediabatch::Result<()> {
/// let spec = SourceSpec::new("photos", true);
/// let naming = DestinationNaming::with_extension(Some("webp-out".into()), "webp");
/// let tasks = discover(&spec, IMAGE_EXTENSIONS, &naming)?;
/// println!("{} file(s) to convert", tasks.len());
/// # Ok(())
/// # }
/// ```
pub fn discover(
    spec: &SourceSpec,
    accepted: &[&str],
    naming: &DestinationNaming,
) -> Result<Vec<FileTask>> {
    if !spec.path.exists() {
        return Err(Error::source_not_found(&spec.path));
    }

    if spec.path.is_file() {
        let relative = PathBuf::from(
            spec.path
                .file_name()
                .ok_or_else(|| Error::source_not_found(&spec.path))?,
        );
        let destination = naming.destination_for(&spec.path, &relative);
        return Ok(vec![FileTask {
            source: spec.path.clone(),
            relative,
            destination,
        }]);
    }

    let max_depth = if spec.recursive { usize::MAX } else { 1 };
    let mut tasks = Vec::new();

    // Sorted traversal keeps reports deterministic across platforms.
    for entry in WalkDir::new(&spec.path)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| Error::other(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        if !has_accepted_extension(entry.path(), accepted) {
            continue;
        }

        let source = entry.path().to_path_buf();
        let relative = source
            .strip_prefix(&spec.path)
            .unwrap_or(&source)
            .to_path_buf();
        let destination = naming.destination_for(&source, &relative);

        tasks.push(FileTask {
            source,
            relative,
            destination,
        });
    }

    Ok(tasks)
}

/// Case-insensitive extension membership test.
pub fn has_accepted_extension(path: &Path, accepted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            accepted.iter().any(|a| *a == ext)
        })
        .unwrap_or(false)
}

/// Resolve an ordered list of merge inputs from CLI arguments.
///
/// Each argument is either a literal path or a glob pattern. Patterns
/// expand in sorted order; argument order is preserved, so the caller
/// controls page order. A literal path that does not exist is a fatal
/// error, matching the merge contract that every input must be present
/// before any work starts.
pub fn resolve_ordered_inputs<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();

        let is_glob = pattern.contains(['*', '?', '[']);
        if !is_glob {
            let path = PathBuf::from(pattern);
            if !path.is_file() {
                return Err(Error::source_not_found(path));
            }
            resolved.push(path);
            continue;
        }

        let paths = glob::glob(pattern).map_err(|err| Error::invalid_config(err.to_string()))?;

        let mut matched = Vec::new();
        for entry in paths {
            let path = entry.map_err(|err| Error::other(err.to_string()))?;
            if path.is_file() {
                matched.push(path);
            }
        }

        if matched.is_empty() {
            return Err(Error::source_not_found(PathBuf::from(pattern)));
        }

        matched.sort();
        resolved.extend(matched);
    }

    if resolved.is_empty() {
        return Err(Error::NoInputs);
    }

    Ok(resolved)
}
