//! PDF concatenation.
//!
//! Merging is the one operation that is not per-file independent: it is a
//! single ordered reduction over the input documents, where page order is
//! input order and input order is whatever the caller specified. Unlike
//! the batch pipeline, any constituent failure aborts the whole merge:
//! a partial merge is not a meaningful partial success. Every input is
//! loaded and validated before the output is assembled, and the output is
//! written atomically.

use lopdf::{Document, Object, ObjectId};
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{Error, Result};

/// Statistics about a completed merge.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of input documents merged.
    pub files_merged: usize,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Combined size of the input files in bytes.
    pub input_size: u64,

    /// Time taken to load and merge.
    pub merge_time: Duration,
}

impl MergeStatistics {
    /// Format the combined input size as a human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }
}

/// Page count and path for one input, as shown in the dry-run plan.
#[derive(Debug, Clone)]
pub struct MergePlanEntry {
    /// Input path.
    pub path: PathBuf,

    /// Number of pages it contributes.
    pub pages: usize,
}

/// PDF merger performing the ordered reduction.
pub struct Merger;

impl Merger {
    /// Create a merger.
    pub fn new() -> Self {
        Self
    }

    /// Load and validate every input, returning the merge plan.
    ///
    /// Used by dry-run and verbose modes. Fails on the first unreadable
    /// input, like the merge itself.
    ///
    /// # Errors
    ///
    /// Returns an error if any input cannot be loaded as a PDF.
    pub async fn plan(&self, inputs: &[PathBuf]) -> Result<Vec<MergePlanEntry>> {
        let inputs = inputs.to_vec();
        task::spawn_blocking(move || {
            inputs
                .iter()
                .map(|path| {
                    let doc = load_input(path)?;
                    Ok(MergePlanEntry {
                        path: path.clone(),
                        pages: doc.get_pages().len(),
                    })
                })
                .collect()
        })
        .await
        .map_err(|err| Error::other(format!("merge task failed: {err}")))?
    }

    /// Merge the inputs, in order, into one document.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Input paths in page order
    ///
    /// # Errors
    ///
    /// Returns an error if the input list is empty or any input fails to
    /// load; no output is produced in that case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediabatch::merge::Merger;
    /// use std::path::PathBuf;
    ///
    /// # async fn example() -> mediabatch::Result<()> {
    /// let merger = Merger::new();
    /// let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
    /// let (doc, stats) = merger.merge(&inputs).await?;
    /// println!("{} pages from {} files", stats.total_pages, stats.files_merged);
    /// # let _ = doc;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(&self, inputs: &[PathBuf]) -> Result<(Document, MergeStatistics)> {
        let inputs = inputs.to_vec();
        task::spawn_blocking(move || merge_documents(&inputs))
            .await
            .map_err(|err| Error::other(format!("merge task failed: {err}")))?
    }

    /// Atomically write the merged document.
    ///
    /// The document is written to a temporary sibling and renamed into
    /// place, so a failed write leaves nothing at the output path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputExists`] if the output exists and
    /// `overwrite` is false, or a write error.
    pub async fn save(&self, doc: Document, output: &Path, overwrite: bool) -> Result<u64> {
        let output = output.to_path_buf();
        task::spawn_blocking(move || save_document(doc, &output, overwrite))
            .await
            .map_err(|err| Error::other(format!("write task failed: {err}")))?
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

fn load_input(path: &Path) -> Result<Document> {
    let doc =
        Document::load(path).map_err(|err| Error::failed_to_load_pdf(path, err.to_string()))?;

    if doc.get_pages().is_empty() {
        return Err(Error::failed_to_load_pdf(path, "PDF has no pages"));
    }

    Ok(doc)
}

fn merge_documents(inputs: &[PathBuf]) -> Result<(Document, MergeStatistics)> {
    if inputs.is_empty() {
        return Err(Error::NoInputs);
    }

    let start = Instant::now();

    // Load everything up front: a bad input must abort before any
    // assembly happens.
    let mut input_size = 0;
    let mut loaded = Vec::with_capacity(inputs.len());
    for path in inputs {
        loaded.push(load_input(path)?);
        input_size += fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    }

    let mut docs = loaded.into_iter();
    let mut merged = match docs.next() {
        Some(doc) => doc,
        None => return Err(Error::NoInputs),
    };
    let mut max_id = merged.max_id;

    for mut doc in docs {
        // Renumber past the running maximum to avoid object id clashes.
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let doc_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

        merged.objects.extend(doc.objects);
        append_pages(&mut merged, &doc_pages)?;
    }

    merged.compress();
    merged.renumber_objects();

    let total_pages = merged.get_pages().len();
    let statistics = MergeStatistics {
        files_merged: inputs.len(),
        total_pages,
        input_size,
        merge_time: start.elapsed(),
    };

    Ok((merged, statistics))
}

/// Append page references to the merged document's page tree.
fn append_pages(merged: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let catalog = merged
        .catalog_mut()
        .map_err(|err| Error::merge_failed(format!("Failed to get catalog: {err}")))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(|p| p.as_reference())
        .map_err(|err| Error::merge_failed(format!("Failed to get pages reference: {err}")))?;

    let pages_obj = merged
        .get_object_mut(pages_id)
        .map_err(|err| Error::merge_failed(format!("Failed to get pages object: {err}")))?;

    let Object::Dictionary(dict) = pages_obj else {
        return Err(Error::merge_failed("Pages object is not a dictionary"));
    };

    let kids = dict
        .get_mut(b"Kids")
        .map_err(|_| Error::merge_failed("Pages dictionary missing Kids array"))?;

    if let Object::Array(kids_array) = kids {
        for &page_id in page_ids {
            kids_array.push(Object::Reference(page_id));
        }
    } else {
        return Err(Error::merge_failed("Kids is not an array"));
    }

    let current_count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
    dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

    Ok(())
}

fn save_document(mut doc: Document, output: &Path, overwrite: bool) -> Result<u64> {
    if output.exists() && !overwrite {
        return Err(Error::OutputExists {
            path: output.to_path_buf(),
        });
    }

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| Error::FailedToCreateOutput {
            path: parent.to_path_buf(),
            source: err,
        })?;
    }

    let mut tmp_name = output.file_name().map(std::ffi::OsString::from).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = output.with_file_name(tmp_name);

    if let Err(err) = write_document(&mut doc, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    fs::rename(&tmp, output).map_err(|err| {
        let _ = fs::remove_file(&tmp);
        Error::FailedToWrite {
            path: output.to_path_buf(),
            source: err,
        }
    })?;

    Ok(fs::metadata(output).map(|m| m.len()).unwrap_or(0))
}

fn write_document(doc: &mut Document, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::FailedToCreateOutput {
        path: path.to_path_buf(),
        source: err,
    })?;
    let mut writer = BufWriter::new(file);

    doc.save_to(&mut writer).map_err(|err| Error::FailedToWrite {
        path: path.to_path_buf(),
        source: std::io::Error::other(err),
    })?;

    writer.flush().map_err(|err| Error::FailedToWrite {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Format file size as human-readable string.
fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
