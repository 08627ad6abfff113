//! Output and presentation: formatter, progress line, report display.

pub mod formatter;
pub mod progress;

pub use formatter::OutputFormatter;
pub use progress::ProgressLine;

use crate::check::{CheckReport, CompressionClass};
use crate::merge::MergeStatistics;
use crate::report::{BatchReport, Outcome};

/// Display a batch report: per-file failures, verbose detail, summary.
///
/// Failed entries always list the file name and cause; skipped and
/// converted entries only appear in verbose mode.
pub fn display_batch_report(formatter: &OutputFormatter, report: &BatchReport) {
    if formatter.is_verbose() {
        for result in &report.results {
            match &result.outcome {
                Outcome::Converted => {
                    formatter.detail(&format!("converted: {}", result.source.display()));
                }
                Outcome::Skipped { reason } => {
                    formatter.detail(&format!(
                        "skipped: {} ({reason})",
                        result.source.display()
                    ));
                }
                Outcome::Failed { .. } => {}
            }
        }
    }

    for failure in report.failures() {
        if let Outcome::Failed { cause } = &failure.outcome {
            formatter.warning(&format!("failed: {}: {cause}", failure.source.display()));
        }
    }

    if report.is_clean() {
        formatter.success(&report.summary());
    } else {
        formatter.info(&report.summary());
    }
}

/// Display a compression check report.
pub fn display_check_report(formatter: &OutputFormatter, report: &CheckReport) {
    for result in &report.results {
        match &result.class {
            CompressionClass::Compatible => {
                formatter.detail(&format!("compatible: {}", result.path.display()));
            }
            CompressionClass::Incompatible { page, compression } => {
                formatter.warning(&format!(
                    "{} uses {compression} compression on page {page}",
                    result.path.display()
                ));
            }
            CompressionClass::Unknown { reason } => {
                formatter.warning(&format!(
                    "{} could not be inspected: {reason}",
                    result.path.display()
                ));
            }
        }
    }

    if report.is_all_compatible() {
        formatter.success(&report.summary());
    } else {
        formatter.info(&report.summary());
    }
}

/// Display merge statistics after a successful merge.
pub fn display_merge_statistics(formatter: &OutputFormatter, stats: &MergeStatistics) {
    formatter.stat("Input files", &stats.files_merged.to_string());
    formatter.stat("Total pages", &stats.total_pages.to_string());
    formatter.stat("Input size", &stats.format_input_size());
    formatter.stat(
        "Merge time",
        &format!("{:.2}s", stats.merge_time.as_secs_f64()),
    );
}
