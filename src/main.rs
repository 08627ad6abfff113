//! mediabatch - batch conversion, rotation and merging for image and PDF
//! files.

use clap::Parser;
use std::process;
use std::sync::Arc;

use mediabatch::check::check_batch;
use mediabatch::cli::{
    CheckArgs, Cli, Command, ConvertArgs, MergeArgs, ReportMode, RotateArgs,
};
use mediabatch::config::{IMAGE_EXTENSIONS, ROTATE_EXTENSIONS, TIFF_EXTENSIONS};
use mediabatch::convert::ImageConverter;
use mediabatch::discover::{DestinationNaming, FileTask, discover, resolve_ordered_inputs};
use mediabatch::error::{Error, Result};
use mediabatch::merge::Merger;
use mediabatch::output::{
    OutputFormatter, ProgressLine, display_batch_report, display_check_report,
    display_merge_statistics,
};
use mediabatch::pipeline::{BatchRunner, Transform};
use mediabatch::report::BatchReport;
use mediabatch::rotate::Rotator;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert(args) => run_convert(args).await,
        Command::Rotate(args) => run_rotate(args).await,
        Command::Merge(args) => run_merge(args).await,
        Command::Check(args) => run_check(args).await,
    }
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let (config, mode) = args.to_config()?;
    let formatter = formatter_for(config.quiet, config.verbose, mode);

    let naming =
        DestinationNaming::with_extension(config.output_dir.clone(), config.target.extension());
    let tasks = discover(&config.source, IMAGE_EXTENSIONS, &naming)?;

    if config.dry_run {
        show_plan(&formatter, &tasks);
        return Ok(());
    }

    formatter.info(&format!(
        "Converting {} file(s) to {}...",
        tasks.len(),
        config.target.extension()
    ));

    let transform = Arc::new(ImageConverter::new(&config));
    let report = run_batch(
        transform,
        tasks,
        config.collision,
        config.effective_jobs(),
        &formatter,
    )
    .await;

    emit_batch_report(&formatter, mode, &report)
}

async fn run_rotate(args: RotateArgs) -> Result<()> {
    let (config, mode) = args.to_config()?;
    let formatter = formatter_for(config.quiet, config.verbose, mode);

    let naming = DestinationNaming::mirrored(config.output_dir.clone());
    let tasks = discover(&config.source, ROTATE_EXTENSIONS, &naming)?;

    if config.dry_run {
        show_plan(&formatter, &tasks);
        return Ok(());
    }

    formatter.info(&format!(
        "Rotating {} file(s) by {} degrees...",
        tasks.len(),
        config.angle
    ));

    let transform = Arc::new(Rotator::new(&config));
    let report = run_batch(
        transform,
        tasks,
        config.collision,
        config.effective_jobs(),
        &formatter,
    )
    .await;

    emit_batch_report(&formatter, mode, &report)
}

async fn run_merge(args: MergeArgs) -> Result<()> {
    let inputs = resolve_ordered_inputs(&args.inputs)?;
    let config = args.to_config(inputs)?;
    let formatter = OutputFormatter::new(config.quiet, config.verbose);
    let merger = Merger::new();

    formatter.info(&format!("Merging {} PDF file(s)...", config.inputs.len()));

    if config.dry_run || config.verbose {
        let plan = merger.plan(&config.inputs).await?;
        let total_pages: usize = plan.iter().map(|entry| entry.pages).sum();

        for (idx, entry) in plan.iter().enumerate() {
            formatter.info(&format!(
                "  {}. {} ({} page(s))",
                idx + 1,
                entry.path.display(),
                entry.pages
            ));
        }
        formatter.info(&format!("  Total pages: {total_pages}"));

        if config.dry_run {
            formatter.blank_line();
            formatter.success("Dry run completed successfully");
            formatter.info(&format!("  Output would be: {}", config.output.display()));
            return Ok(());
        }
    }

    let (doc, stats) = merger.merge(&config.inputs).await?;

    formatter.info(&format!("Writing to: {}", config.output.display()));
    let output_size = merger.save(doc, &config.output, config.overwrite).await?;

    formatter.success(&format!(
        "Created {} ({} pages from {} files)",
        config.output.display(),
        stats.total_pages,
        stats.files_merged
    ));
    display_merge_statistics(&formatter, &stats);
    formatter.stat("Output size", &format!("{output_size} bytes"));

    Ok(())
}

async fn run_check(args: CheckArgs) -> Result<()> {
    let (config, mode) = args.to_config()?;
    let formatter = formatter_for(config.quiet, config.verbose, mode);

    let tasks = discover(
        &config.source,
        TIFF_EXTENSIONS,
        &DestinationNaming::default(),
    )?;
    let paths: Vec<_> = tasks.into_iter().map(|task| task.source).collect();

    formatter.info(&format!("Checking {} TIFF file(s)...", paths.len()));

    let mut progress = progress_for(&formatter, paths.len());
    let report = check_batch(paths, config.effective_jobs(), |_, result| {
        progress.advance(&file_label(&result.path));
    })
    .await;
    progress.finish();

    match mode {
        ReportMode::Json => print_json(&report),
        ReportMode::Human => {
            display_check_report(&formatter, &report);
            Ok(())
        }
    }
}

/// Run a transform batch with a progress line.
async fn run_batch(
    transform: Arc<dyn Transform>,
    tasks: Vec<FileTask>,
    collision: mediabatch::config::CollisionPolicy,
    jobs: usize,
    formatter: &OutputFormatter,
) -> BatchReport {
    let mut progress = progress_for(formatter, tasks.len());

    let runner = BatchRunner::new(transform, collision, jobs);
    let report = runner
        .run_with_progress(tasks, |_, result| {
            progress.advance(&file_label(&result.source));
        })
        .await;

    progress.finish();
    report
}

fn emit_batch_report(
    formatter: &OutputFormatter,
    mode: ReportMode,
    report: &BatchReport,
) -> Result<()> {
    match mode {
        ReportMode::Json => print_json(report),
        ReportMode::Human => {
            display_batch_report(formatter, report);
            Ok(())
        }
    }
}

fn show_plan(formatter: &OutputFormatter, tasks: &[FileTask]) {
    formatter.info(&format!("Would process {} file(s):", tasks.len()));
    for task in tasks {
        formatter.info(&format!(
            "  {} -> {}",
            task.source.display(),
            task.destination.display()
        ));
    }
    formatter.blank_line();
    formatter.success("Dry run completed, nothing written");
}

fn formatter_for(quiet: bool, verbose: bool, mode: ReportMode) -> OutputFormatter {
    // JSON mode owns stdout; suppress the human chrome.
    OutputFormatter::new(quiet || mode == ReportMode::Json, verbose)
}

fn progress_for(formatter: &OutputFormatter, total: usize) -> ProgressLine {
    if formatter.should_print() {
        ProgressLine::new(total)
    } else {
        ProgressLine::disabled()
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|err| Error::other(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
