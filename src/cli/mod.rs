//! # CLI Module
//!
//! Command-line interface for the image duplicate finder.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for duplicates
//! image-dedup scan ~/Pictures
//!
//! # Stricter matching with the perceptual hash
//! image-dedup scan ~/Pictures --algorithm phash --threshold 4
//!
//! # Move duplicates into an archive, keeping the folder layout
//! image-dedup scan ~/Pictures --action move --action-dir ~/dup-archive
//!
//! # JSON output
//! image-dedup scan ~/Pictures --output json
//!
//! # Permanently delete specific files (asks for confirmation)
//! image-dedup delete ~/Pictures/copy.jpg
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_dedup::core::actions::{duplicates_to_delete, ActionExecutor, ActionKind, DispositionResult};
use image_dedup::core::pipeline::{
    CancellationToken, DedupEngine, EngineConfig, EngineSettings, RunResult,
};
use image_dedup::core::reporter::{export, ExportFormat};
use image_dedup::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
use image_dedup::error::{DedupError, ReportError, Result};
use image_dedup::events::{ActionEvent, Event, EventChannel, EventReceiver, HashEvent, PipelineEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;

/// Image Dedup - Find duplicate and near-duplicate images
#[derive(Parser, Debug)]
#[command(name = "image-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory for duplicate images and write a report
    Scan {
        /// Directory to scan (defaults to the configured input directory)
        input: Option<PathBuf>,

        /// JSON settings file; command-line options override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Hash algorithm: ahash, phash, dhash or whash
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Maximum Hamming distance for a duplicate (lower = stricter)
        #[arg(short, long)]
        threshold: Option<i64>,

        /// Fingerprint grid size, 2 to 64 (8 gives 64-bit fingerprints)
        #[arg(long)]
        hash_size: Option<u32>,

        /// Ignore the hash cache and rehash every image
        #[arg(long)]
        rebuild: bool,

        /// What to do with duplicates after the scan
        #[arg(long)]
        action: Option<ActionArg>,

        /// Where moved or copied duplicates go
        #[arg(long)]
        action_dir: Option<PathBuf>,

        /// Hash cache file
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Text report file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Also export pairs to a .json or .csv file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Permanently delete the second image of every pair
        #[arg(long)]
        delete_duplicates: bool,

        /// Skip the deletion prompt
        #[arg(long)]
        yes: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Permanently delete the given files
    Delete {
        /// Files to delete
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    /// Leave duplicates in place
    None,
    /// Move duplicates into the action directory
    Move,
    /// Copy duplicates into the action directory
    Copy,
}

impl From<ActionArg> for ActionKind {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::None => ActionKind::None,
            ActionArg::Move => ActionKind::Move,
            ActionArg::Copy => ActionKind::Copy,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Scan options that are not engine settings
struct ScanOptions {
    export: Option<PathBuf>,
    include_hidden: bool,
    delete_duplicates: bool,
    yes: bool,
    output: OutputFormat,
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            input,
            config,
            algorithm,
            threshold,
            hash_size,
            rebuild,
            action,
            action_dir,
            cache,
            report,
            export,
            include_hidden,
            delete_duplicates,
            yes,
            output,
            verbose,
        } => {
            let mut settings = match config {
                Some(path) => EngineSettings::from_json_file(&path)?,
                None => EngineSettings::default(),
            };

            if let Some(input) = input {
                settings.input_directory = input;
            }
            if let Some(algorithm) = algorithm {
                settings.hash_type = algorithm;
            }
            if let Some(threshold) = threshold {
                settings.hash_threshold = threshold;
            }
            if let Some(hash_size) = hash_size {
                settings.hash_size = hash_size;
            }
            if rebuild {
                settings.rebuild_hash_cache = true;
            }
            if let Some(action) = action {
                let kind = ActionKind::from(action);
                settings.duplicate_action_type = kind.name().to_string();
                settings.enable_duplicate_actions = kind != ActionKind::None;
            }
            if let Some(dir) = action_dir {
                settings.duplicate_action_directory = dir;
            }
            if let Some(cache) = cache {
                settings.image_hashes_cache_file = cache;
            }
            if let Some(report) = report {
                settings.duplicate_report_file = report;
            }

            run_scan(
                EngineConfig::from_settings(&settings)?,
                ScanOptions {
                    export,
                    include_hidden,
                    delete_duplicates,
                    yes,
                    output,
                    verbose,
                },
            )
        }
        Commands::Delete { paths, yes, output } => run_delete(paths, yes, output),
    }
}

fn run_scan(config: EngineConfig, options: ScanOptions) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(options.output, OutputFormat::Pretty);

    // Print header
    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Image Dedup").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  Scanning {} ({}, threshold {})",
            style(config.input_dir.display()).cyan(),
            config.algorithm,
            config.threshold
        ))
        .ok();
        term.write_line("").ok();
    }

    let scanner = WalkDirScanner::new(ScanConfig {
        include_hidden: options.include_hidden,
        exclude: vec![config.action_dir.clone()],
        ..Default::default()
    });
    let scan = scanner.scan(&[config.input_dir.clone()])?;
    if options.verbose {
        for error in &scan.errors {
            term.write_line(&format!("  {} {}", style("!").yellow(), error)).ok();
        }
    }

    let engine = DedupEngine::new(config);
    let cancel = CancellationToken::new();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();
    let progress = pretty.then(new_progress_bar);
    let event_thread = spawn_event_thread(receiver, progress, options.verbose);

    let result = engine.run_with_events(&scan.files, &sender, &cancel);

    let disposition = match &result {
        Ok(run) => Some(engine.dispose_with_events(&run.pairs, &sender, &cancel)),
        Err(_) => None,
    };

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;

    if let Some(path) = &options.export {
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            DedupError::Config(format!(
                "cannot tell export format from {}; use .json or .csv",
                path.display()
            ))
        })?;
        export(&result.pairs, format, path)?;
    }

    let deletion = if options.delete_duplicates && !result.pairs.is_empty() {
        let targets = duplicates_to_delete(&result.pairs);
        if confirm_delete(&term, &targets, options.yes) {
            Some(engine.delete(&targets))
        } else {
            term.write_line("Deletion cancelled. No files were deleted.").ok();
            None
        }
    } else {
        None
    };

    match options.output {
        OutputFormat::Pretty => {
            print_pretty_results(&term, &result, engine.config(), options.verbose);
            if let Some(disposition) = disposition.as_ref().filter(|d| d.attempted > 0) {
                print_disposition(&term, engine.config().action_kind.name(), disposition);
            }
            if let Some(deletion) = &deletion {
                print_disposition(&term, "delete", deletion);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "run": result,
            "disposition": disposition,
            "deletion": deletion,
        }))?,
        OutputFormat::Minimal => {
            for path in duplicates_to_delete(&result.pairs) {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn run_delete(paths: Vec<PathBuf>, yes: bool, output: OutputFormat) -> Result<()> {
    let term = Term::stderr();

    if !confirm_delete(&term, &paths, yes) {
        term.write_line("Deletion cancelled. No files were deleted.").ok();
        return Ok(());
    }

    let result = ActionExecutor::new().delete(&paths);

    match output {
        OutputFormat::Pretty => print_disposition(&term, "delete", &result),
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Minimal => println!("{}", result.count()),
    }

    Ok(())
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    pb.set_style(style);
    pb
}

/// Render engine events on a progress bar until every sender is dropped
fn spawn_event_thread(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = &progress else {
                continue;
            };

            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Hash(HashEvent::Started { to_hash, .. }) => {
                    pb.set_position(0);
                    pb.set_length(to_hash as u64);
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Hash(HashEvent::Error { path, message }) if verbose => {
                    pb.println(format!("  {} {}: {}", style("!").yellow(), path.display(), message));
                }
                Event::Action(ActionEvent::Started { total, .. }) => {
                    pb.set_position(0);
                    pb.set_length(total as u64);
                }
                Event::Action(
                    ActionEvent::Completed { .. }
                    | ActionEvent::Skipped { .. }
                    | ActionEvent::Failed { .. },
                ) => pb.inc(1),
                Event::Pipeline(PipelineEvent::Completed { .. } | PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
    })
}

/// Ask the user to type DELETE. `--yes` skips the prompt.
///
/// Without a terminal and without `--yes` nothing is deleted.
fn confirm_delete(term: &Term, paths: &[PathBuf], yes: bool) -> bool {
    if yes {
        return true;
    }
    if !term.is_term() {
        tracing::warn!("Refusing to delete without a terminal; pass --yes to confirm");
        return false;
    }

    term.write_line(&format!(
        "{} The following {} file(s) will be permanently deleted:",
        style("WARNING:").red().bold(),
        paths.len()
    ))
    .ok();
    for path in paths {
        term.write_line(&format!("    {}", path.display())).ok();
    }
    term.write_str(&format!("Type {} to confirm: ", style("DELETE").red().bold()))
        .ok();

    term.read_line()
        .map(|answer| answer.trim() == "DELETE")
        .unwrap_or(false)
}

fn print_pretty_results(term: &Term, result: &RunResult, config: &EngineConfig, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(result.total_candidates).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} hashed, {} from cache",
        style(result.hashed).cyan(),
        style(result.cache_hits).dim()
    ))
    .ok();
    if result.hash_failures > 0 {
        term.write_line(&format!(
            "  {} images could not be read (will be retried)",
            style(result.hash_failures).yellow()
        ))
        .ok();
    }
    if result.pruned > 0 {
        term.write_line(&format!(
            "  {} stale cache entries removed",
            style(result.pruned).dim()
        ))
        .ok();
    }
    term.write_line(&format!(
        "  {} duplicate pairs found",
        style(result.pairs.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if result.pairs.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Pairs:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, pair) in result.pairs.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} (distance {})",
                style(format!("Pair {}:", i + 1)).bold(),
                style(pair.match_type()).yellow(),
                pair.distance
            ))
            .ok();
            term.write_line(&format!("    {} {}", style("★").green(), pair.original.display()))
                .ok();
            term.write_line(&format!("    {} {}", style("○").dim(), pair.duplicate.display()))
                .ok();
            term.write_line("").ok();
        }
    }

    term.write_line(&format!(
        "  Report written to {}",
        style(config.report_path.display()).cyan()
    ))
    .ok();
    if verbose {
        term.write_line(&format!(
            "  Hash cache at {}",
            style(config.cache_path.display()).dim()
        ))
        .ok();
    }

    // Footer
    if !config.enable_actions {
        term.write_line(&format!(
            "{}",
            style("No files were moved or deleted. Review the report before taking action.").dim()
        ))
        .ok();
    }
}

fn print_disposition(term: &Term, operation: &str, result: &DispositionResult) {
    term.write_line("").ok();
    term.write_line(&format!(
        "  {}: {} succeeded, {} skipped, {} failed{}",
        style(operation).bold(),
        style(result.succeeded).green(),
        style(result.skipped).dim(),
        style(result.failed).red(),
        if result.cancelled { " (cancelled)" } else { "" }
    ))
    .ok();

    for failure in &result.failures {
        term.write_line(&format!(
            "    {} {}: {}",
            style("✗").red(),
            display_path(&failure.path),
            failure.message
        ))
        .ok();
    }
}

fn display_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let output =
        serde_json::to_string_pretty(value).map_err(|e| ReportError::Serialize(e.to_string()))?;
    println!("{}", output);
    Ok(())
}
