//! vidg - catalog, preview and rate a local video library.
//!
//! Usage:
//!   vidg sync [PATH]               Scan the library and update its catalog
//!   vidg status [PATH]             Ratings and totals
//!   vidg list [PATH]               Filtered, sorted listing
//!   vidg rate [PATH] -F FILE --up  Change a file's rating
//!   vidg empty-trash [PATH]        Move files rated -1 to the system trash
//!   vidg export [PATH]             Export the catalog to JSON
//!   vidg --help                    Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vidg_browse::{Browser, Filters, RatingFilter, RatingMode, SortKey, SortOrder, StatKey};
use vidg_catalog::{CatalogStore, SqliteCatalog, SystemTrash};
use vidg_core::{CatalogEntry, LibraryConfig, Rating};
use vidg_extract::FfmpegExtractor;
use vidg_sync::{SyncProgress, SyncReport, Syncer};

#[derive(Parser)]
#[command(
    name = "vidg",
    version,
    about = "Catalog, preview and rate a local video library",
    long_about = "vidg keeps a catalog of the videos under a directory, with a contact \
                  sheet preview, technical attributes and a rating for each file.\n\n\
                  Run `vidg sync [PATH]` to bring the catalog up to date, then browse \
                  it with `list` and curate it with `rate` and `empty-trash`."
)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the library and update its catalog
    Sync {
        /// Library root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show ratings, totals and value ranges
    Status {
        /// Library root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List catalog entries
    List {
        /// Library root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Keep entries with this rating (-1 to 5)
        #[arg(short, long, allow_negative_numbers = true, value_parser = parse_rating)]
        rating: Option<Rating>,

        /// How --rating is compared
        #[arg(short, long, default_value = "equal")]
        mode: RatingMode,

        /// Keep entries whose path contains this text
        #[arg(short, long)]
        text: Option<String>,

        /// Keep entries sharing this attribute with another entry
        #[arg(short, long)]
        duplicate: Option<StatKey>,

        /// Sort by this attribute
        #[arg(short, long)]
        sort: Option<SortKey>,

        /// Sort direction
        #[arg(short, long, default_value = "desc")]
        order: SortOrder,

        /// Maximum number of entries to show
        #[arg(short = 'n', long, default_value = "50")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Raise or lower the rating of a file
    Rate {
        /// Library root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// File to rate
        #[arg(short = 'F', long)]
        file: PathBuf,

        /// Raise the rating by one
        #[arg(long, conflicts_with = "down", required_unless_present = "down")]
        up: bool,

        /// Lower the rating by one
        #[arg(long)]
        down: bool,
    },

    /// Move every file rated -1 to the system trash
    EmptyTrash {
        /// Library root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Actually move the files (default: only list them)
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the catalog to JSON
    Export {
        /// Library root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Sync { path } => run_sync(&path).await?,
        Command::Status { path } => run_status(&path)?,
        Command::List {
            path,
            rating,
            mode,
            text,
            duplicate,
            sort,
            order,
            top,
            format,
        } => {
            let filters = Filters {
                rating: rating.map(|r| RatingFilter::new(r, mode)),
                text,
                duplicate,
            };
            run_list(&path, filters, sort.map(|key| (key, order)), top, format)?;
        }
        Command::Rate { path, file, up, .. } => run_rate(&path, &file, up)?,
        Command::EmptyTrash { path, yes } => run_empty_trash(&path, yes)?,
        Command::Export { path, output } => run_export(&path, output)?,
    }

    Ok(())
}

/// Log to stderr, filtered by RUST_LOG when set.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default_filter = [
        "vidg", "vidg_sync", "vidg_scan", "vidg_extract", "vidg_catalog", "vidg_browse",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",");
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Canonicalize the library root and read its settings.
fn load_config(path: &Path) -> Result<LibraryConfig> {
    let root = path.canonicalize().context("Invalid path")?;
    LibraryConfig::load(root).context("Failed to load library configuration")
}

fn open_catalog(config: &LibraryConfig) -> Result<SqliteCatalog> {
    SqliteCatalog::open_library(config)
        .with_context(|| format!("Failed to open catalog {}", config.catalog_path().display()))
}

/// Run one sync pass; Ctrl-C abandons the file in progress and keeps the rest.
async fn run_sync(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let mut store = open_catalog(&config)?;

    eprintln!("Syncing {}...", config.root.display());

    let extractor = FfmpegExtractor::new(config.extract.clone());
    let syncer = Syncer::new(config, extractor);

    let token = syncer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            token.cancel();
        }
    });

    let mut progress = syncer.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match progress.recv().await {
                Ok(SyncProgress::Scanned { found, warnings }) => {
                    eprintln!("Found {found} media files ({warnings} warnings)");
                }
                Ok(SyncProgress::Diffed {
                    added,
                    removed,
                    renamed,
                }) => {
                    eprintln!("{added} new, {removed} gone, {renamed} moved");
                }
                Ok(SyncProgress::Processing { index, total, path }) => {
                    eprintln!("[{}/{}] {}", index + 1, total, path.display());
                }
                Ok(SyncProgress::Finished) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(_)) => {}
            }
        }
    });

    let result = syncer.sync(&mut store).await;
    // closes the progress channel so the printer always exits
    drop(syncer);
    let _ = printer.await;

    print_report(&result.context("Sync failed")?);
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " Sync {} in {:.2}s",
        if report.cancelled { "cancelled" } else { "finished" },
        report.elapsed.as_secs_f64()
    );
    println!("{}", "─".repeat(60));
    println!("   Found      {:>8}", report.found);
    println!("   Added      {:>8}", report.added);
    println!("   Removed    {:>8}", report.removed);
    println!("   Moved      {:>8}", report.renamed);
    println!("   Completed  {:>8}", report.completed);
    println!("   Failed     {:>8}", report.failed.len());

    if !report.failed.is_empty() {
        println!();
        println!(" Failed files (retried on the next sync):");
        for failure in &report.failed {
            println!("   {}: {}", failure.path.display(), failure.error);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!(" {} warning(s) during scan", report.warnings.len());
        for warning in report.warnings.iter().take(10) {
            println!("   [{}] {}", warning.kind, warning.path.display());
        }
        let remaining = report.warnings.len().saturating_sub(10);
        if remaining > 0 {
            println!("   ... and {} more", remaining);
        }
    }
    println!();
}

/// Show the rating histogram, totals and value ranges.
fn run_status(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let store = open_catalog(&config)?;
    let browser = Browser::load(&store)?;
    let incomplete = store.incomplete()?.len();

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} - {}",
        config.root.display(),
        format_size(browser.total_size())
    );
    println!(
        " {} files, {} without preview",
        browser.cursor().len(),
        incomplete
    );
    println!("{}", "─".repeat(60));
    println!();

    println!(" Ratings:");
    let histogram = browser.rating_histogram();
    let max_count = histogram.values().map(|b| b.count).max().unwrap_or(1);
    for (rating, bucket) in &histogram {
        let bar_len = (bucket.count as f64 / max_count as f64 * 30.0) as usize;
        println!(
            "   {:<8} {:>6} files {:>10}  {}",
            rating_label(*rating),
            bucket.count,
            format_size(bucket.size),
            "█".repeat(bar_len)
        );
    }
    println!();

    let ranges = browser.ranges();
    if let (Some(min), Some(max)) = (ranges.duration.min, ranges.duration.max) {
        println!(" Duration: {} - {}", format_duration(min), format_duration(max));
    }
    if let (Some(min), Some(max)) = (ranges.size.min, ranges.size.max) {
        println!(" Size:     {} - {}", format_size(min), format_size(max));
    }
    if let (Some(min), Some(max)) = (ranges.created.min, ranges.created.max) {
        println!(" Created:  {} - {}", format_date(min), format_date(max));
    }
    println!();

    Ok(())
}

/// List entries passing `filters`, optionally re-sorted.
fn run_list(
    path: &Path,
    filters: Filters,
    sort: Option<(SortKey, SortOrder)>,
    top_n: usize,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(path)?;
    let store = open_catalog(&config)?;

    let mut browser = Browser::load(&store)?;
    browser.apply_filters(&store, filters)?;
    if let Some((key, order)) = sort {
        browser.sort(key, order);
    }

    let entries: Vec<&CatalogEntry> = browser.cursor().iter().take(top_n).collect();

    match format {
        OutputFormat::Text => {
            for entry in &entries {
                print_entry(entry, &config);
            }

            let remaining = browser.cursor().len().saturating_sub(entries.len());
            if remaining > 0 {
                println!("... and {} more", remaining);
            }
            println!();
            println!(
                "{} of {} files, {}",
                browser.cursor().len(),
                browser.cursor().universe_len(),
                format_size(browser.total_size())
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

fn print_entry(entry: &CatalogEntry, config: &LibraryConfig) {
    let stats = &entry.stats;
    let resolution = match (stats.width, stats.height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => "-".to_string(),
    };

    println!(
        "{:<8} {:>10} {:>9} {:>10}  {}",
        rating_label(entry.rating),
        format_size(stats.size),
        stats.duration.map(format_duration).unwrap_or_else(|| "-".to_string()),
        resolution,
        config.relative(&entry.path).unwrap_or(entry.path.as_path()).display()
    );
}

/// Change the rating of one file by one step.
fn run_rate(path: &Path, file: &Path, up: bool) -> Result<()> {
    let config = load_config(path)?;
    let mut store = open_catalog(&config)?;

    let file = file.canonicalize().context("Invalid file")?;
    let mut browser = Browser::load(&store)?;
    let id = browser
        .cursor()
        .universe()
        .find(|e| e.path == file)
        .map(|e| e.id)
        .ok_or_else(|| eyre!("{} is not in the catalog; run `vidg sync` first", file.display()))?;

    let rating = if up {
        browser.increase(&mut store, Some(id))?
    } else {
        browser.decrease(&mut store, Some(id))?
    };

    if let Some(rating) = rating {
        println!("{}: {}", file.display(), rating_label(rating));
    }
    Ok(())
}

/// List trashed files, and move them to the system trash with `--yes`.
fn run_empty_trash(path: &Path, confirmed: bool) -> Result<()> {
    let config = load_config(path)?;
    let mut store = open_catalog(&config)?;

    let trashed = store.trashed()?;
    if trashed.is_empty() {
        println!("No files rated {}.", Rating::TRASH);
        return Ok(());
    }

    let total: u64 = trashed.iter().map(|e| e.stats.size).sum();
    for entry in &trashed {
        println!(
            "   {} ({})",
            entry.path.display(),
            format_size(entry.stats.size)
        );
    }
    println!();

    if !confirmed {
        println!(
            "{} file(s), {}. Run again with --yes to move them to the trash.",
            trashed.len(),
            format_size(total)
        );
        return Ok(());
    }

    let mut browser = Browser::load(&store)?;
    let removed = browser
        .empty_trash(&mut store, &SystemTrash)
        .context("Failed to empty trash")?;
    println!("Moved {} file(s) to the trash, freed {}", removed, format_size(total));

    Ok(())
}

/// Export the catalog (without previews) to JSON.
fn run_export(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(path)?;
    let store = open_catalog(&config)?;

    let json = serde_json::to_string_pretty(&store.all()?)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

fn parse_rating(s: &str) -> Result<Rating, String> {
    let value: i64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    Rating::try_from(value)
}

fn rating_label(rating: Rating) -> String {
    match rating.value() {
        -1 => "trash".to_string(),
        0 => "unrated".to_string(),
        n => "★".repeat(n as usize),
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format seconds as `h:mm:ss`.
fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}

/// Format epoch milliseconds as a local date.
fn format_date(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|utc| {
            utc.with_timezone(&chrono::Local)
                .format("%Y-%m-%d")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
