//! Birdscope - descriptive dashboard over bird observation records
//!
//! Loads the `observations` table of a SQLite database once and renders
//! seven analysis views as Markdown or JSON, either as a report or in an
//! interactive sidebar session.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable database, bad filter, config failure, etc.)

mod analysis;
mod cli;
mod config;
mod data;
mod error;
mod models;
mod report;
mod session;
mod views;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat, RunMode};
use config::{Config, CONFIG_FILE};
use data::SnapshotStore;
use indicatif::{ProgressBar, ProgressStyle};
use models::{Report, ReportMetadata};
use session::Session;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use views::{render_with, View, ViewSettings};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so the file can turn on verbose output
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("Birdscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(args, config) {
        error!("Dashboard failed: {}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .birdscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the database path, list length and output format.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the selected mode against the configured database.
fn run(args: Args, config: Config) -> Result<()> {
    let mode = args.mode();

    // Listing the views needs no data
    if mode == RunMode::ListViews {
        for view in View::ALL {
            println!("{}. {}", view.number(), view.label());
        }
        return Ok(());
    }

    let settings = ViewSettings {
        top_n: config.views.top_n,
    };
    let format = config.report.format;
    let show_progress =
        !args.quiet && !(format == OutputFormat::Json && config.report.output.is_none());

    let mut store = open_store(&config.data.database, show_progress)?;

    match mode {
        RunMode::ListOptions => {
            let snapshot = store.current();
            println!("Admin units:");
            for unit in snapshot.admin_units() {
                println!("  {}", unit);
            }
            println!("Species:");
            for name in snapshot.species() {
                println!("  {}", name);
            }
            Ok(())
        }
        RunMode::Interactive => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            Session::new(&mut store, settings, format)
                .with_filters(args.filters())
                .run(stdin.lock(), &mut stdout.lock())
        }
        RunMode::Single(view) => {
            let filters = args.filters();
            for kind in filters.unused_by(view) {
                warn!("--{} has no effect on {}", kind.flag(), view);
            }

            let snapshot = store.current();
            let output = render_with(view, &filters, &snapshot, &settings)
                .with_context(|| format!("Failed to render '{}'", view))?;

            let content = match format {
                OutputFormat::Json => report::generate_json_view(&output)?,
                OutputFormat::Markdown => report::generate_markdown_view(&output),
            };
            emit(&content, config.report.output.as_deref(), args.quiet)
        }
        RunMode::All => {
            let report = build_report(&store, &args, &settings)?;

            let content = match format {
                OutputFormat::Json => report::generate_json_report(&report)?,
                OutputFormat::Markdown => report::generate_markdown_report(&report),
            };
            emit(&content, config.report.output.as_deref(), args.quiet)
        }
        RunMode::InitConfig | RunMode::ListViews => Ok(()),
    }
}

/// Load the snapshot, with a spinner while the database is read.
fn open_store(database: &Path, show_progress: bool) -> Result<SnapshotStore> {
    info!("Loading observations from: {}", database.display());

    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Loading {}", database.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = SnapshotStore::open(database);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let store = result?;
    if store.current().is_empty() {
        warn!("{} has no observations; views will be empty", database.display());
    }

    Ok(store)
}

/// Render every view against the current snapshot.
fn build_report(store: &SnapshotStore, args: &Args, settings: &ViewSettings) -> Result<Report> {
    let start_time = Instant::now();
    let snapshot = store.current();
    let filters = args.filters();

    let views = View::ALL
        .iter()
        .map(|view| {
            render_with(*view, &filters, &snapshot, settings)
                .with_context(|| format!("Failed to render '{}'", view))
        })
        .collect::<Result<Vec<_>>>()?;

    let metadata = ReportMetadata {
        database: snapshot.source().display().to_string(),
        loaded_at: snapshot.loaded_at(),
        generated_at: Utc::now(),
        observations: snapshot.len(),
        species: snapshot.distinct_species_count(),
        admin_units: snapshot.admin_units().len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    info!(
        "Rendered {} views ({} charts) over {} observations in {:.2}s",
        views.len(),
        views.iter().map(|v| v.charts().count()).sum::<usize>(),
        metadata.observations,
        metadata.duration_seconds
    );

    Ok(Report { metadata, views })
}

/// Write to the output file if one is set, otherwise to standard output.
fn emit(content: &str, output: Option<&Path>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            report::write_output(content, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            if !args.quiet {
                eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE, e);
            }
            Ok(Config::default())
        }
    }
}
