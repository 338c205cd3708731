//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::views::{Filters, View};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Birdscope - descriptive dashboard over bird observation records
///
/// Loads the `observations` table of a local SQLite database once and
/// renders the seven analysis views as Markdown or JSON chart specs.
///
/// Examples:
///   birdscope --database bird_observations.db
///   birdscope --view "Temporal Analysis" --admin-unit ANTI --species "Vireo olivaceus"
///   birdscope --view 5 --admin-unit CATO --format json -o environment.json
///   birdscope --interactive
///   birdscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// SQLite database holding the `observations` table
    ///
    /// Defaults to the config file value, then bird_observations.db.
    #[arg(short, long, value_name = "FILE", env = "BIRDSCOPE_DB")]
    pub database: Option<PathBuf>,

    /// Render a single view (label, slug, or number 1-7)
    ///
    /// Example: --view "Spatial Analysis", --view spatial, --view 3
    #[arg(long, value_name = "VIEW", value_parser = parse_view)]
    pub view: Option<View>,

    /// Render all seven views into one report (the default)
    #[arg(long)]
    pub all: bool,

    /// Start an interactive session with a sidebar menu
    #[arg(short, long)]
    pub interactive: bool,

    /// Admin unit selection for Temporal Analysis and Environmental Conditions
    #[arg(long, value_name = "UNIT")]
    pub admin_unit: Option<String>,

    /// Species selection for Temporal Analysis
    #[arg(long, value_name = "NAME")]
    pub species: Option<String>,

    /// Length of the "top N" and "least N" lists
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path; prints to standard output when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the view labels in menu order and exit
    #[arg(long)]
    pub list_views: bool,

    /// Print the admin unit and species filter options and exit
    #[arg(long)]
    pub list_options: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .birdscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .birdscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for rendered views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON chart descriptions
    Json,
}

/// What a run of the program does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    InitConfig,
    ListViews,
    ListOptions,
    Interactive,
    Single(View),
    All,
}

/// Upper bound accepted for `--top`.
const MAX_TOP: usize = 100;

fn parse_view(s: &str) -> Result<View, String> {
    s.parse::<View>().map_err(|e| e.to_string())
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(top) = self.top {
            if top == 0 || top > MAX_TOP {
                return Err(format!("--top must be between 1 and {}", MAX_TOP));
            }
        }

        if self.view.is_some() && self.all {
            return Err("Cannot use both --view and --all".to_string());
        }

        if self.interactive {
            if self.output.is_some() {
                return Err("--output cannot be used with --interactive".to_string());
            }
            if self.all || self.view.is_some() {
                return Err("--interactive cannot be combined with --view or --all".to_string());
            }
        }

        if self.list_views && self.list_options {
            return Err("Use only one of --list-views and --list-options".to_string());
        }

        Ok(())
    }

    /// Decide what to run. Listing flags win over rendering.
    pub fn mode(&self) -> RunMode {
        if self.init_config {
            RunMode::InitConfig
        } else if self.list_views {
            RunMode::ListViews
        } else if self.list_options {
            RunMode::ListOptions
        } else if self.interactive {
            RunMode::Interactive
        } else if let Some(view) = self.view {
            RunMode::Single(view)
        } else {
            RunMode::All
        }
    }

    /// Filter selections given on the command line.
    pub fn filters(&self) -> Filters {
        Filters {
            admin_unit: self.admin_unit.clone(),
            species: self.species.clone(),
        }
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over a config file that asks for verbose output.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
