//! CLI command definitions.
//!
//! Each subcommand lives in its own module with an `Args` struct and an
//! `execute` function.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::settings::Settings;

pub mod catalog;
pub mod config;
pub mod draft;
pub mod estimate;
pub mod forecast;
pub mod input;
pub mod preset;
pub mod scenario;

/// Tally - AI usage cost calculator
#[derive(Parser)]
#[command(name = "tally")]
#[command(version, about = "Tally - AI usage cost calculator")]
#[command(long_about = r#"
Tally estimates the monthly cost of AI services: a base platform plan,
additional users, built-in providers (OpenAI, Anthropic, Gemini, ElevenLabs)
and custom providers, plus a 12-month forecast and ROI projection.

COMMANDS:
  estimate  → Itemized monthly cost of a selection
  forecast  → 12-month forecast, ROI and traditional comparison
  catalog   → Show, export or validate a pricing catalog
  preset    → List presets or apply one to the draft
  scenario  → Save, list, update and delete named scenarios
  config    → Read, replace or reset the stored catalog
  draft     → Show or clear the cached draft selection

ENVIRONMENT:
  TALLY_DATA_DIR  Data directory (default: .tally)
  TALLY_USER      Signed-in user for scenario and config commands
  TALLY_CATALOG   Catalog file overriding the stored catalog
  RUST_LOG        Log filter

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or not signed in
  3 - Configuration error
  4 - Persistence error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory for scenarios, config and the draft
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Signed-in user
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Pricing catalog file (JSON or YAML)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the itemized monthly cost of a selection
    Estimate(estimate::EstimateArgs),

    /// Project costs, ROI and savings over twelve months
    Forecast(forecast::ForecastArgs),

    /// Inspect or export a pricing catalog
    #[command(subcommand)]
    Catalog(catalog::CatalogCommand),

    /// List or apply presets
    #[command(subcommand)]
    Preset(preset::PresetCommand),

    /// Manage saved scenarios
    #[command(subcommand)]
    Scenario(scenario::ScenarioCommand),

    /// Manage the stored pricing catalog
    #[command(subcommand)]
    Config(config::ConfigCommand),

    /// Show or clear the cached draft selection
    #[command(subcommand)]
    Draft(draft::DraftCommand),
}

/// Resolved state shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub settings: Settings,
    /// Print machine-readable JSON instead of text
    pub json: bool,
}

impl CommandContext {
    pub fn new(global: &GlobalArgs) -> Self {
        Self {
            settings: Settings::from_env().with_overrides(global),
            json: global.json,
        }
    }
}
