//! Tally CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or not signed in
//! - 3: Configuration error
//! - 4: Persistence error

use std::process::ExitCode;

use clap::Parser;
use tally_core::PricerError;
use tally_store::StoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;
mod settings;

use commands::{Cli, CommandContext, Commands, GlobalArgs};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIGURATION_ERROR: u8 = 3;
    pub const PERSISTENCE_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global);

    let ctx = CommandContext::new(&cli.global);

    let result = match cli.command {
        Commands::Estimate(args) => commands::estimate::execute(args, &ctx).await,
        Commands::Forecast(args) => commands::forecast::execute(args, &ctx).await,
        Commands::Catalog(command) => commands::catalog::execute(command, &ctx).await,
        Commands::Preset(command) => commands::preset::execute(command, &ctx).await,
        Commands::Scenario(command) => commands::scenario::execute(command, &ctx).await,
        Commands::Config(command) => commands::config::execute(command, &ctx).await,
        Commands::Draft(command) => commands::draft::execute(command, &ctx).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging(global: &GlobalArgs) {
    let level = if global.verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in ["tally", "tally_core", "tally_store"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }
    if let Ok(directive) = "warn".parse() {
        filter = filter.add_directive(directive);
    }

    let json_layer = global
        .log_json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!global.log_json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(filter)
        .try_init();
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<StoreError>() {
            return match err {
                StoreError::Authorization | StoreError::Validation(_) => ExitCodes::INVALID_ARGS,
                StoreError::Persistence(_) => ExitCodes::PERSISTENCE_ERROR,
                StoreError::Pricing(err) => categorize_pricing(err),
            };
        }
        if let Some(err) = cause.downcast_ref::<PricerError>() {
            return categorize_pricing(err);
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("unknown") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

fn categorize_pricing(err: &PricerError) -> u8 {
    match err {
        PricerError::InvalidSelection(_) => ExitCodes::INVALID_ARGS,
        _ if err.is_configuration() => ExitCodes::CONFIGURATION_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_store_errors() {
        let auth = anyhow::Error::new(StoreError::Authorization).context("Pass --user");
        assert_eq!(categorize_error(&auth), ExitCodes::INVALID_ARGS);

        let missing = anyhow::Error::new(StoreError::not_found("scenarios", "x"));
        assert_eq!(categorize_error(&missing), ExitCodes::PERSISTENCE_ERROR);
    }

    #[test]
    fn test_categorize_pricing_errors() {
        let plan = anyhow::Error::new(PricerError::Configuration("no plan".to_string()));
        assert_eq!(categorize_error(&plan), ExitCodes::CONFIGURATION_ERROR);

        let wrapped = anyhow::Error::new(StoreError::Pricing(PricerError::InvalidCatalog(
            "bad".to_string(),
        )));
        assert_eq!(categorize_error(&wrapped), ExitCodes::CONFIGURATION_ERROR);

        let selection = anyhow::Error::new(PricerError::InvalidSelection("bad".to_string()));
        assert_eq!(categorize_error(&selection), ExitCodes::INVALID_ARGS);
    }

    #[test]
    fn test_categorize_file_errors_through_context() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Err::<(), _>(PricerError::Io(io))
            .context("Failed to load catalog")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }

    #[test]
    fn test_categorize_plain_messages() {
        let err = anyhow::anyhow!("Invalid argument: nothing to update");
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);
        assert_eq!(categorize_error(&anyhow::anyhow!("boom")), ExitCodes::GENERAL_ERROR);
    }

    #[test]
    fn test_init_logging_twice_keeps_first_subscriber() {
        let cli = Cli::parse_from(["tally", "--log-json", "draft", "show"]);
        init_logging(&cli.global);
        init_logging(&cli.global);
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::parse_from([
            "tally", "--json", "estimate", "--plan", "growth", "-p", "openai.gpt4o", "--users", "2",
        ]);
        assert!(cli.global.json);
        assert!(matches!(cli.command, Commands::Estimate(_)));
    }
}
