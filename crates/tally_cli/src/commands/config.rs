//! Config command - Read, replace or reset the stored pricing catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use super::CommandContext;
use crate::output::print_json;
use crate::settings::load_catalog_file;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the stored catalog, or write it to a file
    Get {
        /// Output file (.json, .yaml or .yml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a catalog file and store it
    Set {
        path: PathBuf,
    },

    /// Remove the stored catalog and fall back to the built-in one
    Reset,
}

pub async fn execute(command: ConfigCommand, ctx: &CommandContext) -> Result<()> {
    let owner = ctx.settings.owner()?;
    let store = ctx.settings.config_store();

    match command {
        ConfigCommand::Get { output } => {
            let catalog = store.get_config(owner).await?;
            match output {
                Some(path) => {
                    catalog
                        .save_to_file(&path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✅ Wrote stored catalog to {}", path.display());
                }
                None => print_json(&catalog)?,
            }
        }
        ConfigCommand::Set { path } => {
            let catalog = load_catalog_file(&path)?;
            store.set_config(owner, &catalog).await?;
            println!("✅ Stored catalog from {}", path.display());
        }
        ConfigCommand::Reset => {
            store.reset_config(owner).await?;
            println!("✅ Reset to the built-in catalog");
        }
    }
    Ok(())
}
