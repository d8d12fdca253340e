//! Preset command - List presets or apply one to the draft.

use anyhow::{Context, Result};
use clap::Subcommand;
use tally_core::UsageSelection;
use tracing::warn;

use super::CommandContext;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum PresetCommand {
    /// List the presets of the active catalog
    List,

    /// Apply a preset to the cached draft
    Apply {
        /// Preset id
        id: String,

        /// Start from the default selection instead of the draft
        #[arg(long)]
        fresh: bool,
    },
}

pub async fn execute(command: PresetCommand, ctx: &CommandContext) -> Result<()> {
    let catalog = ctx.settings.load_catalog().await?;

    match command {
        PresetCommand::List => {
            if ctx.json {
                return print_json(&catalog.presets);
            }
            if catalog.presets.is_empty() {
                println!("No presets defined.");
            }
            for preset in &catalog.presets {
                println!("📦 {} ({})", preset.name, preset.id);
                if !preset.description.is_empty() {
                    println!("   {}", preset.description);
                }
                println!(
                    "   {} tokens, {} characters, providers: {}",
                    preset.monthly_tokens,
                    preset.monthly_characters,
                    preset.providers.join(", ")
                );
            }
            Ok(())
        }
        PresetCommand::Apply { id, fresh } => {
            let preset = catalog
                .preset(&id)
                .with_context(|| format!("Invalid argument: unknown preset '{}'", id))?;

            let cache = ctx.settings.draft_cache();
            let mut selection = if fresh {
                UsageSelection::default()
            } else {
                cache.load().await?.unwrap_or_default()
            };

            let unresolved = selection.apply_preset(preset, &catalog);
            for reference in &unresolved {
                warn!("Preset reference '{}' is not in the catalog", reference);
            }
            cache.save(&selection).await?;

            if ctx.json {
                return print_json(&selection);
            }
            println!("✅ Applied preset '{}' to the draft", preset.name);
            Ok(())
        }
    }
}
