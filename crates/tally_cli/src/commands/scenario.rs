//! Scenario command - Save, list, update and delete named scenarios.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Subcommand;
use tally_core::{compute_costs, UsageSelection};
use tally_store::{Scenario, ScenarioPatch, ScenarioRepository};

use super::input::SelectionArgs;
use super::CommandContext;
use crate::output::{print_json, render_breakdown};

#[derive(Subcommand)]
pub enum ScenarioCommand {
    /// List your scenarios, most recently updated first
    List,

    /// Save the current selection as a new scenario
    Save {
        /// Scenario name
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Show a scenario and its current cost
    Show {
        id: String,
    },

    /// Update a scenario's name, description, sharing or selection
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Share with every signed-in user
        #[arg(long)]
        shared: Option<bool>,

        /// Replace the stored selection with this file
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },

    /// Delete a scenario
    Delete {
        id: String,
    },

    /// Copy a scenario's selection into the draft
    Load {
        id: String,
    },
}

pub async fn execute(command: ScenarioCommand, ctx: &CommandContext) -> Result<()> {
    let owner = ctx.settings.owner()?;
    let store = ctx.settings.scenarios();

    match command {
        ScenarioCommand::List => {
            let scenarios = store.list(owner).await?;
            if ctx.json {
                return print_json(&scenarios);
            }
            if scenarios.is_empty() {
                println!("No saved scenarios.");
            }
            for scenario in &scenarios {
                print_summary(scenario);
            }
        }
        ScenarioCommand::Save {
            name,
            description,
            selection,
        } => {
            let catalog = ctx.settings.load_catalog().await?;
            let state = selection.resolve(&ctx.settings, &catalog).await?;
            let scenario = store
                .save(owner, &name, &state, description.as_deref())
                .await?;
            if ctx.json {
                return print_json(&scenario);
            }
            println!("✅ Saved scenario '{}' ({})", scenario.name, scenario.id);
        }
        ScenarioCommand::Show { id } => {
            let scenario = store.get(owner, &id).await?;
            let catalog = ctx.settings.load_catalog().await?;
            let breakdown = compute_costs(&scenario.state, &catalog)?;
            if ctx.json {
                return print_json(&serde_json::json!({
                    "scenario": scenario,
                    "breakdown": breakdown,
                }));
            }
            print_summary(&scenario);
            if let Some(description) = &scenario.description {
                println!("   {}", description);
            }
            print!("{}", render_breakdown(&breakdown));
        }
        ScenarioCommand::Update {
            id,
            name,
            description,
            shared,
            state,
        } => {
            let state = state
                .map(|path| {
                    UsageSelection::from_file(&path)
                        .with_context(|| format!("Failed to read selection from {}", path.display()))
                })
                .transpose()?;
            let patch = ScenarioPatch {
                name,
                description,
                state,
                shared,
            };
            if patch.is_empty() {
                anyhow::bail!("Invalid arguments: nothing to update");
            }
            let scenario = store.update(owner, &id, patch).await?;
            if ctx.json {
                return print_json(&scenario);
            }
            println!("✅ Updated scenario '{}'", scenario.name);
        }
        ScenarioCommand::Delete { id } => {
            store.delete(owner, &id).await?;
            println!("🗑️  Deleted scenario {}", id);
        }
        ScenarioCommand::Load { id } => {
            let scenario = store.get(owner, &id).await?;
            ctx.settings.draft_cache().save(&scenario.state).await?;
            println!("✅ Loaded '{}' into the draft", scenario.name);
        }
    }
    Ok(())
}

fn print_summary(scenario: &Scenario) {
    let updated = scenario.updated_at.with_timezone(&Local);
    let shared = if scenario.shared { " [shared]" } else { "" };
    println!(
        "📄 {} ({}){} - {} plan, {} tokens, updated {}",
        scenario.name,
        scenario.id,
        shared,
        scenario.state.base_plan_id,
        scenario.state.monthly_tokens,
        updated.format("%Y-%m-%d %H:%M")
    );
}
