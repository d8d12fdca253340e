//! Catalog command - Show, export or validate a pricing catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tally_core::{format_usd, PricingCatalog, ProviderPricing};

use super::CommandContext;
use crate::output::print_json;
use crate::settings::load_catalog_file;

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Show the active catalog
    Show,

    /// Write the built-in catalog to a file to start editing from
    Init {
        /// Output file (.json, .yaml or .yml)
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a catalog file
    Validate {
        path: PathBuf,
    },
}

pub async fn execute(command: CatalogCommand, ctx: &CommandContext) -> Result<()> {
    match command {
        CatalogCommand::Show => {
            let catalog = ctx.settings.load_catalog().await?;
            if ctx.json {
                print_json(&catalog)
            } else {
                print!("{}", render_catalog(&catalog));
                Ok(())
            }
        }
        CatalogCommand::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Invalid argument: {} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            PricingCatalog::default()
                .save_to_file(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Wrote built-in catalog to {}", path.display());
            Ok(())
        }
        CatalogCommand::Validate { path } => {
            let catalog = load_catalog_file(&path)?;
            println!(
                "✅ {} is valid ({} plans, {} providers, {} custom templates)",
                path.display(),
                catalog.base_plans.len(),
                catalog.providers.len(),
                catalog.custom_providers.len()
            );
            Ok(())
        }
    }
}

fn render_catalog(catalog: &PricingCatalog) -> String {
    let mut out = String::from("📋 Base plans\n");
    for (id, plan) in &catalog.base_plans {
        out.push_str(&format!(
            "  {:<14} {:<14} {:>10}/month  ({} users included)\n",
            id,
            plan.name,
            format_usd(plan.monthly_price),
            plan.included_users
        ));
    }
    out.push_str(&format!(
        "  Additional user: {}/month\n",
        format_usd(catalog.additional_user_price)
    ));

    out.push_str("\n🤖 Providers\n");
    for (id, provider) in &catalog.providers {
        out.push_str(&format!("  {} ({}, {})\n", provider.name, id, provider.pricing.kind()));
        match &provider.pricing {
            ProviderPricing::PerModel(pricing) => {
                for (model_id, model) in &pricing.models {
                    out.push_str(&format!(
                        "    {:<14} in ${}/1M  out ${}/1M\n",
                        model_id, model.input_cost_per_1m, model.output_cost_per_1m
                    ));
                }
                for (size, tier) in pricing.embeddings.iter().flatten() {
                    out.push_str(&format!(
                        "    embeddings {:<5} ${}/1M  batch ${}/1M\n",
                        size, tier.standard, tier.batch
                    ));
                }
            }
            ProviderPricing::FlatPlan(pricing) => {
                for (plan_id, plan) in &pricing.plans {
                    out.push_str(&format!(
                        "    {:<14} {}/month\n",
                        plan_id,
                        format_usd(plan.monthly_price)
                    ));
                }
            }
            ProviderPricing::FlatRate(pricing) => {
                out.push_str(&format!(
                    "    in ${} + out ${} per {} tokens\n",
                    pricing.input_cost, pricing.output_cost, pricing.unit
                ));
            }
        }
    }

    if !catalog.custom_providers.is_empty() {
        out.push_str("\n🧩 Custom provider templates\n");
        for provider in &catalog.custom_providers {
            out.push_str(&format!(
                "  {} ({}): {} subscriptions, {} models\n",
                provider.name,
                provider.id,
                provider.subscriptions.len(),
                provider.models.len()
            ));
        }
    }
    out
}
