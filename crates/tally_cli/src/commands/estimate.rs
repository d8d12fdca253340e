//! Estimate command - Itemized monthly cost of a selection.

use anyhow::Result;
use clap::Args;
use tally_core::compute_costs;
use tracing::info;

use super::input::SelectionArgs;
use super::CommandContext;
use crate::output::{print_json, render_breakdown};

#[derive(Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

pub async fn execute(args: EstimateArgs, ctx: &CommandContext) -> Result<()> {
    let catalog = ctx.settings.load_catalog().await?;
    let selection = args.selection.resolve(&ctx.settings, &catalog).await?;

    let breakdown = compute_costs(&selection, &catalog)?;
    info!(total = breakdown.total, "Estimated monthly cost");

    if ctx.json {
        print_json(&breakdown)?;
    } else {
        print!("{}", render_breakdown(&breakdown));
    }
    Ok(())
}
