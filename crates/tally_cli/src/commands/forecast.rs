//! Forecast command - Twelve-month projection, ROI and comparison.

use anyhow::Result;
use clap::Args;
use tally_core::Calculator;

use super::input::SelectionArgs;
use super::CommandContext;
use crate::output::{print_json, render_breakdown, render_equivalents, render_projection};

#[derive(Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Also print the cost breakdown
    #[arg(long)]
    pub breakdown: bool,
}

pub async fn execute(args: ForecastArgs, ctx: &CommandContext) -> Result<()> {
    let catalog = ctx.settings.load_catalog().await?;
    let selection = args.selection.resolve(&ctx.settings, &catalog).await?;

    let estimate = Calculator::new(catalog).estimate(&selection)?;

    if ctx.json {
        return print_json(&estimate);
    }

    if args.breakdown {
        println!("{}", render_breakdown(&estimate.breakdown));
    } else {
        for warning in &estimate.breakdown.warnings {
            println!("⚠️  {}", warning);
        }
    }
    print!("{}", render_projection(&estimate.projection));
    print!("{}", render_equivalents(&estimate.equivalents));
    Ok(())
}
