//! Draft command - Show or clear the cached draft selection.

use anyhow::Result;
use clap::Subcommand;

use super::CommandContext;
use crate::output::print_json;

#[derive(Subcommand)]
pub enum DraftCommand {
    /// Print the cached draft as JSON
    Show,

    /// Delete the cached draft
    Clear,
}

pub async fn execute(command: DraftCommand, ctx: &CommandContext) -> Result<()> {
    let cache = ctx.settings.draft_cache();

    match command {
        DraftCommand::Show => match cache.load().await? {
            Some(selection) => print_json(&selection)?,
            None => println!("No draft saved at {}", cache.path().display()),
        },
        DraftCommand::Clear => {
            cache.clear().await?;
            println!("✅ Draft cleared");
        }
    }
    Ok(())
}
