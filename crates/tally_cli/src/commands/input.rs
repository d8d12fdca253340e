//! Selection input shared by commands that cost a selection.
//!
//! A selection starts from a file, the cached draft, or the defaults, in that
//! order. A preset and the individual flags are then applied on top.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tally_core::{PricingCatalog, UsageSelection};
use tracing::{debug, warn};

use crate::settings::Settings;

#[derive(Args, Debug, Default, Clone)]
pub struct SelectionArgs {
    /// Selection file (JSON or YAML); defaults to the cached draft
    #[arg(short, long)]
    pub selection: Option<PathBuf>,

    /// Ignore the cached draft and start from the defaults
    #[arg(long, conflicts_with = "selection")]
    pub fresh: bool,

    /// Apply a preset from the catalog
    #[arg(long)]
    pub preset: Option<String>,

    /// Base plan id
    #[arg(long)]
    pub plan: Option<String>,

    /// Additional users beyond those included in the plan
    #[arg(long)]
    pub users: Option<u32>,

    /// Monthly tokens
    #[arg(long)]
    pub tokens: Option<f64>,

    /// Monthly voice characters
    #[arg(long)]
    pub characters: Option<f64>,

    /// Enable a provider, optionally selecting a model or plan (`openai.gpt4o`)
    #[arg(short, long = "provider", value_name = "PROVIDER[.ITEM]")]
    pub providers: Vec<String>,

    /// Disable a provider, keeping its item selection
    #[arg(long = "disable", value_name = "PROVIDER")]
    pub disabled: Vec<String>,

    /// Enable embeddings for a per-model provider (`openai.small`)
    #[arg(long, value_name = "PROVIDER.SIZE")]
    pub embeddings: Option<String>,

    /// Use batch embedding prices
    #[arg(long, requires = "embeddings")]
    pub batch: bool,

    /// Add a custom provider template, optionally enabling a subscription or
    /// model (`perplexity.pro-monthly`)
    #[arg(long = "custom", value_name = "TEMPLATE[.ITEM]")]
    pub custom: Vec<String>,

    /// Store the resulting selection as the draft
    #[arg(long)]
    pub save_draft: bool,
}

impl SelectionArgs {
    /// Build the selection these flags describe.
    pub async fn resolve(&self, settings: &Settings, catalog: &PricingCatalog) -> Result<UsageSelection> {
        let mut selection = self.base(settings).await?;

        if let Some(id) = &self.preset {
            let preset = catalog
                .preset(id)
                .with_context(|| format!("Unknown preset '{}'", id))?;
            for reference in selection.apply_preset(preset, catalog) {
                warn!("Preset reference '{}' is not in the catalog", reference);
            }
        }

        self.apply_flags(&mut selection, catalog)?;
        selection.validate()?;

        if self.save_draft {
            settings.draft_cache().save(&selection).await?;
            debug!("Saved draft selection");
        }

        Ok(selection)
    }

    async fn base(&self, settings: &Settings) -> Result<UsageSelection> {
        if let Some(path) = &self.selection {
            return UsageSelection::from_file(path)
                .with_context(|| format!("Failed to read selection from {}", path.display()));
        }
        if !self.fresh {
            if let Some(draft) = settings.draft_cache().load().await? {
                debug!("Starting from the cached draft");
                return Ok(draft);
            }
        }
        Ok(UsageSelection::default())
    }

    fn apply_flags(&self, selection: &mut UsageSelection, catalog: &PricingCatalog) -> Result<()> {
        if let Some(plan) = &self.plan {
            selection.base_plan_id = plan.clone();
        }
        if let Some(users) = self.users {
            selection.additional_users = users;
        }
        if let Some(tokens) = self.tokens {
            selection.monthly_tokens = tokens;
        }
        if let Some(characters) = self.characters {
            selection.monthly_characters = characters;
        }

        for reference in &self.providers {
            let (provider_id, item) = split_reference(reference);
            let provider = selection.provider_mut(provider_id);
            provider.enabled = true;
            if let Some(item) = item {
                provider.select(item);
            }
        }

        for provider_id in &self.disabled {
            selection.set_provider_enabled(provider_id, false);
        }

        if let Some(reference) = &self.embeddings {
            let (provider_id, size) = split_reference(reference);
            let Some(size) = size else {
                bail!("Invalid argument --embeddings '{}': expected PROVIDER.SIZE", reference);
            };
            let provider = selection.provider_mut(provider_id);
            provider.enabled = true;
            provider.embeddings = Some(tally_core::EmbeddingSelection {
                enabled: true,
                size: size.to_string(),
                batch: self.batch,
            });
        }

        for reference in &self.custom {
            let (template_id, item) = split_reference(reference);
            add_custom(selection, catalog, template_id, item)?;
        }

        Ok(())
    }
}

/// Split `provider.item` at the first dot.
pub fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('.') {
        Some((provider, item)) => (provider, Some(item)),
        None => (reference, None),
    }
}

fn add_custom(
    selection: &mut UsageSelection,
    catalog: &PricingCatalog,
    template_id: &str,
    item: Option<&str>,
) -> Result<()> {
    let existing = selection
        .custom_providers
        .iter()
        .position(|c| c.provider.id == template_id);

    let index = match existing {
        Some(index) => index,
        None => {
            let template = catalog
                .custom_provider_template(template_id)
                .with_context(|| format!("Unknown custom provider template '{}'", template_id))?;
            selection.add_custom_provider(template.clone());
            selection.custom_providers.len() - 1
        }
    };

    let entry = &mut selection.custom_providers[index];
    entry.enabled = true;
    if let Some(item) = item {
        let provider = &mut entry.provider;
        if !provider.set_subscription_enabled(item, true) && !provider.set_model_enabled(item, true) {
            bail!(
                "Invalid argument --custom: '{}' offers no subscription or model '{}'",
                template_id,
                item
            );
        }
    }
    Ok(())
}
