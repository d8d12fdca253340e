//! Usage selection: the plan, volumes and providers a user has chosen.
//!
//! A selection is an immutable input to one computation. Hosts keep the
//! in-progress selection themselves and pass it explicitly to the engine.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::{validate_custom_provider, CustomProvider, Preset, PricingCatalog};
use crate::document::{read_document, write_document};
use crate::error::{CoreResult, PricerError};

/// Embedding options of a per-model provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSelection {
    pub enabled: bool,
    /// Embedding tier id, e.g. `small` or `large`
    pub size: String,
    /// Use batch pricing instead of standard
    #[serde(default)]
    pub batch: bool,
}

impl Default for EmbeddingSelection {
    fn default() -> Self {
        Self {
            enabled: false,
            size: "small".to_string(),
            batch: false,
        }
    }
}

/// Selection state of one built-in provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSelection {
    pub enabled: bool,
    /// Model ids for per-model providers, plan ids for flat-plan providers.
    /// Treated as a set: a repeated id is dropped on load and never costed twice.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub selected: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<EmbeddingSelection>,
}

impl ProviderSelection {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_selected<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.clear();
        for id in ids {
            self.select(id);
        }
        self
    }

    pub fn with_embeddings(mut self, size: impl Into<String>, batch: bool) -> Self {
        self.embeddings = Some(EmbeddingSelection {
            enabled: true,
            size: size.into(),
            batch,
        });
        self
    }

    /// Add an id to the selection unless it is already present.
    pub fn select(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected.retain(|s| s != id);
    }

    /// Selected ids in order, each at most once.
    pub fn unique_selected(&self) -> impl Iterator<Item = &str> + '_ {
        let mut seen = BTreeSet::new();
        self.selected
            .iter()
            .map(String::as_str)
            .filter(move |id| seen.insert(*id))
    }
}

fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Vec::<String>::deserialize(deserializer)?;
    let mut seen = BTreeSet::new();
    Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
}

/// A custom provider instance inside a selection.
///
/// Subscriptions and models carry their own `enabled` flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomProviderSelection {
    pub provider: CustomProvider,
    pub enabled: bool,
}

/// Everything the engine needs to cost one month of usage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageSelection {
    pub base_plan_id: String,
    #[serde(default)]
    pub additional_users: u32,
    pub monthly_tokens: f64,
    #[serde(default)]
    pub monthly_characters: f64,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSelection>,
    #[serde(default)]
    pub custom_providers: Vec<CustomProviderSelection>,
}

impl Default for UsageSelection {
    fn default() -> Self {
        let providers = ["openai", "anthropic", "gemini", "elevenlabs"]
            .into_iter()
            .map(|id| (id.to_string(), ProviderSelection::default()))
            .collect();

        Self {
            base_plan_id: "starter".to_string(),
            additional_users: 0,
            monthly_tokens: 1_000_000.0,
            monthly_characters: 100_000.0,
            providers,
            custom_providers: Vec::new(),
        }
    }
}

impl UsageSelection {
    pub fn new(base_plan_id: impl Into<String>) -> Self {
        Self {
            base_plan_id: base_plan_id.into(),
            ..Default::default()
        }
    }

    /// Load a selection from a JSON or YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        read_document(path)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        write_document(path, self)
    }

    pub fn with_users(mut self, additional_users: u32) -> Self {
        self.additional_users = additional_users;
        self
    }

    pub fn with_tokens(mut self, monthly_tokens: f64) -> Self {
        self.monthly_tokens = monthly_tokens;
        self
    }

    pub fn with_characters(mut self, monthly_characters: f64) -> Self {
        self.monthly_characters = monthly_characters;
        self
    }

    pub fn with_provider(mut self, id: impl Into<String>, selection: ProviderSelection) -> Self {
        self.providers.insert(id.into(), selection);
        self
    }

    /// Mutable access to a provider's selection, inserting a disabled one.
    pub fn provider_mut(&mut self, id: &str) -> &mut ProviderSelection {
        self.providers.entry(id.to_string()).or_default()
    }

    /// Enable or disable a provider without touching its item selection.
    pub fn set_provider_enabled(&mut self, id: &str, enabled: bool) {
        self.provider_mut(id).enabled = enabled;
    }

    /// Append a custom provider, enabled.
    pub fn add_custom_provider(&mut self, provider: CustomProvider) {
        self.custom_providers.push(CustomProviderSelection {
            provider,
            enabled: true,
        });
    }

    /// Enable or disable every instance of a custom provider. Returns false if
    /// no instance with that id is present.
    pub fn set_custom_provider_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let mut found = false;
        for entry in self.custom_providers.iter_mut().filter(|c| c.provider.id == id) {
            entry.enabled = enabled;
            found = true;
        }
        found
    }

    /// Check volumes, plan id and custom provider prices. The engine does not
    /// call this; it degrades bad volumes and prices to zero instead.
    pub fn validate(&self) -> CoreResult<()> {
        if self.base_plan_id.trim().is_empty() {
            return Err(PricerError::InvalidSelection(
                "base plan id must not be empty".to_string(),
            ));
        }
        for (field, value) in [
            ("monthlyTokens", self.monthly_tokens),
            ("monthlyCharacters", self.monthly_characters),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PricerError::InvalidSelection(format!(
                    "{} must be a non-negative number, got {}",
                    field, value
                )));
            }
        }
        for entry in &self.custom_providers {
            validate_custom_provider(&entry.provider).map_err(|err| match err {
                PricerError::InvalidCatalog(message) => PricerError::InvalidSelection(message),
                other => other,
            })?;
        }
        Ok(())
    }

    /// Apply a preset: replace the volumes and enable each `provider.item`
    /// reference. References the catalog cannot resolve are returned.
    pub fn apply_preset(&mut self, preset: &Preset, catalog: &PricingCatalog) -> Vec<String> {
        self.monthly_tokens = preset.monthly_tokens;
        self.monthly_characters = preset.monthly_characters;

        let mut unresolved = Vec::new();
        for reference in &preset.providers {
            let (provider_id, item) = match reference.split_once('.') {
                Some((provider_id, item)) => (provider_id, Some(item)),
                None => (reference.as_str(), None),
            };

            if catalog.provider(provider_id).is_none() {
                unresolved.push(reference.clone());
                continue;
            }

            let selection = self.provider_mut(provider_id);
            selection.enabled = true;
            if let Some(item) = item {
                selection.select(item);
            }
        }
        unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection() {
        let selection = UsageSelection::default();
        assert_eq!(selection.base_plan_id, "starter");
        assert_eq!(selection.monthly_tokens, 1_000_000.0);
        assert_eq!(selection.providers.len(), 4);
        assert!(selection.providers.values().all(|p| !p.enabled));
        selection.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_negative_tokens() {
        let selection = UsageSelection::default().with_tokens(-5.0);
        assert!(matches!(
            selection.validate(),
            Err(PricerError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_custom_prices() {
        let mut provider = CustomProvider::perplexity();
        provider.set_model_enabled("llama-8b", true);
        if let Some(model) = provider.models.iter_mut().find(|m| m.id == "llama-8b") {
            model.cost_per_token = Some(-1000.0);
        }
        let mut selection = UsageSelection::default();
        selection.add_custom_provider(provider);

        let err = selection.validate().unwrap_err();
        assert!(matches!(err, PricerError::InvalidSelection(ref m) if m.contains("llama-8b")));

        selection.custom_providers[0].provider.models.retain(|m| m.id != "llama-8b");
        selection.custom_providers[0].provider.subscriptions[0].price = f64::NAN;
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_selected_ids_form_a_set() {
        let selection = ProviderSelection::enabled().with_selected(["gpt4o", "gpt4o", "gpt35"]);
        assert_eq!(selection.selected, vec!["gpt4o", "gpt35"]);

        let loaded: ProviderSelection =
            serde_json::from_str(r#"{"enabled": true, "selected": ["pro", "basic", "pro"]}"#).unwrap();
        assert_eq!(loaded.selected, vec!["pro", "basic"]);

        let mut pushed = ProviderSelection::enabled();
        pushed.selected = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(pushed.unique_selected().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_validate_rejects_empty_plan() {
        let selection = UsageSelection::new("  ");
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut provider = ProviderSelection::enabled();
        provider.select("gpt4o");
        provider.select("gpt4o");
        assert_eq!(provider.selected, vec!["gpt4o"]);
        provider.deselect("gpt4o");
        assert!(provider.selected.is_empty());
    }

    #[test]
    fn test_toggle_keeps_item_selection() {
        let mut selection = UsageSelection::default().with_provider(
            "openai",
            ProviderSelection::enabled().with_selected(["gpt4o"]),
        );
        selection.set_provider_enabled("openai", false);
        selection.set_provider_enabled("openai", true);
        assert_eq!(selection.providers["openai"].selected, vec!["gpt4o"]);
    }

    #[test]
    fn test_apply_preset() {
        let catalog = PricingCatalog::default();
        let preset = catalog.preset("basic-documentation").unwrap();
        let mut selection = UsageSelection::default();

        let unresolved = selection.apply_preset(preset, &catalog);

        assert!(unresolved.is_empty());
        assert_eq!(selection.monthly_tokens, 500_000.0);
        assert_eq!(selection.monthly_characters, 50_000.0);
        assert!(selection.providers["openai"].enabled);
        assert_eq!(selection.providers["openai"].selected, vec!["gpt3-turbo"]);
    }

    #[test]
    fn test_apply_preset_reports_unknown_provider() {
        let catalog = PricingCatalog::default();
        let mut preset = Preset::named("Odd", "");
        preset.providers = vec!["mistral.large".to_string(), "anthropic".to_string()];
        let mut selection = UsageSelection::default();

        let unresolved = selection.apply_preset(&preset, &catalog);

        assert_eq!(unresolved, vec!["mistral.large"]);
        assert!(selection.providers["anthropic"].enabled);
        assert!(!selection.providers.contains_key("mistral"));
    }

    #[test]
    fn test_custom_provider_toggle() {
        let mut selection = UsageSelection::default();
        selection.add_custom_provider(CustomProvider::perplexity());
        assert!(selection.custom_providers[0].enabled);
        assert!(selection.set_custom_provider_enabled("perplexity", false));
        assert!(!selection.custom_providers[0].enabled);
        assert!(!selection.set_custom_provider_enabled("other", true));
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let mut selection = UsageSelection::new("growth")
            .with_users(3)
            .with_tokens(2_500_000.5)
            .with_provider(
                "openai",
                ProviderSelection::enabled()
                    .with_selected(["gpt4o", "gpt4o-mini"])
                    .with_embeddings("large", true),
            );
        selection.add_custom_provider(CustomProvider::perplexity());

        let json = serde_json::to_string(&selection).unwrap();
        let back: UsageSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(selection, back);
    }
}
