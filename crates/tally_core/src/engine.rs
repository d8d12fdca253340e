//! Cost engine.
//!
//! [`compute_costs`] maps a [`UsageSelection`] and a [`PricingCatalog`] to a
//! [`CostBreakdown`]. It is pure: no I/O, no shared state, and identical
//! inputs give bit-identical output.
//!
//! Evaluation order:
//! 1. base plan price (a missing plan is the only fatal error)
//! 2. additional users
//! 3. enabled built-in providers, in selection order
//! 4. enabled custom providers, in selection order
//! 5. total = sum of the above, in the same order

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::breakdown::{CostBreakdown, PlanRef, ProviderCost, StaleSelectionWarning, WarningKind};
use crate::catalog::PricingCatalog;
use crate::error::CoreResult;
use crate::forecast::{project, Projection};
use crate::insights::UsageEquivalents;
use crate::selection::UsageSelection;
use crate::strategy::{is_costable, PricingStrategy, StrategyCost, UsageVolume};

/// Compute the monthly cost breakdown of `selection` priced by `catalog`.
pub fn compute_costs(selection: &UsageSelection, catalog: &PricingCatalog) -> CoreResult<CostBreakdown> {
    let plan = catalog.base_plan(&selection.base_plan_id)?;
    let mut warnings = Vec::new();

    let volume = usage_volume(selection, &mut warnings);

    let additional_users = f64::from(selection.additional_users) * catalog.additional_user_price;

    let mut providers = Vec::new();
    for (provider_id, provider_selection) in &selection.providers {
        if !provider_selection.enabled {
            continue;
        }

        let Some(definition) = catalog.provider(provider_id) else {
            warnings.push(StaleSelectionWarning::new(
                WarningKind::UnknownProvider,
                Some(provider_id.as_str()),
                None,
            ));
            continue;
        };

        let cost = definition.pricing.cost(provider_id, provider_selection, volume);
        debug!(
            provider = %provider_id,
            strategy = definition.pricing.kind(),
            total = cost.total,
            "Costed provider"
        );
        providers.push(into_provider_cost(provider_id, &definition.name, cost, &mut warnings));
    }

    let mut custom_providers = Vec::new();
    for entry in selection.custom_providers.iter().filter(|c| c.enabled) {
        let cost = entry.provider.monthly_cost(volume);
        debug!(provider = %entry.provider.id, total = cost.total, "Costed custom provider");
        custom_providers.push(into_provider_cost(
            &entry.provider.id,
            &entry.provider.name,
            cost,
            &mut warnings,
        ));
    }

    for warning in &warnings {
        warn!(kind = ?warning.kind, "Stale selection: {}", warning);
    }

    let mut breakdown = CostBreakdown {
        base_plan: PlanRef {
            id: selection.base_plan_id.clone(),
            name: plan.name.clone(),
        },
        base_platform: plan.monthly_price,
        additional_user_count: selection.additional_users,
        additional_users,
        providers,
        custom_providers,
        total: 0.0,
        warnings,
    };
    breakdown.total = breakdown.sum_components();

    debug!(
        plan = %breakdown.base_plan.id,
        total = breakdown.total,
        warnings = breakdown.warnings.len(),
        "Computed cost breakdown"
    );

    Ok(breakdown)
}

fn into_provider_cost(
    id: &str,
    name: &str,
    cost: StrategyCost,
    warnings: &mut Vec<StaleSelectionWarning>,
) -> ProviderCost {
    warnings.extend(cost.warnings);
    ProviderCost {
        id: id.to_string(),
        name: name.to_string(),
        total: cost.total,
        items: cost.items,
    }
}

/// Volumes as the engine costs them: negative or non-finite values become zero.
fn usage_volume(selection: &UsageSelection, warnings: &mut Vec<StaleSelectionWarning>) -> UsageVolume {
    UsageVolume {
        tokens: sanitize_volume(selection.monthly_tokens, "monthlyTokens", warnings),
        characters: sanitize_volume(selection.monthly_characters, "monthlyCharacters", warnings),
    }
}

fn sanitize_volume(value: f64, field: &str, warnings: &mut Vec<StaleSelectionWarning>) -> f64 {
    if is_costable(value) {
        value
    } else {
        warnings.push(StaleSelectionWarning::new(WarningKind::InvalidVolume, None, Some(field)));
        0.0
    }
}

/// Everything derived from one selection: costs, projections, equivalents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub breakdown: CostBreakdown,
    pub projection: Projection,
    pub equivalents: UsageEquivalents,
}

/// Convenience wrapper owning a catalog.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    catalog: PricingCatalog,
}

impl Calculator {
    pub fn new(catalog: PricingCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    pub fn compute(&self, selection: &UsageSelection) -> CoreResult<CostBreakdown> {
        compute_costs(selection, &self.catalog)
    }

    /// Cost the selection and derive the forecast, ROI and usage equivalents.
    pub fn estimate(&self, selection: &UsageSelection) -> CoreResult<Estimate> {
        let breakdown = self.compute(selection)?;
        let rules = &self.catalog.business_rules;
        let volume = usage_volume(selection, &mut Vec::new());

        let projection = project(&breakdown, volume.tokens, rules);
        let equivalents = UsageEquivalents::from_volume(volume.tokens, volume.characters, rules);

        Ok(Estimate {
            breakdown,
            projection,
            equivalents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CustomProvider;
    use crate::error::PricerError;
    use crate::selection::ProviderSelection;

    #[test]
    fn test_starter_with_two_users() {
        let catalog = PricingCatalog::default();
        let selection = UsageSelection::new("starter").with_users(2);

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        assert_eq!(breakdown.base_platform, 99.0);
        assert_eq!(breakdown.additional_users, 16.0);
        assert_eq!(breakdown.total, 115.0);
        assert!(breakdown.providers.is_empty());
        assert!(!breakdown.has_warnings());
    }

    #[test]
    fn test_unknown_base_plan_fails() {
        let catalog = PricingCatalog::default();
        let selection = UsageSelection::new("platinum");
        let err = compute_costs(&selection, &catalog).unwrap_err();
        assert!(matches!(err, PricerError::Configuration(_)));
    }

    #[test]
    fn test_disabled_provider_is_omitted() {
        let catalog = PricingCatalog::default();
        let mut selection = UsageSelection::default()
            .with_provider("openai", ProviderSelection::enabled().with_selected(["gpt4o"]));
        selection.set_provider_enabled("openai", false);

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        assert!(breakdown.provider("openai").is_none());
        assert_eq!(breakdown.total, 99.0);
    }

    #[test]
    fn test_enabled_provider_with_nothing_selected_is_listed() {
        let catalog = PricingCatalog::default();
        let selection = UsageSelection::default().with_provider("gemini", ProviderSelection::enabled());

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        let gemini = breakdown.provider("gemini").unwrap();
        assert_eq!(gemini.total, 0.0);
        assert_eq!(gemini.name, "Google Gemini");
    }

    #[test]
    fn test_unknown_provider_is_warned_and_omitted() {
        let catalog = PricingCatalog::default();
        let selection = UsageSelection::default().with_provider("mistral", ProviderSelection::enabled());

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        assert!(breakdown.provider("mistral").is_none());
        assert_eq!(breakdown.warnings.len(), 1);
        assert_eq!(breakdown.warnings[0].kind, WarningKind::UnknownProvider);
        assert_eq!(breakdown.total, 99.0);
    }

    #[test]
    fn test_invalid_volume_costs_as_zero() {
        let catalog = PricingCatalog::default();
        let selection = UsageSelection::default()
            .with_tokens(f64::NAN)
            .with_provider("anthropic", ProviderSelection::enabled());

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        assert_eq!(breakdown.provider("anthropic").unwrap().total, 0.0);
        assert_eq!(breakdown.warnings[0].kind, WarningKind::InvalidVolume);
        assert!(breakdown.total.is_finite());
    }

    #[test]
    fn test_amounts_stay_non_negative_with_bad_custom_prices() {
        let catalog = PricingCatalog::default();
        let mut provider = CustomProvider::perplexity();
        provider.set_model_enabled("llama-8b", true);
        provider.set_subscription_enabled("pro-monthly", true);
        if let Some(model) = provider.models.iter_mut().find(|m| m.id == "llama-8b") {
            model.cost_per_token = Some(-1000.0);
        }
        let mut selection = UsageSelection::default();
        selection.add_custom_provider(provider);

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        assert!(breakdown.components().all(|amount| amount.is_finite() && amount >= 0.0));
        assert!(breakdown
            .custom_providers
            .iter()
            .flat_map(|c| &c.items)
            .all(|item| item.amount >= 0.0));
        assert_eq!(breakdown.total, 99.0 + 20.0);
        assert_eq!(breakdown.warnings.len(), 1);
        assert_eq!(breakdown.warnings[0].kind, WarningKind::InvalidPrice);
    }

    #[test]
    fn test_repeated_model_id_is_costed_once() {
        let catalog = PricingCatalog::default();
        let mut selection = UsageSelection::new("starter")
            .with_provider("openai", ProviderSelection::enabled().with_selected(["gpt4o"]));
        let once = compute_costs(&selection, &catalog).unwrap().total;

        selection.provider_mut("openai").selected.push("gpt4o".to_string());
        let twice = compute_costs(&selection, &catalog).unwrap().total;

        assert_eq!(once, 99.0 + 18.75);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_custom_provider_in_selection_order() {
        let catalog = PricingCatalog::default();
        let mut first = CustomProvider::perplexity();
        first.set_subscription_enabled("pro-monthly", true);
        let mut second = CustomProvider::perplexity();
        second.id = "perplexity-team".to_string();
        second.set_subscription_enabled("pro-yearly", true);

        let mut selection = UsageSelection::default();
        selection.add_custom_provider(first);
        selection.add_custom_provider(second);

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        let ids: Vec<&str> = breakdown.custom_providers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["perplexity", "perplexity-team"]);
        assert_eq!(breakdown.total, 99.0 + 20.0 + 200.0);
    }

    #[test]
    fn test_disabled_custom_provider_is_omitted() {
        let catalog = PricingCatalog::default();
        let mut provider = CustomProvider::perplexity();
        provider.set_subscription_enabled("pro-monthly", true);
        let mut selection = UsageSelection::default();
        selection.add_custom_provider(provider);
        selection.set_custom_provider_enabled("perplexity", false);

        let breakdown = compute_costs(&selection, &catalog).unwrap();

        assert!(breakdown.custom_providers.is_empty());
        assert_eq!(breakdown.total, 99.0);
    }

    #[test]
    fn test_calculator_estimate() {
        let calculator = Calculator::default();
        let selection = UsageSelection::new("growth")
            .with_provider("openai", ProviderSelection::enabled().with_selected(["gpt4o"]));

        let estimate = calculator.estimate(&selection).unwrap();

        assert_eq!(estimate.breakdown.total, 149.0 + 18.75);
        assert_eq!(estimate.projection.forecast.len(), 12);
        assert_eq!(estimate.equivalents.words, 750_000);
    }
}
