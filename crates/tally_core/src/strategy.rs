//! Pricing strategies.
//!
//! Every built-in provider is priced by one variant of
//! [`ProviderPricing`]; each variant implements [`PricingStrategy`]. Custom
//! providers carry their own subscription and API pricing and are costed by
//! [`CustomProvider::monthly_cost`].
//!
//! Strategies never fail. An id the price table does not know contributes
//! zero and yields a [`StaleSelectionWarning`].

use crate::breakdown::{LineItem, StaleSelectionWarning, WarningKind};
use crate::catalog::{
    CustomProvider, FlatPlanPricing, FlatRatePricing, PerModelPricing, ProviderPricing, Unit,
};
use crate::selection::ProviderSelection;

const PER_MILLION: f64 = 1_000_000.0;

/// Whether a price or volume can enter a total: finite and non-negative.
pub(crate) fn is_costable(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Monthly usage volumes, already sanitized to finite non-negative values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageVolume {
    pub tokens: f64,
    pub characters: f64,
}

/// Result of costing one provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyCost {
    pub total: f64,
    pub items: Vec<LineItem>,
    pub warnings: Vec<StaleSelectionWarning>,
}

impl StrategyCost {
    fn push(&mut self, label: impl Into<String>, amount: f64) {
        self.total += amount;
        self.items.push(LineItem::new(label, amount));
    }

    fn warn(&mut self, kind: WarningKind, provider: &str, item: &str) {
        self.warnings
            .push(StaleSelectionWarning::new(kind, Some(provider), Some(item)));
    }
}

/// Cost computation shared by every built-in pricing shape.
pub trait PricingStrategy {
    /// Cost one month of `volume` for the items chosen in `selection`.
    fn cost(&self, provider_id: &str, selection: &ProviderSelection, volume: UsageVolume) -> StrategyCost;
}

impl PricingStrategy for PerModelPricing {
    fn cost(&self, provider_id: &str, selection: &ProviderSelection, volume: UsageVolume) -> StrategyCost {
        let mut result = StrategyCost::default();
        let tokens = volume.tokens;

        for model_id in selection.unique_selected() {
            match self.models.get(model_id) {
                Some(model) => {
                    let cost = (model.input_cost_per_1m * tokens + model.output_cost_per_1m * tokens)
                        / PER_MILLION;
                    result.push(&model.name, cost);
                }
                None => result.warn(WarningKind::UnknownModel, provider_id, model_id),
            }
        }

        if let Some(embeddings) = selection.embeddings.as_ref().filter(|e| e.enabled) {
            match self.embeddings.as_ref().and_then(|tiers| tiers.get(&embeddings.size)) {
                Some(tier) => {
                    let price = if embeddings.batch { tier.batch } else { tier.standard };
                    let label = if embeddings.batch {
                        format!("{} Embeddings (Batch)", tier.name)
                    } else {
                        format!("{} Embeddings", tier.name)
                    };
                    result.push(label, price * tokens / PER_MILLION);
                }
                None => result.warn(WarningKind::UnknownEmbedding, provider_id, &embeddings.size),
            }
        }

        result
    }
}

impl PricingStrategy for FlatPlanPricing {
    fn cost(&self, provider_id: &str, selection: &ProviderSelection, _volume: UsageVolume) -> StrategyCost {
        let mut result = StrategyCost::default();
        for plan_id in selection.unique_selected() {
            match self.plans.get(plan_id) {
                Some(plan) => result.push(&plan.name, plan.monthly_price),
                None => result.warn(WarningKind::UnknownPlan, provider_id, plan_id),
            }
        }
        result
    }
}

impl PricingStrategy for FlatRatePricing {
    fn cost(&self, _provider_id: &str, _selection: &ProviderSelection, volume: UsageVolume) -> StrategyCost {
        // The divisor is whatever unit the definition declares; the built-in
        // Anthropic entry is quoted per thousand tokens.
        let mut result = StrategyCost::default();
        let cost = (self.input_cost + self.output_cost) * volume.tokens / self.unit.divisor();
        result.push(format!("Input + output per {}", self.unit), cost);
        result
    }
}

impl PricingStrategy for ProviderPricing {
    fn cost(&self, provider_id: &str, selection: &ProviderSelection, volume: UsageVolume) -> StrategyCost {
        match self {
            ProviderPricing::PerModel(pricing) => pricing.cost(provider_id, selection, volume),
            ProviderPricing::FlatPlan(pricing) => pricing.cost(provider_id, selection, volume),
            ProviderPricing::FlatRate(pricing) => pricing.cost(provider_id, selection, volume),
        }
    }
}

impl CustomProvider {
    /// Cost one month of `volume` against the enabled subscriptions and
    /// models of this provider.
    ///
    /// Every enabled subscription is added; nothing assumes at most one.
    /// A negative or non-finite price costs zero and yields a warning.
    pub fn monthly_cost(&self, volume: UsageVolume) -> StrategyCost {
        let mut result = StrategyCost::default();

        if self.has_subscription {
            for sub in self.subscriptions.iter().filter(|s| s.enabled) {
                if is_costable(sub.price) {
                    result.push(&sub.name, sub.price);
                } else {
                    result.warn(WarningKind::InvalidPrice, &self.id, &sub.id);
                }
            }
        }

        for model in self.models.iter().filter(|m| m.enabled) {
            let rates = [
                (model.cost_per_request, model.request_unit),
                (model.cost_per_token, model.token_unit),
            ];
            if rates
                .iter()
                .any(|(cost, _)| cost.is_some_and(|c| !is_costable(c)))
            {
                result.warn(WarningKind::InvalidPrice, &self.id, &model.id);
                continue;
            }

            let cost = rates
                .iter()
                .filter_map(|(cost, unit)| {
                    cost.map(|c| c * volume.tokens / unit.unwrap_or(Unit::One).divisor())
                })
                .fold(0.0, |total, part| total + part);
            result.push(&model.name, cost);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CustomModel, PricingCatalog, TokenModel};
    use std::collections::BTreeMap;

    fn volume(tokens: f64) -> UsageVolume {
        UsageVolume {
            tokens,
            characters: 0.0,
        }
    }

    fn openai() -> ProviderPricing {
        PricingCatalog::default().providers["openai"].pricing.clone()
    }

    #[test]
    fn test_per_model_gpt4o_one_million_tokens() {
        let selection = ProviderSelection::enabled().with_selected(["gpt4o"]);
        let cost = openai().cost("openai", &selection, volume(1_000_000.0));
        assert_eq!(cost.total, 18.75);
        assert_eq!(cost.items, vec![LineItem::new("GPT-4o", 18.75)]);
        assert!(cost.warnings.is_empty());
    }

    #[test]
    fn test_training_cost_is_not_recurring() {
        let mut pricing = PerModelPricing::default();
        pricing.models.insert(
            "tuned".to_string(),
            TokenModel::new("Tuned", 1.0, 2.0).with_training(1_000.0),
        );
        let selection = ProviderSelection::enabled().with_selected(["tuned"]);
        let cost = pricing.cost("p", &selection, volume(1_000_000.0));
        assert_eq!(cost.total, 3.0);
    }

    #[test]
    fn test_unknown_model_is_zero_with_warning() {
        let selection = ProviderSelection::enabled().with_selected(["gpt4o", "gpt-9"]);
        let cost = openai().cost("openai", &selection, volume(1_000_000.0));
        assert_eq!(cost.total, 18.75);
        assert_eq!(cost.items.len(), 1);
        assert_eq!(cost.warnings.len(), 1);
        assert_eq!(cost.warnings[0].kind, WarningKind::UnknownModel);
        assert_eq!(cost.warnings[0].item.as_deref(), Some("gpt-9"));
    }

    #[test]
    fn test_embeddings_batch_and_standard() {
        let standard = ProviderSelection::enabled().with_embeddings("large", false);
        let batch = ProviderSelection::enabled().with_embeddings("large", true);

        let standard_cost = openai().cost("openai", &standard, volume(2_000_000.0));
        let batch_cost = openai().cost("openai", &batch, volume(2_000_000.0));

        assert!((standard_cost.total - 0.26).abs() < 1e-12);
        assert!((batch_cost.total - 0.13).abs() < 1e-12);
        assert_eq!(standard_cost.items[0].label, "Large Embeddings");
        assert_eq!(batch_cost.items[0].label, "Large Embeddings (Batch)");
    }

    #[test]
    fn test_embeddings_disabled_contribute_nothing() {
        let mut selection = ProviderSelection::enabled().with_embeddings("small", false);
        selection.embeddings.as_mut().unwrap().enabled = false;
        let cost = openai().cost("openai", &selection, volume(1_000_000.0));
        assert_eq!(cost.total, 0.0);
        assert!(cost.items.is_empty());
    }

    #[test]
    fn test_embeddings_not_offered_warns() {
        let gemini = PricingCatalog::default().providers["gemini"].pricing.clone();
        let selection = ProviderSelection::enabled()
            .with_selected(["flash"])
            .with_embeddings("small", false);
        let cost = gemini.cost("gemini", &selection, volume(1_000_000.0));
        assert_eq!(cost.total, 0.35);
        assert_eq!(cost.warnings[0].kind, WarningKind::UnknownEmbedding);
    }

    #[test]
    fn test_flat_plan_sums_selected_plans() {
        let elevenlabs = PricingCatalog::default().providers["elevenlabs"].pricing.clone();
        let selection = ProviderSelection::enabled().with_selected(["basic", "pro", "studio"]);
        let cost = elevenlabs.cost("elevenlabs", &selection, volume(0.0));
        assert_eq!(cost.total, 121.0);
        assert_eq!(cost.warnings.len(), 1);
        assert_eq!(cost.warnings[0].kind, WarningKind::UnknownPlan);
    }

    #[test]
    fn test_flat_rate_uses_per_thousand_divisor() {
        let anthropic = PricingCatalog::default().providers["anthropic"].pricing.clone();
        let cost = anthropic.cost("anthropic", &ProviderSelection::enabled(), volume(1_000.0));
        assert!((cost.total - 0.09).abs() < 1e-12);

        let per_million = FlatRatePricing {
            input_cost: 0.015,
            output_cost: 0.075,
            unit: Unit::Million,
        };
        let cost = per_million.cost("x", &ProviderSelection::enabled(), volume(1_000.0));
        assert!((cost.total - 0.00009).abs() < 1e-15);
    }

    #[test]
    fn test_custom_model_both_terms() {
        let mut provider = CustomProvider::perplexity();
        provider.set_model_enabled("sonar-small-online", true);
        let cost = provider.monthly_cost(volume(1_000_000.0));
        // 5 per thousand requests + 0.2 per million tokens
        assert!((cost.total - 5000.2).abs() < 1e-9);
    }

    #[test]
    fn test_custom_subscriptions_all_enabled_are_summed() {
        let mut provider = CustomProvider::perplexity();
        provider.set_subscription_enabled("pro-monthly", true);
        provider.set_subscription_enabled("pro-yearly", true);
        let cost = provider.monthly_cost(volume(0.0));
        assert_eq!(cost.total, 220.0);
        assert_eq!(cost.items.len(), 2);
    }

    #[test]
    fn test_custom_subscription_ignored_without_flag() {
        let mut provider = CustomProvider::perplexity();
        provider.set_subscription_enabled("pro-monthly", true);
        provider.has_subscription = false;
        assert_eq!(provider.monthly_cost(volume(0.0)).total, 0.0);
    }

    #[test]
    fn test_custom_model_without_costs_is_zero() {
        let provider = CustomProvider {
            id: "free".to_string(),
            name: "Free".to_string(),
            description: None,
            has_subscription: false,
            subscriptions: Vec::new(),
            has_api: true,
            models: vec![CustomModel::new("m", "M").enabled(true)],
        };
        let cost = provider.monthly_cost(volume(1_000_000.0));
        assert_eq!(cost.total, 0.0);
        assert_eq!(cost.items, vec![LineItem::new("M", 0.0)]);
    }

    #[test]
    fn test_custom_model_missing_unit_defaults_to_one() {
        let mut model = CustomModel::new("m", "M").enabled(true);
        model.cost_per_token = Some(0.001);
        let provider = CustomProvider {
            id: "p".to_string(),
            name: "P".to_string(),
            description: None,
            has_subscription: false,
            subscriptions: Vec::new(),
            has_api: true,
            models: vec![model],
        };
        let cost = provider.monthly_cost(volume(1_000.0));
        assert!((cost.total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_ids_are_charged_once() {
        let mut selection = ProviderSelection::enabled().with_selected(["gpt4o"]);
        selection.selected.push("gpt4o".to_string());
        let cost = openai().cost("openai", &selection, volume(1_000_000.0));
        assert_eq!(cost.total, 18.75);
        assert_eq!(cost.items.len(), 1);

        let voice = PricingCatalog::default().providers["elevenlabs"].pricing.clone();
        let mut plans = ProviderSelection::enabled().with_selected(["pro"]);
        plans.selected.push("pro".to_string());
        assert_eq!(voice.cost("elevenlabs", &plans, volume(0.0)).total, 99.0);
    }

    #[test]
    fn test_negative_custom_price_is_zero_with_warning() {
        let mut provider = CustomProvider::perplexity();
        provider.set_model_enabled("llama-8b", true);
        provider.set_model_enabled("llama-70b", true);
        if let Some(model) = provider.models.iter_mut().find(|m| m.id == "llama-8b") {
            model.cost_per_token = Some(-1000.0);
        }

        let cost = provider.monthly_cost(volume(1_000_000.0));

        assert_eq!(cost.total, 1.0);
        assert_eq!(cost.items, vec![LineItem::new("Llama 3.1 70B", 1.0)]);
        assert_eq!(cost.warnings.len(), 1);
        assert_eq!(cost.warnings[0].kind, WarningKind::InvalidPrice);
        assert_eq!(cost.warnings[0].item.as_deref(), Some("llama-8b"));
    }

    #[test]
    fn test_non_finite_subscription_price_is_zero_with_warning() {
        let mut provider = CustomProvider::perplexity();
        provider.set_subscription_enabled("pro-monthly", true);
        provider.subscriptions[0].price = f64::NAN;

        let cost = provider.monthly_cost(volume(0.0));

        assert_eq!(cost.total, 0.0);
        assert!(cost.items.is_empty());
        assert_eq!(cost.warnings[0].kind, WarningKind::InvalidPrice);
    }

    #[test]
    fn test_empty_pricing_tables() {
        let pricing = PerModelPricing {
            models: BTreeMap::new(),
            embeddings: None,
        };
        let cost = pricing.cost("p", &ProviderSelection::enabled(), volume(1.0));
        assert_eq!(cost, StrategyCost::default());
    }
}
