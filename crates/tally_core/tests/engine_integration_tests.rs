//! Integration tests for the cost and forecast engines.

use std::fs;
use tempfile::tempdir;

use tally_core::{
    compute_costs, project, Calculator, CustomModel, CustomProvider, PricingCatalog,
    ProviderSelection, Unit, UsageSelection, WarningKind,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

/// Every provider enabled with a realistic mix of models and plans.
fn full_selection() -> UsageSelection {
    let mut perplexity = CustomProvider::perplexity();
    perplexity.set_subscription_enabled("pro-monthly", true);
    perplexity.set_model_enabled("sonar-small-online", true);

    let mut selection = UsageSelection::new("professional")
        .with_users(4)
        .with_tokens(2_000_000.0)
        .with_provider(
            "openai",
            ProviderSelection::enabled()
                .with_selected(["gpt4o", "gpt4o-mini"])
                .with_embeddings("large", false),
        )
        .with_provider("anthropic", ProviderSelection::enabled())
        .with_provider("gemini", ProviderSelection::enabled().with_selected(["flash"]))
        .with_provider("elevenlabs", ProviderSelection::enabled().with_selected(["pro"]));
    selection.add_custom_provider(perplexity);
    selection
}

#[test]
fn test_total_equals_sum_of_components() {
    let catalog = PricingCatalog::default();
    let breakdown = compute_costs(&full_selection(), &catalog).unwrap();

    let mut expected = 0.0;
    expected += breakdown.base_platform;
    expected += breakdown.additional_users;
    for provider in &breakdown.providers {
        expected += provider.total;
    }
    for provider in &breakdown.custom_providers {
        expected += provider.total;
    }

    assert_eq!(breakdown.total, expected);
    assert_eq!(breakdown.providers.len(), 4);
    assert_eq!(breakdown.custom_providers.len(), 1);
    assert!(!breakdown.has_warnings());
}

#[test]
fn test_provider_totals_equal_their_items() {
    let catalog = PricingCatalog::default();
    let breakdown = compute_costs(&full_selection(), &catalog).unwrap();

    for provider in breakdown.providers.iter().chain(&breakdown.custom_providers) {
        let items: f64 = provider.items.iter().map(|i| i.amount).sum();
        assert!(close(provider.total, items), "{} does not add up", provider.id);
    }
}

#[test]
fn test_base_only_total_is_plan_price() {
    let catalog = PricingCatalog::default();
    for (id, plan) in &catalog.base_plans {
        let breakdown = compute_costs(&UsageSelection::new(id.clone()), &catalog).unwrap();
        assert_eq!(breakdown.total, plan.monthly_price);
    }
}

#[test]
fn test_starter_with_two_additional_users() {
    let catalog = PricingCatalog::default();
    let breakdown = compute_costs(&UsageSelection::new("starter").with_users(2), &catalog).unwrap();
    assert_eq!(breakdown.total, 115.0);
    assert_eq!(tally_core::format_usd(breakdown.total), "$115.00");
}

#[test]
fn test_gpt4o_one_million_tokens() {
    let catalog = PricingCatalog::default();
    let selection = UsageSelection::new("starter")
        .with_provider("openai", ProviderSelection::enabled().with_selected(["gpt4o"]));

    let breakdown = compute_costs(&selection, &catalog).unwrap();

    assert_eq!(breakdown.provider("openai").unwrap().total, 18.75);
}

#[test]
fn test_stale_model_costs_the_same_as_not_selecting_it() {
    let catalog = PricingCatalog::default();
    let fresh = UsageSelection::new("growth")
        .with_provider("openai", ProviderSelection::enabled().with_selected(["gpt4o"]));
    let stale = UsageSelection::new("growth").with_provider(
        "openai",
        ProviderSelection::enabled().with_selected(["gpt4o", "gpt5-preview"]),
    );

    let fresh = compute_costs(&fresh, &catalog).unwrap();
    let stale = compute_costs(&stale, &catalog).unwrap();

    assert_eq!(fresh.total, stale.total);
    assert_eq!(stale.warnings.len(), 1);
    assert_eq!(stale.warnings[0].kind, WarningKind::UnknownModel);
    assert_eq!(stale.warnings[0].item.as_deref(), Some("gpt5-preview"));
}

#[test]
fn test_stale_plan_is_warned() {
    let catalog = PricingCatalog::default();
    let selection = UsageSelection::new("starter").with_provider(
        "elevenlabs",
        ProviderSelection::enabled().with_selected(["creator"]),
    );

    let breakdown = compute_costs(&selection, &catalog).unwrap();

    assert_eq!(breakdown.total, 99.0);
    assert_eq!(breakdown.warnings[0].kind, WarningKind::UnknownPlan);
}

#[test]
fn test_anthropic_per_thousand_rate() {
    let catalog = PricingCatalog::default();
    let selection = UsageSelection::new("starter")
        .with_tokens(1000.0)
        .with_provider("anthropic", ProviderSelection::enabled());

    let breakdown = compute_costs(&selection, &catalog).unwrap();

    assert!(close(breakdown.provider("anthropic").unwrap().total, 0.09));
}

#[test]
fn test_custom_model_request_and_token_terms() {
    let catalog = PricingCatalog::default();
    let mut provider = CustomProvider::perplexity();
    provider.id = "search".to_string();
    provider.models = vec![CustomModel::new("online", "Online")
        .per_request(5.0, Unit::Thousand)
        .per_token(0.2, Unit::Million)
        .enabled(true)];

    let mut selection = UsageSelection::new("starter");
    selection.add_custom_provider(provider);

    let breakdown = compute_costs(&selection, &catalog).unwrap();

    assert!(close(breakdown.custom_provider("search").unwrap().total, 5000.2));
}

#[test]
fn test_unknown_base_plan_is_configuration_error() {
    let catalog = PricingCatalog::default();
    let err = compute_costs(&UsageSelection::new("enterprise"), &catalog).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let catalog = PricingCatalog::default();
    let selection = full_selection();

    let first = compute_costs(&selection, &catalog).unwrap();
    let second = compute_costs(&selection, &catalog).unwrap();

    assert_eq!(first.total.to_bits(), second.total.to_bits());
    assert_eq!(first, second);
}

#[test]
fn test_forecast_growth_from_breakdown() {
    let catalog = PricingCatalog::default();
    let breakdown = compute_costs(&UsageSelection::new("starter").with_users(2), &catalog).unwrap();

    let projection = project(&breakdown, 1_000_000.0, &catalog.business_rules);

    assert_eq!(projection.forecast[0].cost, breakdown.total);
    assert!(close(projection.forecast[3].cost, breakdown.total * 1.1));
    assert!(close(projection.forecast[6].cost, breakdown.total * 1.21));
}

#[test]
fn test_estimate_with_zero_spend_has_no_roi() {
    let mut catalog = PricingCatalog::default();
    catalog.base_plans.get_mut("starter").unwrap().monthly_price = 0.0;
    let calculator = Calculator::new(catalog);

    let estimate = calculator.estimate(&UsageSelection::new("starter")).unwrap();

    assert_eq!(estimate.breakdown.total, 0.0);
    assert_eq!(estimate.projection.roi.roi_percent, None);
    assert!(estimate.projection.comparison.reduction_percent.is_some());
}

#[test]
fn test_catalog_from_yaml_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("catalog.yaml");
    fs::write(
        &path,
        r#"
basePlans:
  team:
    name: Team
    monthlyPrice: 50
    includedUsers: 3
additionalUserPrice: 10
providers:
  acme:
    name: Acme AI
    pricing:
      strategy: flatRate
      inputCost: 1
      outputCost: 1
      unit: million
"#,
    )
    .unwrap();

    let catalog = PricingCatalog::from_file(&path).unwrap();
    let selection = UsageSelection::new("team")
        .with_users(1)
        .with_provider("acme", ProviderSelection::enabled());

    let breakdown = compute_costs(&selection, &catalog).unwrap();

    // 50 + 10 + (1 + 1) * 1M / 1M
    assert_eq!(breakdown.total, 62.0);
    assert_eq!(catalog.business_rules.average_hourly_rate, 75.0);
}

#[test]
fn test_catalog_file_round_trip() {
    let temp = tempdir().unwrap();
    let catalog = PricingCatalog::default();

    for name in ["catalog.json", "catalog.yml"] {
        let path = temp.path().join(name);
        catalog.save_to_file(&path).unwrap();
        assert_eq!(PricingCatalog::from_file(&path).unwrap(), catalog);
    }
}

#[test]
fn test_invalid_catalog_file_is_rejected() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("catalog.json");
    let mut catalog = PricingCatalog::default();
    catalog.additional_user_price = -8.0;
    catalog.save_to_file(&path).unwrap();

    assert!(PricingCatalog::from_file(&path).is_err());
}

#[test]
fn test_selection_file_round_trip() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("nested").join("selection.json");
    let selection = full_selection();

    selection.save_to_file(&path).unwrap();

    assert_eq!(UsageSelection::from_file(&path).unwrap(), selection);
}
