//! Pricing catalog: base plans, provider price tables and business rules.
//!
//! The catalog is plain data. It is loaded once per session (built-in default,
//! a file, or the config store) and handed to the engine by reference; the
//! engine never mutates it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{read_document, write_document};
use crate::error::{CoreResult, PricerError};

/// A base platform subscription plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasePlan {
    /// Display name
    pub name: String,
    /// Monthly price in USD
    pub monthly_price: f64,
    /// Users included before the additional-user price applies
    pub included_users: u32,
}

impl BasePlan {
    pub fn new(name: impl Into<String>, monthly_price: f64, included_users: u32) -> Self {
        Self {
            name: name.into(),
            monthly_price,
            included_users,
        }
    }
}

/// Quantity a price is quoted against.
///
/// `One` also accepts the `request` and `token` spellings used by custom
/// provider definitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    #[serde(alias = "request", alias = "token")]
    One,
    Thousand,
    Million,
}

impl Unit {
    /// Divisor applied to a volume priced in this unit.
    pub fn divisor(self) -> f64 {
        match self {
            Unit::One => 1.0,
            Unit::Thousand => 1_000.0,
            Unit::Million => 1_000_000.0,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::One => write!(f, "unit"),
            Unit::Thousand => write!(f, "1K"),
            Unit::Million => write!(f, "1M"),
        }
    }
}

/// Token-priced model, rates per million tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenModel {
    pub name: String,
    #[serde(rename = "inputCostPer1M")]
    pub input_cost_per_1m: f64,
    #[serde(rename = "outputCostPer1M", default)]
    pub output_cost_per_1m: f64,
    /// Fine-tuning price. Shown for reference, never part of a monthly total.
    #[serde(
        rename = "trainingCostPer1M",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub training_cost_per_1m: Option<f64>,
}

impl TokenModel {
    pub fn new(name: impl Into<String>, input_cost_per_1m: f64, output_cost_per_1m: f64) -> Self {
        Self {
            name: name.into(),
            input_cost_per_1m,
            output_cost_per_1m,
            training_cost_per_1m: None,
        }
    }

    /// A model quoted with one rate for all tokens.
    pub fn single_rate(name: impl Into<String>, cost_per_1m: f64) -> Self {
        Self::new(name, cost_per_1m, 0.0)
    }

    pub fn with_training(mut self, training_cost_per_1m: f64) -> Self {
        self.training_cost_per_1m = Some(training_cost_per_1m);
        self
    }
}

/// Embedding price tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingTier {
    pub name: String,
    /// Per million tokens, synchronous API
    pub standard: f64,
    /// Per million tokens, batch API
    pub batch: f64,
}

impl EmbeddingTier {
    pub fn new(name: impl Into<String>, standard: f64, batch: f64) -> Self {
        Self {
            name: name.into(),
            standard,
            batch,
        }
    }
}

/// Per-model token pricing with optional embeddings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerModelPricing {
    pub models: BTreeMap<String, TokenModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<BTreeMap<String, EmbeddingTier>>,
}

/// A flat monthly plan (voice synthesis and similar).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatPlan {
    pub name: String,
    pub monthly_price: f64,
    /// Characters included per month
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<u64>,
}

/// Flat monthly plans selectable by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FlatPlanPricing {
    pub plans: BTreeMap<String, FlatPlan>,
}

/// Single on/off provider with one input and one output rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatRatePricing {
    pub input_cost: f64,
    pub output_cost: f64,
    /// Token quantity the two rates are quoted against
    pub unit: Unit,
}

/// The closed set of pricing strategies a built-in provider can use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum ProviderPricing {
    PerModel(PerModelPricing),
    FlatPlan(FlatPlanPricing),
    FlatRate(FlatRatePricing),
}

impl ProviderPricing {
    /// Short name of the strategy, for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderPricing::PerModel(_) => "per-model",
            ProviderPricing::FlatPlan(_) => "flat-plan",
            ProviderPricing::FlatRate(_) => "flat-rate",
        }
    }
}

/// A built-in provider entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDefinition {
    pub name: String,
    pub pricing: ProviderPricing,
}

impl ProviderDefinition {
    pub fn new(name: impl Into<String>, pricing: ProviderPricing) -> Self {
        Self {
            name: name.into(),
            pricing,
        }
    }
}

/// Billing period of a custom provider subscription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Yearly,
}

/// A subscription tier offered by a custom provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub billing_period: BillingPeriod,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// An API model offered by a custom provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomModel {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_request: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_unit: Option<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_token: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_unit: Option<Unit>,
    #[serde(default)]
    pub enabled: bool,
}

impl CustomModel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost_per_request: None,
            request_unit: None,
            cost_per_token: None,
            token_unit: None,
            enabled: false,
        }
    }

    pub fn per_request(mut self, cost: f64, unit: Unit) -> Self {
        self.cost_per_request = Some(cost);
        self.request_unit = Some(unit);
        self
    }

    pub fn per_token(mut self, cost: f64, unit: Unit) -> Self {
        self.cost_per_token = Some(cost);
        self.token_unit = Some(unit);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A user or admin defined provider outside the built-in set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomProvider {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub has_subscription: bool,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub has_api: bool,
    #[serde(default)]
    pub models: Vec<CustomModel>,
}

impl CustomProvider {
    /// Perplexity AI: subscription plans plus online/chat API models.
    pub fn perplexity() -> Self {
        let subscription = |id: &str, name: &str, price: f64, period: BillingPeriod, features: &[&str]| {
            Subscription {
                id: id.to_string(),
                name: name.to_string(),
                price,
                billing_period: period,
                features: features.iter().map(|f| f.to_string()).collect(),
                enabled: false,
            }
        };

        Self {
            id: "perplexity".to_string(),
            name: "Perplexity AI".to_string(),
            description: Some(
                "Advanced AI platform with subscription and API access options".to_string(),
            ),
            has_subscription: true,
            subscriptions: vec![
                subscription(
                    "pro-monthly",
                    "Pro (Monthly)",
                    20.0,
                    BillingPeriod::Monthly,
                    &[
                        "300 Pro searches daily",
                        "Advanced AI models access",
                        "File analysis (PDF, CSV, images)",
                        "Unlimited file uploads",
                        "API access",
                        "Image generation tools",
                    ],
                ),
                subscription(
                    "pro-yearly",
                    "Pro (Yearly)",
                    200.0,
                    BillingPeriod::Yearly,
                    &["All Pro features", "$40 annual savings"],
                ),
            ],
            has_api: true,
            models: vec![
                CustomModel::new("sonar-small-online", "Sonar Small (Online)")
                    .per_request(5.0, Unit::Thousand)
                    .per_token(0.2, Unit::Million),
                CustomModel::new("sonar-large-online", "Sonar Large (Online)")
                    .per_request(5.0, Unit::Thousand)
                    .per_token(1.0, Unit::Million),
                CustomModel::new("sonar-huge-online", "Sonar Huge (Online)")
                    .per_request(5.0, Unit::Thousand)
                    .per_token(5.0, Unit::Million),
                CustomModel::new("sonar-small-chat", "Sonar Small (Chat)")
                    .per_token(0.2, Unit::Million),
                CustomModel::new("sonar-large-chat", "Sonar Large (Chat)")
                    .per_token(1.0, Unit::Million),
                CustomModel::new("llama-8b", "Llama 3.1 8B").per_token(0.2, Unit::Million),
                CustomModel::new("llama-70b", "Llama 3.1 70B").per_token(1.0, Unit::Million),
            ],
        }
    }

    /// Enable or disable a subscription tier by id. Returns false if absent.
    pub fn set_subscription_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.subscriptions.iter_mut().find(|s| s.id == id) {
            Some(sub) => {
                sub.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enable or disable an API model by id. Returns false if absent.
    pub fn set_model_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.models.iter_mut().find(|m| m.id == id) {
            Some(model) => {
                model.enabled = enabled;
                true
            }
            None => false,
        }
    }
}

/// Heuristics used by the forecast/ROI engine and usage equivalents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRules {
    /// Hourly rate of a human writer, USD
    pub average_hourly_rate: f64,
    /// Writer hours saved per generated page
    pub hours_per_page: f64,
    /// Review overhead as a fraction of writer cost
    pub review_cycle_cost_fraction: f64,
    /// One-off training and setup cost of the AI approach, USD
    pub setup_cost: f64,
    pub words_per_token: f64,
    pub words_per_page: f64,
    pub words_per_minute: f64,
    pub chars_per_word: f64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            average_hourly_rate: 75.0,
            hours_per_page: 2.0,
            review_cycle_cost_fraction: 0.3,
            setup_cost: 200.0,
            words_per_token: 0.75,
            words_per_page: 250.0,
            words_per_minute: 150.0,
            chars_per_word: 5.0,
        }
    }
}

impl BusinessRules {
    fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("averageHourlyRate", self.average_hourly_rate),
            ("hoursPerPage", self.hours_per_page),
            ("reviewCycleCostFraction", self.review_cycle_cost_fraction),
            ("setupCost", self.setup_cost),
            ("wordsPerToken", self.words_per_token),
            ("wordsPerPage", self.words_per_page),
            ("wordsPerMinute", self.words_per_minute),
            ("charsPerWord", self.chars_per_word),
        ]
    }
}

/// A named starting point: volumes plus `provider.item` references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub monthly_tokens: f64,
    pub monthly_characters: f64,
    #[serde(default)]
    pub providers: Vec<String>,
}

impl Preset {
    /// Build a preset whose id is derived from its name.
    pub fn named(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: preset_id(&name),
            name,
            description: description.into(),
            monthly_tokens: 0.0,
            monthly_characters: 0.0,
            providers: Vec::new(),
        }
    }
}

/// Lowercased name with whitespace runs collapsed to `-`.
pub fn preset_id(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// The complete set of prices and constants used to cost a selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingCatalog {
    pub base_plans: BTreeMap<String, BasePlan>,
    pub additional_user_price: f64,
    pub providers: BTreeMap<String, ProviderDefinition>,
    #[serde(default)]
    pub custom_providers: Vec<CustomProvider>,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl Default for PricingCatalog {
    fn default() -> Self {
        let base_plans = BTreeMap::from([
            ("starter".to_string(), BasePlan::new("Starter", 99.0, 5)),
            ("growth".to_string(), BasePlan::new("Growth", 149.0, 5)),
            ("professional".to_string(), BasePlan::new("Professional", 199.0, 5)),
        ]);

        let openai = PerModelPricing {
            models: BTreeMap::from([
                (
                    "gpt4o".to_string(),
                    TokenModel::new("GPT-4o", 3.75, 15.0).with_training(25.0),
                ),
                (
                    "gpt4o-mini".to_string(),
                    TokenModel::new("GPT-4o Mini", 0.30, 1.20).with_training(3.0),
                ),
                ("gpt4-turbo".to_string(), TokenModel::new("GPT-4 Turbo", 0.01, 0.03)),
                ("gpt3-turbo".to_string(), TokenModel::new("GPT-3.5 Turbo", 0.0005, 0.0015)),
            ]),
            embeddings: Some(BTreeMap::from([
                ("small".to_string(), EmbeddingTier::new("Small", 0.02, 0.01)),
                ("large".to_string(), EmbeddingTier::new("Large", 0.13, 0.065)),
            ])),
        };

        let gemini = PerModelPricing {
            models: BTreeMap::from([
                ("pro".to_string(), TokenModel::single_rate("Pro", 7.0)),
                ("flash".to_string(), TokenModel::single_rate("Flash", 0.35)),
            ]),
            embeddings: None,
        };

        let plan = |name: &str, price: f64, characters: u64| FlatPlan {
            name: name.to_string(),
            monthly_price: price,
            characters: Some(characters),
        };
        let elevenlabs = FlatPlanPricing {
            plans: BTreeMap::from([
                ("basic".to_string(), plan("Basic", 22.0, 50_000)),
                ("pro".to_string(), plan("Pro", 99.0, 250_000)),
                ("enterprise".to_string(), plan("Enterprise", 330.0, 1_000_000)),
            ]),
        };

        let anthropic = FlatRatePricing {
            input_cost: 0.015,
            output_cost: 0.075,
            unit: Unit::Thousand,
        };

        let providers = BTreeMap::from([
            (
                "openai".to_string(),
                ProviderDefinition::new("OpenAI", ProviderPricing::PerModel(openai)),
            ),
            (
                "anthropic".to_string(),
                ProviderDefinition::new("Anthropic Claude", ProviderPricing::FlatRate(anthropic)),
            ),
            (
                "gemini".to_string(),
                ProviderDefinition::new("Google Gemini", ProviderPricing::PerModel(gemini)),
            ),
            (
                "elevenlabs".to_string(),
                ProviderDefinition::new("ElevenLabs Voice", ProviderPricing::FlatPlan(elevenlabs)),
            ),
        ]);

        let mut basic_docs = Preset::named(
            "Basic Documentation",
            "Suitable for small documentation projects",
        );
        basic_docs.monthly_tokens = 500_000.0;
        basic_docs.monthly_characters = 50_000.0;
        basic_docs.providers = vec!["openai.gpt3-turbo".to_string()];

        Self {
            base_plans,
            additional_user_price: 8.0,
            providers,
            custom_providers: vec![CustomProvider::perplexity()],
            business_rules: BusinessRules::default(),
            presets: vec![basic_docs],
        }
    }
}

impl PricingCatalog {
    /// Load a catalog from a JSON or YAML file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        debug!("Loading pricing catalog from {}", path.display());
        let catalog: Self = read_document(path)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Write the catalog as JSON or YAML, chosen by extension.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        debug!("Writing pricing catalog to {}", path.display());
        write_document(path, self)
    }

    /// Look up a base plan. A missing plan is a configuration error.
    pub fn base_plan(&self, id: &str) -> CoreResult<&BasePlan> {
        self.base_plans.get(id).ok_or_else(|| {
            PricerError::Configuration(format!(
                "base plan '{}' is not defined (known: {})",
                id,
                self.base_plans.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderDefinition> {
        self.providers.get(id)
    }

    pub fn custom_provider_template(&self, id: &str) -> Option<&CustomProvider> {
        self.custom_providers.iter().find(|p| p.id == id)
    }

    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Check that every price is finite and non-negative and every business
    /// rule is finite and strictly positive.
    pub fn validate(&self) -> CoreResult<()> {
        if self.base_plans.is_empty() {
            return Err(PricerError::InvalidCatalog(
                "at least one base plan is required".to_string(),
            ));
        }

        for (id, plan) in &self.base_plans {
            check_price(&format!("basePlans.{}.monthlyPrice", id), plan.monthly_price)?;
        }
        check_price("additionalUserPrice", self.additional_user_price)?;

        for (provider_id, provider) in &self.providers {
            match &provider.pricing {
                ProviderPricing::PerModel(pricing) => {
                    for (model_id, model) in &pricing.models {
                        let field = format!("providers.{}.models.{}", provider_id, model_id);
                        check_price(&format!("{}.inputCostPer1M", field), model.input_cost_per_1m)?;
                        check_price(&format!("{}.outputCostPer1M", field), model.output_cost_per_1m)?;
                        if let Some(training) = model.training_cost_per_1m {
                            check_price(&format!("{}.trainingCostPer1M", field), training)?;
                        }
                    }
                    for (size, tier) in pricing.embeddings.iter().flatten() {
                        let field = format!("providers.{}.embeddings.{}", provider_id, size);
                        check_price(&format!("{}.standard", field), tier.standard)?;
                        check_price(&format!("{}.batch", field), tier.batch)?;
                    }
                }
                ProviderPricing::FlatPlan(pricing) => {
                    for (plan_id, plan) in &pricing.plans {
                        check_price(
                            &format!("providers.{}.plans.{}.monthlyPrice", provider_id, plan_id),
                            plan.monthly_price,
                        )?;
                    }
                }
                ProviderPricing::FlatRate(pricing) => {
                    check_price(&format!("providers.{}.inputCost", provider_id), pricing.input_cost)?;
                    check_price(&format!("providers.{}.outputCost", provider_id), pricing.output_cost)?;
                }
            }
        }

        for provider in &self.custom_providers {
            validate_custom_provider(provider)?;
        }

        for (field, value) in self.business_rules.fields() {
            if !value.is_finite() || value <= 0.0 {
                return Err(PricerError::InvalidCatalog(format!(
                    "businessRules.{} must be a positive number, got {}",
                    field, value
                )));
            }
        }

        Ok(())
    }
}

/// Check the prices of a custom provider definition.
pub fn validate_custom_provider(provider: &CustomProvider) -> CoreResult<()> {
    for sub in &provider.subscriptions {
        check_price(
            &format!("customProviders.{}.subscriptions.{}.price", provider.id, sub.id),
            sub.price,
        )?;
    }
    for model in &provider.models {
        let field = format!("customProviders.{}.models.{}", provider.id, model.id);
        if let Some(cost) = model.cost_per_request {
            check_price(&format!("{}.costPerRequest", field), cost)?;
        }
        if let Some(cost) = model.cost_per_token {
            check_price(&format!("{}.costPerToken", field), cost)?;
        }
    }
    Ok(())
}

fn check_price(field: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PricerError::InvalidCatalog(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )))
    }
}
