//! # tally_core
//!
//! Pricing catalog, cost engine and ROI forecasting for Tally.
//!
//! Everything in this crate is synchronous and free of shared state: a
//! [`UsageSelection`] and a [`PricingCatalog`] go in, an itemized
//! [`CostBreakdown`] comes out, and [`project`] derives the forecast, ROI and
//! traditional-versus-AI comparison from it.
//!
//! ## Pricing strategies
//!
//! - **Per model**: token prices per million, plus optional embeddings
//! - **Flat plan**: fixed monthly price per selected plan
//! - **Flat rate**: combined input and output rate per unit of tokens
//! - **Custom providers**: subscriptions plus per-request/per-token models
//!
//! Selected ids the catalog does not know cost nothing and are reported as
//! [`StaleSelectionWarning`]s. Only a missing base plan is an error.
//!
//! # Example
//!
//! ```rust
//! use tally_core::{compute_costs, PricingCatalog, ProviderSelection, UsageSelection};
//!
//! let catalog = PricingCatalog::default();
//! let selection = UsageSelection::new("starter")
//!     .with_users(2)
//!     .with_provider("openai", ProviderSelection::enabled().with_selected(["gpt4o"]));
//!
//! let breakdown = compute_costs(&selection, &catalog).unwrap();
//! assert_eq!(breakdown.total, 99.0 + 16.0 + 18.75);
//! ```

pub mod breakdown;
pub mod catalog;
pub mod document;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod selection;
pub mod strategy;

pub use breakdown::{
    format_usd, CostBreakdown, LineItem, PlanRef, ProviderCost, StaleSelectionWarning, WarningKind,
};
pub use catalog::{
    preset_id, validate_custom_provider, BasePlan, BillingPeriod, BusinessRules, CustomModel,
    CustomProvider, EmbeddingTier, FlatPlan, FlatPlanPricing, FlatRatePricing, PerModelPricing,
    Preset, PricingCatalog, ProviderDefinition, ProviderPricing, Subscription, TokenModel, Unit,
};
pub use document::{read_document, write_document, DocumentFormat};
pub use engine::{compute_costs, Calculator, Estimate};
pub use error::{CoreResult, PricerError};
pub use forecast::{
    compare, growth_factor, project, roi, ComparisonStats, ForecastPeriod, Projection, RoiStats,
};
pub use insights::UsageEquivalents;
pub use selection::{CustomProviderSelection, EmbeddingSelection, ProviderSelection, UsageSelection};
pub use strategy::{PricingStrategy, StrategyCost, UsageVolume};
