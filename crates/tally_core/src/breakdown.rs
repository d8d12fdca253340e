//! Cost breakdown: the itemized output of one engine run.

use serde::{Deserialize, Serialize};

/// A labelled amount shown under a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Monthly cost of one enabled provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCost {
    pub id: String,
    pub name: String,
    pub total: f64,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// What made a selection entry stale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Enabled provider id missing from the catalog
    UnknownProvider,
    /// Selected model id missing from the provider's price table
    UnknownModel,
    /// Selected plan id missing from the provider's plan table
    UnknownPlan,
    /// Embedding size missing, or embeddings not offered by the provider
    UnknownEmbedding,
    /// Volume was negative or not a number and was costed as zero
    InvalidVolume,
    /// Custom provider price was negative or not a number and was costed as zero
    InvalidPrice,
}

/// Non-fatal anomaly found while costing a selection.
///
/// The offending entry contributed zero to the total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaleSelectionWarning {
    pub kind: WarningKind,
    pub provider: Option<String>,
    pub item: Option<String>,
    pub message: String,
}

impl StaleSelectionWarning {
    pub fn new(kind: WarningKind, provider: Option<&str>, item: Option<&str>) -> Self {
        let message = match (kind, provider, item) {
            (WarningKind::UnknownProvider, Some(p), _) => {
                format!("provider '{}' is not in the catalog", p)
            }
            (WarningKind::UnknownModel, Some(p), Some(i)) => {
                format!("model '{}' is not offered by '{}'", i, p)
            }
            (WarningKind::UnknownPlan, Some(p), Some(i)) => {
                format!("plan '{}' is not offered by '{}'", i, p)
            }
            (WarningKind::UnknownEmbedding, Some(p), Some(i)) => {
                format!("embedding size '{}' is not offered by '{}'", i, p)
            }
            (WarningKind::InvalidPrice, Some(p), Some(i)) => {
                format!("price of '{}' from '{}' is not a non-negative number; costed as zero", i, p)
            }
            (WarningKind::InvalidVolume, _, Some(i)) => {
                format!("{} is not a non-negative number; costed as zero", i)
            }
            (kind, p, i) => format!("{:?} (provider: {:?}, item: {:?})", kind, p, i),
        };
        Self {
            kind,
            provider: provider.map(str::to_string),
            item: item.map(str::to_string),
            message,
        }
    }
}

impl std::fmt::Display for StaleSelectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The selected base plan, as echoed in the breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRef {
    pub id: String,
    pub name: String,
}

/// Itemized monthly cost.
///
/// `total` is the sum of `base_platform`, `additional_users` and every
/// provider total, added in the order [`CostBreakdown::components`] yields
/// them. Nothing is rounded here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub base_plan: PlanRef,
    pub base_platform: f64,
    pub additional_user_count: u32,
    pub additional_users: f64,
    pub providers: Vec<ProviderCost>,
    pub custom_providers: Vec<ProviderCost>,
    pub total: f64,
    #[serde(default)]
    pub warnings: Vec<StaleSelectionWarning>,
}

impl CostBreakdown {
    /// Every listed component total, in summation order.
    pub fn components(&self) -> impl Iterator<Item = f64> + '_ {
        [self.base_platform, self.additional_users]
            .into_iter()
            .chain(self.providers.iter().map(|p| p.total))
            .chain(self.custom_providers.iter().map(|p| p.total))
    }

    /// Sum of the listed components.
    pub fn sum_components(&self) -> f64 {
        self.components().fold(0.0, |acc, amount| acc + amount)
    }

    pub fn annual_total(&self) -> f64 {
        self.total * 12.0
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderCost> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn custom_provider(&self, id: &str) -> Option<&ProviderCost> {
        self.custom_providers.iter().find(|p| p.id == id)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Format an amount as US dollars with two decimals.
pub fn format_usd(amount: f64) -> String {
    format!("${:.2}", amount)
}
