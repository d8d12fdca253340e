//! Forecast and ROI projections derived from a cost breakdown.
//!
//! All figures are monthly unless named otherwise. Hourly rate, hours per
//! page, review fraction, setup cost and the word ratios come from
//! [`BusinessRules`]; the growth step, reduced-review fraction and tooling
//! cost are engine constants.

use serde::{Deserialize, Serialize};

use crate::breakdown::CostBreakdown;
use crate::catalog::BusinessRules;
use crate::strategy::is_costable;

/// Number of monthly periods in a forecast.
pub const FORECAST_PERIODS: usize = 12;

/// Usage growth applied once per quarter.
pub const QUARTERLY_GROWTH: f64 = 1.1;

/// Review overhead that remains with AI-assisted drafting, as a fraction of
/// writer cost.
pub const AI_REVIEW_FRACTION: f64 = 0.1;

/// Monthly tools and software cost of the traditional approach, USD.
pub const TRADITIONAL_TOOLING_COST: f64 = 500.0;

const MONTH_LABELS: [&str; FORECAST_PERIODS] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One forecast month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    /// Zero-based period index
    pub period: usize,
    pub label: String,
    pub cost: f64,
    pub tokens: f64,
}

/// Return on investment against human writing effort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoiStats {
    /// Estimated pages produced per month
    pub pages: f64,
    /// Whole writer hours saved per month
    pub hours_saved: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub monthly_investment: f64,
    pub annual_investment: f64,
    /// ROI in percent. `None` when nothing is spent: the return is unbounded,
    /// so there is no finite percentage to report.
    pub roi_percent: Option<f64>,
}

/// Traditional versus AI-assisted monthly cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStats {
    pub writer_cost: f64,
    pub review_cost: f64,
    pub tooling_cost: f64,
    pub traditional_total: f64,
    pub ai_platform_cost: f64,
    pub reduced_review_cost: f64,
    pub setup_cost: f64,
    pub ai_assisted_total: f64,
    /// Percentage saved by the AI-assisted approach. `None` when the
    /// traditional total is zero.
    pub reduction_percent: Option<f64>,
}

/// Forecast, ROI and comparison for one breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub forecast: Vec<ForecastPeriod>,
    pub roi: RoiStats,
    pub comparison: ComparisonStats,
}

impl Projection {
    /// Sum of the twelve forecast months.
    pub fn forecast_total(&self) -> f64 {
        self.forecast.iter().map(|p| p.cost).sum()
    }
}

fn costable_volume(value: f64) -> f64 {
    if is_costable(value) {
        value
    } else {
        0.0
    }
}

/// Growth multiplier of period `index`: `1.1 ^ floor(index / 3)`.
pub fn growth_factor(index: usize) -> f64 {
    QUARTERLY_GROWTH.powi((index / 3) as i32)
}

/// Build the forecast, ROI and comparison for `breakdown` at `monthly_tokens`.
///
/// A negative or non-finite token volume is projected as zero, as the cost
/// engine costs it.
pub fn project(breakdown: &CostBreakdown, monthly_tokens: f64, rules: &BusinessRules) -> Projection {
    let monthly_tokens = costable_volume(monthly_tokens);
    let forecast = (0..FORECAST_PERIODS)
        .map(|i| {
            let factor = growth_factor(i);
            ForecastPeriod {
                period: i,
                label: MONTH_LABELS[i].to_string(),
                cost: breakdown.total * factor,
                tokens: monthly_tokens * factor,
            }
        })
        .collect();

    let roi = roi(breakdown.total, monthly_tokens, rules);
    let comparison = compare(breakdown.total, roi.hours_saved, rules);

    Projection {
        forecast,
        roi,
        comparison,
    }
}

/// ROI of spending `monthly_total` to generate `monthly_tokens`.
pub fn roi(monthly_total: f64, monthly_tokens: f64, rules: &BusinessRules) -> RoiStats {
    let monthly_tokens = costable_volume(monthly_tokens);
    let pages = monthly_tokens * rules.words_per_token / rules.words_per_page;
    let hours_saved = (pages * rules.hours_per_page).round();
    let monthly_savings = hours_saved * rules.average_hourly_rate;
    let annual_savings = monthly_savings * 12.0;
    let annual_investment = monthly_total * 12.0;

    let roi_percent = if annual_investment > 0.0 {
        Some((annual_savings - annual_investment) / annual_investment * 100.0)
    } else {
        None
    };

    RoiStats {
        pages,
        hours_saved,
        monthly_savings,
        annual_savings,
        monthly_investment: monthly_total,
        annual_investment,
        roi_percent,
    }
}

/// Compare the traditional and AI-assisted monthly cost for `hours_saved`.
pub fn compare(monthly_total: f64, hours_saved: f64, rules: &BusinessRules) -> ComparisonStats {
    let writer_cost = hours_saved * rules.average_hourly_rate;
    let review_cost = writer_cost * rules.review_cycle_cost_fraction;
    let traditional_total = writer_cost + review_cost + TRADITIONAL_TOOLING_COST;

    let reduced_review_cost = writer_cost * AI_REVIEW_FRACTION;
    let ai_assisted_total = monthly_total + reduced_review_cost + rules.setup_cost;

    let reduction_percent = if traditional_total > 0.0 {
        Some((traditional_total - ai_assisted_total) / traditional_total * 100.0)
    } else {
        None
    };

    ComparisonStats {
        writer_cost,
        review_cost,
        tooling_cost: TRADITIONAL_TOOLING_COST,
        traditional_total,
        ai_platform_cost: monthly_total,
        reduced_review_cost,
        setup_cost: rules.setup_cost,
        ai_assisted_total,
        reduction_percent,
    }
}
