//! Text and JSON rendering of command results.

use anyhow::Result;
use serde::Serialize;
use tally_core::{format_usd, CostBreakdown, Projection, UsageEquivalents};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn percent(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.1}%", value),
        None => "n/a (no spend)".to_string(),
    }
}

pub fn render_breakdown(breakdown: &CostBreakdown) -> String {
    let mut out = String::new();
    let line = |out: &mut String, label: &str, amount: f64| {
        out.push_str(&format!("  {:<40} {:>12}\n", label, format_usd(amount)));
    };

    out.push_str(&format!("💰 Monthly cost ({} plan)\n", breakdown.base_plan.name));
    line(&mut out, "Base platform", breakdown.base_platform);
    if breakdown.additional_user_count > 0 {
        line(
            &mut out,
            &format!("Additional users (x{})", breakdown.additional_user_count),
            breakdown.additional_users,
        );
    }

    for provider in breakdown.providers.iter().chain(&breakdown.custom_providers) {
        line(&mut out, &provider.name, provider.total);
        for item in &provider.items {
            out.push_str(&format!("      {:<36} {:>12}\n", item.label, format_usd(item.amount)));
        }
    }

    out.push_str(&format!("  {}\n", "-".repeat(53)));
    line(&mut out, "Total per month", breakdown.total);
    line(&mut out, "Total per year", breakdown.annual_total());

    for warning in &breakdown.warnings {
        out.push_str(&format!("⚠️  {}\n", warning));
    }
    out
}

pub fn render_projection(projection: &Projection) -> String {
    let mut out = String::new();

    out.push_str("📈 12-month forecast\n");
    for period in &projection.forecast {
        out.push_str(&format!(
            "  {:<4} {:>12}  {:>14.0} tokens\n",
            period.label,
            format_usd(period.cost),
            period.tokens
        ));
    }
    out.push_str(&format!("  Total {:>11}\n", format_usd(projection.forecast_total())));

    let roi = &projection.roi;
    out.push_str("\n🎯 Return on investment\n");
    out.push_str(&format!("  Pages per month            {:>12.0}\n", roi.pages));
    out.push_str(&format!("  Hours saved per month      {:>12.0}\n", roi.hours_saved));
    out.push_str(&format!("  Savings per month          {:>12}\n", format_usd(roi.monthly_savings)));
    out.push_str(&format!("  Savings per year           {:>12}\n", format_usd(roi.annual_savings)));
    out.push_str(&format!("  Investment per year        {:>12}\n", format_usd(roi.annual_investment)));
    out.push_str(&format!("  ROI                        {:>12}\n", percent(roi.roi_percent)));

    let cmp = &projection.comparison;
    out.push_str("\n⚖️  Traditional vs AI-assisted (monthly)\n");
    out.push_str(&format!("  Writers                    {:>12}\n", format_usd(cmp.writer_cost)));
    out.push_str(&format!("  Review cycles              {:>12}\n", format_usd(cmp.review_cost)));
    out.push_str(&format!("  Tools and software         {:>12}\n", format_usd(cmp.tooling_cost)));
    out.push_str(&format!("  Traditional total          {:>12}\n", format_usd(cmp.traditional_total)));
    out.push_str(&format!("  AI platform                {:>12}\n", format_usd(cmp.ai_platform_cost)));
    out.push_str(&format!("  Reduced review             {:>12}\n", format_usd(cmp.reduced_review_cost)));
    out.push_str(&format!("  Training and setup         {:>12}\n", format_usd(cmp.setup_cost)));
    out.push_str(&format!("  AI-assisted total          {:>12}\n", format_usd(cmp.ai_assisted_total)));
    out.push_str(&format!("  Cost reduction             {:>12}\n", percent(cmp.reduction_percent)));
    out
}

pub fn render_equivalents(eq: &UsageEquivalents) -> String {
    let mut out = String::from("\n📚 Monthly output equivalents\n");
    let rows = [
        ("Words", eq.words),
        ("Pages", eq.pages),
        ("Training modules", eq.training_modules),
        ("Script minutes", eq.script_minutes),
        ("Training videos", eq.training_videos),
        ("Q&A exchanges", eq.qa_exchanges),
        ("Voice-over words", eq.voice_words),
        ("Voice-over minutes", eq.voice_minutes),
        ("Audio segments", eq.voice_segments),
    ];
    for (label, value) in rows {
        out.push_str(&format!("  {:<26} {:>12}\n", label, value));
    }
    out
}
