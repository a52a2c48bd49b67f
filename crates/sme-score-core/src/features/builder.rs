//! Computes a [`FeatureVector`] for one business at one as-of cutoff date.
//!
//! Leakage rule: an event is visible only when its date is on or before the
//! as-of date. Cash-flow months are coarser than days, so the in-progress
//! month is **excluded** entirely: a snapshot for month M becomes visible
//! on the last day of M, never partially. The same rule applies at training
//! and inference time.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::config::FeatureConfig;
use crate::dataset::NormalizedBundle;
use crate::error::ScoreEngineError;
use crate::features::FeatureVector;
use crate::types::*;
use crate::ScoreEngineResult;

/// Burn rate assigned when a business shows expenses but no revenue in the
/// window. Chosen far above any organic expense ratio.
const NO_REVENUE_BURN_PENALTY: Decimal = dec!(10);

/// Build the fixed-schema feature vector for `profile` as of `as_of`.
///
/// Fails with a `FeatureSchema` error when the business has a profile but
/// zero rows in every event source: that is a data-quality failure, not a
/// zero score.
pub fn build_features(
    profile: &BusinessProfile,
    bundle: &NormalizedBundle,
    as_of: NaiveDate,
    cfg: &FeatureConfig,
) -> ScoreEngineResult<FeatureVector> {
    if !bundle.has_any_events(&profile.business_id) {
        return Err(ScoreEngineError::FeatureSchema {
            business_id: profile.business_id.clone(),
            reason: "no data in any event source (transactions, cash_flow, ad_spend)".to_string(),
        });
    }

    let cash = cash_flow_features(
        bundle
            .cash_flow
            .get(&profile.business_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        as_of,
    );
    let txn = transaction_features(
        bundle
            .transactions
            .get(&profile.business_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        as_of,
    );
    let ads = ad_features(
        bundle
            .ad_spend
            .get(&profile.business_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        as_of,
        cfg,
    );

    Ok(FeatureVector {
        revenue_avg_3m: cash.revenue_avg_3m,
        revenue_avg_6m: cash.revenue_avg_6m,
        revenue_avg_12m: cash.revenue_avg_12m,
        revenue_cv_12m: cash.revenue_cv_12m,
        net_cash_flow_12m: cash.net_cash_flow_12m,
        burn_rate_12m: cash.burn_rate_12m,
        opex_ratio_12m: cash.opex_ratio_12m,
        txn_count_12m: txn.count_12m,
        txn_per_month_3m: txn.per_month_3m,
        txn_avg_amount_12m: txn.avg_amount_12m,
        inflow_total_12m: txn.inflow_total_12m,
        outflow_total_12m: txn.outflow_total_12m,
        revenue_concentration_12m: txn.concentration_12m,
        channel_diversity: txn.channel_diversity,
        has_ad_data: ads.has_ad_data,
        ad_spend_12m: ads.spend_12m,
        ad_cpa_12m: ads.cpa_12m,
        ad_roas_12m: ads.roas_12m,
        ad_ctr_12m: ads.ctr_12m,
        ad_spend_trend: ads.spend_trend,
        age_months: Decimal::from(profile.age_months),
        sector_code: sector_code(&profile.sector),
        size_code: size_code(&profile.size_category),
        registration_code: registration_code(&profile.registration_status),
    })
}

fn months_ago(as_of: NaiveDate, months: u32) -> NaiveDate {
    as_of
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Last calendar day of the month that `period` (a first-of-month date)
/// belongs to.
fn month_end(period: NaiveDate) -> NaiveDate {
    period
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(period)
}

struct CashFlowFeatures {
    revenue_avg_3m: Decimal,
    revenue_avg_6m: Decimal,
    revenue_avg_12m: Decimal,
    revenue_cv_12m: Decimal,
    net_cash_flow_12m: Decimal,
    burn_rate_12m: Decimal,
    opex_ratio_12m: Decimal,
}

fn cash_flow_features(series: &[CashFlowSnapshot], as_of: NaiveDate) -> CashFlowFeatures {
    // Only fully completed months are visible.
    let visible: Vec<&CashFlowSnapshot> =
        series.iter().filter(|s| month_end(s.period) <= as_of).collect();

    let in_window = |months: u32| -> Vec<&CashFlowSnapshot> {
        let start = months_ago(as_of, months);
        visible.iter().copied().filter(|s| s.period > start).collect()
    };

    let avg_revenue = |snaps: &[&CashFlowSnapshot]| -> Decimal {
        if snaps.is_empty() {
            return Decimal::ZERO;
        }
        let sum: Decimal = snaps.iter().map(|s| s.revenue).sum();
        sum / Decimal::from(snaps.len() as u64)
    };

    let w3 = in_window(3);
    let w6 = in_window(6);
    let w12 = in_window(12);

    let revenue_avg_12m = avg_revenue(&w12);

    // Coefficient of variation: population std dev over mean.
    let revenue_cv_12m = if w12.is_empty() || revenue_avg_12m.is_zero() {
        Decimal::ZERO
    } else {
        let n = Decimal::from(w12.len() as u64);
        let var: Decimal = w12
            .iter()
            .map(|s| {
                let d = s.revenue - revenue_avg_12m;
                d * d
            })
            .sum::<Decimal>()
            / n;
        var.sqrt().map(|sd| sd / revenue_avg_12m).unwrap_or(Decimal::ZERO)
    };

    let revenue_sum: Decimal = w12.iter().map(|s| s.revenue).sum();
    let expense_sum: Decimal = w12.iter().map(|s| s.expenses).sum();
    let opex_sum: Decimal = w12.iter().map(|s| s.operating_expenses).sum();

    let burn_rate_12m = if revenue_sum > Decimal::ZERO {
        expense_sum / revenue_sum
    } else if expense_sum > Decimal::ZERO {
        NO_REVENUE_BURN_PENALTY
    } else {
        Decimal::ZERO
    };
    let opex_ratio_12m = if revenue_sum > Decimal::ZERO {
        opex_sum / revenue_sum
    } else {
        Decimal::ZERO
    };

    CashFlowFeatures {
        revenue_avg_3m: avg_revenue(&w3),
        revenue_avg_6m: avg_revenue(&w6),
        revenue_avg_12m,
        revenue_cv_12m,
        net_cash_flow_12m: revenue_sum - expense_sum,
        burn_rate_12m,
        opex_ratio_12m,
    }
}

struct TransactionFeatures {
    count_12m: Decimal,
    per_month_3m: Decimal,
    avg_amount_12m: Decimal,
    inflow_total_12m: Decimal,
    outflow_total_12m: Decimal,
    concentration_12m: Decimal,
    channel_diversity: Decimal,
}

fn transaction_features(series: &[TransactionEvent], as_of: NaiveDate) -> TransactionFeatures {
    let start_12 = months_ago(as_of, 12);
    let start_3 = months_ago(as_of, 3);

    let w12: Vec<&TransactionEvent> = series
        .iter()
        .filter(|e| e.date > start_12 && e.date <= as_of)
        .collect();
    let count_3m = series
        .iter()
        .filter(|e| e.date > start_3 && e.date <= as_of)
        .count();

    if w12.is_empty() {
        return TransactionFeatures {
            count_12m: Decimal::ZERO,
            per_month_3m: Decimal::ZERO,
            avg_amount_12m: Decimal::ZERO,
            inflow_total_12m: Decimal::ZERO,
            outflow_total_12m: Decimal::ZERO,
            concentration_12m: Decimal::ZERO,
            channel_diversity: Decimal::ZERO,
        };
    }

    let abs_sum: Decimal = w12.iter().map(|e| e.amount.abs()).sum();
    let inflow_total: Decimal = w12
        .iter()
        .filter(|e| e.amount > Decimal::ZERO)
        .map(|e| e.amount)
        .sum();
    let outflow_total: Decimal = w12
        .iter()
        .filter(|e| e.amount < Decimal::ZERO)
        .map(|e| e.amount.abs())
        .sum();

    // Revenue concentration: largest counterparty type's share of inflow.
    let mut by_counterparty: BTreeMap<&str, Decimal> = BTreeMap::new();
    for e in w12.iter().filter(|e| e.amount > Decimal::ZERO) {
        *by_counterparty.entry(e.counterparty_type.as_str()).or_default() += e.amount;
    }
    let concentration = if inflow_total > Decimal::ZERO {
        by_counterparty
            .values()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO)
            / inflow_total
    } else {
        Decimal::ZERO
    };

    let channels: std::collections::BTreeSet<&str> =
        w12.iter().map(|e| e.channel.as_str()).collect();

    TransactionFeatures {
        count_12m: Decimal::from(w12.len() as u64),
        per_month_3m: Decimal::from(count_3m as u64) / dec!(3),
        avg_amount_12m: abs_sum / Decimal::from(w12.len() as u64),
        inflow_total_12m: inflow_total,
        outflow_total_12m: outflow_total,
        concentration_12m: concentration,
        channel_diversity: Decimal::from(channels.len() as u64),
    }
}

struct AdFeatures {
    has_ad_data: Decimal,
    spend_12m: Decimal,
    cpa_12m: Decimal,
    roas_12m: Decimal,
    ctr_12m: Decimal,
    spend_trend: Decimal,
}

fn ad_features(series: &[AdCampaignRecord], as_of: NaiveDate, cfg: &FeatureConfig) -> AdFeatures {
    let start_12 = months_ago(as_of, 12);
    let start_3 = months_ago(as_of, 3);
    let start_6 = months_ago(as_of, 6);

    let w12: Vec<&AdCampaignRecord> = series
        .iter()
        .filter(|r| r.date > start_12 && r.date <= as_of)
        .collect();

    // No ad activity is a missing signal, not a bad one. The flag lets the
    // model treat organic businesses as their own population.
    if w12.is_empty() {
        return AdFeatures {
            has_ad_data: Decimal::ZERO,
            spend_12m: Decimal::ZERO,
            cpa_12m: Decimal::ZERO,
            roas_12m: Decimal::ZERO,
            ctr_12m: Decimal::ZERO,
            spend_trend: Decimal::ZERO,
        };
    }

    let spend: Decimal = w12.iter().map(|r| r.spend).sum();
    let conversions: u64 = w12.iter().map(|r| r.conversions).sum();
    let clicks: u64 = w12.iter().map(|r| r.clicks).sum();
    let impressions: u64 = w12.iter().map(|r| r.impressions).sum();

    let cpa = spend / Decimal::from(conversions.max(1));
    let roas = if spend > Decimal::ZERO {
        Decimal::from(conversions) * Decimal::from(cfg.average_order_value) / spend
    } else {
        Decimal::ZERO
    };
    let ctr = if impressions > 0 {
        Decimal::from(clicks) / Decimal::from(impressions)
    } else {
        Decimal::ZERO
    };

    // Trend of spend: trailing 3 months vs the 3 months before them.
    let recent: Decimal = w12
        .iter()
        .filter(|r| r.date > start_3)
        .map(|r| r.spend)
        .sum();
    let prior: Decimal = w12
        .iter()
        .filter(|r| r.date > start_6 && r.date <= start_3)
        .map(|r| r.spend)
        .sum();
    let trend = if prior > Decimal::ZERO {
        (recent - prior) / prior
    } else if recent > Decimal::ZERO {
        Decimal::ONE
    } else {
        Decimal::ZERO
    };

    AdFeatures {
        has_ad_data: Decimal::ONE,
        spend_12m: spend,
        cpa_12m: cpa,
        roas_12m: roas,
        ctr_12m: ctr,
        spend_trend: trend,
    }
}

// Fixed ordinal lookups. Unknown categories encode to 0 so the sentinel is
// explicit rather than colliding with a real category.

fn sector_code(sector: &str) -> Decimal {
    match sector.to_ascii_lowercase().as_str() {
        "agriculture" => dec!(1),
        "manufacturing" => dec!(2),
        "retail" => dec!(3),
        "wholesale" => dec!(4),
        "services" => dec!(5),
        "hospitality" => dec!(6),
        "logistics" => dec!(7),
        "technology" => dec!(8),
        _ => Decimal::ZERO,
    }
}

fn size_code(size: &str) -> Decimal {
    match size.to_ascii_lowercase().as_str() {
        "micro" => dec!(1),
        "small" => dec!(2),
        "medium" => dec!(3),
        _ => Decimal::ZERO,
    }
}

fn registration_code(status: &str) -> Decimal {
    match status.to_ascii_lowercase().as_str() {
        "unregistered" | "informal" => dec!(1),
        "pending" => dec!(2),
        "registered" => dec!(3),
        _ => Decimal::ZERO,
    }
}
