//! The fixed, versioned feature schema.
//!
//! A model artifact records the schema version it was trained against;
//! scoring refuses to mix versions. Feature vectors are computed, never
//! persisted; reproducing one means recomputing from the source series at
//! the same as-of date.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bumped whenever a feature is added, removed, or its semantics change.
pub const FEATURE_SCHEMA_VERSION: &str = "fv1";

pub const FEATURE_COUNT: usize = 24;

/// Feature names in schema order. Must stay in lockstep with
/// [`FeatureVector::values`].
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "revenue_avg_3m",
    "revenue_avg_6m",
    "revenue_avg_12m",
    "revenue_cv_12m",
    "net_cash_flow_12m",
    "burn_rate_12m",
    "opex_ratio_12m",
    "txn_count_12m",
    "txn_per_month_3m",
    "txn_avg_amount_12m",
    "inflow_total_12m",
    "outflow_total_12m",
    "revenue_concentration_12m",
    "channel_diversity",
    "has_ad_data",
    "ad_spend_12m",
    "ad_cpa_12m",
    "ad_roas_12m",
    "ad_ctr_12m",
    "ad_spend_trend",
    "age_months",
    "sector_code",
    "size_code",
    "registration_code",
];

/// One fixed-width feature vector for a business at an as-of date.
///
/// All trailing-window aggregates use only events dated on or before the
/// as-of date. Businesses with no activity in a source over the window get
/// sentinel zeros, with `has_ad_data` separating "no ad signal" from "bad
/// ad signal".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    // Cash-flow
    pub revenue_avg_3m: Decimal,
    pub revenue_avg_6m: Decimal,
    pub revenue_avg_12m: Decimal,
    /// Coefficient of variation (std dev / mean) of monthly revenue.
    pub revenue_cv_12m: Decimal,
    pub net_cash_flow_12m: Decimal,
    /// Expenses over revenue. A business with expenses and zero revenue
    /// gets a fixed penalty value of 10.
    pub burn_rate_12m: Decimal,
    pub opex_ratio_12m: Decimal,
    // Transactions
    pub txn_count_12m: Decimal,
    pub txn_per_month_3m: Decimal,
    pub txn_avg_amount_12m: Decimal,
    pub inflow_total_12m: Decimal,
    pub outflow_total_12m: Decimal,
    /// Share of inflow coming from the single largest counterparty type.
    pub revenue_concentration_12m: Decimal,
    /// Number of distinct payment channels seen in the window.
    pub channel_diversity: Decimal,
    // Advertising
    /// 1 when any ad record is visible in the window, else 0. Keeps organic
    /// businesses separable from badly-performing advertisers.
    pub has_ad_data: Decimal,
    pub ad_spend_12m: Decimal,
    pub ad_cpa_12m: Decimal,
    pub ad_roas_12m: Decimal,
    pub ad_ctr_12m: Decimal,
    pub ad_spend_trend: Decimal,
    // Static
    pub age_months: Decimal,
    pub sector_code: Decimal,
    pub size_code: Decimal,
    pub registration_code: Decimal,
}

impl FeatureVector {
    /// Values in schema order.
    pub fn values(&self) -> [Decimal; FEATURE_COUNT] {
        [
            self.revenue_avg_3m,
            self.revenue_avg_6m,
            self.revenue_avg_12m,
            self.revenue_cv_12m,
            self.net_cash_flow_12m,
            self.burn_rate_12m,
            self.opex_ratio_12m,
            self.txn_count_12m,
            self.txn_per_month_3m,
            self.txn_avg_amount_12m,
            self.inflow_total_12m,
            self.outflow_total_12m,
            self.revenue_concentration_12m,
            self.channel_diversity,
            self.has_ad_data,
            self.ad_spend_12m,
            self.ad_cpa_12m,
            self.ad_roas_12m,
            self.ad_ctr_12m,
            self.ad_spend_trend,
            self.age_months,
            self.sector_code,
            self.size_code,
            self.registration_code,
        ]
    }

    /// Lossy projection for the tree ensemble, which runs in f64.
    pub fn to_f64_row(&self) -> Vec<f64> {
        self.values()
            .iter()
            .map(|d| d.to_f64().unwrap_or(0.0))
            .collect()
    }

    /// True when no event-derived signal is present at all: every dynamic
    /// feature is at its sentinel. Static profile features may still be
    /// non-zero.
    pub fn is_all_sentinel(&self) -> bool {
        let dynamic = [
            self.revenue_avg_12m,
            self.net_cash_flow_12m,
            self.txn_count_12m,
            self.inflow_total_12m,
            self.outflow_total_12m,
            self.has_ad_data,
            self.ad_spend_12m,
        ];
        dynamic.iter().all(|d| d.is_zero())
    }
}
