//! Raw row tables as delivered by the surrounding ingestion layer.
//!
//! File and CSV handling is an external concern; the contract here is "a
//! table of typed rows per dataset". Dates arrive as strings and optional
//! categoricals may be absent; everything is validated and canonicalised
//! by [`super::normalize_bundle`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the `business_basic_info` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBusinessRow {
    pub business_id: String,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub size_category: Option<String>,
    pub registration_status: Option<String>,
    pub employee_count: Option<u32>,
    pub age_months: Option<u32>,
}

/// One row of the `transactions` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransactionRow {
    pub business_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Signed amount: positive = inflow, negative = outflow.
    pub amount: Option<Decimal>,
    pub txn_type: Option<String>,
    pub channel: Option<String>,
    pub counterparty_type: Option<String>,
}

/// One row of the `cash_flow` table. `period` accepts `YYYY-MM` or any
/// day within the month as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCashFlowRow {
    pub business_id: String,
    pub period: String,
    pub revenue: Option<Decimal>,
    pub expenses: Option<Decimal>,
    pub operating_expenses: Option<Decimal>,
    pub cost_of_goods: Option<Decimal>,
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
}

/// One row of the `ad_spend` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAdSpendRow {
    pub business_id: String,
    pub date: String,
    pub platform: Option<String>,
    pub campaign_type: Option<String>,
    pub spend: Option<Decimal>,
    pub impressions: Option<u64>,
    pub clicks: Option<u64>,
    pub conversions: Option<u64>,
    pub duration_days: Option<u32>,
}

/// One row of the `loan_repayment` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLoanRow {
    pub business_id: String,
    pub loan_id: String,
    pub disbursement_date: String,
    pub principal: Option<Decimal>,
    pub due_date: String,
    /// Empty / absent when the loan has not been repaid.
    pub actual_repayment_date: Option<String>,
    pub repaid_flag: Option<bool>,
    pub repayment_amount: Option<Decimal>,
}

/// All five raw tables for one normalization call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBundle {
    pub businesses: Vec<RawBusinessRow>,
    pub transactions: Vec<RawTransactionRow>,
    pub cash_flow: Vec<RawCashFlowRow>,
    pub ad_spend: Vec<RawAdSpendRow>,
    pub loans: Vec<RawLoanRow>,
}
