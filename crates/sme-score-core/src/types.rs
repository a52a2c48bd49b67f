use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage
/// at the data layer.
pub type Money = Decimal;

/// Rates and ratios expressed as decimals (0.05 = 5%). Never percentages.
pub type Rate = Decimal;

/// Sentinel for missing non-critical categorical fields. Rows are kept and
/// the category is made explicit rather than dropping the row.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Static descriptive attributes of a scored business. Immutable once
/// ingested; exactly one per business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub business_id: String,
    pub sector: String,
    pub location: String,
    pub size_category: String,
    pub registration_status: String,
    pub employee_count: u32,
    pub age_months: u32,
}

/// A single dated ledger movement. Positive amounts are inflows, negative
/// amounts are outflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub business_id: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub txn_type: String,
    pub channel: String,
    pub counterparty_type: String,
}

/// One month of summarised cash-flow activity. `period` is the first
/// calendar day of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSnapshot {
    pub business_id: String,
    pub period: NaiveDate,
    pub revenue: Money,
    pub expenses: Money,
    pub operating_expenses: Money,
    pub cost_of_goods: Money,
    pub opening_balance: Money,
    pub closing_balance: Money,
}

/// One advertising campaign observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCampaignRecord {
    pub business_id: String,
    pub date: NaiveDate,
    pub platform: String,
    pub campaign_type: String,
    pub spend: Money,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub duration_days: u32,
}

/// One loan with its repayment outcome. The label source: terminal once
/// `repaid_flag` is set. A loan with no repayment date and `repaid_flag`
/// false past its due date is an active default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub business_id: String,
    pub loan_id: String,
    pub disbursement_date: NaiveDate,
    pub principal: Money,
    pub due_date: NaiveDate,
    pub actual_repayment_date: Option<NaiveDate>,
    pub repaid_flag: bool,
    pub repayment_amount: Money,
}

/// Discretised risk band derived from the 0-100 credit score.
/// Bands are fixed and non-overlapping: High [0,39], Medium [40,69],
/// Low [70,100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Map a clamped 0-100 score onto its band.
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=100 => RiskTier::Low,
            40..=69 => RiskTier::Medium,
            _ => RiskTier::High,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low Risk"),
            RiskTier::Medium => write!(f, "Medium Risk"),
            RiskTier::High => write!(f, "High Risk"),
        }
    }
}

/// Whether a factor pushed the score up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorDirection {
    IncreasesScore,
    DecreasesScore,
}

/// One ranked driver of a scoring decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub feature: String,
    pub direction: FactorDirection,
    /// Absolute contribution to the repayment probability.
    pub magnitude: f64,
    /// Plain-language description for loan officers.
    pub description: String,
}

/// The scoring decision for one business at one as-of date. Produced fresh
/// per request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub business_id: String,
    pub as_of_date: NaiveDate,
    pub model_version: String,
    /// Estimated probability of repayment, in [0, 1].
    pub probability: f64,
    /// round(probability * 100), clamped to [0, 100].
    pub credit_score: u8,
    pub risk_tier: RiskTier,
    /// Top drivers sorted by descending absolute contribution.
    pub top_factors: Vec<ScoreFactor>,
    pub decision_summary: String,
    /// Non-fatal notes accumulated while producing this result.
    pub warnings: Vec<String>,
}

/// A non-fatal data-quality event recorded during normalization. Processing
/// always continues past these; they exist so that dropped or suspect rows
/// are visible to operators instead of silently vanishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub table: String,
    pub business_id: Option<String>,
    pub reason: String,
}

impl DataQualityWarning {
    pub fn new(table: &str, business_id: Option<&str>, reason: impl Into<String>) -> Self {
        DataQualityWarning {
            table: table.to_string(),
            business_id: business_id.map(str::to_string),
            reason: reason.into(),
        }
    }
}
