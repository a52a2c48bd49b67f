//! Converts raw row tables into per-business chronological series with
//! validated types and a canonical missing-value representation.
//!
//! Row-level problems (missing business_id, unparseable date, duplicate
//! rows, invariant violations) are recovered locally: the row is dropped or
//! flagged and a [`DataQualityWarning`] is recorded. Only a table that is
//! non-empty yet yields *zero* valid rows fails the ingestion call with a
//! `Schema` error.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::dataset::raw::*;
use crate::error::ScoreEngineError;
use crate::types::*;
use crate::ScoreEngineResult;

/// Relative component of the balance-identity tolerance band.
const BALANCE_TOLERANCE_PCT: Decimal = dec!(0.01);
/// Absolute floor of the tolerance band, for near-zero balances.
const BALANCE_TOLERANCE_ABS: Decimal = dec!(1);

/// Per-business, per-source ordered series plus the warnings accumulated
/// while producing them. Ordering is deterministic: `BTreeMap` keyed by
/// business id, each series sorted by date.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBundle {
    pub profiles: BTreeMap<String, BusinessProfile>,
    pub transactions: BTreeMap<String, Vec<TransactionEvent>>,
    pub cash_flow: BTreeMap<String, Vec<CashFlowSnapshot>>,
    pub ad_spend: BTreeMap<String, Vec<AdCampaignRecord>>,
    pub loans: BTreeMap<String, Vec<LoanRecord>>,
    pub warnings: Vec<DataQualityWarning>,
}

impl NormalizedBundle {
    /// True when the business has at least one row in any event source
    /// (transactions, cash flow, or ad spend). Loan history does not count:
    /// it is the label source, not a feature source.
    pub fn has_any_events(&self, business_id: &str) -> bool {
        self.transactions.contains_key(business_id)
            || self.cash_flow.contains_key(business_id)
            || self.ad_spend.contains_key(business_id)
    }

    /// All loans across all businesses, in deterministic order.
    pub fn all_loans(&self) -> impl Iterator<Item = &LoanRecord> {
        self.loans.values().flatten()
    }
}

/// Normalize all five raw tables into per-business series.
pub fn normalize_bundle(raw: &RawBundle) -> ScoreEngineResult<NormalizedBundle> {
    let mut out = NormalizedBundle::default();

    normalize_businesses(&raw.businesses, &mut out)?;
    normalize_transactions(&raw.transactions, &mut out)?;
    normalize_cash_flow(&raw.cash_flow, &mut out)?;
    normalize_ad_spend(&raw.ad_spend, &mut out)?;
    normalize_loans(&raw.loans, &mut out)?;

    for w in &out.warnings {
        warn!(table = %w.table, business = ?w.business_id, "{}", w.reason);
    }
    Ok(out)
}

fn cat(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => UNKNOWN_CATEGORY.to_string(),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Cash-flow periods come as `YYYY-MM` or any day within the month; both
/// canonicalise to the first day of the month.
fn parse_period(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let day = parse_date(trimmed)
        .or_else(|| NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").ok())?;
    day.with_day(1)
}

/// Fail the call when a non-empty table produced nothing usable: the whole
/// table is malformed, not just individual rows.
fn check_not_all_dropped(
    table: &str,
    raw_len: usize,
    kept: usize,
) -> ScoreEngineResult<()> {
    if raw_len > 0 && kept == 0 {
        return Err(ScoreEngineError::Schema {
            table: table.to_string(),
            reason: format!("all {raw_len} rows were invalid"),
        });
    }
    Ok(())
}

fn normalize_businesses(
    rows: &[RawBusinessRow],
    out: &mut NormalizedBundle,
) -> ScoreEngineResult<()> {
    let table = "business_basic_info";
    for row in rows {
        let id = row.business_id.trim();
        if id.is_empty() {
            out.warnings
                .push(DataQualityWarning::new(table, None, "row dropped: empty business_id"));
            continue;
        }
        if out.profiles.contains_key(id) {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                "duplicate profile dropped; profiles are immutable once ingested",
            ));
            continue;
        }
        out.profiles.insert(
            id.to_string(),
            BusinessProfile {
                business_id: id.to_string(),
                sector: cat(&row.sector),
                location: cat(&row.location),
                size_category: cat(&row.size_category),
                registration_status: cat(&row.registration_status),
                employee_count: row.employee_count.unwrap_or(0),
                age_months: row.age_months.unwrap_or(0),
            },
        );
    }
    check_not_all_dropped(table, rows.len(), out.profiles.len())
}

fn normalize_transactions(
    rows: &[RawTransactionRow],
    out: &mut NormalizedBundle,
) -> ScoreEngineResult<()> {
    let table = "transactions";
    let mut seen: HashSet<(String, NaiveDate, Decimal, String)> = HashSet::new();
    let mut kept = 0usize;

    for row in rows {
        let id = row.business_id.trim();
        if id.is_empty() {
            out.warnings
                .push(DataQualityWarning::new(table, None, "row dropped: empty business_id"));
            continue;
        }
        let Some(date) = parse_date(&row.date) else {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!("row dropped: unparseable date '{}'", row.date),
            ));
            continue;
        };
        let Some(amount) = row.amount else {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                "row dropped: missing amount",
            ));
            continue;
        };
        let txn_type = cat(&row.txn_type);

        // Exact duplicates: same business + date + amount + type.
        if !seen.insert((id.to_string(), date, amount, txn_type.clone())) {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                "exact duplicate row dropped",
            ));
            continue;
        }

        out.transactions
            .entry(id.to_string())
            .or_default()
            .push(TransactionEvent {
                business_id: id.to_string(),
                date,
                amount,
                txn_type,
                channel: cat(&row.channel),
                counterparty_type: cat(&row.counterparty_type),
            });
        kept += 1;
    }

    for series in out.transactions.values_mut() {
        series.sort_by_key(|e| e.date);
    }
    check_not_all_dropped(table, rows.len(), kept)
}

fn normalize_cash_flow(
    rows: &[RawCashFlowRow],
    out: &mut NormalizedBundle,
) -> ScoreEngineResult<()> {
    let table = "cash_flow";
    let mut kept = 0usize;

    for row in rows {
        let id = row.business_id.trim();
        if id.is_empty() {
            out.warnings
                .push(DataQualityWarning::new(table, None, "row dropped: empty business_id"));
            continue;
        }
        let Some(period) = parse_period(&row.period) else {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!("row dropped: unparseable period '{}'", row.period),
            ));
            continue;
        };

        let snapshot = CashFlowSnapshot {
            business_id: id.to_string(),
            period,
            revenue: row.revenue.unwrap_or(Decimal::ZERO),
            expenses: row.expenses.unwrap_or(Decimal::ZERO),
            operating_expenses: row.operating_expenses.unwrap_or(Decimal::ZERO),
            cost_of_goods: row.cost_of_goods.unwrap_or(Decimal::ZERO),
            opening_balance: row.opening_balance.unwrap_or(Decimal::ZERO),
            closing_balance: row.closing_balance.unwrap_or(Decimal::ZERO),
        };

        // Balance identity: closing ≈ opening + revenue − expenses.
        let implied = snapshot.opening_balance + snapshot.revenue - snapshot.expenses;
        let tolerance =
            snapshot.closing_balance.abs() * BALANCE_TOLERANCE_PCT + BALANCE_TOLERANCE_ABS;
        if (snapshot.closing_balance - implied).abs() > tolerance {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!(
                    "balance identity violated for {}: closing {} vs implied {}",
                    period, snapshot.closing_balance, implied
                ),
            ));
        }

        out.cash_flow.entry(id.to_string()).or_default().push(snapshot);
        kept += 1;
    }

    for series in out.cash_flow.values_mut() {
        series.sort_by_key(|s| s.period);
    }
    check_not_all_dropped(table, rows.len(), kept)
}

fn normalize_ad_spend(rows: &[RawAdSpendRow], out: &mut NormalizedBundle) -> ScoreEngineResult<()> {
    let table = "ad_spend";
    let mut kept = 0usize;

    for row in rows {
        let id = row.business_id.trim();
        if id.is_empty() {
            out.warnings
                .push(DataQualityWarning::new(table, None, "row dropped: empty business_id"));
            continue;
        }
        let Some(date) = parse_date(&row.date) else {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!("row dropped: unparseable date '{}'", row.date),
            ));
            continue;
        };

        let impressions = row.impressions.unwrap_or(0);
        let clicks = row.clicks.unwrap_or(0);
        let conversions = row.conversions.unwrap_or(0);

        // Funnel monotonicity: impressions >= clicks >= conversions.
        if clicks > impressions {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!("clicks ({clicks}) exceed impressions ({impressions})"),
            ));
        }
        if conversions > clicks {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!("conversions ({conversions}) exceed clicks ({clicks})"),
            ));
        }

        out.ad_spend
            .entry(id.to_string())
            .or_default()
            .push(AdCampaignRecord {
                business_id: id.to_string(),
                date,
                platform: cat(&row.platform),
                campaign_type: cat(&row.campaign_type),
                spend: row.spend.unwrap_or(Decimal::ZERO),
                impressions,
                clicks,
                conversions,
                duration_days: row.duration_days.unwrap_or(0),
            });
        kept += 1;
    }

    for series in out.ad_spend.values_mut() {
        series.sort_by_key(|r| r.date);
    }
    check_not_all_dropped(table, rows.len(), kept)
}

fn normalize_loans(rows: &[RawLoanRow], out: &mut NormalizedBundle) -> ScoreEngineResult<()> {
    let table = "loan_repayment";
    let mut kept = 0usize;

    for row in rows {
        let id = row.business_id.trim();
        if id.is_empty() {
            out.warnings
                .push(DataQualityWarning::new(table, None, "row dropped: empty business_id"));
            continue;
        }
        let (Some(disbursement_date), Some(due_date)) =
            (parse_date(&row.disbursement_date), parse_date(&row.due_date))
        else {
            out.warnings.push(DataQualityWarning::new(
                table,
                Some(id),
                format!(
                    "row dropped: unparseable disbursement/due date ('{}' / '{}')",
                    row.disbursement_date, row.due_date
                ),
            ));
            continue;
        };
        let actual_repayment_date = match &row.actual_repayment_date {
            Some(s) if !s.trim().is_empty() => {
                let Some(d) = parse_date(s) else {
                    out.warnings.push(DataQualityWarning::new(
                        table,
                        Some(id),
                        format!("row dropped: unparseable repayment date '{s}'"),
                    ));
                    continue;
                };
                Some(d)
            }
            _ => None,
        };

        out.loans.entry(id.to_string()).or_default().push(LoanRecord {
            business_id: id.to_string(),
            loan_id: row.loan_id.trim().to_string(),
            disbursement_date,
            principal: row.principal.unwrap_or(Decimal::ZERO),
            due_date,
            actual_repayment_date,
            repaid_flag: row.repaid_flag.unwrap_or(false),
            repayment_amount: row.repayment_amount.unwrap_or(Decimal::ZERO),
        });
        kept += 1;
    }

    for series in out.loans.values_mut() {
        series.sort_by_key(|l| l.disbursement_date);
    }
    check_not_all_dropped(table, rows.len(), kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn txn(id: &str, date: &str, amount: Decimal) -> RawTransactionRow {
        RawTransactionRow {
            business_id: id.to_string(),
            date: date.to_string(),
            amount: Some(amount),
            txn_type: Some("Sales".to_string()),
            channel: None,
            counterparty_type: None,
        }
    }

    #[test]
    fn test_transactions_sorted_per_business() {
        let raw = RawBundle {
            transactions: vec![
                txn("SME-001", "2023-03-01", dec!(100)),
                txn("SME-001", "2023-01-01", dec!(200)),
                txn("SME-001", "2023-02-01", dec!(300)),
            ],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        let dates: Vec<_> = bundle.transactions["SME-001"]
            .iter()
            .map(|e| e.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2023-01-01", "2023-02-01", "2023-03-01"]);
    }

    #[test]
    fn test_exact_duplicate_dropped_with_warning() {
        let raw = RawBundle {
            transactions: vec![
                txn("SME-001", "2023-01-01", dec!(100)),
                txn("SME-001", "2023-01-01", dec!(100)),
            ],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        assert_eq!(bundle.transactions["SME-001"].len(), 1);
        assert!(bundle
            .warnings
            .iter()
            .any(|w| w.reason.contains("duplicate")));
    }

    #[test]
    fn test_row_without_business_id_dropped_not_fatal() {
        let raw = RawBundle {
            transactions: vec![
                txn("", "2023-01-01", dec!(100)),
                txn("SME-001", "2023-01-01", dec!(100)),
            ],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        assert_eq!(bundle.transactions.len(), 1);
        assert_eq!(bundle.warnings.len(), 1);
    }

    #[test]
    fn test_entirely_invalid_table_is_schema_error() {
        let raw = RawBundle {
            transactions: vec![txn("SME-001", "not-a-date", dec!(100))],
            ..Default::default()
        };
        let err = normalize_bundle(&raw).unwrap_err();
        assert!(matches!(err, ScoreEngineError::Schema { .. }));
    }

    #[test]
    fn test_missing_categorical_gets_unknown_sentinel() {
        let raw = RawBundle {
            transactions: vec![txn("SME-001", "2023-01-01", dec!(100))],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        let event = &bundle.transactions["SME-001"][0];
        assert_eq!(event.channel, UNKNOWN_CATEGORY);
        assert_eq!(event.counterparty_type, UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_period_accepts_year_month_form() {
        let raw = RawBundle {
            cash_flow: vec![RawCashFlowRow {
                business_id: "SME-001".to_string(),
                period: "2023-04".to_string(),
                revenue: Some(dec!(1000)),
                expenses: Some(dec!(400)),
                opening_balance: Some(dec!(0)),
                closing_balance: Some(dec!(600)),
                ..Default::default()
            }],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        assert_eq!(
            bundle.cash_flow["SME-001"][0].period,
            NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_balance_identity_violation_flagged_not_fatal() {
        let raw = RawBundle {
            cash_flow: vec![RawCashFlowRow {
                business_id: "SME-001".to_string(),
                period: "2023-04".to_string(),
                revenue: Some(dec!(1000)),
                expenses: Some(dec!(400)),
                opening_balance: Some(dec!(0)),
                closing_balance: Some(dec!(5000)),
                ..Default::default()
            }],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        assert_eq!(bundle.cash_flow["SME-001"].len(), 1);
        assert!(bundle
            .warnings
            .iter()
            .any(|w| w.reason.contains("balance identity")));
    }

    #[test]
    fn test_ad_funnel_violation_flagged() {
        let raw = RawBundle {
            ad_spend: vec![RawAdSpendRow {
                business_id: "SME-001".to_string(),
                date: "2023-01-02".to_string(),
                spend: Some(dec!(500)),
                impressions: Some(10),
                clicks: Some(50),
                conversions: Some(2),
                ..Default::default()
            }],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        assert!(bundle
            .warnings
            .iter()
            .any(|w| w.reason.contains("exceed impressions")));
        // Row is kept: flagged, not dropped.
        assert_eq!(bundle.ad_spend["SME-001"].len(), 1);
    }

    #[test]
    fn test_loan_with_blank_repayment_date_is_open() {
        let raw = RawBundle {
            loans: vec![RawLoanRow {
                business_id: "SME-001".to_string(),
                loan_id: "LN-1".to_string(),
                disbursement_date: "2023-01-01".to_string(),
                due_date: "2023-04-01".to_string(),
                actual_repayment_date: Some("  ".to_string()),
                repaid_flag: Some(false),
                ..Default::default()
            }],
            ..Default::default()
        };
        let bundle = normalize_bundle(&raw).unwrap();
        assert_eq!(bundle.loans["SME-001"][0].actual_repayment_date, None);
    }

    #[test]
    fn test_empty_bundle_is_fine() {
        let bundle = normalize_bundle(&RawBundle::default()).unwrap();
        assert!(bundle.profiles.is_empty());
        assert!(bundle.warnings.is_empty());
    }
}
