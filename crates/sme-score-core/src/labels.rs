//! Label construction from loan repayment records.
//!
//! Each loan yields one independent training example. The example's as-of
//! date is the loan's disbursement date: features for it may only use data
//! available *before the loan was granted*, because cash-flow and ad data
//! keep accruing after disbursement and would leak the outcome.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::LoanRecord;

/// One labeled training example derived from a single loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledLoan {
    pub business_id: String,
    pub loan_id: String,
    /// Feature cutoff for this example.
    pub as_of: NaiveDate,
    /// True when the loan was repaid within the grace period.
    pub repaid: bool,
}

/// Derive binary labels for a sequence of loans.
///
/// repaid = repaid_flag set AND actual_repayment_date ≤ due_date + grace.
/// Everything else labels as not repaid, including still-outstanding
/// past-due loans and repayments that landed after the grace window.
pub fn build_labels<'a>(
    loans: impl IntoIterator<Item = &'a LoanRecord>,
    grace_period_days: u32,
) -> Vec<LabeledLoan> {
    loans
        .into_iter()
        .map(|loan| LabeledLoan {
            business_id: loan.business_id.clone(),
            loan_id: loan.loan_id.clone(),
            as_of: loan.disbursement_date,
            repaid: label_loan(loan, grace_period_days),
        })
        .collect()
}

fn label_loan(loan: &LoanRecord, grace_period_days: u32) -> bool {
    if !loan.repaid_flag {
        return false;
    }
    let Some(repaid_on) = loan.actual_repayment_date else {
        return false;
    };
    let deadline = loan
        .due_date
        .checked_add_days(Days::new(u64::from(grace_period_days)))
        .unwrap_or(loan.due_date);
    repaid_on <= deadline
}
