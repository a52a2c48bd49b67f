//! Scenario builders shared by the integration suites.
#![allow(dead_code)]

use rust_decimal::Decimal;
use sme_score_core::dataset::{
    RawAdSpendRow, RawBundle, RawBusinessRow, RawCashFlowRow, RawLoanRow, RawTransactionRow,
};

pub fn profile_row(id: &str, sector: &str) -> RawBusinessRow {
    RawBusinessRow {
        business_id: id.to_string(),
        sector: Some(sector.to_string()),
        location: Some("nairobi".to_string()),
        size_category: Some("small".to_string()),
        registration_status: Some("registered".to_string()),
        employee_count: Some(6),
        age_months: Some(36),
    }
}

fn month_rows(
    raw: &mut RawBundle,
    id: &str,
    month: u32,
    revenue: i64,
    expense_ratio_pct: i64,
) {
    let revenue_d = Decimal::from(revenue);
    let expenses = revenue_d * Decimal::from(expense_ratio_pct) / Decimal::from(100);
    raw.cash_flow.push(RawCashFlowRow {
        business_id: id.to_string(),
        period: format!("2023-{month:02}"),
        revenue: Some(revenue_d),
        expenses: Some(expenses),
        operating_expenses: Some(expenses / Decimal::from(2)),
        cost_of_goods: Some(expenses / Decimal::from(4)),
        opening_balance: Some(Decimal::ZERO),
        closing_balance: Some(revenue_d - expenses),
    });
    for day in [6u32, 14, 22] {
        raw.transactions.push(RawTransactionRow {
            business_id: id.to_string(),
            date: format!("2023-{month:02}-{day:02}"),
            amount: Some(revenue_d / Decimal::from(3)),
            txn_type: Some("Sales".to_string()),
            channel: Some("POS".to_string()),
            counterparty_type: Some("consumer".to_string()),
        });
    }
    raw.transactions.push(RawTransactionRow {
        business_id: id.to_string(),
        date: format!("2023-{month:02}-26"),
        amount: Some(-expenses),
        txn_type: Some("Inventory".to_string()),
        channel: Some("Transfer".to_string()),
        counterparty_type: Some("supplier".to_string()),
    });
}

fn ad_month(raw: &mut RawBundle, id: &str, month: u32, spend: i64) {
    raw.ad_spend.push(RawAdSpendRow {
        business_id: id.to_string(),
        date: format!("2023-{month:02}-04"),
        platform: Some("Facebook".to_string()),
        campaign_type: Some("conversion".to_string()),
        spend: Some(Decimal::from(spend)),
        impressions: Some(spend as u64 * 20),
        clicks: Some(spend as u64 / 2),
        conversions: Some((spend as u64 / 25).max(1)),
        duration_days: Some(7),
    });
}

/// Twelve months of steadily growing revenue, controlled expenses, and
/// stable ad spend. No loan history.
pub fn growing_business(raw: &mut RawBundle, id: &str) {
    raw.businesses.push(profile_row(id, "retail"));
    for month in 1..=12u32 {
        month_rows(raw, id, month, 50_000 + 3_000 * month as i64, 60);
        ad_month(raw, id, month, 1_000);
    }
}

/// Declining revenue, expenses above income, no ads, and a prior default.
pub fn declining_business(raw: &mut RawBundle, id: &str) {
    raw.businesses.push(profile_row(id, "hospitality"));
    for month in 1..=12u32 {
        month_rows(raw, id, month, (20_000 - 1_500 * month as i64).max(1_500), 150);
    }
    raw.loans.push(RawLoanRow {
        business_id: id.to_string(),
        loan_id: format!("LN-{id}-prior"),
        disbursement_date: "2023-02-01".to_string(),
        principal: Some(Decimal::from(300_000)),
        due_date: "2023-05-01".to_string(),
        actual_repayment_date: None,
        repaid_flag: Some(false),
        repayment_amount: Some(Decimal::ZERO),
    });
}

/// A labeled training portfolio: even ids behave like `growing_business`
/// and repay, odd ids behave like `declining_business` and default.
pub fn training_portfolio(n: usize) -> RawBundle {
    let mut raw = RawBundle::default();
    for i in 0..n {
        let id = format!("SME-{i:03}");
        let good = i % 2 == 0;
        if good {
            growing_business(&mut raw, &id);
        } else {
            declining_business(&mut raw, &id);
        }
        let disb_month = 4 + (i % 6) as u32;
        let due_month = disb_month + 3;
        raw.loans.push(RawLoanRow {
            business_id: id.clone(),
            loan_id: format!("LN-{i:03}"),
            disbursement_date: format!("2023-{disb_month:02}-01"),
            principal: Some(Decimal::from(500_000)),
            due_date: format!("2023-{due_month:02}-01"),
            actual_repayment_date: if good {
                Some(format!("2023-{due_month:02}-01"))
            } else {
                None
            },
            repaid_flag: Some(good),
            repayment_amount: Some(if good {
                Decimal::from(500_000)
            } else {
                Decimal::ZERO
            }),
        });
    }
    raw
}
