//! Deterministic synthetic portfolio used across unit tests.
//!
//! Even-indexed businesses are healthy: growing revenue, controlled
//! expenses, steady ad spend, loans repaid on time. Odd-indexed businesses
//! are struggling: thin declining revenue, expenses above income, no ads,
//! defaulted loans. The separation is deliberately strong so model tests
//! assert on direction, not on tuned thresholds.

use crate::dataset::{
    RawAdSpendRow, RawBundle, RawBusinessRow, RawCashFlowRow, RawLoanRow, RawTransactionRow,
};
use rust_decimal::Decimal;

pub fn business_id(i: usize) -> String {
    format!("SME-{i:03}")
}

/// Build a raw bundle of `n` businesses with 12 months of 2023 activity
/// and one loan each, disbursed from April onwards.
pub fn synthetic_portfolio(n: usize) -> RawBundle {
    let mut raw = RawBundle::default();

    for i in 0..n {
        let id = business_id(i);
        let good = i % 2 == 0;

        raw.businesses.push(RawBusinessRow {
            business_id: id.clone(),
            sector: Some(if good { "retail" } else { "hospitality" }.to_string()),
            location: Some("lagos".to_string()),
            size_category: Some("small".to_string()),
            registration_status: Some("registered".to_string()),
            employee_count: Some(5),
            age_months: Some(24 + i as u32),
        });

        for month in 1..=12u32 {
            let revenue = if good {
                Decimal::from(60_000 + 2_000 * month as i64 + 100 * i as i64)
            } else {
                Decimal::from((16_000i64 - 1_000 * month as i64).max(1_000) + 10 * i as i64)
            };
            let expenses = if good {
                revenue * Decimal::from(6) / Decimal::from(10)
            } else {
                revenue * Decimal::from(15) / Decimal::from(10)
            };
            raw.cash_flow.push(RawCashFlowRow {
                business_id: id.clone(),
                period: format!("2023-{month:02}"),
                revenue: Some(revenue),
                expenses: Some(expenses),
                operating_expenses: Some(expenses / Decimal::from(2)),
                cost_of_goods: Some(expenses / Decimal::from(4)),
                opening_balance: Some(Decimal::ZERO),
                closing_balance: Some(revenue - expenses),
            });

            // Three inflows and one outflow per month.
            for day in [5u32, 12, 20] {
                raw.transactions.push(RawTransactionRow {
                    business_id: id.clone(),
                    date: format!("2023-{month:02}-{day:02}"),
                    amount: Some(revenue / Decimal::from(3)),
                    txn_type: Some("Sales".to_string()),
                    channel: Some(if day == 5 { "POS" } else { "Transfer" }.to_string()),
                    counterparty_type: Some(if day == 20 { "wholesale" } else { "consumer" }.to_string()),
                });
            }
            raw.transactions.push(RawTransactionRow {
                business_id: id.clone(),
                date: format!("2023-{month:02}-25"),
                amount: Some(-expenses),
                txn_type: Some("Inventory".to_string()),
                channel: Some("Transfer".to_string()),
                counterparty_type: Some("supplier".to_string()),
            });

            if good {
                raw.ad_spend.push(RawAdSpendRow {
                    business_id: id.clone(),
                    date: format!("2023-{month:02}-03"),
                    platform: Some("Instagram".to_string()),
                    campaign_type: Some("awareness".to_string()),
                    spend: Some(Decimal::from(1_000)),
                    impressions: Some(20_000),
                    clicks: Some(600),
                    conversions: Some(40),
                    duration_days: Some(7),
                });
            }
        }

        // One loan each, disbursed from April onwards so several complete
        // months precede every as-of date.
        let disb_month = 4 + (i % 6) as u32; // April..September
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
