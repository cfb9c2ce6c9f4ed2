//! Read-only aggregations over the ledger.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    BudgetStatus, EngineError, ResultEngine, Transaction, TransactionType, ValidationErrors,
};

use super::{Engine, TransactionListFilter};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
    pub transaction_count: usize,
    pub active_budgets: usize,
    pub budgets_over_threshold: usize,
}

/// Total per category; `category_id: None` is the uncategorised bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_id: Option<Uuid>,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`.
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

const MAX_TREND_MONTHS: u32 = 120;

fn range_filter(from: NaiveDate, to: NaiveDate) -> TransactionListFilter {
    TransactionListFilter {
        from: Some(from),
        to: Some(to),
        ..TransactionListFilter::default()
    }
}

fn totals_by_category(txs: &[Transaction], kind: TransactionType) -> Vec<CategoryTotal> {
    let mut buckets: HashMap<Option<Uuid>, (Decimal, usize)> = HashMap::new();
    for tx in txs.iter().filter(|tx| tx.transaction_type == kind) {
        let entry = buckets.entry(tx.category_id).or_default();
        entry.0 += tx.amount_in_wallet_currency;
        entry.1 += 1;
    }
    let mut totals: Vec<CategoryTotal> = buckets
        .into_iter()
        .map(|(category_id, (total, count))| CategoryTotal {
            category_id,
            total,
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then(a.category_id.cmp(&b.category_id)));
    totals
}

fn sum_of(txs: &[Transaction], kind: TransactionType) -> Decimal {
    txs.iter()
        .filter(|tx| tx.transaction_type == kind)
        .map(|tx| tx.amount_in_wallet_currency)
        .sum()
}

impl Engine {
    /// Balance, cash flow and budget health of a user over `[from, to]`.
    ///
    /// Income and expense only count INCOME and EXPENSE rows; transfers
    /// move money between the user's own wallets.
    pub async fn dashboard_summary(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultEngine<DashboardSummary> {
        let txs = self.transactions(user_id, &range_filter(from, to)).await?;
        let total_balance = self.total_balance(user_id, None).await?;
        let budgets = self.budgets(user_id).await?;

        let total_income = sum_of(&txs, TransactionType::Income);
        let total_expense = sum_of(&txs, TransactionType::Expense);
        let active: Vec<_> = budgets
            .iter()
            .filter(|b| b.status == BudgetStatus::Active)
            .collect();
        Ok(DashboardSummary {
            from,
            to,
            total_balance,
            total_income,
            total_expense,
            net: total_income - total_expense,
            transaction_count: txs.len(),
            active_budgets: active.len(),
            budgets_over_threshold: active
                .iter()
                .filter(|b| b.is_alert_threshold_reached())
                .count(),
        })
    }

    /// Expense totals per category, largest first.
    pub async fn spending_by_category(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let txs = self.transactions(user_id, &range_filter(from, to)).await?;
        Ok(totals_by_category(&txs, TransactionType::Expense))
    }

    /// Income totals per category, largest first.
    pub async fn income_by_category(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let txs = self.transactions(user_id, &range_filter(from, to)).await?;
        Ok(totals_by_category(&txs, TransactionType::Income))
    }

    /// Income and expense of the last `months` calendar months up to
    /// `today`, oldest first. Months without transactions report zeros.
    pub async fn monthly_trends(
        &self,
        user_id: &str,
        months: u32,
        today: NaiveDate,
    ) -> ResultEngine<Vec<MonthlyTrend>> {
        if months == 0 || months > MAX_TREND_MONTHS {
            return Err(EngineError::Validation(ValidationErrors::single(
                "months",
                format!("must be between 1 and {MAX_TREND_MONTHS}"),
            )));
        }
        let first = today
            .with_day(1)
            .and_then(|day| day.checked_sub_months(Months::new(months - 1)))
            .ok_or_else(|| {
                EngineError::Validation(ValidationErrors::single("today", "out of range"))
            })?;

        let mut trend: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        let mut cursor = first;
        while cursor <= today {
            trend.insert(cursor.format("%Y-%m").to_string(), Default::default());
            let Some(next) = cursor.checked_add_months(Months::new(1)) else {
                break;
            };
            cursor = next;
        }

        let txs = self.transactions(user_id, &range_filter(first, today)).await?;
        for tx in &txs {
            let Some(bucket) = trend.get_mut(&tx.transaction_date.format("%Y-%m").to_string())
            else {
                continue;
            };
            match tx.transaction_type {
                TransactionType::Income => bucket.0 += tx.amount_in_wallet_currency,
                TransactionType::Expense => bucket.1 += tx.amount_in_wallet_currency,
                _ => {}
            }
        }

        Ok(trend
            .into_iter()
            .map(|(month, (income, expense))| MonthlyTrend {
                month,
                income,
                expense,
                net: income - expense,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::Currency;

    fn tx(kind: TransactionType, amount: Decimal, category: Option<Uuid>) -> Transaction {
        let mut tx = Transaction::new(
            "alice".to_string(),
            Uuid::new_v4(),
            kind,
            amount,
            Currency::default(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        tx.category_id = category;
        tx
    }

    #[test]
    fn category_totals_group_and_sort() {
        let food = Uuid::new_v4();
        let txs = vec![
            tx(TransactionType::Expense, dec!(10), Some(food)),
            tx(TransactionType::Expense, dec!(15), Some(food)),
            tx(TransactionType::Expense, dec!(40), None),
            tx(TransactionType::Income, dec!(500), Some(food)),
        ];

        let totals = totals_by_category(&txs, TransactionType::Expense);
        assert_eq!(
            totals,
            vec![
                CategoryTotal {
                    category_id: None,
                    total: dec!(40),
                    count: 1,
                },
                CategoryTotal {
                    category_id: Some(food),
                    total: dec!(25),
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn sums_ignore_transfers() {
        let txs = vec![
            tx(TransactionType::Income, dec!(100), None),
            tx(TransactionType::Transfer, dec!(30), None),
        ];
        assert_eq!(sum_of(&txs, TransactionType::Income), dec!(100));
        assert_eq!(sum_of(&txs, TransactionType::Expense), dec!(0));
    }
}
