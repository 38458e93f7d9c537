//! Dashboard aggregation.
//!
//! Loading is a single query for the period's live transactions; everything
//! else is arithmetic over that slice in [`summarize`].

use axum::{Extension, Json, extract::State};
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime, Time};

use crate::constants::*;
use crate::error::{AppQuery, AppResult};
use crate::models::{DailyAmount, DashboardData, DashboardPeriod, DashboardQuery, Transaction, User};
use crate::state::AppState;
use crate::transactions::transactions_since;
use crate::utils::now_utc;

/// First instant included in the reporting window.
pub fn period_start(period: DashboardPeriod, now: OffsetDateTime) -> OffsetDateTime {
    match period {
        DashboardPeriod::Monthly => now
            .replace_day(1)
            .unwrap_or(now)
            .replace_time(Time::MIDNIGHT),
        DashboardPeriod::Weekly => now - Duration::days(7),
        DashboardPeriod::Trailing30Days => now - Duration::days(30),
    }
}

/// Share of `monthly_budget` spent, as a percentage capped at 100.
pub fn budget_used_percent(total_expenses: f64, monthly_budget: f64) -> f64 {
    if monthly_budget > 0.0 {
        (total_expenses / monthly_budget * 100.0).min(100.0)
    } else {
        0.0
    }
}

pub fn category_breakdown<'a, I>(expenses: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut breakdown = BTreeMap::new();
    for t in expenses {
        *breakdown.entry(t.category.clone()).or_insert(0.0) += t.amount;
    }
    breakdown
}

/// Expense totals for the last `TREND_DAYS` calendar days (UTC), oldest first.
pub fn daily_expense_trend(transactions: &[Transaction], now: OffsetDateTime) -> Vec<DailyAmount> {
    let today = now.date();
    (0..TREND_DAYS)
        .rev()
        .map(|days_back| {
            let day = today - Duration::days(days_back);
            let amount = transactions
                .iter()
                .filter(|t| t.is_expense() && t.date.date() == day)
                .map(|t| t.amount)
                .sum();
            DailyAmount {
                date: day.to_string(),
                amount,
            }
        })
        .collect()
}

/// Aggregates an already-filtered, newest-first list of transactions.
/// Soft-deleted entries are skipped even if present.
pub fn summarize(
    transactions: &[Transaction],
    monthly_budget: f64,
    now: OffsetDateTime,
) -> DashboardData {
    let live: Vec<Transaction> = transactions.iter().filter(|t| !t.deleted).cloned().collect();

    let total_income: f64 = live.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
    let total_expenses: f64 = live.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();

    DashboardData {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        budget_used_percent: budget_used_percent(total_expenses, monthly_budget),
        category_breakdown: category_breakdown(live.iter().filter(|t| t.is_expense())),
        monthly_trend: daily_expense_trend(&live, now),
        recent_transactions: live.into_iter().take(RECENT_TRANSACTIONS_COUNT).collect(),
    }
}

pub async fn build_dashboard(
    state: &AppState,
    user: &User,
    period: DashboardPeriod,
    now: OffsetDateTime,
) -> AppResult<DashboardData> {
    let transactions = transactions_since(&state.db, &user.id, period_start(period, now)).await?;
    Ok(summarize(&transactions, user.monthly_budget, now))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<DashboardQuery>,
) -> AppResult<Json<DashboardData>> {
    let period = DashboardPeriod::from_keyword(query.period.as_deref());
    let data = build_dashboard(&state, &user, period, now_utc()).await?;
    tracing::debug!(user_id = %user.id, ?period, "dashboard built");
    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use time::macros::datetime;

    fn tx(kind: TransactionType, amount: f64, category: &str, date: OffsetDateTime) -> Transaction {
        Transaction {
            id: format!("{}-{}-{}", category, amount, date.unix_timestamp()),
            user_id: "u1".to_string(),
            kind,
            amount,
            category: category.to_string(),
            description: String::new(),
            payment_type: DEFAULT_PAYMENT_TYPE.to_string(),
            tags: vec![],
            date,
            created_at: date,
            deleted: false,
        }
    }

    #[test]
    fn period_starts() {
        let now = datetime!(2024-03-15 13:45:00 UTC);

        assert_eq!(
            period_start(DashboardPeriod::Monthly, now),
            datetime!(2024-03-01 00:00:00 UTC)
        );
        assert_eq!(
            period_start(DashboardPeriod::Weekly, now),
            datetime!(2024-03-08 13:45:00 UTC)
        );
        assert_eq!(
            period_start(DashboardPeriod::Trailing30Days, now),
            datetime!(2024-02-14 13:45:00 UTC)
        );
    }

    #[test]
    fn period_keywords() {
        assert_eq!(DashboardPeriod::from_keyword(None), DashboardPeriod::Monthly);
        assert_eq!(
            DashboardPeriod::from_keyword(Some("monthly")),
            DashboardPeriod::Monthly
        );
        assert_eq!(
            DashboardPeriod::from_keyword(Some("weekly")),
            DashboardPeriod::Weekly
        );
        assert_eq!(
            DashboardPeriod::from_keyword(Some("yearly")),
            DashboardPeriod::Trailing30Days
        );
    }

    #[test]
    fn totals_breakdown_and_balance() {
        let now = datetime!(2024-03-15 12:00:00 UTC);
        let transactions = vec![
            tx(TransactionType::Income, 5000.0, "Salary", now),
            tx(TransactionType::Expense, 120.0, "Food", now - Duration::days(1)),
            tx(TransactionType::Expense, 80.0, "Food", now - Duration::days(2)),
            tx(TransactionType::Expense, 300.0, "Rent", now - Duration::days(2)),
        ];

        let data = summarize(&transactions, 10_000.0, now);

        assert_eq!(data.total_income, 5000.0);
        assert_eq!(data.total_expenses, 500.0);
        assert_eq!(data.balance, 4500.0);
        assert_eq!(data.budget_used_percent, 5.0);
        assert_eq!(data.category_breakdown.len(), 2);
        assert_eq!(data.category_breakdown["Food"], 200.0);
        assert_eq!(data.category_breakdown["Rent"], 300.0);
        assert!(!data.category_breakdown.contains_key("Salary"));
        assert_eq!(data.recent_transactions.len(), 4);
    }

    #[test]
    fn budget_percent_is_capped() {
        assert_eq!(budget_used_percent(50_000.0, 10_000.0), 100.0);
        assert_eq!(budget_used_percent(2_500.0, 10_000.0), 25.0);
        assert_eq!(budget_used_percent(100.0, 0.0), 0.0);
        assert_eq!(budget_used_percent(100.0, -10.0), 0.0);
    }

    #[test]
    fn balance_matches_totals_for_many_sets() {
        let now = datetime!(2024-03-15 12:00:00 UTC);
        for n in 0..40 {
            let transactions: Vec<Transaction> = (0..n)
                .map(|i| {
                    let kind = if i % 3 == 0 {
                        TransactionType::Income
                    } else {
                        TransactionType::Expense
                    };
                    tx(kind, 0.37 * (i as f64 + 1.0) * 91.0, "Misc", now - Duration::hours(i))
                })
                .collect();

            let data = summarize(&transactions, 1_000.0, now);
            assert_eq!(data.balance, data.total_income - data.total_expenses);
            assert!(data.budget_used_percent <= 100.0);
            assert!(data.recent_transactions.len() <= RECENT_TRANSACTIONS_COUNT);
        }
    }

    #[test]
    fn deleted_entries_are_ignored() {
        let now = datetime!(2024-03-15 12:00:00 UTC);
        let mut deleted = tx(TransactionType::Expense, 999.0, "Gone", now);
        deleted.deleted = true;
        let transactions = vec![deleted, tx(TransactionType::Expense, 1.0, "Kept", now)];

        let data = summarize(&transactions, 100.0, now);

        assert_eq!(data.total_expenses, 1.0);
        assert!(!data.category_breakdown.contains_key("Gone"));
        assert!(data.recent_transactions.iter().all(|t| !t.deleted));
    }

    #[test]
    fn trend_covers_seven_days_oldest_first() {
        let now = datetime!(2024-03-15 08:00:00 UTC);
        let transactions = vec![
            tx(TransactionType::Expense, 10.0, "Food", datetime!(2024-03-15 07:00:00 UTC)),
            tx(TransactionType::Expense, 5.0, "Food", datetime!(2024-03-15 01:00:00 UTC)),
            tx(TransactionType::Income, 99.0, "Salary", datetime!(2024-03-15 02:00:00 UTC)),
            tx(TransactionType::Expense, 7.0, "Bus", datetime!(2024-03-09 23:59:59 UTC)),
            tx(TransactionType::Expense, 50.0, "Old", datetime!(2024-03-08 12:00:00 UTC)),
        ];

        let trend = daily_expense_trend(&transactions, now);

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, "2024-03-09");
        assert_eq!(trend[0].amount, 7.0);
        assert_eq!(trend[6].date, "2024-03-15");
        assert_eq!(trend[6].amount, 15.0);
        assert!(trend[1..6].iter().all(|d| d.amount == 0.0));
    }

    #[test]
    fn recent_transactions_keep_input_order_and_cap() {
        let now = datetime!(2024-03-15 12:00:00 UTC);
        let transactions: Vec<Transaction> = (0..15)
            .map(|i| tx(TransactionType::Expense, 1.0, "Food", now - Duration::hours(i)))
            .collect();

        let data = summarize(&transactions, 100.0, now);

        assert_eq!(data.recent_transactions.len(), RECENT_TRANSACTIONS_COUNT);
        assert_eq!(data.recent_transactions[0].date, now);
    }
}
