use axum::{Extension, Json, extract::State};
use time::{Duration, OffsetDateTime};

use crate::constants::*;
use crate::dashboard::category_breakdown;
use crate::error::AppResult;
use crate::models::{Insights, Projection, Transaction, User};
use crate::state::AppState;
use crate::transactions::transactions_since;
use crate::utils::now_utc;

const NO_DATA_TIP: &str = "Start tracking your expenses to get personalized insights!";
const NO_DATA_MESSAGE: &str = "No data available";

/// Month-end spend extrapolated from the average daily spend so far this month.
pub fn project_month_end(
    total_expenses: f64,
    monthly_budget: f64,
    currency: &str,
    now: OffsetDateTime,
) -> Projection {
    let days_in_month = time::util::days_in_year_month(now.year(), now.month()) as f64;
    let days_passed = now.day() as f64;
    let projected_spend = total_expenses / days_passed * days_in_month;

    Projection::Forecast {
        projected_spend,
        projected_balance: monthly_budget - projected_spend,
        message: format!(
            "At your current rate, you'll spend {}{:.0} this month.",
            currency, projected_spend
        ),
    }
}

/// Rule-based tips over the user's recent expenses. Income entries are ignored.
pub fn derive_insights(transactions: &[Transaction], user: &User, now: OffsetDateTime) -> Insights {
    let expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_expense() && !t.deleted)
        .collect();

    if expenses.is_empty() {
        return Insights {
            tips: vec![NO_DATA_TIP.to_string()],
            projection: Projection::NoData {
                balance: 0.0,
                message: NO_DATA_MESSAGE.to_string(),
            },
        };
    }

    let currency = &user.currency;
    let total_expenses: f64 = expenses.iter().map(|t| t.amount).sum();
    let mut tips = Vec::new();

    // Highest total wins; ties go to the category that appears first in `transactions`.
    let breakdown = category_breakdown(expenses.iter().copied());
    let top = expenses
        .iter()
        .filter_map(|t| breakdown.get_key_value(&t.category))
        .fold(None::<(&String, f64)>, |best, (category, &amount)| match best {
            Some((_, best_amount)) if best_amount >= amount => best,
            _ => Some((category, amount)),
        });
    if let Some((category, amount)) = top {
        let percentage = amount / total_expenses * 100.0;
        if percentage > DOMINANT_CATEGORY_PERCENT {
            tips.push(format!(
                "You spent {:.0}% on {}. Consider setting a monthly limit to track this category better.",
                percentage, category
            ));
        }
    }

    let small: Vec<f64> = expenses
        .iter()
        .map(|t| t.amount)
        .filter(|&amount| amount < SMALL_PURCHASE_THRESHOLD)
        .collect();
    if small.len() > SMALL_PURCHASE_COUNT {
        let small_total: f64 = small.iter().sum();
        tips.push(format!(
            "You made {} small purchases totaling {}{:.0}. These add up quickly!",
            small.len(),
            currency,
            small_total
        ));
    }

    if total_expenses > user.monthly_budget {
        tips.push(format!(
            "You're {}{:.0} over budget this month. Try to reduce discretionary spending.",
            currency,
            total_expenses - user.monthly_budget
        ));
    } else {
        tips.push(format!(
            "Great job! You're {}{:.0} under budget. Consider saving this amount.",
            currency,
            user.monthly_budget - total_expenses
        ));
    }
    tips.truncate(MAX_TIPS);

    Insights {
        tips,
        projection: project_month_end(total_expenses, user.monthly_budget, currency, now),
    }
}

pub async fn get_insights(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Insights>> {
    let now = now_utc();
    let since = now - Duration::days(INSIGHTS_WINDOW_DAYS);
    let transactions = transactions_since(&state.db, &user.id, since).await?;
    Ok(Json(derive_insights(&transactions, &user, now)))
}
