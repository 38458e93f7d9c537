use axum::{Extension, Json, extract::State};
use uuid::Uuid;

use crate::constants::*;
use crate::database::Db;
use crate::error::{AppError, AppJson, AppResult};
use crate::models::{Budget, CreateBudgetPayload, User};
use crate::state::AppState;
use crate::utils::{datetime_from_timestamp, now_utc, validate_string_length};

pub fn validate_budget_category(category: &str) -> AppResult<()> {
    validate_string_length(category, "Category", MAX_CATEGORY_NAME_LENGTH)
}

pub fn extract_budget_from_row(row: libsql::Row) -> AppResult<Budget> {
    let period: String = row.get(4)?;
    let created_at: i64 = row.get(5)?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        limit: row.get(3)?,
        period: period.parse().map_err(AppError::internal)?,
        created_at: datetime_from_timestamp(created_at)?,
    })
}

pub async fn insert_budget(db: &Db, budget: &Budget) -> AppResult<()> {
    let conn = db.write().await;
    conn.execute(
        r#"INSERT INTO budgets (id, user_id, category, "limit", period, created_at) VALUES (?, ?, ?, ?, ?, ?)"#,
        (
            budget.id.as_str(),
            budget.user_id.as_str(),
            budget.category.as_str(),
            budget.limit,
            budget.period.as_str(),
            budget.created_at.unix_timestamp(),
        ),
    )
    .await?;
    Ok(())
}

pub async fn list_budgets(db: &Db, user_id: &str) -> AppResult<Vec<Budget>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            r#"SELECT id, user_id, category, "limit", period, created_at FROM budgets
               WHERE user_id = ? ORDER BY created_at ASC, rowid ASC"#,
            [user_id],
        )
        .await?;

    let mut budgets = Vec::new();
    while let Some(row) = rows.next().await? {
        budgets.push(extract_budget_from_row(row)?);
    }
    Ok(budgets)
}

pub async fn create_budget(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppJson(payload): AppJson<CreateBudgetPayload>,
) -> AppResult<Json<Budget>> {
    validate_budget_category(&payload.category)?;

    let budget = Budget {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        category: payload.category.trim().to_string(),
        limit: payload.limit,
        period: payload.period,
        created_at: now_utc(),
    };
    insert_budget(&state.db, &budget).await?;

    tracing::info!(user_id = %user.id, budget_id = %budget.id, "budget created");
    Ok(Json(budget))
}

pub async fn get_budgets(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<Budget>>> {
    Ok(Json(list_budgets(&state.db, &user.id).await?))
}
