use axum::{Extension, Json, extract::State};

use crate::constants::*;
use crate::database::Db;
use crate::error::{AppError, AppJson, AppResult};
use crate::models::{UpdateSettingsPayload, User};
use crate::state::AppState;
use crate::utils::{datetime_from_timestamp, validate_string_length};

const USER_COLUMNS: &str = "id, name, email, currency, monthly_budget, password_hash, created_at";

pub fn extract_user_from_row(row: libsql::Row) -> AppResult<User> {
    let created_at: i64 = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        currency: row.get(3)?,
        monthly_budget: row.get(4)?,
        password_hash: row.get(5)?,
        created_at: datetime_from_timestamp(created_at)?,
    })
}

/// Stores a new user. A duplicate email surfaces as `400 Email already registered`.
pub async fn insert_user(db: &Db, user: &User) -> AppResult<()> {
    let conn = db.write().await;
    conn.execute(
        "INSERT INTO users (id, name, email, currency, monthly_budget, password_hash, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        libsql::params![
            user.id.as_str(),
            user.name.as_str(),
            user.email.as_str(),
            user.currency.as_str(),
            user.monthly_budget,
            user.password_hash.as_str(),
            user.created_at.unix_timestamp()
        ],
    )
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::bad_request(ERR_EMAIL_TAKEN)
        } else {
            AppError::Database(e)
        }
    })?;
    Ok(())
}

pub async fn get_user_by_email(db: &Db, email: &str) -> AppResult<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            [email],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn get_user_by_id(db: &Db, user_id: &str) -> AppResult<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            [user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(row)?)),
        None => Ok(None),
    }
}

pub fn validate_settings(payload: &UpdateSettingsPayload) -> AppResult<()> {
    if let Some(name) = &payload.name {
        validate_string_length(name, "Name", MAX_NAME_LENGTH)?;
    }
    if let Some(currency) = &payload.currency {
        validate_string_length(currency, "Currency", MAX_CURRENCY_LENGTH)?;
    }
    if let Some(budget) = payload.monthly_budget {
        if !budget.is_finite() || budget < 0.0 {
            return Err(AppError::bad_request(
                "Monthly budget must be a non-negative number",
            ));
        }
    }
    Ok(())
}

/// Applies the provided settings to `user` and persists them. Fields left out stay unchanged.
pub async fn update_user_settings(
    db: &Db,
    user: &User,
    payload: &UpdateSettingsPayload,
) -> AppResult<User> {
    validate_settings(payload)?;

    let mut updated = user.clone();
    if let Some(name) = &payload.name {
        updated.name = name.trim().to_string();
    }
    if let Some(currency) = &payload.currency {
        updated.currency = currency.trim().to_string();
    }
    if let Some(budget) = payload.monthly_budget {
        updated.monthly_budget = budget;
    }

    let conn = db.write().await;
    let affected = conn
        .execute(
            "UPDATE users SET name = ?, currency = ?, monthly_budget = ? WHERE id = ?",
            (
                updated.name.as_str(),
                updated.currency.as_str(),
                updated.monthly_budget,
                updated.id.as_str(),
            ),
        )
        .await?;

    if affected == 0 {
        return Err(AppError::unauthorized());
    }

    Ok(updated)
}

pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppJson(payload): AppJson<UpdateSettingsPayload>,
) -> AppResult<Json<User>> {
    let updated = update_user_settings(&state.db, &user, &payload).await?;
    tracing::info!(user_id = %updated.id, "user settings updated");
    Ok(Json(updated))
}
