use axum::{
    Extension, Json,
    extract::{Path, State},
};
use libsql::{Connection, Value};
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::constants::*;
use crate::database::Db;
use crate::error::{AppError, AppJson, AppQuery, AppResult};
use crate::models::{
    GetTransactionsQuery, MessageResponse, Transaction, TransactionFilter, TransactionPayload, User,
};
use crate::state::AppState;
use crate::utils::{
    datetime_from_timestamp, now_utc, validate_offset, validate_string_length,
    validate_transactions_limit,
};

const TRANSACTION_COLUMNS: &str = "id, user_id, type, amount, category, description, \
     payment_type, tags, date, created_at, deleted";

pub fn extract_transaction_from_row(row: libsql::Row) -> AppResult<Transaction> {
    let kind: String = row.get(2)?;
    let tags: String = row.get(7)?;
    let date: i64 = row.get(8)?;
    let created_at: i64 = row.get(9)?;
    let deleted: i64 = row.get(10)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: kind.parse().map_err(AppError::internal)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        payment_type: row.get(6)?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| AppError::internal(format!("invalid stored tags: {}", e)))?,
        date: datetime_from_timestamp(date)?,
        created_at: datetime_from_timestamp(created_at)?,
        deleted: deleted != 0,
    })
}

pub fn validate_transaction_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }
    if amount > MAX_TRANSACTION_AMOUNT {
        return Err(AppError::bad_request(format!(
            "Amount cannot exceed {:.0}",
            MAX_TRANSACTION_AMOUNT
        )));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> AppResult<()> {
    if tags.len() > MAX_TAGS {
        return Err(AppError::bad_request(format!(
            "At most {} tags are allowed",
            MAX_TAGS
        )));
    }
    for tag in tags {
        validate_string_length(tag, "Tag", MAX_TAG_LENGTH)?;
    }
    Ok(())
}

pub fn validate_transaction(payload: &TransactionPayload) -> AppResult<()> {
    validate_transaction_amount(payload.amount)?;
    validate_string_length(&payload.category, "Category", MAX_CATEGORY_NAME_LENGTH)?;
    if payload.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::bad_request(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    validate_string_length(&payload.payment_type, "Payment type", MAX_PAYMENT_TYPE_LENGTH)?;
    validate_tags(&payload.tags)
}

fn normalize_date(date: OffsetDateTime) -> OffsetDateTime {
    let utc = date.to_offset(UtcOffset::UTC);
    utc.replace_nanosecond(0).unwrap_or(utc)
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|tag| tag.trim().to_string()).collect()
}

/// Validates `payload` and turns it into a new transaction owned by `user_id`.
pub fn build_transaction(
    user_id: &str,
    payload: &TransactionPayload,
    now: OffsetDateTime,
) -> AppResult<Transaction> {
    validate_transaction(payload)?;

    Ok(Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        kind: payload.kind,
        amount: payload.amount,
        category: payload.category.trim().to_string(),
        description: payload.description.trim().to_string(),
        payment_type: payload.payment_type.trim().to_string(),
        tags: clean_tags(&payload.tags),
        date: normalize_date(payload.date.unwrap_or(now)),
        created_at: normalize_date(now),
        deleted: false,
    })
}

fn encode_tags(tags: &[String]) -> AppResult<String> {
    serde_json::to_string(tags).map_err(|e| AppError::internal(format!("invalid tags: {}", e)))
}

pub async fn insert_transaction(db: &Db, transaction: &Transaction) -> AppResult<()> {
    let tags = encode_tags(&transaction.tags)?;
    let conn = db.write().await;
    conn.execute(
        &format!(
            "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TRANSACTION_COLUMNS
        ),
        libsql::params![
            transaction.id.as_str(),
            transaction.user_id.as_str(),
            transaction.kind.as_str(),
            transaction.amount,
            transaction.category.as_str(),
            transaction.description.as_str(),
            transaction.payment_type.as_str(),
            tags,
            transaction.date.unix_timestamp(),
            transaction.created_at.unix_timestamp(),
            transaction.deleted as i64
        ],
    )
    .await?;
    Ok(())
}

async fn fetch_owned(conn: &Connection, user_id: &str, id: &str) -> AppResult<Option<Transaction>> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM transactions WHERE id = ? AND user_id = ? AND deleted = 0",
                TRANSACTION_COLUMNS
            ),
            [id, user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_transaction_from_row(row)?)),
        None => Ok(None),
    }
}

/// Looks up a live transaction owned by `user_id`.
pub async fn find_transaction(db: &Db, user_id: &str, id: &str) -> AppResult<Option<Transaction>> {
    let conn = db.read().await;
    fetch_owned(&conn, user_id, id).await
}

/// Lists the user's live transactions, newest first.
pub async fn query_transactions(
    db: &Db,
    user_id: &str,
    filter: &TransactionFilter,
) -> AppResult<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id = ? AND deleted = 0",
        TRANSACTION_COLUMNS
    );
    let mut params = vec![Value::Text(user_id.to_string())];

    if let Some(category) = &filter.category {
        sql.push_str(" AND category = ?");
        params.push(Value::Text(category.clone()));
    }
    if let Some(kind) = filter.kind {
        sql.push_str(" AND type = ?");
        params.push(Value::Text(kind.as_str().to_string()));
    }
    sql.push_str(" ORDER BY date DESC, created_at DESC, rowid DESC LIMIT ? OFFSET ?");
    params.push(Value::Integer(filter.limit as i64));
    params.push(Value::Integer(filter.offset as i64));

    let conn = db.read().await;
    let mut rows = conn.query(&sql, params).await?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

/// All live transactions dated at or after `since`, newest first.
pub async fn transactions_since(
    db: &Db,
    user_id: &str,
    since: OffsetDateTime,
) -> AppResult<Vec<Transaction>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM transactions WHERE user_id = ? AND deleted = 0 AND date >= ? \
                 ORDER BY date DESC, created_at DESC, rowid DESC",
                TRANSACTION_COLUMNS
            ),
            libsql::params![user_id, since.unix_timestamp()],
        )
        .await?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

/// Replaces the editable fields of an owned, live transaction. Keeps the stored
/// date when the payload leaves it out.
pub async fn replace_transaction(
    db: &Db,
    user_id: &str,
    id: &str,
    payload: &TransactionPayload,
) -> AppResult<Transaction> {
    validate_transaction(payload)?;

    let conn = db.write().await;
    let existing = fetch_owned(&conn, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found(ERR_TRANSACTION_NOT_FOUND))?;

    let updated = Transaction {
        kind: payload.kind,
        amount: payload.amount,
        category: payload.category.trim().to_string(),
        description: payload.description.trim().to_string(),
        payment_type: payload.payment_type.trim().to_string(),
        tags: clean_tags(&payload.tags),
        date: payload.date.map(normalize_date).unwrap_or(existing.date),
        ..existing
    };

    let affected = conn
        .execute(
            "UPDATE transactions SET type = ?, amount = ?, category = ?, description = ?, \
             payment_type = ?, tags = ?, date = ? \
             WHERE id = ? AND user_id = ? AND deleted = 0",
            libsql::params![
                updated.kind.as_str(),
                updated.amount,
                updated.category.as_str(),
                updated.description.as_str(),
                updated.payment_type.as_str(),
                encode_tags(&updated.tags)?,
                updated.date.unix_timestamp(),
                id,
                user_id
            ],
        )
        .await?;

    if affected == 0 {
        return Err(AppError::not_found(ERR_TRANSACTION_NOT_FOUND));
    }
    Ok(updated)
}

/// Flags an owned, live transaction as deleted. The row is kept.
pub async fn soft_delete_transaction(db: &Db, user_id: &str, id: &str) -> AppResult<()> {
    let conn = db.write().await;
    let affected = conn
        .execute(
            "UPDATE transactions SET deleted = 1 WHERE id = ? AND user_id = ? AND deleted = 0",
            [id, user_id],
        )
        .await?;

    if affected == 0 {
        return Err(AppError::not_found(ERR_TRANSACTION_NOT_FOUND));
    }
    Ok(())
}

pub fn build_filter(query: GetTransactionsQuery) -> AppResult<TransactionFilter> {
    let category = match query.category {
        Some(category) if !category.trim().is_empty() => Some(category.trim().to_string()),
        _ => None,
    };

    Ok(TransactionFilter {
        limit: validate_transactions_limit(query.limit)?,
        offset: validate_offset(query.offset)?,
        category,
        kind: query.kind,
    })
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppJson(payload): AppJson<TransactionPayload>,
) -> AppResult<Json<Transaction>> {
    let transaction = build_transaction(&user.id, &payload, now_utc())?;
    insert_transaction(&state.db, &transaction).await?;

    tracing::info!(
        user_id = %user.id,
        transaction_id = %transaction.id,
        kind = %transaction.kind,
        "transaction created"
    );
    Ok(Json(transaction))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<GetTransactionsQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    let filter = build_filter(query)?;
    let transactions = query_transactions(&state.db, &user.id, &filter).await?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> AppResult<Json<Transaction>> {
    find_transaction(&state.db, &user.id, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(ERR_TRANSACTION_NOT_FOUND))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<TransactionPayload>,
) -> AppResult<Json<Transaction>> {
    let transaction = replace_transaction(&state.db, &user.id, &id, &payload).await?;
    tracing::info!(user_id = %user.id, transaction_id = %id, "transaction updated");
    Ok(Json(transaction))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    soft_delete_transaction(&state.db, &user.id, &id).await?;
    tracing::info!(user_id = %user.id, transaction_id = %id, "transaction deleted");
    Ok(Json(MessageResponse {
        message: "Transaction deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use axum::http::StatusCode;

    fn payload(kind: TransactionType, amount: f64) -> TransactionPayload {
        TransactionPayload {
            kind,
            amount,
            category: " Food ".to_string(),
            description: "Lunch".to_string(),
            payment_type: DEFAULT_PAYMENT_TYPE.to_string(),
            tags: vec![" work ".to_string()],
            date: None,
        }
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = build_transaction("u1", &payload(TransactionType::Expense, amount), now_utc())
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn amounts_above_maximum_are_rejected() {
        assert!(validate_transaction_amount(MAX_TRANSACTION_AMOUNT).is_ok());
        for amount in [MAX_TRANSACTION_AMOUNT + 1.0, f64::MAX] {
            let err = build_transaction("u1", &payload(TransactionType::Income, amount), now_utc())
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn unknown_type_does_not_deserialize() {
        let body = r#"{"type":"transfer","amount":10,"category":"Food","description":""}"#;
        assert!(serde_json::from_str::<TransactionPayload>(body).is_err());

        let body = r#"{"type":"income","amount":10,"category":"Salary","description":""}"#;
        let parsed: TransactionPayload = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.kind, TransactionType::Income);
        assert_eq!(parsed.payment_type, DEFAULT_PAYMENT_TYPE);
        assert!(parsed.tags.is_empty());
        assert!(parsed.date.is_none());
    }

    #[test]
    fn build_stamps_owner_and_defaults_date_to_now() {
        let now = now_utc();
        let transaction =
            build_transaction("u1", &payload(TransactionType::Expense, 12.5), now).unwrap();

        assert_eq!(transaction.user_id, "u1");
        assert_eq!(transaction.category, "Food");
        assert_eq!(transaction.tags, vec!["work".to_string()]);
        assert_eq!(transaction.date, now);
        assert_eq!(transaction.created_at, now);
        assert!(!transaction.deleted);
    }

    #[test]
    fn too_many_tags_rejected() {
        let mut p = payload(TransactionType::Income, 1.0);
        p.tags = (0..=MAX_TAGS).map(|i| format!("t{}", i)).collect();
        assert!(validate_transaction(&p).is_err());
    }

    #[test]
    fn blank_category_filter_is_ignored() {
        let filter = build_filter(GetTransactionsQuery {
            category: Some("  ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter, TransactionFilter::default());
    }
}
