#![allow(dead_code)]

use axum::{Extension, extract::State};
use budget_tracker_server::auth::register;
use budget_tracker_server::database::init_db;
use budget_tracker_server::error::AppJson;
use budget_tracker_server::models::{
    AuthResponse, RegisterPayload, Transaction, TransactionPayload, TransactionType, User,
};
use budget_tracker_server::state::AppState;
use budget_tracker_server::token::TokenService;
use budget_tracker_server::transactions::{build_transaction, insert_transaction};
use tempfile::{TempDir, tempdir};
use time::OffsetDateTime;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "TestPass123!";

/// Fresh database in a temporary directory. Keep the `TempDir` alive for the test's duration.
pub async fn setup_test_environment() -> (AppState, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let db = init_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize database at {}: {}", data_path, e));

    (
        AppState::new(db, TokenService::new(TEST_SECRET, 60)),
        temp_dir,
    )
}

pub fn register_payload(name: &str, email: &str) -> RegisterPayload {
    RegisterPayload {
        name: name.to_string(),
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
    }
}

pub async fn register_test_user(state: &AppState, name: &str, email: &str) -> AuthResponse {
    register(State(state.clone()), AppJson(register_payload(name, email)))
        .await
        .unwrap_or_else(|e| panic!("Failed to register test user {}: {}", email, e))
        .0
}

pub async fn create_test_user(state: &AppState, email: &str) -> User {
    register_test_user(state, "Test User", email).await.user
}

pub fn transaction_payload(
    kind: TransactionType,
    amount: f64,
    category: &str,
    date: Option<OffsetDateTime>,
) -> TransactionPayload {
    TransactionPayload {
        kind,
        amount,
        category: category.to_string(),
        description: format!("{} {}", category, amount),
        payment_type: "Card".to_string(),
        tags: vec![],
        date,
    }
}

pub async fn create_test_transaction(
    state: &AppState,
    user: &User,
    kind: TransactionType,
    amount: f64,
    category: &str,
    date: OffsetDateTime,
) -> Transaction {
    let transaction = build_transaction(
        &user.id,
        &transaction_payload(kind, amount, category, Some(date)),
        OffsetDateTime::now_utc(),
    )
    .unwrap_or_else(|e| panic!("Failed to build test transaction '{}': {}", category, e));

    insert_transaction(&state.db, &transaction)
        .await
        .unwrap_or_else(|e| panic!("Failed to insert test transaction '{}': {}", category, e));

    transaction
}

pub fn as_user(user: &User) -> Extension<User> {
    Extension(user.clone())
}
