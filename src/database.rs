use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

const DATABASE_FILE: &str = "budget.db";

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              TEXT    PRIMARY KEY,
    name            TEXT    NOT NULL,
    email           TEXT    UNIQUE NOT NULL,
    currency        TEXT    NOT NULL,
    monthly_budget  REAL    NOT NULL,
    password_hash   TEXT    NOT NULL,
    created_at      INTEGER NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id            TEXT    PRIMARY KEY,
    user_id       TEXT    NOT NULL REFERENCES users(id),
    type          TEXT    NOT NULL CHECK (type IN ('income', 'expense')),
    amount        REAL    NOT NULL CHECK (amount > 0),
    category      TEXT    NOT NULL,
    description   TEXT    NOT NULL,
    payment_type  TEXT    NOT NULL,
    tags          TEXT    NOT NULL DEFAULT '[]',
    date          INTEGER NOT NULL,
    created_at    INTEGER NOT NULL,
    deleted       INTEGER NOT NULL DEFAULT 0
);
"#;

const CREATE_TRANSACTIONS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_user_date
    ON transactions (user_id, deleted, date DESC);
"#;

const CREATE_BUDGETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS budgets (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL REFERENCES users(id),
    category    TEXT    NOT NULL,
    "limit"     REAL    NOT NULL,
    period      TEXT    NOT NULL CHECK (period IN ('daily', 'weekly', 'monthly')),
    created_at  INTEGER NOT NULL
);
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Opens (or creates) the application database under `data_dir` and applies the schema.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    for statement in [
        CREATE_USERS_TABLE,
        CREATE_TRANSACTIONS_TABLE,
        CREATE_TRANSACTIONS_INDEX,
        CREATE_BUDGETS_TABLE,
    ] {
        conn.execute(statement, ()).await?;
    }

    tracing::debug!(data_dir, "database schema ready");
    Ok(Arc::new(RwLock::new(conn)))
}
