use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::constants::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub currency: String,
    pub monthly_budget: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsPayload {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub monthly_budget: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!(
                "Type must be income or expense, got '{}'",
                other
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub payment_type: String,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub deleted: bool,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}

fn default_payment_type() -> String {
    DEFAULT_PAYMENT_TYPE.to_string()
}

/// Body of both create and update; an update replaces every editable field.
#[derive(Deserialize, Debug, Clone)]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub category: String,
    pub description: String,
    #[serde(default = "default_payment_type")]
    pub payment_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GetTransactionsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// Validated listing parameters handed to the data-access layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub limit: u32,
    pub offset: u32,
    pub category: Option<String>,
    pub kind: Option<TransactionType>,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        TransactionFilter {
            limit: DEFAULT_TRANSACTIONS_LIMIT,
            offset: 0,
            category: None,
            kind: None,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Daily => "daily",
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(BudgetPeriod::Daily),
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            other => Err(format!("Unknown budget period '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub limit: f64,
    pub period: BudgetPeriod,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateBudgetPayload {
    pub category: String,
    pub limit: f64,
    #[serde(default)]
    pub period: BudgetPeriod,
}

/// Reporting window for the dashboard. Unknown keywords fall back to a 30-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPeriod {
    Monthly,
    Weekly,
    Trailing30Days,
}

impl DashboardPeriod {
    pub fn from_keyword(keyword: Option<&str>) -> Self {
        match keyword {
            None | Some("monthly") => DashboardPeriod::Monthly,
            Some("weekly") => DashboardPeriod::Weekly,
            Some(_) => DashboardPeriod::Trailing30Days,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DashboardQuery {
    pub period: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyAmount {
    pub date: String,
    pub amount: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct DashboardData {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub budget_used_percent: f64,
    pub recent_transactions: Vec<Transaction>,
    pub category_breakdown: BTreeMap<String, f64>,
    pub monthly_trend: Vec<DailyAmount>,
}

/// Month-end outlook. Serialized without a tag, so an empty history renders as
/// `{"balance": 0, "message": ...}`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Projection {
    Forecast {
        projected_spend: f64,
        projected_balance: f64,
        message: String,
    },
    NoData {
        balance: f64,
        message: String,
    },
}

impl Projection {
    pub fn message(&self) -> &str {
        match self {
            Projection::Forecast { message, .. } | Projection::NoData { message, .. } => message,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Insights {
    pub tips: Vec<String>,
    pub projection: Projection,
}
