use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category: String,
    pub date: NaiveDateTime,
    pub amount: Decimal,            // negative = expense, positive = income/refund
    pub theme: String,
    pub recurring: bool,
    pub recurring_id: Option<i64>,  // bill this payment belongs to
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub name: String,
    pub category: String,
    pub date: NaiveDateTime,
    pub amount: Decimal,
    pub theme: String,
    #[serde(default)]
    pub recurring_id: Option<i64>,
}
