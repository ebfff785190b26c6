use serde::{Serialize, Deserialize};
use rust_decimal::Decimal;

// monthly spending cap for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub maximum: Decimal,
    pub theme: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetInput {
    pub category: String,
    pub maximum: Decimal,
    pub theme: String,
}
