use serde::{Serialize, Deserialize};
use rust_decimal::Decimal;

// savings bucket, kept apart from the main balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pot {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target: Decimal,
    pub total: Decimal,
    pub theme: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotInput {
    pub name: String,
    pub target: Decimal,
    pub theme: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PotMovement {
    pub amount: Decimal,
}
