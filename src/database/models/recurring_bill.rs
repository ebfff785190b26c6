use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::summary::bill_status::DueDay;

// a monthly bill template; individual payments are transactions linked via recurring_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBill {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub category: String,
    pub amount: Decimal,                    // signed, expenses negative
    pub last_paid: Option<NaiveDateTime>,   // latest linked transaction
    pub due_date: String,                   // day of month "1".."31"
    pub theme: String,
    pub recurring: bool,
}

impl RecurringBill {
    /// `None` when the stored due date is not a usable day of month.
    pub fn due_day(&self) -> Option<DueDay> {
        DueDay::parse(&self.due_date).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillInput {
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub due_date: String,
    pub theme: String,
}
