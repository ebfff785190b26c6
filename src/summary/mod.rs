//! Derived views computed per request from the caller's rows. Nothing here
//! touches the database or keeps state between calls.

pub mod bill_status;
pub mod category_spend;
pub mod recurring;

pub use bill_status::{classify, BillRules, BillStatus, DueDay, DueDayOverflow, InvalidDueDate};
pub use category_spend::{budget_progress, spend_by_category, BudgetStats, YearMonth};
pub use recurring::{summarize, BillView, RecurringSummary};
