pub mod user;
pub mod recurring_bill;
pub mod transaction;
pub mod budget;
pub mod pot;
pub mod settings;

pub use user::{NewUser, User};
pub use recurring_bill::{BillInput, RecurringBill};
pub use transaction::{Transaction, TransactionInput};
pub use budget::{Budget, BudgetInput};
pub use pot::{Pot, PotInput, PotMovement};
pub use settings::{Settings, SettingsInput};
