use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{
    BillInput, Budget, BudgetInput, Pot, PotInput, RecurringBill, Settings, Transaction,
    TransactionInput, User,
};
/*
SQL for every table the API owns. Each function is scoped to one user:
rows of other users are invisible (not found) rather than forbidden.
 */

const BILL_COLUMNS: &str = "id, user_id, name, category, amount, last_paid, due_date, theme";
const TXN_COLUMNS: &str = "id, user_id, name, category, date, amount, theme, recurring_id";
const BUDGET_COLUMNS: &str = "id, user_id, category, maximum, theme";
const POT_COLUMNS: &str = "id, user_id, name, target, total, theme";

// money is stored as TEXT; parse it back the same way everywhere
fn decimal_col(row: &SqliteRow, col: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(col)?;
    Decimal::from_str(&text)
        .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for {}: {}", col, e).into()))
}

fn bill_from_row(row: &SqliteRow) -> Result<RecurringBill, sqlx::Error> {
    Ok(RecurringBill {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        amount: decimal_col(row, "amount")?,
        last_paid: row.try_get("last_paid")?,
        due_date: row.try_get("due_date")?,
        theme: row.try_get("theme")?,
        recurring: true,
    })
}

fn txn_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    let recurring_id: Option<i64> = row.try_get("recurring_id")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        date: row.try_get("date")?,
        amount: decimal_col(row, "amount")?,
        theme: row.try_get("theme")?,
        recurring: recurring_id.is_some(),
        recurring_id,
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<Budget, sqlx::Error> {
    Ok(Budget {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        category: row.try_get("category")?,
        maximum: decimal_col(row, "maximum")?,
        theme: row.try_get("theme")?,
    })
}

fn pot_from_row(row: &SqliteRow) -> Result<Pot, sqlx::Error> {
    Ok(Pot {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        target: decimal_col(row, "target")?,
        total: decimal_col(row, "total")?,
        theme: row.try_get("theme")?,
    })
}

/*==========User Queries=========== */

pub async fn create_user(pool: &Pool<Sqlite>, name: &str, now: NaiveDateTime) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, created_at)
        VALUES (?, ?)
        RETURNING id, name, created_at
        "#,
    )
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/*==========Recurring Bill Queries=========== */

pub async fn list_bills(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<RecurringBill>, sqlx::Error> {
    let sql = format!(
        "SELECT {BILL_COLUMNS} FROM recurring_bills WHERE user_id = ? ORDER BY CAST(due_date AS INTEGER) ASC, id ASC"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(bill_from_row)
        .collect()
}

pub async fn get_bill(pool: &Pool<Sqlite>, user_id: i64, bill_id: i64) -> Result<Option<RecurringBill>, sqlx::Error> {
    let sql = format!("SELECT {BILL_COLUMNS} FROM recurring_bills WHERE id = ? AND user_id = ?");
    sqlx::query(&sql)
        .bind(bill_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(bill_from_row)
        .transpose()
}

pub async fn create_bill(pool: &Pool<Sqlite>, user_id: i64, b: &BillInput) -> Result<RecurringBill, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO recurring_bills (user_id, name, category, amount, due_date, theme)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {BILL_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(&b.name)
        .bind(&b.category)
        .bind(b.amount.to_string())
        .bind(b.due_date.trim())
        .bind(&b.theme)
        .fetch_one(pool)
        .await?;

    bill_from_row(&row)
}

// last_paid is derived from linked transactions and is never written here
pub async fn update_bill(
    pool: &Pool<Sqlite>,
    user_id: i64,
    bill_id: i64,
    b: &BillInput,
) -> Result<Option<RecurringBill>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE recurring_bills
        SET name = ?, category = ?, amount = ?, due_date = ?, theme = ?
        WHERE id = ? AND user_id = ?
        RETURNING {BILL_COLUMNS}
        "#
    );
    sqlx::query(&sql)
        .bind(&b.name)
        .bind(&b.category)
        .bind(b.amount.to_string())
        .bind(b.due_date.trim())
        .bind(&b.theme)
        .bind(bill_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(bill_from_row)
        .transpose()
}

pub async fn delete_bill(pool: &Pool<Sqlite>, user_id: i64, bill_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM recurring_bills WHERE id = ? AND user_id = ?")
        .bind(bill_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// last_paid = date of the latest linked transaction, NULL when none is left
async fn refresh_last_paid(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    bill_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE recurring_bills
        SET last_paid = (SELECT MAX(date) FROM transactions WHERE recurring_id = ?)
        WHERE id = ?
        "#,
    )
    .bind(bill_id)
    .bind(bill_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

 /*==========Transaction Queries=========== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionSort {
    #[default]
    Latest,
    Oldest,
    NameAsc,
    NameDesc,
    Highest,
    Lowest,
}

impl TransactionSort {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latest" => Some(Self::Latest),
            "oldest" => Some(Self::Oldest),
            "a-z" => Some(Self::NameAsc),
            "z-a" => Some(Self::NameDesc),
            "highest" => Some(Self::Highest),
            "lowest" => Some(Self::Lowest),
            _ => None,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Latest => "date DESC, id DESC",
            Self::Oldest => "date ASC, id ASC",
            Self::NameAsc => "name COLLATE NOCASE ASC, id ASC",
            Self::NameDesc => "name COLLATE NOCASE DESC, id DESC",
            Self::Highest => "CAST(amount AS REAL) DESC, id DESC",
            Self::Lowest => "CAST(amount AS REAL) ASC, id ASC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: TransactionSort,
    pub limit: i64,
    pub offset: i64,
}

// `LIKE` pattern matching `needle` anywhere, with its own wildcards taken literally
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// One page of the user's transactions and the number of rows matching the filter.
pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    user_id: i64,
    filter: &TransactionFilter,
) -> Result<(Vec<Transaction>, i64), sqlx::Error> {
    let category = filter.category.as_deref();
    let search = filter.search.as_deref().map(contains_pattern);

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM transactions
        WHERE user_id = ?
          AND (? IS NULL OR category = ?)
          AND (? IS NULL OR name LIKE ? ESCAPE '\')
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(category)
    .bind(search.as_deref())
    .bind(search.as_deref())
    .fetch_one(pool)
    .await?;

    let sql = format!(
        r#"
        SELECT {TXN_COLUMNS}
        FROM transactions
        WHERE user_id = ?
          AND (? IS NULL OR category = ?)
          AND (? IS NULL OR name LIKE ? ESCAPE '\')
        ORDER BY {}
        LIMIT ? OFFSET ?
        "#,
        filter.sort.order_by()
    );
    let txns = sqlx::query(&sql)
        .bind(user_id)
        .bind(category)
        .bind(category)
        .bind(search.as_deref())
        .bind(search.as_deref())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?
        .iter()
        .map(txn_from_row)
        .collect::<Result<Vec<Transaction>, sqlx::Error>>()?;

    Ok((txns, total))
}

/// All of the user's transactions dated within `[start, end)`, newest first.
pub async fn transactions_between(
    pool: &Pool<Sqlite>,
    user_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {TXN_COLUMNS}
        FROM transactions
        WHERE user_id = ? AND date >= ? AND date < ?
        ORDER BY date DESC, id DESC
        "#
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?
        .iter()
        .map(txn_from_row)
        .collect()
}

/* Recording a payment of a recurring bill moves the bill's last_paid.
The insert and the bill update share one SQL transaction so a reader never
sees one without the other. */

pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    t: &TransactionInput,
) -> Result<Transaction, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        r#"
        INSERT INTO transactions (user_id, name, category, date, amount, theme, recurring_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {TXN_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(&t.name)
        .bind(&t.category)
        .bind(t.date)
        .bind(t.amount.to_string())
        .bind(&t.theme)
        .bind(t.recurring_id)
        .fetch_one(&mut *tx)
        .await?;
    let created = txn_from_row(&row)?;

    if let Some(bill_id) = created.recurring_id {
        refresh_last_paid(&mut tx, bill_id).await?;
    }

    tx.commit().await?;

    Ok(created)
}

pub async fn update_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    txn_id: i64,
    t: &TransactionInput,
) -> Result<Option<Transaction>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let previous: Option<Option<i64>> = sqlx::query_scalar(
        "SELECT recurring_id FROM transactions WHERE id = ? AND user_id = ?",
    )
    .bind(txn_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(previous_bill) = previous else {
        return Ok(None);
    };

    let sql = format!(
        r#"
        UPDATE transactions
        SET name = ?, category = ?, date = ?, amount = ?, theme = ?, recurring_id = ?
        WHERE id = ? AND user_id = ?
        RETURNING {TXN_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&t.name)
        .bind(&t.category)
        .bind(t.date)
        .bind(t.amount.to_string())
        .bind(&t.theme)
        .bind(t.recurring_id)
        .bind(txn_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
    let updated = txn_from_row(&row)?;

    // both the bill it left and the bill it joined may have a new latest payment
    if let Some(bill_id) = previous_bill {
        refresh_last_paid(&mut tx, bill_id).await?;
    }
    if let Some(bill_id) = updated.recurring_id.filter(|id| Some(*id) != previous_bill) {
        refresh_last_paid(&mut tx, bill_id).await?;
    }

    tx.commit().await?;

    Ok(Some(updated))
}

pub async fn delete_transaction(pool: &Pool<Sqlite>, user_id: i64, txn_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted: Option<Option<i64>> = sqlx::query_scalar(
        "DELETE FROM transactions WHERE id = ? AND user_id = ? RETURNING recurring_id",
    )
    .bind(txn_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(bill) = deleted else {
        return Ok(false);
    };
    if let Some(bill_id) = bill {
        refresh_last_paid(&mut tx, bill_id).await?;
    }

    tx.commit().await?;

    Ok(true)
}

// ====================Budget Queries======================

pub async fn list_budgets(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Budget>, sqlx::Error> {
    let sql = format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE user_id = ? ORDER BY id ASC");
    sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(budget_from_row)
        .collect()
}

// (user_id, category) is unique: a second budget for a category is a constraint violation
pub async fn create_budget(pool: &Pool<Sqlite>, user_id: i64, b: &BudgetInput) -> Result<Budget, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO budgets (user_id, category, maximum, theme)
        VALUES (?, ?, ?, ?)
        RETURNING {BUDGET_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(&b.category)
        .bind(b.maximum.to_string())
        .bind(&b.theme)
        .fetch_one(pool)
        .await?;

    budget_from_row(&row)
}

pub async fn update_budget(
    pool: &Pool<Sqlite>,
    user_id: i64,
    budget_id: i64,
    b: &BudgetInput,
) -> Result<Option<Budget>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE budgets
        SET category = ?, maximum = ?, theme = ?
        WHERE id = ? AND user_id = ?
        RETURNING {BUDGET_COLUMNS}
        "#
    );
    sqlx::query(&sql)
        .bind(&b.category)
        .bind(b.maximum.to_string())
        .bind(&b.theme)
        .bind(budget_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(budget_from_row)
        .transpose()
}

pub async fn delete_budget(pool: &Pool<Sqlite>, user_id: i64, budget_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budgets WHERE id = ? AND user_id = ?")
        .bind(budget_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ====================Pot Queries======================

pub async fn list_pots(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Pot>, sqlx::Error> {
    let sql = format!("SELECT {POT_COLUMNS} FROM pots WHERE user_id = ? ORDER BY id ASC");
    sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(pot_from_row)
        .collect()
}

pub async fn create_pot(pool: &Pool<Sqlite>, user_id: i64, p: &PotInput) -> Result<Pot, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO pots (user_id, name, target, total, theme)
        VALUES (?, ?, ?, '0', ?)
        RETURNING {POT_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(&p.name)
        .bind(p.target.to_string())
        .bind(&p.theme)
        .fetch_one(pool)
        .await?;

    pot_from_row(&row)
}

pub async fn update_pot(
    pool: &Pool<Sqlite>,
    user_id: i64,
    pot_id: i64,
    p: &PotInput,
) -> Result<Option<Pot>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE pots
        SET name = ?, target = ?, theme = ?
        WHERE id = ? AND user_id = ?
        RETURNING {POT_COLUMNS}
        "#
    );
    sqlx::query(&sql)
        .bind(&p.name)
        .bind(p.target.to_string())
        .bind(&p.theme)
        .bind(pot_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .as_ref()
        .map(pot_from_row)
        .transpose()
}

pub async fn delete_pot(pool: &Pool<Sqlite>, user_id: i64, pot_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pots WHERE id = ? AND user_id = ?")
        .bind(pot_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PotMove {
    Moved(Pot),
    NotFound,
    InsufficientFunds,
}

/// Add `delta` (negative to withdraw) to a pot's total; the total never drops below zero.
///
/// The write only lands if the total is still the one read, so concurrent moves
/// on one pot retry instead of overwriting each other.
pub async fn move_pot_funds(
    pool: &Pool<Sqlite>,
    user_id: i64,
    pot_id: i64,
    delta: Decimal,
) -> Result<PotMove, sqlx::Error> {
    let sql = format!("SELECT {POT_COLUMNS} FROM pots WHERE id = ? AND user_id = ?");

    loop {
        let Some(row) = sqlx::query(&sql)
            .bind(pot_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(PotMove::NotFound);
        };
        let stored_total: String = row.try_get("total")?;
        let mut pot = pot_from_row(&row)?;

        let new_total = pot.total + delta;
        if new_total < Decimal::ZERO {
            return Ok(PotMove::InsufficientFunds);
        }

        let result = sqlx::query("UPDATE pots SET total = ? WHERE id = ? AND user_id = ? AND total = ?")
            .bind(new_total.to_string())
            .bind(pot_id)
            .bind(user_id)
            .bind(stored_total)
            .execute(pool)
            .await?;

        if result.rows_affected() == 1 {
            pot.total = new_total;
            return Ok(PotMove::Moved(pot));
        }
    }
}

// ====================Settings Queries======================

pub async fn get_settings(pool: &Pool<Sqlite>, user_id: i64) -> Result<Settings, sqlx::Error> {
    let row = sqlx::query("SELECT currency, font, enabled_modules FROM settings WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(Settings::defaults_for(user_id));
    };

    let modules_json: String = row.try_get("enabled_modules")?;
    let enabled_modules: Vec<String> = serde_json::from_str(&modules_json)
        .map_err(|e| sqlx::Error::Decode(format!("Invalid enabled_modules: {}", e).into()))?;

    Ok(Settings {
        user_id,
        currency: row.try_get("currency")?,
        font: row.try_get("font")?,
        enabled_modules,
    })
}

pub async fn save_settings(pool: &Pool<Sqlite>, s: &Settings) -> Result<(), sqlx::Error> {
    let modules_json = serde_json::to_string(&s.enabled_modules)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        r#"
        INSERT INTO settings (user_id, currency, font, enabled_modules)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            currency = excluded.currency,
            font = excluded.font,
            enabled_modules = excluded.enabled_modules
        "#,
    )
    .bind(s.user_id)
    .bind(&s.currency)
    .bind(&s.font)
    .bind(modules_json)
    .execute(pool)
    .await?;

    Ok(())
}
