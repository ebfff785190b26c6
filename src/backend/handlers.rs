// src/backend/handlers.rs
use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::auth::CurrentUser;
use crate::backend::error::{ApiError, ApiResult};
use crate::backend::extract::{JsonBody, PathParam, QueryParams};
use crate::backend::AppState;
use crate::database::db::queries::{self, PotMove, TransactionFilter, TransactionSort};
use crate::database::models::settings::MODULES;
use crate::database::models::{
    BillInput, Budget, BudgetInput, NewUser, Pot, PotInput, PotMovement, RecurringBill, Settings,
    SettingsInput, Transaction, TransactionInput, User,
};
use crate::summary::{self, BillView, BudgetStats, DueDay, RecurringSummary, YearMonth};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

fn require_text(field: &'static str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::MissingInput(field.to_string()));
    }
    Ok(())
}

fn require_positive(field: &str, value: Decimal) -> ApiResult<()> {
    if value <= Decimal::ZERO {
        return Err(ApiError::Validation(format!("{field} must be greater than zero")));
    }
    Ok(())
}

/* ==========Users========== */

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_text("name", &payload.name)?;

    let user = queries::create_user(&state.db, payload.name.trim(), state.clock.now()).await?;
    info!(user_id = user.id, "user created");

    Ok((StatusCode::CREATED, Json(user)))
}

/* ==========Recurring bills========== */

fn validate_bill(b: &BillInput) -> ApiResult<()> {
    require_text("name", &b.name)?;
    require_text("category", &b.category)?;
    require_text("theme", &b.theme)?;
    DueDay::parse(&b.due_date)?;
    Ok(())
}

pub async fn list_bills(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<BillView>>> {
    let bills = queries::list_bills(&state.db, user.id()).await?;
    debug!(user_id = user.id(), count = bills.len(), "listing bills");

    let views = summary::recurring::with_status(bills, state.clock.now(), &state.config.bill_rules);
    Ok(Json(views))
}

pub async fn bill_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<RecurringSummary>> {
    let bills = queries::list_bills(&state.db, user.id()).await?;
    let stats = summary::summarize(&bills, state.clock.now(), &state.config.bill_rules);
    debug!(user_id = user.id(), bills = bills.len(), "computed bill stats");

    Ok(Json(stats))
}

pub async fn create_bill(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<BillInput>,
) -> ApiResult<(StatusCode, Json<RecurringBill>)> {
    validate_bill(&payload)?;

    let bill = queries::create_bill(&state.db, user.id(), &payload).await?;
    info!(user_id = user.id(), bill_id = bill.id, "bill created");

    Ok((StatusCode::CREATED, Json(bill)))
}

pub async fn update_bill(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(bill_id): PathParam<i64>,
    JsonBody(payload): JsonBody<BillInput>,
) -> ApiResult<Json<RecurringBill>> {
    validate_bill(&payload)?;

    let bill = queries::update_bill(&state.db, user.id(), bill_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("bill"))?;
    info!(user_id = user.id(), bill_id, "bill updated");

    Ok(Json(bill))
}

pub async fn delete_bill(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(bill_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !queries::delete_bill(&state.db, user.id(), bill_id).await? {
        return Err(ApiError::NotFound("bill"));
    }
    info!(user_id = user.id(), bill_id, "bill deleted");

    Ok(StatusCode::NO_CONTENT)
}

/* ==========Transactions========== */

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl TransactionQuery {
    fn into_filter(self) -> ApiResult<(TransactionFilter, i64, i64)> {
        let sort = match self.sort.as_deref() {
            Some(raw) => TransactionSort::parse(raw)
                .ok_or_else(|| ApiError::Validation(format!("unknown sort `{raw}`")))?,
            None => TransactionSort::default(),
        };
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(ApiError::Validation("page starts at 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ApiError::Validation(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        // "All Transactions" is how the frontend spells "no category filter"
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all transactions"));
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let filter = TransactionFilter {
            category,
            search,
            sort,
            limit: page_size,
            offset: (page - 1) * page_size,
        };
        Ok((filter, page, page_size))
    }
}

async fn validate_transaction(state: &AppState, user_id: i64, t: &TransactionInput) -> ApiResult<()> {
    require_text("name", &t.name)?;
    require_text("category", &t.category)?;
    require_text("theme", &t.theme)?;
    if t.amount.is_zero() {
        return Err(ApiError::Validation("amount must not be zero".to_string()));
    }
    if let Some(bill_id) = t.recurring_id {
        if queries::get_bill(&state.db, user_id, bill_id).await?.is_none() {
            return Err(ApiError::NotFound("recurring bill"));
        }
    }
    Ok(())
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
    QueryParams(query): QueryParams<TransactionQuery>,
) -> ApiResult<Json<TransactionPage>> {
    let (filter, page, page_size) = query.into_filter()?;
    let (transactions, total) = queries::list_transactions(&state.db, user.id(), &filter).await?;
    debug!(user_id = user.id(), page, total, "listing transactions");

    Ok(Json(TransactionPage {
        transactions,
        page,
        page_size,
        total,
    }))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<TransactionInput>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    validate_transaction(&state, user.id(), &payload).await?;

    let txn = queries::create_transaction(&state.db, user.id(), &payload).await?;
    info!(user_id = user.id(), transaction_id = txn.id, recurring_id = ?txn.recurring_id, "transaction recorded");

    Ok((StatusCode::CREATED, Json(txn)))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(txn_id): PathParam<i64>,
    JsonBody(payload): JsonBody<TransactionInput>,
) -> ApiResult<Json<Transaction>> {
    validate_transaction(&state, user.id(), &payload).await?;

    let txn = queries::update_transaction(&state.db, user.id(), txn_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;
    info!(user_id = user.id(), transaction_id = txn_id, "transaction updated");

    Ok(Json(txn))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(txn_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !queries::delete_transaction(&state.db, user.id(), txn_id).await? {
        return Err(ApiError::NotFound("transaction"));
    }
    info!(user_id = user.id(), transaction_id = txn_id, "transaction deleted");

    Ok(StatusCode::NO_CONTENT)
}

/* ==========Budgets========== */

fn validate_budget(b: &BudgetInput) -> ApiResult<()> {
    require_text("category", &b.category)?;
    require_text("theme", &b.theme)?;
    require_positive("maximum", b.maximum)
}

// groups rows under the requested categories; each requested category gets an entry
fn group_by_category(categories: &[String], txns: Vec<Transaction>) -> BTreeMap<String, Vec<Transaction>> {
    let mut grouped: BTreeMap<String, Vec<Transaction>> =
        categories.iter().map(|c| (c.clone(), Vec::new())).collect();
    for txn in txns {
        if let Some(bucket) = grouped.get_mut(&txn.category) {
            bucket.push(txn);
        }
    }
    grouped
}

pub async fn list_budgets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Budget>>> {
    Ok(Json(queries::list_budgets(&state.db, user.id()).await?))
}

pub async fn budget_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<BudgetStats>> {
    let budgets = queries::list_budgets(&state.db, user.id()).await?;
    let month = YearMonth::containing(state.clock.now());
    let (start, end) = month.bounds();

    let txns = queries::transactions_between(&state.db, user.id(), start, end).await?;
    let categories: Vec<String> = budgets.iter().map(|b| b.category.clone()).collect();
    let spend = summary::spend_by_category(&group_by_category(&categories, txns));
    debug!(user_id = user.id(), %month, budgets = budgets.len(), "computed budget stats");

    Ok(Json(summary::budget_progress(&budgets, &spend)))
}

pub async fn create_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<BudgetInput>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    validate_budget(&payload)?;

    let budget = queries::create_budget(&state.db, user.id(), &payload)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict(format!("a budget for `{}` already exists", payload.category))
            }
            other => other,
        })?;
    info!(user_id = user.id(), budget_id = budget.id, "budget created");

    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn update_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(budget_id): PathParam<i64>,
    JsonBody(payload): JsonBody<BudgetInput>,
) -> ApiResult<Json<Budget>> {
    validate_budget(&payload)?;

    let budget = queries::update_budget(&state.db, user.id(), budget_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("budget"))?;
    info!(user_id = user.id(), budget_id, "budget updated");

    Ok(Json(budget))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(budget_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !queries::delete_budget(&state.db, user.id(), budget_id).await? {
        return Err(ApiError::NotFound("budget"));
    }
    info!(user_id = user.id(), budget_id, "budget deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategoriesRequest {
    pub category_names: Option<Vec<String>>,
    pub month: Option<String>,
}

pub async fn budget_categories(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<BudgetCategoriesRequest>,
) -> ApiResult<Json<BTreeMap<String, Vec<Transaction>>>> {
    let categories = payload
        .category_names
        .ok_or_else(|| ApiError::MissingInput("categoryNames".to_string()))?;
    let month: YearMonth = payload
        .month
        .ok_or_else(|| ApiError::MissingInput("month".to_string()))?
        .parse()
        .map_err(ApiError::Validation)?;

    let (start, end) = month.bounds();
    let txns = queries::transactions_between(&state.db, user.id(), start, end).await?;
    debug!(user_id = user.id(), %month, categories = categories.len(), "budget category transactions");

    Ok(Json(group_by_category(&categories, txns)))
}

/* ==========Pots========== */

fn validate_pot(p: &PotInput) -> ApiResult<()> {
    require_text("name", &p.name)?;
    require_text("theme", &p.theme)?;
    require_positive("target", p.target)
}

pub async fn list_pots(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Pot>>> {
    Ok(Json(queries::list_pots(&state.db, user.id()).await?))
}

pub async fn create_pot(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<PotInput>,
) -> ApiResult<(StatusCode, Json<Pot>)> {
    validate_pot(&payload)?;

    let pot = queries::create_pot(&state.db, user.id(), &payload).await?;
    info!(user_id = user.id(), pot_id = pot.id, "pot created");

    Ok((StatusCode::CREATED, Json(pot)))
}

pub async fn update_pot(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(pot_id): PathParam<i64>,
    JsonBody(payload): JsonBody<PotInput>,
) -> ApiResult<Json<Pot>> {
    validate_pot(&payload)?;

    let pot = queries::update_pot(&state.db, user.id(), pot_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("pot"))?;
    info!(user_id = user.id(), pot_id, "pot updated");

    Ok(Json(pot))
}

pub async fn delete_pot(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(pot_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    if !queries::delete_pot(&state.db, user.id(), pot_id).await? {
        return Err(ApiError::NotFound("pot"));
    }
    info!(user_id = user.id(), pot_id, "pot deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn move_funds(state: &AppState, user_id: i64, pot_id: i64, delta: Decimal) -> ApiResult<Json<Pot>> {
    match queries::move_pot_funds(&state.db, user_id, pot_id, delta).await? {
        PotMove::Moved(pot) => {
            info!(user_id, pot_id, %delta, total = %pot.total, "pot balance moved");
            Ok(Json(pot))
        }
        PotMove::NotFound => Err(ApiError::NotFound("pot")),
        PotMove::InsufficientFunds => Err(ApiError::InsufficientFunds),
    }
}

pub async fn deposit_to_pot(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(pot_id): PathParam<i64>,
    JsonBody(payload): JsonBody<PotMovement>,
) -> ApiResult<Json<Pot>> {
    require_positive("amount", payload.amount)?;
    move_funds(&state, user.id(), pot_id, payload.amount).await
}

pub async fn withdraw_from_pot(
    State(state): State<AppState>,
    user: CurrentUser,
    PathParam(pot_id): PathParam<i64>,
    JsonBody(payload): JsonBody<PotMovement>,
) -> ApiResult<Json<Pot>> {
    require_positive("amount", payload.amount)?;
    move_funds(&state, user.id(), pot_id, -payload.amount).await
}

/* ==========Settings========== */

pub async fn get_settings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Settings>> {
    Ok(Json(queries::get_settings(&state.db, user.id()).await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<SettingsInput>,
) -> ApiResult<Json<Settings>> {
    let mut settings = queries::get_settings(&state.db, user.id()).await?;

    if let Some(currency) = payload.currency {
        let currency = currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ApiError::Validation(format!(
                "currency `{currency}` is not a three letter code"
            )));
        }
        settings.currency = currency;
    }
    if let Some(font) = payload.font {
        require_text("font", &font)?;
        settings.font = font.trim().to_string();
    }
    if let Some(modules) = payload.enabled_modules {
        if let Some(unknown) = modules.iter().find(|m| !MODULES.contains(&m.as_str())) {
            return Err(ApiError::Validation(format!("unknown module `{unknown}`")));
        }
        let mut modules = modules;
        modules.sort_by_key(|m| MODULES.iter().position(|known| *known == m.as_str()));
        modules.dedup();
        settings.enabled_modules = modules;
    }

    queries::save_settings(&state.db, &settings).await?;
    info!(user_id = user.id(), "settings saved");

    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_first_page_of_latest() {
        let (filter, page, page_size) = TransactionQuery::default().into_filter().unwrap();
        assert_eq!(page, 1);
        assert_eq!(page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.sort, TransactionSort::Latest);
        assert_eq!(filter.offset, 0);
        assert!(filter.category.is_none());
    }

    #[test]
    fn query_offsets_and_category_filter() {
        let query = TransactionQuery {
            category: Some("All Transactions".to_string()),
            search: Some("  ".to_string()),
            sort: Some("a-z".to_string()),
            page: Some(3),
            page_size: Some(20),
        };
        let (filter, _, _) = query.into_filter().unwrap();
        assert_eq!(filter.offset, 40);
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.sort, TransactionSort::NameAsc);
        assert!(filter.category.is_none());
        assert!(filter.search.is_none());
    }

    #[test]
    fn query_rejects_bad_paging() {
        let bad_page = TransactionQuery {
            page: Some(0),
            ..TransactionQuery::default()
        };
        assert!(matches!(bad_page.into_filter(), Err(ApiError::Validation(_))));

        let bad_sort = TransactionQuery {
            sort: Some("random".to_string()),
            ..TransactionQuery::default()
        };
        assert!(matches!(bad_sort.into_filter(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn grouping_keeps_every_requested_category() {
        let txn = |category: &str| Transaction {
            id: 1,
            user_id: 1,
            name: "x".to_string(),
            category: category.to_string(),
            date: chrono::NaiveDateTime::parse_from_str("2024-06-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            amount: Decimal::from(-5),
            theme: "#000".to_string(),
            recurring: false,
            recurring_id: None,
        };
        let grouped = group_by_category(
            &["Bills".to_string(), "Groceries".to_string()],
            vec![txn("Bills"), txn("Dining Out"), txn("Bills")],
        );
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["Bills"].len(), 2);
        assert!(grouped["Groceries"].is_empty());
    }
}
