use axum::{
    routing::{get, post, put},
    Router,
};
use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::create_user))
        .route("/bills", get(handlers::list_bills).post(handlers::create_bill))
        .route("/bills/stats", get(handlers::bill_stats))
        .route("/bills/:id", put(handlers::update_bill).delete(handlers::delete_bill))
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            put(handlers::update_transaction).delete(handlers::delete_transaction),
        )
        .route("/budgets", get(handlers::list_budgets).post(handlers::create_budget))
        .route("/budgets/stats", get(handlers::budget_stats))
        .route("/budgets/:id", put(handlers::update_budget).delete(handlers::delete_budget))
        .route("/budgetCategories", post(handlers::budget_categories))
        .route("/pots", get(handlers::list_pots).post(handlers::create_pot))
        .route("/pots/:id", put(handlers::update_pot).delete(handlers::delete_pot))
        .route("/pots/:id/deposit", post(handlers::deposit_to_pot))
        .route("/pots/:id/withdraw", post(handlers::withdraw_from_pot))
        .route("/settings", get(handlers::get_settings).put(handlers::update_settings))
}
