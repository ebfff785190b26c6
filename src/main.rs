// src/main.rs
use std::env;

use dotenvy::dotenv;
use finance_tracker_api::backend::{self, AppState};
use finance_tracker_api::config::Config;
use finance_tracker_api::database::db::{connection, migrate};
use finance_tracker_api::logging;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    logging::init_tracing(config.log_json);

    let pool = connection::get_db_pool(&config).await?;
    migrate::run_migrations(&pool).await?;

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("migrate") => {
            info!("migrations only, exiting");
        }
        None | Some("server") => {
            info!(database = %config.database_url, overflow = ?config.bill_rules.overflow, "starting backend server");
            backend::run_server(AppState::new(pool, config)).await?;
        }
        Some(other) => {
            anyhow::bail!("unknown command `{other}` (expected `server` or `migrate`)");
        }
    }
    Ok(())
}
