use anyhow::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations applied");
    Ok(())
}
