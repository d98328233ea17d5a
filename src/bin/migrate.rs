use storefront_order_api::{config::AppConfig, db::Db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let db = Db::new(config.database_url);
    sqlx::migrate!("./migrations").run(db.pool().await?).await?;
    println!("Migrations applied");
    Ok(())
}
