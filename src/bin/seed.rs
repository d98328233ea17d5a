use storefront_order_api::{config::AppConfig, db::Db};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let db = Db::new(config.database_url.clone());
    let pool = db.pool().await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(pool).await?;

    let customer_id = ensure_user(
        pool,
        "Asha Verma",
        "asha@example.com",
        Some("+91 98100 00000"),
        "customer",
    )
    .await?;
    ensure_user(pool, "Store Admin", "admin@example.com", None, "admin").await?;
    seed_products(pool).await?;

    println!("Seed completed. Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    phone: Option<&str>,
    role: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, phone, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, i64, i32, Vec<String>)> = vec![
        (
            "Ceramic Mug",
            "Hand-glazed stoneware mug",
            45000,
            100,
            vec!["https://cdn.example.com/mug.jpg".into()],
        ),
        (
            "Linen Tote",
            "Natural linen tote bag",
            120000,
            50,
            vec!["https://cdn.example.com/tote.jpg".into()],
        ),
        (
            "Desk Lamp",
            "Adjustable warm-light desk lamp",
            350000,
            25,
            vec![
                "https://cdn.example.com/lamp-front.jpg".into(),
                "https://cdn.example.com/lamp-side.jpg".into(),
            ],
        ),
        ("Notebook Set", "Pack of three dotted notebooks", 60000, 200, vec![]),
    ];

    for (name, desc, price, stock, images) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, images)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(images)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
