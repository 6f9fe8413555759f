use std::env;

use beaute_shop::{
    config::DatabaseConfig,
    database,
    error::{AppError, Result},
    models::{
        ProductCategory, ProductFields, ProductImage, ProductVisibility, RegisterRequest,
        UserRole, normalize_email,
    },
    queries::{admin_queries, product_queries, user_queries},
    utils::{password, slug},
};
use rust_decimal::Decimal;
use sqlx::{PgPool, types::Json};
use tracing::Level;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        tracing::error!("Seeding failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let pool = database::create_pool(&DatabaseConfig {
        url: env::var("DB_URL")?,
        max_connections: 2,
    })
    .await?;

    let admin_id = seed_admin(&pool).await?;
    seed_sample_product(&pool, admin_id).await?;

    tracing::info!("Seeding complete");
    Ok(())
}

async fn seed_admin(pool: &PgPool) -> Result<i32> {
    let request = RegisterRequest {
        name: env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
        email: env::var("SEED_ADMIN_EMAIL")
            .map_err(|_| AppError::ConfigError("SEED_ADMIN_EMAIL not set".to_string()))?,
        password: env::var("SEED_ADMIN_PASSWORD")
            .map_err(|_| AppError::ConfigError("SEED_ADMIN_PASSWORD not set".to_string()))?,
    };
    request.validate()?;

    let email = normalize_email(&request.email);

    if let Some(existing) = user_queries::find_by_email(pool, &email).await? {
        if existing.role != UserRole::Admin {
            tracing::warn!("{} exists but is not an admin, leaving it untouched", email);
        } else {
            tracing::info!("Admin {} already exists", email);
        }
        return Ok(existing.id);
    }

    let password_hash = password::hash_password(request.password).await?;
    let admin = user_queries::create_user(
        pool,
        &email,
        request.name.trim(),
        &password_hash,
        UserRole::Admin,
    )
    .await?;

    tracing::info!("Created admin {} (id {})", admin.email, admin.id);
    Ok(admin.id)
}

async fn seed_sample_product(pool: &PgPool, admin_id: i32) -> Result<()> {
    if product_queries::count_all(pool).await? > 0 {
        tracing::info!("Catalog is not empty, skipping sample product");
        return Ok(());
    }

    let fields = ProductFields {
        name: "Hydrating Rose Serum".to_string(),
        description: "Lightweight daily serum with rose water and hyaluronic acid.".to_string(),
        price: Decimal::new(2990, 2),
        compare_at_price: Some(Decimal::new(3490, 2)),
        category: ProductCategory::Skincare,
        brand: "BeautéShop".to_string(),
        stock: 25,
        images: Json(vec![ProductImage {
            url: "https://placehold.co/600x600?text=Rose+Serum".to_string(),
            alt: Some("Hydrating Rose Serum".to_string()),
        }]),
        ingredients: vec!["Rose water".to_string(), "Hyaluronic acid".to_string()],
        benefits: vec!["Hydrates".to_string(), "Soothes".to_string()],
        how_to_use: Some("Apply two drops morning and evening.".to_string()),
        featured: true,
        visibility: ProductVisibility::Active,
        ..ProductFields::placeholder()
    };
    fields.validate()?;

    let product =
        admin_queries::create_product(pool, &slug::slugify(&fields.name), &fields, admin_id)
            .await?;

    tracing::info!("Created sample product {} ({})", product.id, product.slug);
    Ok(())
}
