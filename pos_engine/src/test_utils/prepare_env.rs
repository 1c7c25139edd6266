use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{NewProduct, Product, Vnd},
    traits::PosDatabase,
    SqliteDatabase,
};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/pos_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Did not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// A fresh, migrated database in the temp directory.
pub async fn fresh_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating database")
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop database {url}: {e}");
    }
}

/// Adds a small catalogue to the database: a managed-stock coffee (10 in stock), a managed-stock cake (2 in stock,
/// 10% off) and an unmanaged bottle of water.
pub async fn seed_catalogue(db: &SqliteDatabase) -> Vec<Product> {
    let products = vec![
        NewProduct::new("Cà phê sữa đá", Vnd::from(29_000)).with_stock(10),
        NewProduct::new("Bánh tiramisu", Vnd::from(45_000)).with_stock(2).with_discount(10),
        NewProduct::new("Nước suối", Vnd::from(10_000)),
    ];
    let mut result = Vec::with_capacity(products.len());
    for p in products {
        result.push(db.insert_product(p).await.expect("Error inserting product"));
    }
    result
}
