use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::info;

use crate::models::{PriceObservation, TrackedProduct};

/// SQLite-backed store for tracked products and their price history.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            info!("Creating database file");
            if let Some(parent) = db_url
                .strip_prefix("sqlite:")
                .map(|p| Path::new(p.trim_start_matches("//")))
                .and_then(Path::parent)
                .filter(|p| !p.as_os_str().is_empty())
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            Sqlite::create_database(db_url).await?;
        }

        let pool = SqlitePool::connect(db_url).await?;
        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, running migrations first.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn add_product(&self, product: &TrackedProduct) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO products (instance_id, product_id, name, url, website, profile_id, category, brand)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&product.instance_id)
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(&product.url)
        .bind(&product.website)
        .bind(&product.profile_id)
        .bind(&product.category)
        .bind(&product.brand)
        .execute(&self.pool)
        .await
        .with_context(|| format!("inserting product {}", product.instance_id))?;

        Ok(())
    }

    /// Returns `false` when no product has this instance id.
    pub async fn update_product(&self, product: &TrackedProduct) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET product_id = ?, name = ?, url = ?, website = ?, profile_id = ?, category = ?, brand = ?
            WHERE instance_id = ?
            ",
        )
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(&product.url)
        .bind(&product.website)
        .bind(&product.profile_id)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.instance_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when no product has this instance id.
    pub async fn delete_product(&self, instance_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE instance_id = ?")
            .bind(instance_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_product(&self, instance_id: &str) -> Result<Option<TrackedProduct>> {
        let row = sqlx::query("SELECT * FROM products WHERE instance_id = ?")
            .bind(instance_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| product_from_row(&row)))
    }

    pub async fn list_products(&self) -> Result<Vec<TrackedProduct>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY website, name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    pub async fn save_observation(&self, observation: &PriceObservation) -> Result<()> {
        let price = i64::try_from(observation.price)
            .with_context(|| format!("price {} out of range", observation.price))?;

        sqlx::query(
            r"
            INSERT INTO price_history (instance_id, product_id, website, price, observed_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&observation.instance_id)
        .bind(&observation.product_id)
        .bind(&observation.website)
        .bind(price)
        .bind(observation.observed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Price observations oldest first, optionally filtered by product and time range.
    pub async fn price_history(
        &self,
        product_id: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<PriceObservation>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT instance_id, product_id, website, price, observed_at FROM price_history WHERE 1 = 1",
        );
        if let Some(product_id) = product_id {
            query.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(from) = from {
            query.push(" AND observed_at >= ").push_bind(from);
        }
        if let Some(to) = to {
            query.push(" AND observed_at <= ").push_bind(to);
        }
        query.push(" ORDER BY observed_at, id");

        let rows = query.build().fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let price = row.get::<i64, _>("price");
                Ok(PriceObservation {
                    instance_id: row.get("instance_id"),
                    product_id: row.get("product_id"),
                    website: row.get("website"),
                    price: u64::try_from(price)
                        .with_context(|| format!("negative price {price} in history"))?,
                    observed_at: row.get("observed_at"),
                })
            })
            .collect()
    }
}

fn product_from_row(row: &SqliteRow) -> TrackedProduct {
    TrackedProduct {
        instance_id: row.get("instance_id"),
        product_id: row.get("product_id"),
        name: row.get("name"),
        url: row.get("url"),
        website: row.get("website"),
        profile_id: row.get("profile_id"),
        category: row.get("category"),
        brand: row.get("brand"),
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    pub(crate) async fn memory_db() -> Database {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Database::from_pool(pool).await.unwrap()
    }

    fn observation(product: &TrackedProduct, price: u64, at: DateTime<Utc>) -> PriceObservation {
        PriceObservation {
            instance_id: product.instance_id.clone(),
            product_id: product.product_id.clone(),
            website: product.website.clone(),
            price,
            observed_at: at,
        }
    }

    #[tokio::test]
    async fn products_round_trip_in_website_order() {
        let db = memory_db().await;
        let theirs = TrackedProduct::new("SKU-1", "Chuột", "https://b.vn/1", "Competitor", Some("woocommerce"))
            .with_category("Phụ kiện");
        let ours = TrackedProduct::new("SKU-1", "Chuột", "https://mystore.vn/1", "MyStore", None);

        db.add_product(&ours).await.unwrap();
        db.add_product(&theirs).await.unwrap();

        let products = db.list_products().await.unwrap();
        assert_eq!(products, vec![theirs.clone(), ours]);
        assert_eq!(db.get_product(&theirs.instance_id).await.unwrap(), Some(theirs));
    }

    #[tokio::test]
    async fn duplicate_instance_id_is_rejected() {
        let db = memory_db().await;
        let product = TrackedProduct::new("SKU-1", "Chuột", "https://b.vn/1", "B", None);
        db.add_product(&product).await.unwrap();
        assert!(db.add_product(&product).await.is_err());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let db = memory_db().await;
        let mut product = TrackedProduct::new("SKU-1", "Chuột", "https://b.vn/1", "B", None);

        assert!(!db.update_product(&product).await.unwrap());
        assert!(!db.delete_product(&product.instance_id).await.unwrap());

        db.add_product(&product).await.unwrap();
        product.profile_id = "cellphones".to_string();
        product.brand = Some("Logitech".to_string());
        assert!(db.update_product(&product).await.unwrap());
        assert_eq!(
            db.get_product(&product.instance_id).await.unwrap(),
            Some(product.clone())
        );

        assert!(db.delete_product(&product.instance_id).await.unwrap());
        assert!(db.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_filtered_and_ordered() {
        let db = memory_db().await;
        let mouse = TrackedProduct::new("SKU-1", "Chuột", "https://b.vn/1", "B", None);
        let screen = TrackedProduct::new("SKU-2", "Màn hình", "https://b.vn/2", "B", None);
        let now = Utc::now();

        db.save_observation(&observation(&mouse, 300_000, now)).await.unwrap();
        db.save_observation(&observation(&mouse, 320_000, now - Duration::days(2)))
            .await
            .unwrap();
        db.save_observation(&observation(&screen, 4_000_000, now)).await.unwrap();

        let all = db.price_history(None, None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let mouse_history = db.price_history(Some("SKU-1"), None, None).await.unwrap();
        assert_eq!(
            mouse_history.iter().map(|o| o.price).collect::<Vec<_>>(),
            vec![320_000, 300_000]
        );

        let recent = db
            .price_history(Some("SKU-1"), Some(now - Duration::days(1)), None)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].price, 300_000);
    }
}
