//! Product repository

use std::future::Future;

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewProduct, Product, ProductUpdate};

pub trait ProductRepository: Send + Sync {
    fn insert_product(&self, product: NewProduct)
    -> impl Future<Output = Result<Product>> + Send;

    fn find_product(&self, id: Uuid) -> impl Future<Output = Result<Option<Product>>> + Send;

    fn products_by_owner(&self, owner_id: Uuid)
    -> impl Future<Output = Result<Vec<Product>>> + Send;

    fn all_products(&self) -> impl Future<Output = Result<Vec<Product>>> + Send;

    /// Apply the already validated fields of `update`
    fn update_product(
        &self,
        id: Uuid,
        update: ProductUpdate,
    ) -> impl Future<Output = Result<Option<Product>>> + Send;

    /// Returns whether a product was deleted
    fn delete_product(&self, id: Uuid) -> impl Future<Output = Result<bool>> + Send;
}

const PRODUCT_COLUMNS: &str =
    "id, owner_id, name, price, images, description, created_at, updated_at";

fn product_from_row(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        images: row.try_get("images")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Product repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for PgProductRepository {
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        info!("Creating product {} for vendor {}", product.id, product.owner_id);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (id, owner_id, name, price, images, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(product.owner_id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.images)
        .bind(&product.description)
        .fetch_one(&self.pool)
        .await?;

        product_from_row(&row)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn products_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Option<Product>> {
        info!("Updating product {}", id);

        // A present-but-empty description clears the column.
        let clear_description = matches!(update.description.as_deref(), Some(""));
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                description = CASE WHEN $4 THEN NULL ELSE COALESCE($5, description) END,
                images = COALESCE($6, images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(update.price)
        .bind(clear_description)
        .bind(update.description.as_deref().filter(|d| !d.is_empty()))
        .bind(&update.images)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        info!("Deleting product {}", id);

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
