//! Cart repository

use std::future::Future;

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::unique_violation;
use crate::models::{Cart, CartLine};

pub trait CartRepository: Send + Sync {
    /// Insert an empty cart; callers check for an existing one first
    fn create_cart(&self, owner_id: Uuid) -> impl Future<Output = Result<Cart>> + Send;

    fn cart_for_owner(&self, owner_id: Uuid) -> impl Future<Output = Result<Option<Cart>>> + Send;

    /// Replace the stored lines with `cart.lines`
    fn save_cart(&self, cart: &Cart) -> impl Future<Output = Result<()>> + Send;
}

/// Cart repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for PgCartRepository {
    async fn create_cart(&self, owner_id: Uuid) -> Result<Cart> {
        info!("Creating cart for account {}", owner_id);

        let cart = Cart::new(owner_id);
        sqlx::query("INSERT INTO carts (id, owner_id) VALUES ($1, $2)")
            .bind(cart.id)
            .bind(cart.owner_id)
            .execute(&self.pool)
            .await
            .map_err(unique_violation)?;

        Ok(cart)
    }

    async fn cart_for_owner(&self, owner_id: Uuid) -> Result<Option<Cart>> {
        let Some(row) = sqlx::query("SELECT id, owner_id FROM carts WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let id: Uuid = row.try_get("id")?;
        let lines = sqlx::query(
            r#"
            SELECT product_id, quantity FROM cart_lines
            WHERE cart_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| -> Result<CartLine> {
            Ok(CartLine {
                product_id: row.try_get("product_id")?,
                quantity: row.try_get("quantity")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(Cart {
            id,
            owner_id: row.try_get("owner_id")?,
            lines,
        }))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in cart.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_lines (cart_id, product_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(cart.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
