//! Order repository

use std::collections::HashMap;
use std::future::Future;

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{CartLine, Hub, NewOrder, Order, OrderStatus};

pub trait OrderRepository: Send + Sync {
    /// Persist a new `Active` order and empty the owner's cart, atomically
    fn place_order(&self, order: NewOrder) -> impl Future<Output = Result<Order>> + Send;

    fn find_order(&self, id: Uuid) -> impl Future<Output = Result<Option<Order>>> + Send;

    fn orders_by_owner(&self, owner_id: Uuid) -> impl Future<Output = Result<Vec<Order>>> + Send;

    fn active_orders_at_hub(&self, hub: Hub) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Move an `Active` order to `status`; returns false if the order is
    /// missing or no longer active
    fn transition_order(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> impl Future<Output = Result<bool>> + Send;
}

const ORDER_COLUMNS: &str = "id, owner_id, hub, total_price, status, created_at, updated_at";

fn order_from_row(row: &PgRow, lines: Vec<CartLine>) -> Result<Order> {
    Ok(Order {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        lines,
        hub: row.try_get::<String, _>("hub")?.parse()?,
        total_price: row.try_get("total_price")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Order repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the snapshot lines of `rows` and assemble the orders
    async fn with_lines(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut lines: HashMap<Uuid, Vec<CartLine>> = HashMap::new();
        let line_rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &line_rows {
            lines
                .entry(row.try_get::<Uuid, _>("order_id")?)
                .or_default()
                .push(CartLine {
                    product_id: row.try_get("product_id")?,
                    quantity: row.try_get("quantity")?,
                });
        }

        rows.iter()
            .zip(ids)
            .map(|(row, id)| order_from_row(row, lines.remove(&id).unwrap_or_default()))
            .collect()
    }
}

impl OrderRepository for PgOrderRepository {
    async fn place_order(&self, order: NewOrder) -> Result<Order> {
        info!(
            "Placing order for account {} at hub {}",
            order.owner_id, order.hub
        );

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (id, owner_id, hub, total_price, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(order.owner_id)
        .bind(order.hub.as_str())
        .bind(order.total_price)
        .bind(OrderStatus::Active.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let id: Uuid = row.try_get("id")?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, product_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            DELETE FROM cart_lines
            USING carts
            WHERE cart_lines.cart_id = carts.id AND carts.owner_id = $1
            "#,
        )
        .bind(order.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        order_from_row(&row, order.lines)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        let rows = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(self.with_lines(rows).await?.pop())
    }

    async fn orders_by_owner(&self, owner_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    async fn active_orders_at_hub(&self, hub: Hub) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE hub = $1 AND status = $2 ORDER BY created_at"
        ))
        .bind(hub.as_str())
        .bind(OrderStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    async fn transition_order(&self, id: Uuid, status: OrderStatus) -> Result<bool> {
        info!("Setting order {} to {}", id, status);

        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(OrderStatus::Active.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
