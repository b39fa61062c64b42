//! Order model and status lifecycle

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CartLine, Hub, ParseEnumError, VendorLines};

/// Order status: `Active` until a shipper marks it `Delivered` or `Canceled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "Active",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Active)
    }

    /// Position in listings: active first, canceled last
    fn listing_rank(&self) -> u8 {
        match self {
            OrderStatus::Active => 0,
            OrderStatus::Delivered => 1,
            OrderStatus::Canceled => 2,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(OrderStatus::Active),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Canceled" => Ok(OrderStatus::Canceled),
            other => Err(ParseEnumError::new("order status", other)),
        }
    }
}

/// Immutable snapshot of a customer's cart at checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub lines: Vec<CartLine>,
    pub hub: Hub,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Listing order: status rank, then creation time
    pub fn listing_cmp(&self, other: &Self) -> Ordering {
        self.status
            .listing_rank()
            .cmp(&other.status.listing_rank())
            .then_with(|| self.created_at.cmp(&other.created_at))
    }
}

/// New order record
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_id: Uuid,
    pub lines: Vec<CartLine>,
    pub hub: Hub,
    pub total_price: Decimal,
}

/// Order enriched with the customer's details and its lines grouped by vendor
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub username: String,
    pub customer_name: String,
    pub customer_address: String,
    pub vendors: Vec<VendorLines>,
    pub hub: Hub,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus, minutes: i64) -> Order {
        let created_at = DateTime::from_timestamp(minutes * 60, 0).unwrap();
        Order {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            lines: Vec::new(),
            hub: Hub::Hanoi,
            total_price: Decimal::ZERO,
            status,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn listing_puts_active_first_and_canceled_last() {
        let mut orders = vec![
            order(OrderStatus::Canceled, 0),
            order(OrderStatus::Delivered, 1),
            order(OrderStatus::Active, 2),
            order(OrderStatus::Canceled, 3),
            order(OrderStatus::Active, 4),
            order(OrderStatus::Delivered, 5),
        ];

        orders.sort_by(Order::listing_cmp);

        let statuses: Vec<OrderStatus> = orders.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Active,
                OrderStatus::Active,
                OrderStatus::Delivered,
                OrderStatus::Delivered,
                OrderStatus::Canceled,
                OrderStatus::Canceled,
            ]
        );
        assert!(orders[0].created_at < orders[1].created_at);
    }

    #[test]
    fn only_active_is_non_terminal() {
        assert!(!OrderStatus::Active.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn parses_status_names() {
        assert_eq!("Delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }
}
