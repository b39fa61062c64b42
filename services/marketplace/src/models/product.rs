//! Product model and catalog groupings

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields submitted by a vendor
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: Decimal,
    /// Staged upload filenames
    pub images: Vec<String>,
    pub description: Option<String>,
}

/// New product record
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub description: Option<String>,
}

/// Product update payload; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    /// An empty description clears it
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

/// A vendor together with (a subset of) the products it owns
#[derive(Debug, Clone, Serialize)]
pub struct VendorProducts {
    pub vendor_id: Uuid,
    pub username: String,
    pub vendor_name: String,
    pub profile_image: String,
    pub products: Vec<Product>,
}
