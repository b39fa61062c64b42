//! Shopping cart model

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ParseEnumError, Product};
use crate::error::{MarketError, MarketResult};
use crate::validation::MAX_LINE_QUANTITY;

/// A (product, quantity) pairing inside a cart or an order snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// How much of a product to take out of the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveQuantity {
    All,
    Count(i64),
}

impl FromStr for RemoveQuantity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RemoveQuantity::All);
        }
        s.parse()
            .map(RemoveQuantity::Count)
            .map_err(|_| ParseEnumError::new("quantity", s))
    }
}

/// The single cart owned by a customer account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<i64> {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }

    /// Merge `quantity` into the line for `product_id`, appending a line if absent.
    ///
    /// The merged quantity must stay within `1..=MAX_LINE_QUANTITY`; otherwise
    /// the cart is left untouched. Returns the line's new quantity.
    pub fn add(&mut self, product_id: Uuid, quantity: i64) -> MarketResult<i64> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id);
        let held = index.map_or(0, |index| self.lines[index].quantity);

        let merged = held
            .checked_add(quantity)
            .filter(|merged| (1..=MAX_LINE_QUANTITY).contains(merged))
            .ok_or_else(|| {
                MarketError::Validation(format!(
                    "A cart holds between 1 and {MAX_LINE_QUANTITY} of each product"
                ))
            })?;

        match index {
            Some(index) => self.lines[index].quantity = merged,
            None => self.lines.push(CartLine {
                product_id,
                quantity: merged,
            }),
        }
        Ok(merged)
    }

    /// Take `quantity` of `product_id` out; the line goes once it reaches zero.
    ///
    /// Returns whether the product was in the cart.
    pub fn remove(&mut self, product_id: Uuid, quantity: RemoveQuantity) -> bool {
        let Some(index) = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
        else {
            return false;
        };

        match quantity {
            RemoveQuantity::All => {
                self.lines.remove(index);
            }
            RemoveQuantity::Count(count) => {
                let remaining = self.lines[index].quantity.saturating_sub(count.max(0));
                if remaining <= 0 {
                    self.lines.remove(index);
                } else {
                    self.lines[index].quantity = remaining;
                }
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// A cart or order line resolved to its product
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedLine {
    pub product: Product,
    pub quantity: i64,
}

/// Lines of a cart or order that belong to one vendor
#[derive(Debug, Clone, Serialize)]
pub struct VendorLines {
    pub vendor_id: Uuid,
    pub username: String,
    pub vendor_name: String,
    pub lines: Vec<ResolvedLine>,
}
