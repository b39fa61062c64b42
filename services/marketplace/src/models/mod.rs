//! Marketplace domain models

use thiserror::Error;

pub mod account;
pub mod cart;
pub mod hub;
pub mod order;
pub mod product;

pub use account::{Account, DEFAULT_PROFILE_IMAGE, NewAccount, Role, RoleProfile, VendorField};
pub use cart::{Cart, CartLine, RemoveQuantity, ResolvedLine, VendorLines};
pub use hub::Hub;
pub use order::{NewOrder, Order, OrderStatus, OrderView};
pub use product::{NewProduct, Product, ProductDraft, ProductUpdate, VendorProducts};

/// Raised when a stored or submitted value is outside one of the closed enumerations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
