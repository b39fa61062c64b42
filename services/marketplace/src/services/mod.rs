//! Marketplace domain services
//!
//! Each service is generic over the repository traits it touches, so the
//! same code runs against PostgreSQL in production and the in-memory
//! store in tests.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::MarketResult;
use crate::models::{CartLine, ResolvedLine, VendorLines};
use crate::repositories::{AccountRepository, ProductRepository};

pub mod account;
pub mod cart;
pub mod catalog;
pub mod order;

pub use account::{AccountService, Caller, Signup};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use order::OrderService;

/// Resolve cart or order lines to their products and group them by vendor
///
/// Repeated references to a product are merged into one line. Lines whose
/// product or vendor no longer exists are skipped. Groups keep the order in
/// which their vendor first appears.
pub(crate) async fn group_by_vendor<A, P>(
    accounts: &A,
    products: &P,
    lines: &[CartLine],
) -> MarketResult<Vec<VendorLines>>
where
    A: AccountRepository,
    P: ProductRepository,
{
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(*line),
        }
    }

    let mut groups: Vec<VendorLines> = Vec::new();
    let mut group_of_vendor: HashMap<Uuid, usize> = HashMap::new();

    for line in merged {
        let Some(product) = products.find_product(line.product_id).await? else {
            continue;
        };

        let index = match group_of_vendor.get(&product.owner_id) {
            Some(index) => *index,
            None => {
                let Some(vendor) = accounts.find_by_id(product.owner_id).await? else {
                    continue;
                };
                groups.push(VendorLines {
                    vendor_id: vendor.id,
                    vendor_name: vendor.display_name().unwrap_or_default().to_string(),
                    username: vendor.username,
                    lines: Vec::new(),
                });
                group_of_vendor.insert(product.owner_id, groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[index].lines.push(ResolvedLine {
            product,
            quantity: line.quantity,
        });
    }

    Ok(groups)
}
