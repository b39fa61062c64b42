//! Customer carts

use tracing::info;
use uuid::Uuid;

use super::group_by_vendor;
use crate::error::{MarketError, MarketResult};
use crate::models::{Account, Cart, RemoveQuantity, Role, VendorLines};
use crate::repositories::{AccountRepository, CartRepository, ProductRepository};
use crate::validation::{MAX_LINE_QUANTITY, validate_quantity};

/// Cart service
pub struct CartService<A: AccountRepository, P: ProductRepository, C: CartRepository> {
    accounts: A,
    products: P,
    carts: C,
}

impl<A, P, C> CartService<A, P, C>
where
    A: AccountRepository,
    P: ProductRepository,
    C: CartRepository,
{
    pub fn new(accounts: A, products: P, carts: C) -> Self {
        Self {
            accounts,
            products,
            carts,
        }
    }

    /// Start an empty cart; callers check that the customer has none yet
    pub async fn create_cart(&self, customer: &Account) -> MarketResult<Cart> {
        if customer.role() != Role::Customer {
            return Err(MarketError::Forbidden);
        }
        Ok(self.carts.create_cart(customer.id).await?)
    }

    pub async fn cart_of(&self, customer: &Account) -> MarketResult<Cart> {
        if customer.role() != Role::Customer {
            return Err(MarketError::Forbidden);
        }
        self.carts
            .cart_for_owner(customer.id)
            .await?
            .ok_or_else(|| MarketError::NotFound("cart".to_string()))
    }

    /// Add `quantity` of a product, merging with an existing line
    pub async fn add_item(
        &self,
        customer: &Account,
        product_id: Uuid,
        quantity: i64,
    ) -> MarketResult<Cart> {
        validate_quantity(quantity).map_err(MarketError::Validation)?;
        let mut cart = self.cart_of(customer).await?;
        if self.products.find_product(product_id).await?.is_none() {
            return Err(MarketError::NotFound("product".to_string()));
        }

        cart.add(product_id, quantity)?;
        self.carts.save_cart(&cart).await?;

        info!(
            "Added {} x {} to cart of {}",
            quantity, product_id, customer.username
        );
        Ok(cart)
    }

    /// Take some or all of a product out; absent products leave the cart as is
    pub async fn remove_item(
        &self,
        customer: &Account,
        product_id: Uuid,
        quantity: RemoveQuantity,
    ) -> MarketResult<Cart> {
        let mut cart = self.cart_of(customer).await?;
        if cart.remove(product_id, quantity) {
            self.carts.save_cart(&cart).await?;
        }
        Ok(cart)
    }

    pub async fn view_grouped_by_vendor(&self, customer: &Account) -> MarketResult<Vec<VendorLines>> {
        let cart = self.cart_of(customer).await?;
        group_by_vendor(&self.accounts, &self.products, &cart.lines).await
    }
}
