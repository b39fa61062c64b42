//! Checkout and order fulfilment

use std::sync::Arc;

use anyhow::anyhow;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};
use uuid::Uuid;

use super::group_by_vendor;
use crate::error::{MarketError, MarketResult};
use crate::models::{Account, CartLine, Hub, NewOrder, Order, OrderStatus, OrderView, Role};
use crate::randomizer::Randomizer;
use crate::repositories::{
    AccountRepository, CartRepository, OrderRepository, ProductRepository,
};
use crate::validation::MAX_ORDER_TOTAL;

/// Order service
pub struct OrderService<A, P, C, O>
where
    A: AccountRepository,
    P: ProductRepository,
    C: CartRepository,
    O: OrderRepository,
{
    accounts: A,
    products: P,
    carts: C,
    orders: O,
    randomizer: Arc<dyn Randomizer>,
}

impl<A, P, C, O> OrderService<A, P, C, O>
where
    A: AccountRepository,
    P: ProductRepository,
    C: CartRepository,
    O: OrderRepository,
{
    pub fn new(accounts: A, products: P, carts: C, orders: O, randomizer: Arc<dyn Randomizer>) -> Self {
        Self {
            accounts,
            products,
            carts,
            orders,
            randomizer,
        }
    }

    /// Turn the customer's cart into an `Active` order and empty the cart
    ///
    /// Lines whose product has been deleted since it was added are left out.
    /// A hub outside the fixed set is replaced by a random one.
    pub async fn create_order(
        &self,
        customer: &Account,
        requested_hub: Option<&str>,
    ) -> MarketResult<Order> {
        if customer.role() != Role::Customer {
            return Err(MarketError::Forbidden);
        }

        let cart = self
            .carts
            .cart_for_owner(customer.id)
            .await?
            .ok_or(MarketError::EmptyCart)?;

        let mut lines: Vec<CartLine> = Vec::with_capacity(cart.lines.len());
        let mut total = Decimal::ZERO;
        for line in cart.lines.iter().filter(|line| line.quantity > 0) {
            match self.products.find_product(line.product_id).await? {
                Some(product) => {
                    total = product
                        .price
                        .checked_mul(Decimal::from(line.quantity))
                        .and_then(|subtotal| total.checked_add(subtotal))
                        .filter(|total| *total <= MAX_ORDER_TOTAL)
                        .ok_or_else(|| {
                            MarketError::Validation(format!(
                                "Order total must not exceed {MAX_ORDER_TOTAL}"
                            ))
                        })?;
                    lines.push(*line);
                }
                None => warn!(
                    "Dropping deleted product {} from the cart of {}",
                    line.product_id, customer.username
                ),
            }
        }

        if lines.is_empty() {
            return Err(MarketError::EmptyCart);
        }

        let hub = self.resolve_hub(requested_hub);
        let order = self
            .orders
            .place_order(NewOrder {
                owner_id: customer.id,
                lines,
                hub,
                total_price: total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            })
            .await?;

        info!(
            "Customer {} placed order {} for {} at {}",
            customer.username, order.id, order.total_price, order.hub
        );
        Ok(order)
    }

    /// One order, visible to its customer and to shippers at its hub
    pub async fn get_order(&self, caller: &Account, id: Uuid) -> MarketResult<OrderView> {
        let order = self
            .orders
            .find_order(id)
            .await?
            .filter(|order| may_view(caller, order))
            .ok_or_else(|| MarketError::NotFound("order".to_string()))?;

        self.view(order).await
    }

    pub async fn orders_for_customer(&self, customer: &Account) -> MarketResult<Vec<OrderView>> {
        if customer.role() != Role::Customer {
            return Err(MarketError::Forbidden);
        }
        let orders = self.orders.orders_by_owner(customer.id).await?;
        self.views(orders).await
    }

    /// Active orders routed through `hub`
    pub async fn orders_for_hub(&self, hub: Hub) -> MarketResult<Vec<OrderView>> {
        let orders = self.orders.active_orders_at_hub(hub).await?;
        self.views(orders).await
    }

    pub async fn orders_for_shipper(&self, shipper: &Account) -> MarketResult<Vec<OrderView>> {
        let hub = shipper.hub().ok_or(MarketError::Forbidden)?;
        self.orders_for_hub(hub).await
    }

    /// Move an `Active` order to `Delivered` or `Canceled`
    pub async fn set_status(&self, shipper: &Account, id: Uuid, status: &str) -> MarketResult<Order> {
        let status: OrderStatus = status.parse()?;
        if !status.is_terminal() {
            return Err(MarketError::Validation(format!(
                "An order can only become {} or {}",
                OrderStatus::Delivered,
                OrderStatus::Canceled
            )));
        }

        let hub = shipper.hub().ok_or(MarketError::Forbidden)?;
        let order = self
            .orders
            .find_order(id)
            .await?
            .ok_or_else(|| MarketError::NotFound("order".to_string()))?;
        if order.hub != hub {
            return Err(MarketError::Forbidden);
        }

        if !self.orders.transition_order(id, status).await? {
            return Err(MarketError::Conflict(format!("Order {id} is no longer active")));
        }

        info!("Shipper {} marked order {} {}", shipper.username, id, status);
        self.orders
            .find_order(id)
            .await?
            .ok_or_else(|| MarketError::NotFound("order".to_string()))
    }

    fn resolve_hub(&self, requested: Option<&str>) -> Hub {
        if let Some(hub) = requested.and_then(|name| name.parse::<Hub>().ok()) {
            return hub;
        }
        let hub = Hub::ALL[self.randomizer.pick(Hub::ALL.len()) % Hub::ALL.len()];
        warn!("Requested hub {:?} is not served, assigned {}", requested, hub);
        hub
    }

    async fn views(&self, mut orders: Vec<Order>) -> MarketResult<Vec<OrderView>> {
        orders.sort_by(Order::listing_cmp);
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.view(order).await?);
        }
        Ok(views)
    }

    async fn view(&self, order: Order) -> MarketResult<OrderView> {
        let customer = self
            .accounts
            .find_by_id(order.owner_id)
            .await?
            .ok_or_else(|| anyhow!("order {} belongs to a missing account", order.id))?;
        let vendors = group_by_vendor(&self.accounts, &self.products, &order.lines).await?;

        Ok(OrderView {
            id: order.id,
            customer_name: customer.display_name().unwrap_or_default().to_string(),
            customer_address: customer.address().unwrap_or_default().to_string(),
            username: customer.username,
            vendors,
            hub: order.hub,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
        })
    }
}

fn may_view(caller: &Account, order: &Order) -> bool {
    match caller.role() {
        Role::Customer => order.owner_id == caller.id,
        Role::Shipper => caller.hub() == Some(order.hub),
        Role::Vendor => false,
    }
}
