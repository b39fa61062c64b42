//! In-memory repositories for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{
    AccountRepository, CartRepository, OrderRepository, ProductRepository, UniqueViolation,
};
use crate::models::{
    Account, Cart, Hub, NewAccount, NewOrder, NewProduct, Order, OrderStatus, Product,
    ProductUpdate, Role, RoleProfile, VendorField,
};

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    tokens: HashMap<Uuid, Vec<String>>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    orders: Vec<Order>,
    /// Ticks forward on every insert so creation times are strictly ordered
    clock: i64,
    fail_product_writes: bool,
    /// Existence checks miss rows, as they would while a concurrent request
    /// has not committed yet
    stale_reads: bool,
}

impl Tables {
    fn now(&mut self) -> chrono::DateTime<Utc> {
        self.clock += 1;
        chrono::DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now)
            + Duration::seconds(self.clock)
    }
}

/// One store implementing every repository trait
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make product inserts and updates fail, as a broken database would
    pub fn fail_product_writes(&self, fail: bool) {
        self.lock().fail_product_writes = fail;
    }

    /// Make the pre-insert existence checks miss what is already stored
    pub fn stale_reads(&self, stale: bool) {
        self.lock().stale_reads = stale;
    }

    pub fn session_tokens(&self, id: Uuid) -> Vec<String> {
        self.lock().tokens.get(&id).cloned().unwrap_or_default()
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn cart_count(&self, owner_id: Uuid) -> usize {
        self.lock()
            .carts
            .iter()
            .filter(|cart| cart.owner_id == owner_id)
            .count()
    }
}

impl AccountRepository for MemoryStore {
    async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let mut tables = self.lock();
        let clash = tables.accounts.iter().find_map(|a| {
            if a.username == new_account.username {
                return Some("accounts_username_key");
            }
            match (&a.profile, &new_account.profile) {
                (
                    RoleProfile::Vendor { name, .. },
                    RoleProfile::Vendor { name: new_name, .. },
                ) if name == new_name => Some("accounts_vendor_name_key"),
                (
                    RoleProfile::Vendor { address, .. },
                    RoleProfile::Vendor {
                        address: new_address,
                        ..
                    },
                ) if address == new_address => Some("accounts_vendor_address_key"),
                _ => None,
            }
        });
        if let Some(constraint) = clash {
            return Err(UniqueViolation {
                constraint: constraint.to_string(),
            }
            .into());
        }
        let now = tables.now();
        let account = Account {
            id: Uuid::new_v4(),
            username: new_account.username,
            password_hash: new_account.password_hash,
            profile_image: new_account.profile_image,
            profile: new_account.profile,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.lock().accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_session(&self, id: Uuid, token: &str) -> Result<Option<Account>> {
        let tables = self.lock();
        let holds = tables
            .tokens
            .get(&id)
            .is_some_and(|tokens| tokens.iter().any(|t| t == token));
        Ok(holds
            .then(|| tables.accounts.iter().find(|a| a.id == id).cloned())
            .flatten())
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let tables = self.lock();
        Ok(!tables.stale_reads && tables.accounts.iter().any(|a| a.username == username))
    }

    async fn vendor_field_taken(&self, field: VendorField, value: &str) -> Result<bool> {
        let value = value.trim();
        let tables = self.lock();
        Ok(!tables.stale_reads && tables.accounts.iter().any(|a| match &a.profile {
            RoleProfile::Vendor { name, address } => match field {
                VendorField::Name => name == value,
                VendorField::Address => address == value,
            },
            _ => false,
        }))
    }

    async fn list_vendors(&self) -> Result<Vec<Account>> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .filter(|a| a.role() == Role::Vendor)
            .cloned()
            .collect())
    }

    async fn add_session_token(&self, id: Uuid, token: &str) -> Result<()> {
        self.lock()
            .tokens
            .entry(id)
            .or_default()
            .push(token.to_string());
        Ok(())
    }

    async fn remove_session_token(&self, id: Uuid, token: &str) -> Result<bool> {
        let mut tables = self.lock();
        let Some(tokens) = tables.tokens.get_mut(&id) else {
            return Ok(false);
        };
        let before = tokens.len();
        tokens.retain(|t| t != token);
        Ok(tokens.len() < before)
    }

    async fn set_profile_image(&self, id: Uuid, image: &str) -> Result<Option<Account>> {
        let mut tables = self.lock();
        let now = tables.now();
        Ok(tables.accounts.iter_mut().find(|a| a.id == id).map(|a| {
            a.profile_image = image.to_string();
            a.updated_at = now;
            a.clone()
        }))
    }
}

impl ProductRepository for MemoryStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.lock();
        if tables.fail_product_writes {
            bail!("connection reset by peer");
        }
        let now = tables.now();
        let product = Product {
            id: product.id,
            owner_id: product.owner_id,
            name: product.name,
            price: product.price,
            images: product.images,
            description: product.description,
            created_at: now,
            updated_at: now,
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    async fn products_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>> {
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        Ok(self.lock().products.clone())
    }

    async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Option<Product>> {
        let mut tables = self.lock();
        if tables.fail_product_writes {
            bail!("connection reset by peer");
        }
        let now = tables.now();
        Ok(tables.products.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(name) = update.name {
                p.name = name;
            }
            if let Some(price) = update.price {
                p.price = price;
            }
            if let Some(description) = update.description {
                p.description = (!description.is_empty()).then_some(description);
            }
            if let Some(images) = update.images {
                p.images = images;
            }
            p.updated_at = now;
            p.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.lock();
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        for cart in &mut tables.carts {
            cart.lines.retain(|line| line.product_id != id);
        }
        Ok(tables.products.len() < before)
    }
}

impl CartRepository for MemoryStore {
    async fn create_cart(&self, owner_id: Uuid) -> Result<Cart> {
        let mut tables = self.lock();
        if tables.carts.iter().any(|c| c.owner_id == owner_id) {
            return Err(UniqueViolation {
                constraint: "carts_owner_id_key".to_string(),
            }
            .into());
        }
        let cart = Cart::new(owner_id);
        tables.carts.push(cart.clone());
        Ok(cart)
    }

    async fn cart_for_owner(&self, owner_id: Uuid) -> Result<Option<Cart>> {
        let tables = self.lock();
        if tables.stale_reads {
            return Ok(None);
        }
        Ok(tables.carts.iter().find(|c| c.owner_id == owner_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let mut tables = self.lock();
        let stored = tables
            .carts
            .iter_mut()
            .find(|c| c.id == cart.id)
            .ok_or_else(|| anyhow!("cart {} does not exist", cart.id))?;
        stored.lines = cart.lines.clone();
        Ok(())
    }
}

impl OrderRepository for MemoryStore {
    async fn place_order(&self, order: NewOrder) -> Result<Order> {
        let mut tables = self.lock();
        let now = tables.now();
        let order = Order {
            id: Uuid::new_v4(),
            owner_id: order.owner_id,
            lines: order.lines,
            hub: order.hub,
            total_price: order.total_price,
            status: OrderStatus::Active,
            created_at: now,
            updated_at: now,
        };
        for cart in tables.carts.iter_mut().filter(|c| c.owner_id == order.owner_id) {
            cart.clear();
        }
        tables.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_by_owner(&self, owner_id: Uuid) -> Result<Vec<Order>> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn active_orders_at_hub(&self, hub: Hub) -> Result<Vec<Order>> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|o| o.hub == hub && o.status == OrderStatus::Active)
            .cloned()
            .collect())
    }

    async fn transition_order(&self, id: Uuid, status: OrderStatus) -> Result<bool> {
        let mut tables = self.lock();
        let now = tables.now();
        Ok(tables
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == OrderStatus::Active)
            .map(|o| {
                o.status = status;
                o.updated_at = now;
            })
            .is_some())
    }
}
