//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::images::LocalImageStore;
use crate::jwt::JwtService;
use crate::randomizer::{Randomizer, ThreadRandomizer};
use crate::repositories::{
    PgAccountRepository, PgCartRepository, PgOrderRepository, PgProductRepository,
};
use crate::services::{AccountService, CartService, CatalogService, OrderService};

pub type Accounts = AccountService<PgAccountRepository, PgCartRepository>;
pub type Catalog = CatalogService<PgAccountRepository, PgProductRepository, LocalImageStore>;
pub type Carts = CartService<PgAccountRepository, PgProductRepository, PgCartRepository>;
pub type Orders =
    OrderService<PgAccountRepository, PgProductRepository, PgCartRepository, PgOrderRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub accounts: Arc<Accounts>,
    pub catalog: Arc<Catalog>,
    pub carts: Arc<Carts>,
    pub orders: Arc<Orders>,
    pub secure_cookies: bool,
    /// Lifetime of issued session tokens, mirrored in the cookie's Max-Age
    pub session_ttl_secs: u64,
}

impl AppState {
    pub fn new(pool: PgPool, jwt_service: JwtService, config: &ServerConfig) -> Self {
        let account_repository = PgAccountRepository::new(pool.clone());
        let product_repository = PgProductRepository::new(pool.clone());
        let cart_repository = PgCartRepository::new(pool.clone());
        let order_repository = PgOrderRepository::new(pool.clone());
        let image_store = LocalImageStore::new(&config.image_root, &config.staging_dir);
        let randomizer: Arc<dyn Randomizer> = Arc::new(ThreadRandomizer);
        let session_ttl_secs = jwt_service.token_expiry();

        AppState {
            accounts: Arc::new(AccountService::new(
                account_repository.clone(),
                cart_repository.clone(),
                jwt_service,
            )),
            catalog: Arc::new(CatalogService::new(
                account_repository.clone(),
                product_repository.clone(),
                image_store,
                randomizer.clone(),
            )),
            carts: Arc::new(CartService::new(
                account_repository.clone(),
                product_repository.clone(),
                cart_repository.clone(),
            )),
            orders: Arc::new(OrderService::new(
                account_repository,
                product_repository,
                cart_repository,
                order_repository,
                randomizer,
            )),
            db_pool: pool,
            secure_cookies: config.secure_cookies,
            session_ttl_secs,
        }
    }
}
