//! Multi-role marketplace service
//!
//! Guests browse the catalog, customers fill a cart and check out, vendors
//! manage their products and shippers move orders through their hub.

pub mod config;
pub mod error;
pub mod images;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod randomizer;
pub mod repositories;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;
pub mod validation;

pub use error::{MarketError, MarketResult};
pub use state::AppState;
