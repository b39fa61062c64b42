//! Marketplace HTTP routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::CookieJar;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{MarketError, MarketResult, parse_id},
    middleware::{cleared_session_cookie, session_cookie, session_gate},
    models::{ProductDraft, ProductUpdate, RemoveQuantity, Role, VendorField},
    repositories::{PgAccountRepository, PgCartRepository},
    services::{Caller, Signup},
    state::AppState,
};

/// Request for sign-in and the credential check
#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProfileImageRequest {
    pub image: String,
}

/// Inclusive price bounds; missing bounds are open
#[derive(Deserialize)]
pub struct PriceRangeQuery {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct RemoveItemQuery {
    /// A count or `all`; everything when absent
    pub quantity: Option<String>,
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub hub: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Create the router for the marketplace service
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
        .route("/me", get(me))
        .route(
            "/me/profile-image",
            put(update_profile_image).delete(remove_profile_image),
        )
        .route("/check/username/:username", get(check_username))
        .route("/check/vendorname/:name", get(check_vendor_name))
        .route("/check/vendoraddress/:address", get(check_vendor_address))
        .route("/check/signin", post(check_signin))
        .route("/products", get(list_products).post(create_product))
        .route("/products/filter", get(filter_products))
        .route("/products/search", get(search_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/vendors/:username/products", get(vendor_products))
        .route("/cart", get(view_cart))
        .route("/cart/items", post(add_cart_item))
        .route("/cart/items/:id", axum::routing::delete(remove_cart_item))
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", put(set_order_status))
        .route_layer(middleware::from_fn_with_state(
            state.accounts.clone(),
            session_gate::<PgAccountRepository, PgCartRepository>,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(session_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "marketplace",
        "database": database,
    }))
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Signup>,
) -> MarketResult<impl IntoResponse> {
    let account = state.accounts.create_account(payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignInRequest>,
) -> MarketResult<impl IntoResponse> {
    let (account, token) = state
        .accounts
        .sign_in(&payload.username, &payload.password)
        .await?;

    let jar = jar.add(session_cookie(
        token,
        state.secure_cookies,
        state.session_ttl_secs,
    ));
    Ok((jar, Json(account)))
}

pub async fn signout(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    jar: CookieJar,
) -> MarketResult<impl IntoResponse> {
    if let Caller::Account { account, token } = &caller {
        state.accounts.revoke_session_token(account, token).await?;
    }
    Ok((jar.remove(cleared_session_cookie()), StatusCode::NO_CONTENT))
}

pub async fn me(Extension(caller): Extension<Caller>) -> MarketResult<impl IntoResponse> {
    Ok(Json(caller.account()?.clone()))
}

pub async fn update_profile_image(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<ProfileImageRequest>,
) -> MarketResult<impl IntoResponse> {
    let account = state
        .accounts
        .update_profile_image(caller.account()?, &payload.image)
        .await?;
    Ok(Json(account))
}

pub async fn remove_profile_image(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> MarketResult<impl IntoResponse> {
    let account = state
        .accounts
        .remove_profile_image(caller.account()?)
        .await?;
    Ok(Json(account))
}

pub async fn check_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let exists = state.accounts.username_exists(&username).await?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn check_vendor_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let exists = state
        .accounts
        .vendor_field_exists(VendorField::Name, &name)
        .await?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn check_vendor_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let exists = state
        .accounts
        .vendor_field_exists(VendorField::Address, &address)
        .await?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn check_signin(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> MarketResult<impl IntoResponse> {
    let valid = state
        .accounts
        .credentials_valid(&payload.username, &payload.password)
        .await?;
    Ok(Json(json!({ "valid": valid })))
}

pub async fn list_products(State(state): State<AppState>) -> MarketResult<impl IntoResponse> {
    Ok(Json(state.catalog.list_all_grouped(true).await?))
}

pub async fn filter_products(
    State(state): State<AppState>,
    Query(range): Query<PriceRangeQuery>,
) -> MarketResult<impl IntoResponse> {
    let groups = state
        .catalog
        .filter_by_price_range(
            range.min.unwrap_or(Decimal::ZERO),
            range.max.unwrap_or(Decimal::MAX),
        )
        .await?;
    Ok(Json(groups))
}

pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> MarketResult<impl IntoResponse> {
    Ok(Json(state.catalog.search(&query.q).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let product = state.catalog.get_product(parse_id(&id, "product")?).await?;
    Ok(Json(product))
}

pub async fn vendor_products(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> MarketResult<impl IntoResponse> {
    Ok(Json(state.catalog.list_by_vendor(&username, true).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(draft): Json<ProductDraft>,
) -> MarketResult<impl IntoResponse> {
    let vendor = caller.require(Role::Vendor)?;
    let product = state.catalog.create_product(vendor, draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> MarketResult<impl IntoResponse> {
    let vendor = caller.require(Role::Vendor)?;
    let product = state
        .catalog
        .update_product(vendor, parse_id(&id, "product")?, update)
        .await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let vendor = caller.require(Role::Vendor)?;
    state
        .catalog
        .delete_product(vendor, parse_id(&id, "product")?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn view_cart(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> MarketResult<impl IntoResponse> {
    let customer = caller.require(Role::Customer)?;
    Ok(Json(state.carts.view_grouped_by_vendor(customer).await?))
}

pub async fn add_cart_item(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<AddItemRequest>,
) -> MarketResult<impl IntoResponse> {
    let customer = caller.require(Role::Customer)?;
    let cart = state
        .carts
        .add_item(
            customer,
            parse_id(&payload.product_id, "product")?,
            payload.quantity,
        )
        .await?;
    Ok(Json(cart))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Query(query): Query<RemoveItemQuery>,
) -> MarketResult<impl IntoResponse> {
    let customer = caller.require(Role::Customer)?;
    let quantity = match query.quantity.as_deref() {
        Some(raw) => raw.parse::<RemoveQuantity>()?,
        None => RemoveQuantity::All,
    };
    if matches!(quantity, RemoveQuantity::Count(count) if count <= 0) {
        return Err(MarketError::Validation(
            "Quantity must be a positive number".to_string(),
        ));
    }

    let cart = state
        .carts
        .remove_item(customer, parse_id(&id, "product")?, quantity)
        .await?;
    Ok(Json(cart))
}

pub async fn place_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<PlaceOrderRequest>,
) -> MarketResult<impl IntoResponse> {
    let customer = caller.require(Role::Customer)?;
    let order = state
        .orders
        .create_order(customer, payload.hub.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> MarketResult<impl IntoResponse> {
    let account = caller.account()?;
    let orders = match account.role() {
        Role::Customer => state.orders.orders_for_customer(account).await?,
        Role::Shipper => state.orders.orders_for_shipper(account).await?,
        Role::Vendor => return Err(MarketError::Forbidden),
    };
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> MarketResult<impl IntoResponse> {
    let order = state
        .orders
        .get_order(caller.account()?, parse_id(&id, "order")?)
        .await?;
    Ok(Json(order))
}

pub async fn set_order_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> MarketResult<impl IntoResponse> {
    let shipper = caller.require(Role::Shipper)?;
    let order = state
        .orders
        .set_status(shipper, parse_id(&id, "order")?, &payload.status)
        .await?;
    Ok(Json(order))
}
