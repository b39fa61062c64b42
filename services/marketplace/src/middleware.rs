//! Session cookie handling

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::info;

use crate::{
    error::MarketError,
    repositories::{AccountRepository, CartRepository},
    services::AccountService,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "access_token";

/// HTTP-only cookie holding a freshly issued session token, kept by the
/// browser for as long as the token stays valid
pub fn session_cookie(token: String, secure: bool, ttl_secs: u64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)))
        .build()
}

/// Removal counterpart of [`session_cookie`]
pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Resolve the session cookie into a [`Caller`](crate::services::Caller) request extension
///
/// Requests without a cookie continue as guests. An invalid or revoked
/// token clears the cookie and stops the request with 401.
pub async fn session_gate<A, C>(
    State(accounts): State<Arc<AccountService<A, C>>>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    A: AccountRepository + 'static,
    C: CartRepository + 'static,
{
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());

    match accounts.resolve_session(token.as_deref()).await {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(err @ MarketError::Auth(_)) => {
            info!("Clearing invalid session cookie");
            (jar.remove(cleared_session_cookie()), err).into_response()
        }
        Err(err) => err.into_response(),
    }
}
