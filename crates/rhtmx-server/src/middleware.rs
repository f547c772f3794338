// File: src/middleware.rs
// Purpose: Named middleware that routes.toml can refer to

use axum::http::StatusCode;
use rhtmx_routes::middleware::{middleware_fn, Payload};
use rhtmx_routes::{MiddlewareError, MiddlewareSet};
use serde_json::json;

/// Cookie holding the signed-in user
pub const SESSION_COOKIE: &str = "session";

/// Every middleware the server knows by name
pub fn named() -> MiddlewareSet {
    MiddlewareSet::new()
        .with(
            "auth",
            middleware_fn(|ctx| async move {
                let user = ctx.get_cookie(SESSION_COOKIE).filter(|v| !v.is_empty());
                match user {
                    Some(user) => {
                        let mut data = Payload::new();
                        data.insert("user".to_string(), json!(user));
                        Ok(data)
                    }
                    None => Err(MiddlewareError::new("Sign in to view this page")
                        .with_status(StatusCode::UNAUTHORIZED)),
                }
            }),
        )
        .with(
            "analytics",
            middleware_fn(|ctx| async move {
                let mut data = Payload::new();
                data.insert("path".to_string(), json!(ctx.uri.path()));
                data.insert("htmx".to_string(), json!(ctx.get_header("hx-request").is_some()));
                Ok(data)
            }),
        )
}
