// File: src/middleware.rs
// Purpose: Per-route middleware and the sequential pipeline that runs them

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, Uri};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::MiddlewareError;
use crate::route::Route;
use crate::url::Params;

/// Data produced by middleware and handed to the renderer
pub type Payload = Map<String, Value>;

/// Shared, read-only view of the request given to every middleware
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
    pub route: Arc<Route>,
    pub query: Params,
}

impl MiddlewareContext {
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }
}

/// A step in a route's middleware chain
///
/// Returning `Ok(payload)` lets the chain continue; the payload is merged
/// into the data handed to the renderer. Returning `Err` stops the chain and
/// sends the request to the error renderer.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &MiddlewareContext) -> Result<Payload, MiddlewareError>;
}

/// Middleware backed by an async closure, see [`middleware_fn`]
pub struct FnMiddleware<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(MiddlewareContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, MiddlewareError>> + Send,
{
    async fn handle(&self, ctx: &MiddlewareContext) -> Result<Payload, MiddlewareError> {
        (self.f)(ctx.clone()).await
    }
}

/// Wraps an async closure as a shareable middleware
///
/// ```
/// use rhtmx_routes::middleware::{middleware_fn, Payload};
/// use serde_json::json;
///
/// let stamp = middleware_fn(|ctx| async move {
///     let mut data = Payload::new();
///     data.insert("route".to_string(), json!(ctx.route.name));
///     Ok(data)
/// });
/// ```
pub fn middleware_fn<F, Fut>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(MiddlewareContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Payload, MiddlewareError>> + Send + 'static,
{
    Arc::new(FnMiddleware { f })
}

/// Runs `middlewares` strictly in order
///
/// Stops at the first error. On success the payloads are merged with later
/// keys overwriting earlier ones. An empty chain yields an empty payload.
pub async fn run(
    middlewares: &[Arc<dyn Middleware>],
    ctx: &MiddlewareContext,
) -> Result<Payload, MiddlewareError> {
    let mut merged = Payload::new();

    for (index, middleware) in middlewares.iter().enumerate() {
        match middleware.handle(ctx).await {
            Ok(data) => {
                debug!(route = %ctx.route.name, index, keys = data.len(), "middleware passed");
                merged.extend(data);
            }
            Err(err) => {
                warn!(route = %ctx.route.name, index, error = %err, "middleware failed");
                return Err(err);
            }
        }
    }

    Ok(merged)
}

/// Middleware registered under a name so routes can refer to it from config
#[derive(Clone, Default)]
pub struct MiddlewareSet {
    entries: HashMap<String, Arc<dyn Middleware>>,
}

impl MiddlewareSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a named middleware
    pub fn with(mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) -> Self {
        self.entries.insert(name.into(), middleware);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.entries.insert(name.into(), middleware);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self.entries.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareSet").field("names", &names).finish()
    }
}
