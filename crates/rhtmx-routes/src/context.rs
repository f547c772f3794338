// File: src/context.rs
// Purpose: Request context handed to middleware and renderers for a matched route

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::link::Link;
use crate::middleware::{MiddlewareContext, Payload};
use crate::registry::{LocalizedUrl, Routes};
use crate::route::Route;
use crate::url::Params;

/// A request that matched a registered route
///
/// Carries the resolved locale, the route, the site URL and, once the
/// middleware chain has passed, the payload it produced.
pub struct RouteContext {
    /// HTTP method (GET, POST, ...)
    pub method: Method,

    /// Request URI as received
    pub uri: Uri,

    /// Request headers
    pub headers: HeaderMap,

    /// Parsed cookies
    pub cookies: HashMap<String, String>,

    /// Request body, untouched by the dispatcher
    pub body: Body,

    /// Locale of the matched route
    pub locale: Option<String>,

    pub route: Arc<Route>,

    /// Absolute site URL from the routing config
    pub site_url: Option<String>,

    /// Query parameters merged with path parameters
    pub query: Params,

    /// Route data, overlaid with the middleware payload once the chain has run
    pub data: Payload,

    routes: Arc<Routes>,
    multilanguage_urls: OnceCell<Vec<LocalizedUrl>>,
}

impl std::fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteContext")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("route", &self.route.name)
            .field("locale", &self.locale)
            .finish()
    }
}

impl RouteContext {
    pub fn new(
        parts: Parts,
        body: Body,
        route: Arc<Route>,
        query: Params,
        routes: Arc<Routes>,
    ) -> Self {
        let cookies = parse_cookies(&parts.headers);

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            cookies,
            body,
            locale: route.locale.clone(),
            site_url: routes.site_url().map(str::to_string),
            data: route.data.clone(),
            route,
            query,
            routes,
            multilanguage_urls: OnceCell::new(),
        }
    }

    /// Every locale variant of the matched route, computed on first use
    pub fn multilanguage_urls(&self) -> &[LocalizedUrl] {
        self.multilanguage_urls
            .get_or_init(|| self.routes.multilanguage_urls(&self.route, &self.query))
    }

    /// The registry this request was dispatched against
    pub fn routes(&self) -> &Arc<Routes> {
        &self.routes
    }

    /// Link builder defaulting to this request's locale
    pub fn link(&self) -> Link {
        let link = Link::new(self.routes.clone());
        match &self.locale {
            Some(locale) => link.with_locale(locale.clone()),
            None => link,
        }
    }

    /// Read-only view given to the route's middleware
    pub fn middleware_context(&self) -> MiddlewareContext {
        MiddlewareContext {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.headers.clone(),
            cookies: self.cookies.clone(),
            route: self.route.clone(),
            query: self.query.clone(),
        }
    }

    /// Get a header value
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Get a cookie value
    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    /// Check if this is an HTMX request
    pub fn is_htmx(&self) -> bool {
        self.get_header("hx-request").is_some()
    }
}

/// Parse cookies from the Cookie header
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    if let Some(cookie_header) = headers.get("cookie") {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some((key, value)) = cookie.split_once('=') {
                    cookies.insert(key.to_string(), value.to_string());
                }
            }
        }
    }

    cookies
}
