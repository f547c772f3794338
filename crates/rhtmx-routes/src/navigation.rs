// File: src/navigation.rs
// Purpose: Router facade that navigates to named routes

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RouteError;
use crate::registry::Routes;
use crate::route::RouteUrls;
use crate::url::Params;

/// Options for a single navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Only update the address bar, do not load the target
    pub shallow: bool,
}

/// Performs navigation to already resolved URLs
pub trait Navigator: Send + Sync {
    fn push(&self, urls: &RouteUrls, options: NavigateOptions) -> Response;
    fn replace(&self, urls: &RouteUrls, options: NavigateOptions) -> Response;
    fn prefetch(&self, urls: &RouteUrls) -> Response;
}

/// Navigation through HTMX response headers
///
/// - push: `HX-Location` (or `HX-Push-Url` when shallow)
/// - replace: `303 See Other` with `Location` and `HX-Redirect`
///   (or `HX-Replace-Url` when shallow)
/// - prefetch: `Link: <url>; rel=prefetch`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmxNavigator;

impl Navigator for HtmxNavigator {
    fn push(&self, urls: &RouteUrls, options: NavigateOptions) -> Response {
        let name = if options.shallow { "HX-Push-Url" } else { "HX-Location" };
        with_header(StatusCode::NO_CONTENT, name, &urls.as_path)
    }

    fn replace(&self, urls: &RouteUrls, options: NavigateOptions) -> Response {
        if options.shallow {
            return with_header(StatusCode::NO_CONTENT, "HX-Replace-Url", &urls.as_path);
        }

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&urls.as_path) {
            Ok(value) => {
                headers.insert(header::LOCATION, value.clone());
                headers.insert("HX-Redirect", value);
            }
            Err(err) => {
                warn!(url = %urls.as_path, error = %err, "redirect target is not a valid header value")
            }
        }
        (StatusCode::SEE_OTHER, headers).into_response()
    }

    fn prefetch(&self, urls: &RouteUrls) -> Response {
        let value = format!("<{}>; rel=prefetch", urls.as_path);
        with_header(StatusCode::NO_CONTENT, header::LINK.as_str(), &value)
    }
}

fn with_header(status: StatusCode, key: &str, value: &str) -> Response {
    let mut headers = HeaderMap::new();
    match (
        HeaderName::from_bytes(key.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(val)) => {
            headers.insert(name, val);
        }
        _ => warn!(header = %key, %value, "dropping invalid navigation header"),
    }
    (status, headers).into_response()
}

/// Navigates to routes by name
///
/// ```
/// use rhtmx_routes::{route, Routes, RoutingConfig};
/// use rhtmx_routes::navigation::{Navigation, NavigateOptions};
/// use rhtmx_routes::url::Params;
/// use std::sync::Arc;
///
/// let mut routes = Routes::new(RoutingConfig::with_locale("en"));
/// routes.add(route("dashboard").pattern("/dashboard")).unwrap();
///
/// let nav = Navigation::htmx(Arc::new(routes));
/// let response = nav
///     .push_route("dashboard", &Params::new(), None, NavigateOptions::default())
///     .unwrap();
/// assert_eq!(response.headers()["hx-location"], "/dashboard");
/// ```
#[derive(Clone)]
pub struct Navigation {
    routes: Arc<Routes>,
    navigator: Arc<dyn Navigator>,
}

impl Navigation {
    pub fn new(routes: Arc<Routes>, navigator: Arc<dyn Navigator>) -> Self {
        Self { routes, navigator }
    }

    pub fn htmx(routes: Arc<Routes>) -> Self {
        Self::new(routes, Arc::new(HtmxNavigator))
    }

    fn resolve(&self, name: &str, params: &Params, locale: Option<&str>) -> Result<RouteUrls, RouteError> {
        let resolved = self.routes.find_and_get_urls(name, locale, params)?;
        debug!(route = %name, url = %resolved.urls.as_path, "navigating");
        Ok(resolved.urls)
    }

    pub fn push_route(
        &self,
        name: &str,
        params: &Params,
        locale: Option<&str>,
        options: NavigateOptions,
    ) -> Result<Response, RouteError> {
        let urls = self.resolve(name, params, locale)?;
        Ok(self.navigator.push(&urls, options))
    }

    pub fn replace_route(
        &self,
        name: &str,
        params: &Params,
        locale: Option<&str>,
        options: NavigateOptions,
    ) -> Result<Response, RouteError> {
        let urls = self.resolve(name, params, locale)?;
        Ok(self.navigator.replace(&urls, options))
    }

    pub fn prefetch_route(
        &self,
        name: &str,
        params: &Params,
        locale: Option<&str>,
    ) -> Result<Response, RouteError> {
        let urls = self.resolve(name, params, locale)?;
        Ok(self.navigator.prefetch(&urls))
    }
}
