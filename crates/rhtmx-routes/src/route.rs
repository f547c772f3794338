// File: src/route.rs
// Purpose: A single named, localized route

use std::sync::Arc;

use crate::error::RouteError;
use crate::middleware::{Middleware, Payload};
use crate::pattern::{Pattern, PatternError};
use crate::url::{to_query_string, with_query, Params};

/// Fully resolved route settings, produced by the registry before a
/// [`Route`] is built
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    pub name: String,
    pub locale: Option<String>,
    pub pattern: String,
    pub page: String,
    pub data: Payload,
    pub is_default_locale: bool,
    pub force_locale: bool,
}

/// URLs generated for a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteUrls {
    /// Canonical internal path: the page plus every parameter as query
    pub href: String,
    /// Display path: the pattern with parameters substituted
    pub as_path: String,
}

/// A named route in a specific locale
#[derive(Clone)]
pub struct Route {
    pub name: String,
    pub locale: Option<String>,
    pub pattern: Pattern,
    pub page: String,
    pub data: Payload,
    pub is_default_locale: bool,
    pub force_locale: bool,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    /// The chain may be attached once, even when it is empty
    pub(crate) middleware_attached: bool,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("locale", &self.locale)
            .field("pattern", &self.pattern.source())
            .field("page", &self.page)
            .field("is_default_locale", &self.is_default_locale)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl Route {
    /// Compiles the pattern and builds the route
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routes::route::{Route, RouteConfig};
    /// use rhtmx_routes::middleware::Payload;
    ///
    /// let route = Route::new(RouteConfig {
    ///     name: "post".to_string(),
    ///     locale: Some("en".to_string()),
    ///     pattern: "/posts/:id".to_string(),
    ///     page: "Post".to_string(),
    ///     data: Payload::new(),
    ///     is_default_locale: true,
    ///     force_locale: false,
    /// })
    /// .unwrap();
    ///
    /// assert!(route.matches("/posts/42").is_some());
    /// ```
    pub fn new(config: RouteConfig) -> Result<Self, RouteError> {
        let pattern =
            Pattern::compile(&config.pattern).map_err(|source| RouteError::InvalidPattern {
                pattern: config.pattern.clone(),
                source,
            })?;

        Ok(Self {
            name: config.name,
            locale: config.locale,
            pattern,
            page: config.page,
            data: config.data,
            is_default_locale: config.is_default_locale,
            force_locale: config.force_locale,
            middlewares: Vec::new(),
            middleware_attached: false,
        })
    }

    /// Middleware attached to this route, in execution order
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    /// Matches a pathname against this route's pattern
    pub fn matches(&self, pathname: &str) -> Option<Params> {
        self.pattern.match_path(pathname)
    }

    /// Display URL: substituted pattern plus leftover params as query
    pub fn display_url(&self, params: &Params) -> Result<String, PatternError> {
        let path = self.pattern.build_path(params)?;
        let used: Vec<&str> = self.pattern.param_names().collect();
        let leftover = params
            .iter()
            .filter(|(key, _)| !used.contains(&key.as_str()));

        Ok(with_query(path, to_query_string(leftover)))
    }

    /// Canonical internal URL: `/{page}?{params}`
    pub fn canonical_url(&self, params: &Params) -> String {
        let page = self.page.trim_start_matches('/');
        with_query(format!("/{}", page), to_query_string(params))
    }

    /// Both URLs for `params`
    pub fn urls(&self, params: &Params) -> Result<RouteUrls, PatternError> {
        Ok(RouteUrls {
            href: self.canonical_url(params),
            as_path: self.display_url(params)?,
        })
    }
}
