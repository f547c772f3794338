// File: src/registry.rs
// Purpose: Ordered registry of named, localized routes

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{Config, RoutingConfig};
use crate::error::RouteError;
use crate::middleware::{Middleware, MiddlewareSet, Payload};
use crate::route::{Route, RouteConfig, RouteUrls};
use crate::url::{Params, ParsedUrl};

// ============================================================================
// Route declarations
// ============================================================================

/// Flat route declaration, as written in `routes.toml`
///
/// Omitted fields fall back to the registry defaults: the default locale,
/// a `/{name}` pattern and the route name as page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteDescriptor {
    pub name: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub data: Option<Payload>,
    /// Names of middleware registered in a [`MiddlewareSet`]
    #[serde(default)]
    pub middleware: Option<toml::Value>,
    #[serde(default)]
    pub update: bool,
}

/// What was passed in the page position of a positional declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PageArg {
    /// Page falls back to the route name
    #[default]
    Default,
    /// Explicit page target
    Page(String),
    /// A data payload given where the page was expected: it becomes the
    /// route data and the page falls back to the route name
    Data(Payload),
}

/// Positional route declaration, built with [`route`]
#[derive(Debug, Clone, Default)]
pub struct PositionalRoute {
    name: String,
    locale: Option<String>,
    pattern: Option<String>,
    page: PageArg,
    data: Option<Payload>,
    update: bool,
}

/// Starts a positional route declaration
///
/// # Examples
///
/// ```
/// use rhtmx_routes::{route, Routes, RoutingConfig};
///
/// let mut routes = Routes::new(RoutingConfig::with_locale("en"));
/// routes.add(route("about").locale("en").pattern("/about").page("About")).unwrap();
///
/// let found = routes.match_url("/about?x=1");
/// assert_eq!(found.route.unwrap().name, "about");
/// assert_eq!(found.query.get("x"), Some(&"1".to_string()));
/// ```
pub fn route(name: impl Into<String>) -> PositionalRoute {
    PositionalRoute {
        name: name.into(),
        ..PositionalRoute::default()
    }
}

impl PositionalRoute {
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = PageArg::Page(page.into());
        self
    }

    /// Passes a payload in the page position (page falls back to the name)
    pub fn page_data(mut self, data: Payload) -> Self {
        self.page = PageArg::Data(data);
        self
    }

    pub fn data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace an existing route with the same name and locale
    pub fn update(mut self) -> Self {
        self.update = true;
        self
    }
}

/// Either form accepted by [`Routes::add`]
#[derive(Debug, Clone)]
pub enum RouteDeclaration {
    Descriptor(RouteDescriptor),
    Positional(PositionalRoute),
}

impl From<RouteDescriptor> for RouteDeclaration {
    fn from(descriptor: RouteDescriptor) -> Self {
        RouteDeclaration::Descriptor(descriptor)
    }
}

impl From<PositionalRoute> for RouteDeclaration {
    fn from(positional: PositionalRoute) -> Self {
        RouteDeclaration::Positional(positional)
    }
}

impl RouteDeclaration {
    fn update(&self) -> bool {
        match self {
            RouteDeclaration::Descriptor(d) => d.update,
            RouteDeclaration::Positional(p) => p.update,
        }
    }
}

// ============================================================================
// Lookup results
// ============================================================================

/// Outcome of matching a URL against the registry
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// First route whose pattern matched, if any
    pub route: Option<Arc<Route>>,
    /// Path parameters captured by the route
    pub params: Params,
    /// Query parameters merged with path parameters (path wins)
    pub query: Params,
    pub parsed_url: ParsedUrl,
}

/// A route resolved by name together with its URLs
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub route: Arc<Route>,
    pub urls: RouteUrls,
    pub by_name: bool,
}

/// One locale variant of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedUrl {
    pub url: String,
    pub locale: Option<String>,
    pub is_default_locale: bool,
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered collection of named routes
///
/// Routes are matched in registration order, so more specific patterns
/// must be added before more general ones. All mutation needs `&mut self`;
/// once the registry is shared behind an `Arc` for serving it is read-only.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    routes: Vec<Arc<Route>>,
    locale: Option<String>,
    force_locale: bool,
    site_url: Option<String>,
}

impl Routes {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            routes: Vec::new(),
            locale: config.locale,
            force_locale: config.force_locale,
            site_url: config.site_url,
        }
    }

    /// Builds a registry from a loaded configuration file
    ///
    /// Middleware listed on a route are looked up by name in `middleware`.
    pub fn from_config(config: &Config, middleware: &MiddlewareSet) -> Result<Self, RouteError> {
        let mut routes = Self::new(config.routing.clone());

        for descriptor in &config.routes {
            let declared = descriptor.middleware.clone();
            let handle = routes.add(descriptor.clone())?;
            if let Some(names) = declared {
                handle.with_named_middleware(&names, middleware)?;
            }
        }

        Ok(routes)
    }

    /// Registers a route
    ///
    /// Fails with [`RouteError::RouteAlreadyExists`] when the name and locale
    /// are taken, unless the declaration asks for an update, in which case
    /// the old route (and its middleware) is dropped and the new one goes to
    /// the end of the list.
    pub fn add(
        &mut self,
        declaration: impl Into<RouteDeclaration>,
    ) -> Result<RouteHandle<'_>, RouteError> {
        let declaration = declaration.into();
        let update = declaration.update();
        let route = Route::new(self.resolve(declaration))?;

        if let Some(existing) = self.position(&route.name, &route.locale) {
            if !update {
                return Err(RouteError::RouteAlreadyExists {
                    name: route.name,
                    locale: route.locale,
                });
            }
            debug!(name = %route.name, locale = ?route.locale, "replacing route");
            self.routes.remove(existing);
        }

        debug!(
            name = %route.name,
            locale = ?route.locale,
            pattern = %route.pattern.source(),
            page = %route.page,
            "route registered"
        );

        self.routes.push(Arc::new(route));
        let index = self.routes.len() - 1;
        Ok(RouteHandle {
            routes: self,
            index,
        })
    }

    /// Resolves either declaration form into a [`RouteConfig`]
    fn resolve(&self, declaration: RouteDeclaration) -> RouteConfig {
        let (name, locale, pattern, page, data) = match declaration {
            RouteDeclaration::Descriptor(d) => (d.name, d.locale, d.pattern, d.page, d.data),
            RouteDeclaration::Positional(p) => {
                let (page, data) = match p.page {
                    PageArg::Default => (None, p.data),
                    PageArg::Page(page) => (Some(page), p.data),
                    PageArg::Data(data) => (None, Some(data)),
                };
                (p.name, p.locale, p.pattern, page, data)
            }
        };

        let locale = locale.or_else(|| self.locale.clone());

        RouteConfig {
            pattern: pattern.unwrap_or_else(|| format!("/{}", name)),
            page: page.unwrap_or_else(|| name.clone()),
            data: data.unwrap_or_default(),
            is_default_locale: locale == self.locale,
            force_locale: self.force_locale,
            locale,
            name,
        }
    }

    fn position(&self, name: &str, locale: &Option<String>) -> Option<usize> {
        self.routes
            .iter()
            .position(|r| r.name == name && &r.locale == locale)
    }

    /// Attaches middleware to the most recently added route
    ///
    /// Fails with [`RouteError::MiddlewareAlreadySet`] when that route
    /// already has a chain.
    ///
    /// # Deprecated
    ///
    /// Use the handle returned by [`Routes::add`], which cannot attach to
    /// the wrong route.
    #[deprecated(since = "0.2.0", note = "Use RouteHandle::with_middleware() on the result of add()")]
    pub fn middleware<I>(&mut self, middlewares: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let last = self
            .routes
            .last_mut()
            .ok_or(RouteError::NoRouteToAttachMiddleware)?;
        if last.middleware_attached {
            return Err(RouteError::MiddlewareAlreadySet {
                name: last.name.clone(),
                locale: last.locale.clone(),
            });
        }

        let route = Arc::make_mut(last);
        route.middlewares = middlewares.into_iter().collect();
        route.middleware_attached = true;
        Ok(self)
    }

    /// Changes the default locale for later registrations and lookups
    ///
    /// Existing routes keep their `is_default_locale` flag.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = Some(locale.into());
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn force_locale(&self) -> bool {
        self.force_locale
    }

    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Distinct registered locales, in registration order
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = Vec::new();
        for locale in self.routes.iter().filter_map(|r| r.locale.as_deref()) {
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        locales
    }

    /// Finds a route by exact name and locale (`None` → default locale)
    pub fn find_by_name(&self, name: &str, locale: Option<&str>) -> Option<&Arc<Route>> {
        let locale = locale.or(self.locale.as_deref());
        self.routes
            .iter()
            .find(|r| r.name == name && r.locale.as_deref() == locale)
    }

    /// Matches a URL; the first registered route that matches wins
    pub fn match_url(&self, url: &str) -> RouteMatch {
        self.match_parsed(ParsedUrl::parse(url))
    }

    /// Same as [`Routes::match_url`] for an already parsed URL
    pub fn match_parsed(&self, parsed_url: ParsedUrl) -> RouteMatch {
        let found = self
            .routes
            .iter()
            .find_map(|route| route.matches(&parsed_url.pathname).map(|params| (route, params)));

        match found {
            Some((route, params)) => {
                debug!(path = %parsed_url.pathname, route = %route.name, locale = ?route.locale, "route matched");
                let mut query = parsed_url.query.clone();
                query.extend(params.clone());
                RouteMatch {
                    route: Some(route.clone()),
                    params,
                    query,
                    parsed_url,
                }
            }
            None => RouteMatch {
                route: None,
                params: Params::new(),
                query: parsed_url.query.clone(),
                parsed_url,
            },
        }
    }

    /// Resolves a route by name and renders its URLs for `params`
    pub fn find_and_get_urls(
        &self,
        name: &str,
        locale: Option<&str>,
        params: &Params,
    ) -> Result<ResolvedRoute, RouteError> {
        let route = self
            .find_by_name(name, locale)
            .ok_or_else(|| RouteError::RouteNotFound {
                name: name.to_string(),
                locale: locale.or(self.locale.as_deref()).map(str::to_string),
            })?;

        let urls = route.urls(params).map_err(|source| RouteError::MissingParam {
            name: name.to_string(),
            source,
        })?;

        Ok(ResolvedRoute {
            route: route.clone(),
            urls,
            by_name: true,
        })
    }

    /// Display URLs of every locale variant of `route`, in registration order
    pub fn multilanguage_urls(&self, route: &Route, query: &Params) -> Vec<LocalizedUrl> {
        self.routes
            .iter()
            .filter(|r| r.name == route.name)
            .filter_map(|r| match r.display_url(query) {
                Ok(url) => Some(LocalizedUrl {
                    url,
                    locale: r.locale.clone(),
                    is_default_locale: r.is_default_locale,
                }),
                Err(err) => {
                    warn!(name = %r.name, locale = ?r.locale, error = %err, "skipping locale variant");
                    None
                }
            })
            .collect()
    }
}

// ============================================================================
// Registration handle
// ============================================================================

/// Handle to the route just added, used to attach its middleware
///
/// ```
/// use rhtmx_routes::{route, Routes, RoutingConfig};
/// use rhtmx_routes::middleware::{middleware_fn, Payload};
///
/// let mut routes = Routes::new(RoutingConfig::with_locale("en"));
/// routes
///     .add(route("account").pattern("/account"))
///     .unwrap()
///     .with_middleware(vec![middleware_fn(|_ctx| async { Ok(Payload::new()) })])
///     .add(route("home").pattern("/"))
///     .unwrap();
///
/// assert_eq!(routes.len(), 2);
/// ```
#[derive(Debug)]
pub struct RouteHandle<'a> {
    routes: &'a mut Routes,
    index: usize,
}

impl<'a> RouteHandle<'a> {
    pub fn route(&self) -> &Route {
        &self.routes.routes[self.index]
    }

    /// Sets the route's middleware chain and hands the registry back
    ///
    /// Consumes the handle, so a route added through [`Routes::add`] gets
    /// its chain at most once.
    pub fn with_middleware<I>(self, middlewares: I) -> &'a mut Routes
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let RouteHandle { routes, index } = self;
        let route = Arc::make_mut(&mut routes.routes[index]);
        route.middlewares = middlewares.into_iter().collect();
        route.middleware_attached = true;
        routes
    }

    /// Sets the middleware chain from a list of names declared in config
    ///
    /// `names` must be an array of strings, each naming an entry of `set`.
    pub fn with_named_middleware(
        self,
        names: &toml::Value,
        set: &MiddlewareSet,
    ) -> Result<&'a mut Routes, RouteError> {
        let list = names.as_array().ok_or(RouteError::InvalidMiddlewareList)?;

        let middlewares = list
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .as_str()
                    .and_then(|name| set.get(name))
                    .ok_or(RouteError::InvalidMiddlewareFunction { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.with_middleware(middlewares))
    }
}
