//! # RHTMX Routes
//!
//! Named, localized routes for RHTMX applications:
//! - Patterns with parameters (`/posts/:id`, `/posts/:id?`, `/docs/*slug`)
//! - One name per page, one pattern per locale
//! - Per-route async middleware whose payloads reach the renderer
//! - Reverse lookup: build URLs from a route name and parameters
//! - Locale redirect from `/` when every URL carries a locale
//!
//! ## URLs
//!
//! Every route has two URLs. The *display URL* is the pretty one the
//! visitor sees (`/posts/42`). The *canonical URL* names the page and
//! carries every parameter as query (`/Post?id=42`).
//!
//! ## Lifecycle
//!
//! Routes are registered through `&mut Routes`, then the registry is frozen
//! in an `Arc` and handed to the [`RequestHandler`]. Nothing mutates it
//! while requests are served.
//!
//! ## Example
//!
//! ```
//! use rhtmx_routes::{route, Routes, RoutingConfig};
//! use rhtmx_routes::url::Params;
//!
//! let mut routes = Routes::new(RoutingConfig::with_locale("en"));
//! routes.add(route("post").locale("en").pattern("/en/posts/:id").page("Post")).unwrap();
//! routes.add(route("post").locale("fr").pattern("/fr/articles/:id").page("Post")).unwrap();
//!
//! let found = routes.match_url("/fr/articles/7?ref=feed");
//! assert_eq!(found.route.unwrap().locale.as_deref(), Some("fr"));
//! assert_eq!(found.query.get("id"), Some(&"7".to_string()));
//!
//! let mut params = Params::new();
//! params.insert("id".to_string(), "7".to_string());
//! let resolved = routes.find_and_get_urls("post", None, &params).unwrap();
//! assert_eq!(resolved.urls.as_path, "/en/posts/7");
//! assert_eq!(resolved.urls.href, "/Post?id=7");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod locale;
pub mod middleware;
pub mod navigation;
pub mod pattern;
pub mod registry;
pub mod route;
pub mod url;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{Config, RoutingConfig, ServerConfig};
pub use context::RouteContext;
pub use dispatch::{get_request_handler, Application, RequestHandler, RouteHandler};
pub use error::{MiddlewareError, RouteError};
pub use link::{Link, LinkProps};
pub use locale::{AcceptLanguageDetector, LocaleDetector};
pub use middleware::{middleware_fn, Middleware, MiddlewareContext, MiddlewareSet, Payload};
pub use navigation::{NavigateOptions, Navigation};
pub use registry::{route, RouteDeclaration, RouteDescriptor, RouteHandle, RouteMatch, Routes};
pub use route::{Route, RouteUrls};
pub use url::{Params, ParsedUrl};
