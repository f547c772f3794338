// File: src/dispatch.rs
// Purpose: Per-request dispatch: match, run middleware, render

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use tracing::{debug, info, warn};

use crate::context::RouteContext;
use crate::error::MiddlewareError;
use crate::locale::{AcceptLanguageDetector, LocaleDetector};
use crate::middleware;
use crate::registry::Routes;
use crate::route::Route;
use crate::url::{Params, ParsedUrl};

/// What the application provides to the dispatcher
#[async_trait]
pub trait Application: Send + Sync {
    /// Render `page` for a matched route (query is on `ctx.query`)
    async fn render(&self, ctx: RouteContext, page: &str) -> Response;

    /// Render the error page for a failed middleware chain
    ///
    /// The dispatcher sets the final status from the error afterwards.
    async fn render_error(&self, error: MiddlewareError, ctx: RouteContext, pathname: &str)
        -> Response;

    /// Handle a request no route matched (static files, 404, ...)
    async fn handle_default(&self, req: Request<Body>, parsed_url: ParsedUrl) -> Response;
}

/// Replaces [`Application::render`] for every matched route
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, ctx: RouteContext) -> Response;
}

/// Resolves requests against a frozen route registry
///
/// Cloning is cheap; every clone shares the same registry and application.
#[derive(Clone)]
pub struct RequestHandler {
    routes: Arc<Routes>,
    app: Arc<dyn Application>,
    custom: Option<Arc<dyn RouteHandler>>,
    detector: Arc<dyn LocaleDetector>,
}

/// Builds the request handler for `routes`
pub fn get_request_handler(
    routes: Arc<Routes>,
    app: Arc<dyn Application>,
    custom: Option<Arc<dyn RouteHandler>>,
) -> RequestHandler {
    let handler = RequestHandler::new(routes, app);
    match custom {
        Some(custom) => handler.with_custom_handler(custom),
        None => handler,
    }
}

impl RequestHandler {
    pub fn new(routes: Arc<Routes>, app: Arc<dyn Application>) -> Self {
        Self {
            routes,
            app,
            custom: None,
            detector: Arc::new(AcceptLanguageDetector),
        }
    }

    pub fn with_custom_handler(mut self, custom: Arc<dyn RouteHandler>) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn with_locale_detector(mut self, detector: Arc<dyn LocaleDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn routes(&self) -> &Arc<Routes> {
        &self.routes
    }

    /// An axum router that sends every request through this handler
    pub fn into_router(self) -> axum::Router {
        axum::Router::new().fallback_service(self)
    }

    /// Dispatches one request
    pub async fn handle(&self, req: Request<Body>) -> Response {
        let found = self.routes.match_parsed(ParsedUrl::from_uri(req.uri()));

        match found.route {
            Some(route) => self.dispatch_route(req, route, found.query, found.parsed_url).await,
            None => self.dispatch_miss(req, found.parsed_url).await,
        }
    }

    async fn dispatch_route(
        &self,
        req: Request<Body>,
        route: Arc<Route>,
        query: Params,
        parsed_url: ParsedUrl,
    ) -> Response {
        let (parts, body) = req.into_parts();
        let mut ctx = RouteContext::new(parts, body, route.clone(), query, self.routes.clone());

        match middleware::run(route.middlewares(), &ctx.middleware_context()).await {
            Err(error) => {
                let status = error.status_or_default();
                warn!(
                    route = %route.name,
                    path = %parsed_url.pathname,
                    status = status.as_u16(),
                    error = %error,
                    "rendering error page"
                );
                let mut response = self.app.render_error(error, ctx, &parsed_url.pathname).await;
                *response.status_mut() = status;
                response
            }
            Ok(payload) => {
                ctx.data.extend(payload);
                match &self.custom {
                    Some(custom) => custom.handle(ctx).await,
                    None => {
                        debug!(route = %route.name, page = %route.page, "rendering page");
                        self.app.render(ctx, &route.page).await
                    }
                }
            }
        }
    }

    async fn dispatch_miss(&self, req: Request<Body>, parsed_url: ParsedUrl) -> Response {
        if parsed_url.pathname == "/" && self.routes.force_locale() {
            let (parts, body) = req.into_parts();
            if let Some(locale) = self.detector.detect(&parts, &self.routes) {
                let location = format!("/{}", locale);
                info!(%location, "redirecting root to locale home");
                return redirect_permanent(&location);
            }
            return self
                .app
                .handle_default(Request::from_parts(parts, body), parsed_url)
                .await;
        }

        self.app.handle_default(req, parsed_url).await
    }
}

fn redirect_permanent(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}
