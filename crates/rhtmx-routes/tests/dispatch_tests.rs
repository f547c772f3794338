use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use pretty_assertions::assert_eq;
use rhtmx_routes::middleware::{middleware_fn, Payload};
use rhtmx_routes::{
    get_request_handler, route, Application, MiddlewareError, ParsedUrl, RequestHandler,
    RouteContext, RouteHandler, Routes, RoutingConfig,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Renders what it was given as plain text so tests can assert on it
struct TestApp;

#[async_trait]
impl Application for TestApp {
    async fn render(&self, ctx: RouteContext, page: &str) -> Response {
        let data = serde_json::Value::Object(ctx.data.clone());
        let query = serde_json::to_value(&ctx.query).unwrap_or_default();
        format!(
            "page={} locale={} data={} query={}",
            page,
            ctx.locale.as_deref().unwrap_or("-"),
            data,
            query
        )
        .into_response()
    }

    async fn render_error(
        &self,
        error: MiddlewareError,
        ctx: RouteContext,
        pathname: &str,
    ) -> Response {
        // status is overwritten by the dispatcher
        (
            StatusCode::OK,
            format!("error={} route={} path={}", error, ctx.route.name, pathname),
        )
            .into_response()
    }

    async fn handle_default(&self, _req: Request<Body>, parsed_url: ParsedUrl) -> Response {
        (StatusCode::NOT_FOUND, format!("default={}", parsed_url.pathname)).into_response()
    }
}

fn data(key: &str, value: serde_json::Value) -> Payload {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), value);
    payload
}

fn routes(force_locale: bool) -> Routes {
    let mut routes = Routes::new(RoutingConfig::with_locale("en").force_locale(force_locale));
    routes
        .add(route("post").locale("en").pattern("/en/posts/:id").page("Post"))
        .unwrap();
    routes
        .add(route("post").locale("fr").pattern("/fr/articles/:id").page("Post"))
        .unwrap();
    routes
        .add(route("account").locale("en").pattern("/en/account").page("Account"))
        .unwrap()
        .with_middleware(vec![
            middleware_fn(|_ctx| async { Ok(data("user", json!("ada"))) }),
            middleware_fn(|_ctx| async {
                let mut payload = data("user", json!("grace"));
                payload.insert("plan".to_string(), json!("pro"));
                Ok(payload)
            }),
        ]);
    routes
        .add(route("admin").locale("en").pattern("/en/admin").page("Admin"))
        .unwrap()
        .with_middleware(vec![middleware_fn(|ctx| async move {
            match ctx.get_cookie("role").map(String::as_str) {
                Some("admin") => Ok(Payload::new()),
                Some(_) => Err(MiddlewareError::new("forbidden").with_status(StatusCode::FORBIDDEN)),
                None => Err(MiddlewareError::new("no role")),
            }
        })]);
    routes
}

fn handler(force_locale: bool) -> RequestHandler {
    RequestHandler::new(Arc::new(routes(force_locale)), Arc::new(TestApp))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_matched_route_renders_page_with_query() {
    let response = handler(false).handle(get("/fr/articles/9?ref=feed")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        r#"page=Post locale=fr data={} query={"id":"9","ref":"feed"}"#
    );
}

#[tokio::test]
async fn test_middleware_payloads_merge_last_write_wins() {
    let response = handler(false).handle(get("/en/account")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        r#"page=Account locale=en data={"plan":"pro","user":"grace"} query={}"#
    );
}

#[tokio::test]
async fn test_middleware_error_uses_its_status() {
    let request = Request::builder()
        .uri("/en/admin")
        .header("cookie", "role=guest")
        .body(Body::empty())
        .unwrap();
    let response = handler(false).handle(request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(response).await,
        "error=forbidden route=admin path=/en/admin"
    );
}

#[tokio::test]
async fn test_middleware_error_defaults_to_500() {
    let response = handler(false).handle(get("/en/admin")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_middleware_passes() {
    let request = Request::builder()
        .uri("/en/admin")
        .header("cookie", "role=admin")
        .body(Body::empty())
        .unwrap();
    let response = handler(false).handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_middleware_chain_stops_at_first_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();

    let mut routes = Routes::new(RoutingConfig::with_locale("en"));
    routes
        .add(route("guarded").pattern("/guarded"))
        .unwrap()
        .with_middleware(vec![
            middleware_fn(|_ctx| async { Err(MiddlewareError::new("stop")) }),
            middleware_fn(move |_ctx| {
                let counted = counted.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(Payload::new())
                }
            }),
        ]);

    let handler = RequestHandler::new(Arc::new(routes), Arc::new(TestApp));
    let response = handler.handle(get("/guarded")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unmatched_goes_to_default_handler() {
    let response = handler(true).handle(get("/assets/app.css")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "default=/assets/app.css");
}

#[tokio::test]
async fn test_root_redirects_to_detected_locale() {
    let request = Request::builder()
        .uri("/")
        .header("accept-language", "fr-FR,fr;q=0.9,en;q=0.5")
        .body(Body::empty())
        .unwrap();
    let response = handler(true).handle(request).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "/fr");
}

#[tokio::test]
async fn test_root_redirects_to_default_locale() {
    let response = handler(true).handle(get("/")).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "/en");
}

#[tokio::test]
async fn test_root_without_force_locale_falls_through() {
    let response = handler(false).handle(get("/")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "default=/");
}

#[tokio::test]
async fn test_registered_root_route_is_not_redirected() {
    let mut routes = routes(true);
    routes.add(route("landing").pattern("/").page("Landing")).unwrap();
    let handler = RequestHandler::new(Arc::new(routes), Arc::new(TestApp));

    let response = handler.handle(get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.starts_with("page=Landing"));
}

struct EchoRoute;

#[async_trait]
impl RouteHandler for EchoRoute {
    async fn handle(&self, ctx: RouteContext) -> Response {
        let links: Vec<String> = ctx
            .multilanguage_urls()
            .iter()
            .map(|u| format!("{}:{}", u.locale.as_deref().unwrap_or("-"), u.url))
            .collect();
        format!("custom {} {}", ctx.route.name, links.join(",")).into_response()
    }
}

#[tokio::test]
async fn test_custom_handler_replaces_render() {
    let handler = get_request_handler(
        Arc::new(routes(false)),
        Arc::new(TestApp),
        Some(Arc::new(EchoRoute)),
    );
    let response = handler.handle(get("/en/posts/5")).await;

    assert_eq!(
        body_text(response).await,
        "custom post en:/en/posts/5,fr:/fr/articles/5"
    );
}

#[tokio::test]
async fn test_custom_handler_not_used_on_middleware_error() {
    let handler = handler(false).with_custom_handler(Arc::new(EchoRoute));
    let response = handler.handle(get("/en/admin")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.starts_with("error=no role"));
}

#[tokio::test]
async fn test_into_router_serves_every_path() {
    let router = handler(true).into_router();

    let response = router.clone().oneshot(get("/en/posts/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);

    let response = router.oneshot(get("/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_route_data_is_overlaid_by_middleware() {
    let mut static_data = data("title", json!("Account"));
    static_data.insert("user".to_string(), json!("nobody"));

    let mut routes = Routes::new(RoutingConfig::with_locale("en"));
    routes
        .add(route("me").pattern("/me").page("Me").data(static_data))
        .unwrap()
        .with_middleware(vec![middleware_fn(|_ctx| async { Ok(data("user", json!("ada"))) })]);

    let handler = RequestHandler::new(Arc::new(routes), Arc::new(TestApp));
    let response = handler.handle(get("/me")).await;

    assert_eq!(
        body_text(response).await,
        r#"page=Me locale=en data={"title":"Account","user":"ada"} query={}"#
    );
}
