// File: src/pages.rs
// Purpose: Maud pages rendered for matched routes

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use maud::{html, Markup, DOCTYPE};
use rhtmx_routes::{
    route, Application, LinkProps, MiddlewareError, MiddlewareSet, ParsedUrl, RouteContext,
    RouteError, Routes,
};
use tracing::warn;

/// Routes used when no `routes.toml` declares any
pub fn register_default_routes(routes: &mut Routes, set: &MiddlewareSet) -> Result<(), RouteError> {
    let auth = toml::Value::Array(vec![toml::Value::String("auth".to_string())]);

    routes.add(route("home").locale("en").pattern("/en").page("Home"))?;
    routes.add(route("home").locale("fr").pattern("/fr").page("Home"))?;
    routes.add(route("post").locale("en").pattern("/en/posts/:id").page("Post"))?;
    routes.add(route("post").locale("fr").pattern("/fr/articles/:id").page("Post"))?;
    routes
        .add(route("account").locale("en").pattern("/en/account").page("Account"))?
        .with_named_middleware(&auth, set)?;
    routes
        .add(route("account").locale("fr").pattern("/fr/compte").page("Account"))?
        .with_named_middleware(&auth, set)?;

    Ok(())
}

/// Renders every page of the site
pub struct SiteApp;

#[async_trait]
impl Application for SiteApp {
    async fn render(&self, ctx: RouteContext, page: &str) -> Response {
        let content = match page {
            "Home" => home(&ctx),
            "Post" => post(&ctx),
            "Account" => account(&ctx),
            other => generic(&ctx, other),
        };

        // HTMX requests only need the swapped fragment
        if ctx.is_htmx() {
            return Html(content.into_string()).into_response();
        }
        Html(layout(&ctx, page, content).into_string()).into_response()
    }

    async fn render_error(
        &self,
        error: MiddlewareError,
        ctx: RouteContext,
        pathname: &str,
    ) -> Response {
        let content = html! {
            section.error {
                h1 { (error.status_or_default().as_u16()) }
                p { (error.message()) }
                p.path { (pathname) }
            }
        };
        Html(layout(&ctx, "Error", content).into_string()).into_response()
    }

    async fn handle_default(&self, _req: Request<Body>, parsed_url: ParsedUrl) -> Response {
        let markup = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8";
                    title { "Not found" }
                }
                body {
                    h1 { "404" }
                    p { "Nothing lives at " code { (parsed_url.pathname) } }
                }
            }
        };
        (StatusCode::NOT_FOUND, Html(markup.into_string())).into_response()
    }
}

fn layout(ctx: &RouteContext, title: &str, content: Markup) -> Markup {
    let lang = ctx.locale.as_deref().unwrap_or("en");

    html! {
        (DOCTYPE)
        html lang=(lang) {
            head {
                meta charset="UTF-8";
                title { (title) }
                script src="https://unpkg.com/htmx.org@1.9.12" {}
                @if let Some(site_url) = &ctx.site_url {
                    link rel="canonical" href={ (site_url) (ctx.uri.path()) };
                }
                @for variant in ctx.multilanguage_urls() {
                    @if let Some(locale) = &variant.locale {
                        link rel="alternate" hreflang=(locale) href=(variant.url);
                    }
                }
            }
            body hx-boost="true" {
                nav {
                    (nav_link(ctx, LinkProps::to_route("home").children(html! { "Home" })))
                    (nav_link(ctx, LinkProps::to_route("account").children(html! { "Account" })))
                }
                ul.languages {
                    @for variant in ctx.multilanguage_urls() {
                        li {
                            a href=(variant.url) {
                                (variant.locale.as_deref().unwrap_or("-"))
                            }
                        }
                    }
                }
                main id="content" { (content) }
            }
        }
    }
}

fn nav_link(ctx: &RouteContext, props: LinkProps) -> Markup {
    ctx.link().render(props).unwrap_or_else(|err| {
        warn!(error = %err, "skipping navigation link");
        html! {}
    })
}

fn home(ctx: &RouteContext) -> Markup {
    html! {
        h1 { "Welcome to RHTMX" }
        p { "Named, localized routes on top of Rust + HTMX." }
        ul {
            @for id in ["1", "2", "3"] {
                li {
                    (nav_link(ctx, LinkProps::to_route("post")
                        .param("id", id)
                        .children(html! { "Post " (id) })))
                }
            }
        }
    }
}

fn post(ctx: &RouteContext) -> Markup {
    let id = ctx.query.get("id").map(String::as_str).unwrap_or("?");
    let title = ctx
        .data
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("Post");

    html! {
        article {
            h1 { (title) " #" (id) }
            p { "Rendered for route " code { (ctx.route.name) } }
        }
    }
}

fn account(ctx: &RouteContext) -> Markup {
    let user = ctx.data.get("user").and_then(|v| v.as_str()).unwrap_or("guest");

    html! {
        h1 { "Account" }
        p { "Signed in as " strong { (user) } }
    }
}

fn generic(ctx: &RouteContext, page: &str) -> Markup {
    html! {
        h1 { (page) }
        @if !ctx.data.is_empty() {
            pre { (serde_json::Value::Object(ctx.data.clone())) }
        }
    }
}
