mod middleware;
mod pages;

use anyhow::Context;
use rhtmx_routes::{Config, RequestHandler, Routes};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::pages::{register_default_routes, SiteApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config_path =
        std::env::var("RHTMX_ROUTES_CONFIG").unwrap_or_else(|_| "routes.toml".to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        warn!("Failed to load config: {:#}, using defaults", e);
        Config::default()
    });

    let named = middleware::named();
    let mut routes = Routes::from_config(&config, &named)?;
    if routes.is_empty() {
        // No routes declared; serve the built-in demo pages
        register_default_routes(&mut routes, &named)?;
    }

    info!(
        routes = routes.len(),
        locales = ?routes.locales(),
        force_locale = routes.force_locale(),
        "routes registered"
    );
    for route in routes.iter() {
        info!(
            "  {} [{}] {} -> {}",
            route.name,
            route.locale.as_deref().unwrap_or("-"),
            route.pattern.source(),
            route.page
        );
    }

    let app = RequestHandler::new(Arc::new(routes), Arc::new(SiteApp))
        .into_router()
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
