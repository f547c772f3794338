// File: src/link.rs
// Purpose: Link facade that turns route names into anchors

use axum::http::Uri;
use maud::{Markup, PreEscaped, Render};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RouteError;
use crate::registry::Routes;
use crate::url::Params;

/// Properties of a link, either to a named route or to a literal URL
#[derive(Debug, Clone, Default)]
pub struct LinkProps {
    /// Route name to resolve
    pub route: Option<String>,
    /// Literal URL (absolute, rooted or hash), rendered untouched
    pub href: Option<String>,
    /// Locale of the route, defaults to the link's locale
    pub locale: Option<String>,
    pub params: Params,
    /// Remaining attributes for the rendered element
    pub attrs: BTreeMap<String, String>,
    pub children: Option<Markup>,
}

impl LinkProps {
    pub fn to_route(name: impl Into<String>) -> Self {
        Self {
            route: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn to_href(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn children(mut self, children: Markup) -> Self {
        self.children = Some(children);
        self
    }
}

/// A link after route resolution, ready for rendering
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    /// Canonical URL, or the literal URL on pass-through
    pub href: String,
    /// Display URL when the link was resolved from a route
    pub as_path: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub children: Option<Markup>,
}

/// Renders a resolved link into markup
pub trait LinkRenderer: Send + Sync {
    fn render(&self, link: &ResolvedLink) -> Markup;
}

/// Renders `<a href="…">`, using the display URL as `href` and the
/// canonical one as `data-href`
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorRenderer;

impl LinkRenderer for AnchorRenderer {
    fn render(&self, link: &ResolvedLink) -> Markup {
        let mut out = String::from("<a");

        let href = link.as_path.as_deref().unwrap_or(&link.href);
        push_attr(&mut out, "href", href);
        if link.as_path.is_some() {
            push_attr(&mut out, "data-href", &link.href);
        }
        for (key, value) in link.attrs.iter().filter(|(key, _)| key.as_str() != "href") {
            push_attr(&mut out, key, value);
        }

        out.push('>');
        if let Some(children) = &link.children {
            out.push_str(&children.0);
        }
        out.push_str("</a>");

        PreEscaped(out)
    }
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    // Attribute names come from application code; drop anything odd
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':') {
        return;
    }
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    value.render_to(out);
    out.push('"');
}

/// Attributes kept when a literal URL is passed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub passthrough: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let passthrough = [
            "class",
            "id",
            "title",
            "target",
            "rel",
            "hx-boost",
            "hx-target",
            "hx-swap",
            "hx-push-url",
        ];
        Self {
            passthrough: passthrough.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Builds anchors for named routes
///
/// # Examples
///
/// ```
/// use rhtmx_routes::{route, Routes, RoutingConfig};
/// use rhtmx_routes::link::{Link, LinkProps};
/// use std::sync::Arc;
///
/// let mut routes = Routes::new(RoutingConfig::with_locale("en"));
/// routes.add(route("post").pattern("/posts/:id").page("Post")).unwrap();
///
/// let link = Link::new(Arc::new(routes));
/// let html = link
///     .render(LinkProps::to_route("post").param("id", "42"))
///     .unwrap()
///     .into_string();
/// assert_eq!(html, r#"<a href="/posts/42" data-href="/Post?id=42"></a>"#);
/// ```
#[derive(Clone)]
pub struct Link {
    routes: Arc<Routes>,
    locale: Option<String>,
    config: LinkConfig,
    renderer: Arc<dyn LinkRenderer>,
}

impl Link {
    pub fn new(routes: Arc<Routes>) -> Self {
        Self {
            routes,
            locale: None,
            config: LinkConfig::default(),
            renderer: Arc::new(AnchorRenderer),
        }
    }

    /// Locale used when the props do not name one
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn LinkRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Resolves the props without rendering them
    pub fn resolve(&self, props: LinkProps) -> Result<ResolvedLink, RouteError> {
        if let Some(href) = props.href.as_deref().filter(|href| is_literal_url(href)) {
            let attrs = props
                .attrs
                .iter()
                .filter(|(key, _)| self.config.passthrough.contains(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            return Ok(ResolvedLink {
                href: href.to_string(),
                as_path: None,
                attrs,
                children: props.children,
            });
        }

        let name = props.route.unwrap_or_default();
        let locale = props.locale.or_else(|| self.locale.clone());
        let resolved = self
            .routes
            .find_and_get_urls(&name, locale.as_deref(), &props.params)?;

        Ok(ResolvedLink {
            href: resolved.urls.href,
            as_path: Some(resolved.urls.as_path),
            attrs: props.attrs,
            children: props.children,
        })
    }

    /// Resolves and renders the link
    pub fn render(&self, props: LinkProps) -> Result<Markup, RouteError> {
        let resolved = self.resolve(props)?;
        Ok(self.renderer.render(&resolved))
    }
}

/// Absolute URLs (any scheme), rooted paths and fragments skip route lookup
fn is_literal_url(href: &str) -> bool {
    if href.starts_with('/') || href.starts_with('#') {
        return true;
    }
    let parsed = href
        .parse::<Uri>()
        .map(|uri| uri.scheme().is_some())
        .unwrap_or(false);

    // `Uri` only knows hierarchical URLs; `mailto:` and `tel:` need the prefix check
    parsed || has_scheme(href)
}

/// `scheme ":"` where scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
