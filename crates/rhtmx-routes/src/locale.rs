// File: src/locale.rs
// Purpose: Picks the locale a visitor of `/` is redirected to

use axum::http::request::Parts;
use axum::http::header::ACCEPT_LANGUAGE;

use crate::context::parse_cookies;
use crate::registry::Routes;

/// Cookie that pins a visitor's locale
pub const LOCALE_COOKIE: &str = "locale";

/// Chooses the best locale for a request
pub trait LocaleDetector: Send + Sync {
    fn detect(&self, request: &Parts, routes: &Routes) -> Option<String>;
}

/// Detects the locale from the `locale` cookie, then `Accept-Language`,
/// then falls back to the registry default
///
/// Cookie and header values only count when some route is registered in
/// that locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptLanguageDetector;

impl LocaleDetector for AcceptLanguageDetector {
    fn detect(&self, request: &Parts, routes: &Routes) -> Option<String> {
        let registered = routes.locales();

        let from_cookie = parse_cookies(&request.headers)
            .get(LOCALE_COOKIE)
            .and_then(|wanted| find_locale(&registered, wanted));

        let from_header = || {
            request
                .headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok())
                .and_then(|header| {
                    parse_accept_language(header)
                        .into_iter()
                        .find_map(|tag| find_locale(&registered, &tag))
                })
        };

        from_cookie
            .or_else(from_header)
            .or_else(|| routes.locale().map(str::to_string))
    }
}

/// Finds a registered locale for a language tag: exact match first, then
/// primary subtag (`fr-CH` → `fr`)
fn find_locale(registered: &[&str], tag: &str) -> Option<String> {
    if let Some(exact) = registered.iter().find(|l| l.eq_ignore_ascii_case(tag)) {
        return Some(exact.to_string());
    }

    let primary = primary_subtag(tag);
    registered
        .iter()
        .find(|l| primary_subtag(l).eq_ignore_ascii_case(primary))
        .map(|l| l.to_string())
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Language tags of an `Accept-Language` header, best first
///
/// Wildcards and entries with `q=0` are dropped; ties keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    // Stable sort keeps header order for equal weights
    tags.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    tags.into_iter().map(|(tag, _)| tag).collect()
}
