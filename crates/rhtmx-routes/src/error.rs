// File: src/error.rs
// Purpose: Error taxonomy for route registration, lookup and middleware

use axum::http::StatusCode;
use thiserror::Error;

use crate::pattern::PatternError;

/// Errors raised while declaring routes or resolving them by name.
///
/// Registration errors are meant to abort application startup; lookup
/// errors only fail the link or navigation call that triggered them.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route \"{name}\" already exists for locale {}", display_locale(.locale))]
    RouteAlreadyExists {
        name: String,
        locale: Option<String>,
    },

    #[error("route \"{name}\" not found for locale {}", display_locale(.locale))]
    RouteNotFound {
        name: String,
        locale: Option<String>,
    },

    #[error("middleware must be declared as a list")]
    InvalidMiddlewareList,

    #[error("middleware at position {index} is not a registered middleware")]
    InvalidMiddlewareFunction { index: usize },

    #[error("cannot attach middleware: no route has been added yet")]
    NoRouteToAttachMiddleware,

    #[error("route \"{name}\" already has middleware for locale {}", display_locale(.locale))]
    MiddlewareAlreadySet {
        name: String,
        locale: Option<String>,
    },

    #[error("invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("route \"{name}\": {source}")]
    MissingParam {
        name: String,
        #[source]
        source: PatternError,
    },
}

fn display_locale(locale: &Option<String>) -> String {
    match locale {
        Some(locale) => format!("\"{}\"", locale),
        None => "<none>".to_string(),
    }
}

/// Error signalled by a middleware while handling a request.
///
/// Carries an optional HTTP status; the dispatcher falls back to 500.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct MiddlewareError {
    message: String,
    status: Option<StatusCode>,
}

impl MiddlewareError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Attach the status code the error page should be served with.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Status to respond with: the carried one, or 500.
    pub fn status_or_default(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
