//! Path pattern compiler
//!
//! Turns templates such as `/posts/:id` into a matcher (path → params) and a
//! URL builder (params → path). The segment syntax is the one used by the
//! RHTMX file router:
//!
//! - `about` static segment
//! - `:id` required parameter
//! - `:id?` optional parameter
//! - `*slug` catch-all (one or more segments)
//! - `*slug?` optional catch-all (zero or more segments)
//!
//! All functions are **pure**: same input → same output, no side effects.

use std::collections::HashSet;
use thiserror::Error;

use crate::url::Params;

/// Errors produced while compiling a pattern or building a path from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("parameter name is empty")]
    EmptyParamName,

    #[error("parameter \"{0}\" is declared more than once")]
    DuplicateParam(String),

    #[error("catch-all parameter \"{0}\" must be the last segment")]
    CatchAllNotLast(String),

    #[error("missing value for parameter \"{0}\"")]
    MissingParam(String),
}

/// One segment of a compiled pattern
///
/// # Examples
///
/// ```
/// use rhtmx_routes::pattern::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("about"), Segment::Static("about".to_string()));
/// assert_eq!(classify_segment(":id"), Segment::Required("id".to_string()));
/// assert_eq!(classify_segment(":id?"), Segment::Optional("id".to_string()));
/// assert_eq!(classify_segment("*slug"), Segment::CatchAll("slug".to_string()));
/// assert_eq!(classify_segment("*slug?"), Segment::OptionalCatchAll("slug".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Required(String),
    Optional(String),
    CatchAll(String),
    OptionalCatchAll(String),
}

impl Segment {
    /// Parameter name, `None` for static segments
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Required(name)
            | Segment::Optional(name)
            | Segment::CatchAll(name)
            | Segment::OptionalCatchAll(name) => Some(name),
        }
    }

    fn is_catch_all(&self) -> bool {
        matches!(self, Segment::CatchAll(_) | Segment::OptionalCatchAll(_))
    }
}

/// Classifies a raw template segment (pure function)
pub fn classify_segment(segment: &str) -> Segment {
    match segment.chars().next() {
        Some('*') => match segment[1..].strip_suffix('?') {
            Some(name) => Segment::OptionalCatchAll(name.to_string()),
            None => Segment::CatchAll(segment[1..].to_string()),
        },
        Some(':') => match segment[1..].strip_suffix('?') {
            Some(name) => Segment::Optional(name.to_string()),
            None => Segment::Required(segment[1..].to_string()),
        },
        _ => Segment::Static(segment.to_string()),
    }
}

/// A compiled path template
///
/// # Examples
///
/// ```
/// use rhtmx_routes::pattern::Pattern;
/// use std::collections::BTreeMap;
///
/// let pattern = Pattern::compile("/posts/:id").unwrap();
/// let params = pattern.match_path("/posts/42").unwrap();
/// assert_eq!(params.get("id"), Some(&"42".to_string()));
///
/// let mut params = BTreeMap::new();
/// params.insert("id".to_string(), "7".to_string());
/// assert_eq!(pattern.build_path(&params).unwrap(), "/posts/7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles a template into a pattern
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        if !source.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        let segments: Vec<Segment> = source
            .split('/')
            .filter(|s| !s.is_empty())
            .map(classify_segment)
            .collect();

        let mut seen = HashSet::new();
        for (idx, segment) in segments.iter().enumerate() {
            let Some(name) = segment.param_name() else {
                continue;
            };
            if name.is_empty() {
                return Err(PatternError::EmptyParamName);
            }
            if !seen.insert(name) {
                return Err(PatternError::DuplicateParam(name.to_string()));
            }
            if segment.is_catch_all() && idx + 1 != segments.len() {
                return Err(PatternError::CatchAllNotLast(name.to_string()));
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template this pattern was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all parameters, in template order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Matches a pathname, returning the decoded parameters on success
    ///
    /// Empty path segments are ignored, so `/about/` and `//about` both
    /// match `/about`. Optional parameters that were not present are absent
    /// from the result.
    pub fn match_path(&self, pathname: &str) -> Option<Params> {
        let path_segments: Vec<String> = pathname
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect();

        match_segments(&self.segments, &path_segments, Params::new())
    }

    /// Builds a concrete path by substituting `params` into the template
    ///
    /// Values and static text are percent-encoded per segment, so the
    /// result is plain ASCII. Parameters that are not part
    /// of the template are ignored here; callers append them as a query
    /// string.
    pub fn build_path(&self, params: &Params) -> Result<String, PatternError> {
        let mut parts: Vec<String> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => parts.push(encode_segment(text)),
                Segment::Required(name) => {
                    let value = non_empty(params, name)
                        .ok_or_else(|| PatternError::MissingParam(name.clone()))?;
                    parts.push(encode_segment(value));
                }
                Segment::Optional(name) => {
                    if let Some(value) = non_empty(params, name) {
                        parts.push(encode_segment(value));
                    }
                }
                Segment::CatchAll(name) => {
                    let value = non_empty(params, name)
                        .ok_or_else(|| PatternError::MissingParam(name.clone()))?;
                    parts.extend(encode_catch_all(value));
                }
                Segment::OptionalCatchAll(name) => {
                    if let Some(value) = non_empty(params, name) {
                        parts.extend(encode_catch_all(value));
                    }
                }
            }
        }

        if parts.is_empty() {
            Ok("/".to_string())
        } else {
            Ok(format!("/{}", parts.join("/")))
        }
    }
}

fn non_empty<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn encode_catch_all(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
}

/// Walks pattern and path segments together (tail-recursive)
fn match_segments(pattern: &[Segment], path: &[String], mut params: Params) -> Option<Params> {
    let Some((segment, rest)) = pattern.split_first() else {
        return path.is_empty().then_some(params);
    };

    match segment {
        Segment::Static(text) => {
            let (head, tail) = path.split_first()?;
            if head != text {
                return None;
            }
            match_segments(rest, tail, params)
        }
        Segment::Required(name) => {
            let (head, tail) = path.split_first()?;
            params.insert(name.clone(), head.clone());
            match_segments(rest, tail, params)
        }
        Segment::Optional(name) => {
            // Try consuming first, then fall back to skipping the parameter
            if let Some((head, tail)) = path.split_first() {
                let mut with_param = params.clone();
                with_param.insert(name.clone(), head.clone());
                if let Some(found) = match_segments(rest, tail, with_param) {
                    return Some(found);
                }
            }
            match_segments(rest, path, params)
        }
        Segment::CatchAll(name) => {
            if path.is_empty() {
                return None;
            }
            params.insert(name.clone(), path.join("/"));
            Some(params)
        }
        Segment::OptionalCatchAll(name) => {
            if !path.is_empty() {
                params.insert(name.clone(), path.join("/"));
            }
            Some(params)
        }
    }
}
