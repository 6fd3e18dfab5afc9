use axum::http::{header, request::Parts, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// One entry of the allowed-origin list.
///
/// Either an exact origin or a pattern with a single `*` standing for one or
/// more subdomain labels, e.g. `https://*.netlify.app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    Exact(String),
    Wildcard { prefix: String, suffix: String },
}

impl OriginPattern {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('*') {
            Some((prefix, suffix)) => OriginPattern::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => OriginPattern::Exact(raw.to_string()),
        }
    }

    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginPattern::Exact(expected) => origin == expected,
            OriginPattern::Wildcard { prefix, suffix } => {
                let Some(middle) = origin
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(suffix.as_str()))
                else {
                    return false;
                };

                !middle.is_empty()
                    && middle
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            }
        }
    }
}

/// CORS policy for the browser front-end.
///
/// A lone `*` in the list allows every origin, in which case credentials are
/// not allowed.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let patterns: Vec<OriginPattern> = allowed_origins
        .iter()
        .map(|origin| OriginPattern::parse(origin))
        .collect();

    layer
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .map(|origin| patterns.iter().any(|p| p.matches(origin)))
                    .unwrap_or(false)
            },
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_origin() {
        let pattern = OriginPattern::parse("http://localhost:3000");

        assert!(pattern.matches("http://localhost:3000"));
        assert!(!pattern.matches("http://localhost:3001"));
        assert!(!pattern.matches("https://localhost:3000"));
    }

    #[test]
    fn test_wildcard_subdomain() {
        let pattern = OriginPattern::parse("https://*.netlify.app");

        assert!(pattern.matches("https://statuesque-toffee-f52484.netlify.app"));
        assert!(pattern.matches("https://deploy-preview-3--site.netlify.app"));
        assert!(!pattern.matches("https://netlify.app"));
        assert!(!pattern.matches("https://.netlify.app"));
        assert!(!pattern.matches("http://site.netlify.app"));
        assert!(!pattern.matches("https://evil.com/.netlify.app"));
        assert!(!pattern.matches("https://site.netlify.app.evil.com"));
    }
}
