//! Security response headers and CORS.
//!
//! Headers are only added when the handler did not set them itself.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Environment;

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Build a Content-Security-Policy whose `connect-src` covers the given
/// upstream URLs. Unparseable URLs are skipped.
pub fn content_security_policy<'a>(upstreams: impl IntoIterator<Item = &'a str>) -> String {
    let mut connect_src = vec!["'self'".to_string()];
    for raw in upstreams {
        if let Ok(url) = url::Url::parse(raw) {
            let origin = url.origin().ascii_serialization();
            if origin != "null" && !connect_src.contains(&origin) {
                connect_src.push(origin);
            }
        }
    }

    format!(
        "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: https:; connect-src {}; frame-ancestors 'self'; object-src 'none'",
        connect_src.join(" ")
    )
}

/// Wrap a router with the standard security headers.
pub fn apply_security_headers(router: Router, environment: Environment, csp: &str) -> Router {
    let mut headers: Vec<(HeaderName, HeaderValue)> = vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
    ];

    match HeaderValue::from_str(csp) {
        Ok(value) => headers.push((header::CONTENT_SECURITY_POLICY, value)),
        Err(e) => tracing::warn!(error = %e, "Skipping invalid Content-Security-Policy"),
    }

    if environment.is_production() {
        headers.push((header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS)));
    }

    headers.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(name, value))
    })
}

/// CORS for the browser front-end. Credentials are allowed, so origins are
/// always an explicit list.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_lists_upstream_origins_once() {
        let csp = content_security_policy([
            "https://api.monday.com/v2",
            "https://xelf.ghost.io/ghost/api/v3/content/posts/",
            "https://api.monday.com/v2/file",
            "not a url",
        ]);
        assert!(csp.contains("connect-src 'self' https://api.monday.com https://xelf.ghost.io;"));
        assert!(csp.starts_with("default-src 'self';"));
    }

    #[test]
    fn test_csp_is_a_valid_header_value() {
        let csp = content_security_policy(["http://127.0.0.1:8080/graphql"]);
        assert!(HeaderValue::from_str(&csp).is_ok());
        assert!(csp.contains("http://127.0.0.1:8080"));
    }
}
