//! Origin allow-listing and CORS.
//!
//! Browser callers must come from a configured origin; requests without an
//! `Origin` header (curl, server-to-server) are permitted. Tightening that
//! default would lock out every non-browser integration, so it is kept as
//! an explicit trade-off rather than an oversight.

use axum::http::header::{HeaderValue, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderMap, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::gateway::GatewayError;

/// Reject requests whose `Origin` header is present and not allow-listed.
pub fn check_origin(headers: &HeaderMap, allowed_origins: &[String]) -> Result<(), GatewayError> {
    let Some(origin) = headers.get(ORIGIN) else {
        return Ok(());
    };
    let origin = origin.to_str().unwrap_or_default();
    if allowed_origins.iter().any(|o| o == origin) {
        Ok(())
    } else {
        Err(GatewayError::OriginDenied(origin.to_string()))
    }
}

/// CORS layer for the configured allow-list. Credentials are permitted only
/// because the origin list is explicit, never a wildcard.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["http://localhost:5173".to_string()]
    }

    #[test]
    fn missing_origin_is_permitted() {
        let headers = HeaderMap::new();
        assert!(check_origin(&headers, &allowed()).is_ok());
    }

    #[test]
    fn allow_listed_origin_is_permitted() {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, "http://localhost:5173".parse().unwrap());
        assert!(check_origin(&headers, &allowed()).is_ok());
    }

    #[test]
    fn unknown_origin_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, "https://evil.example".parse().unwrap());
        assert!(matches!(
            check_origin(&headers, &allowed()),
            Err(GatewayError::OriginDenied(_))
        ));
    }
}
