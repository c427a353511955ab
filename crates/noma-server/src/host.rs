//! Host-side URL routing.
//!
//! The host matches `<base>/{version}/{endpoint}[/{identifier}]` and hands
//! the captured params to the pipeline as a [`LegacyRequest`]. Paths that do
//! not match still reach the pipeline, just without params.

use http::header::ACCEPT;
use http::HeaderMap;
use noma_core::{LegacyRequest, RouteParams, JSON_CONTENT_TYPE};

/// Matches API paths under a base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRouter {
    base_path: String,
}

impl HostRouter {
    /// Creates a router for `base_path` (e.g. `/api`).
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the base path without a trailing slash.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Matches `path` against the API routes.
    ///
    /// A single trailing slash is ignored. Empty segments never match.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let rest = path.strip_prefix(&self.base_path)?.strip_prefix('/')?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        match segments.as_slice() {
            [version, endpoint] => Some(RouteParams::new(*version, *endpoint)),
            [version, endpoint, identifier] => {
                Some(RouteParams::new(*version, *endpoint).with_identifier(*identifier))
            }
            _ => None,
        }
    }

    /// Builds the legacy request the pipeline adapts.
    pub fn legacy_request(&self, path: &str, headers: &HeaderMap) -> LegacyRequest {
        let mut legacy = LegacyRequest::new().with_api_request(accepts_json(headers));

        if let Some(params) = self.match_path(path) {
            let named = [
                ("version", params.version),
                ("endpoint", params.endpoint),
                ("identifier", params.identifier),
            ];
            for (name, value) in named {
                if let Some(value) = value {
                    legacy = legacy.with_param(name, value);
                }
            }
        }
        legacy
    }
}

/// Returns `true` if any `Accept` header lists `application/json`.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|range| range.split(';').next())
        .any(|media| media.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
}
