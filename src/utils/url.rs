//! Endpoint URL helpers
//!
//! The generation endpoint is configured as a base URL plus a path. Users
//! write both with or without slashes at the seam, so joining has to cope
//! with either.

/// Join a base URL and an endpoint path with exactly one `/` between them.
///
/// # Examples
///
/// ```
/// use extshift::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://127.0.0.1:8787/", "/api/generate"),
///     "http://127.0.0.1:8787/api/generate"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = endpoint.trim().trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}

/// Whether `url` names an HTTP(S) origin with a non-empty host part.
pub fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            && url.len() > scheme.len()
            && !url[scheme.len()..].starts_with('/')
    })
}
