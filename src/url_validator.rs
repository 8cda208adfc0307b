//! Destination URL validation

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL cannot be empty")]
    Empty,
    #[error("Invalid URL: {0}")]
    Malformed(String),
    #[error("URL scheme must be http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("URL must include a host")]
    MissingHost,
}

/// Validate an absolute http(s) URL and return its normalized form
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(raw).map_err(|e| UrlError::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    Ok(parsed.to_string())
}
