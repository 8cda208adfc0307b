//! Where the client sends requests and how it builds derived link URLs

use url::Url;

/// Origin the short links are shared under plus the resolved API base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    origin: String,
    /// Empty means same-origin
    api_base: String,
}

impl Endpoints {
    /// `origin` must be an absolute URL; only its origin part is kept.
    /// `configured_api_base` may be empty, relative, or absolute.
    pub fn new(origin: &str, configured_api_base: &str) -> Result<Self, url::ParseError> {
        let page = Url::parse(origin.trim())?;
        let origin = page.origin().ascii_serialization();
        let base = Url::parse(&origin)?;
        Ok(Self {
            api_base: resolve_api_base(configured_api_base, &base),
            origin,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Base URL requests go to
    pub fn request_base(&self) -> &str {
        if self.api_base.is_empty() {
            &self.origin
        } else {
            &self.api_base
        }
    }

    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/r/{}", self.origin, slug)
    }

    pub fn qr_code_url(&self, slug: &str) -> String {
        format!("{}/api/qr?slug={}", self.request_base(), slug)
    }
}

/// Resolve a configured API base against the page origin.
///
/// An `http` base seen from an `https` page is rewritten onto the page origin,
/// keeping only its path, so browsers never block the calls as mixed content.
pub fn resolve_api_base(raw: &str, page: &Url) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let candidate = match page.join(raw) {
        Ok(candidate) => candidate,
        Err(_) => return raw.trim_end_matches('/').to_string(),
    };

    let resolved = if page.scheme() == "https" && candidate.scheme() == "http" {
        let path = match candidate.path() {
            "/" => "",
            path => path,
        };
        format!("{}{}", page.origin().ascii_serialization(), path)
    } else {
        candidate.to_string()
    };

    resolved.trim_end_matches('/').to_string()
}
