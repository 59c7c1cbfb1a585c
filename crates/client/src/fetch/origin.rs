//! Origin allow-list.
//!
//! Only requests whose origin is listed (the application's own origin plus
//! explicit loopback aliases) are eligible for caching. Matching compares
//! scheme and host exactly, so `https://localhost.evil.test` never passes for
//! `https://localhost`. An entry without a port admits any port.

use url::Url;

/// Error type for allow-list construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OriginError {
    #[error("invalid origin {0:?}: {1}")]
    Invalid(String, String),

    #[error("origin {0:?} must use http or https")]
    Scheme(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AllowedOrigin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl AllowedOrigin {
    fn parse(origin: &str) -> Result<Self, OriginError> {
        let url = Url::parse(origin.trim()).map_err(|e| OriginError::Invalid(origin.to_string(), e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(OriginError::Scheme(origin.to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| OriginError::Invalid(origin.to_string(), "missing host".into()))?;

        let port = explicit_port(origin, &url);

        Ok(Self { scheme: url.scheme().to_string(), host: host.to_string(), port })
    }

    fn admits(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.host_str() == Some(self.host.as_str())
            && self.port.is_none_or(|port| url.port_or_known_default() == Some(port))
    }
}

/// `Url` elides default ports; recover one the operator wrote out on purpose.
fn explicit_port(raw: &str, url: &Url) -> Option<u16> {
    url.port().or_else(|| {
        let authority = raw.trim().split("://").nth(1)?.split('/').next()?;
        let (_, port) = authority.rsplit_once(':')?;
        port.parse().ok()
    })
}

/// Set of origins whose requests may be cached.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    entries: Vec<AllowedOrigin>,
}

impl OriginAllowList {
    pub fn new<I, S>(origins: I) -> Result<Self, OriginError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = origins
            .into_iter()
            .map(|o| AllowedOrigin::parse(o.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn allows(&self, url: &Url) -> bool {
        self.entries.iter().any(|entry| entry.admits(url))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn default_list() -> OriginAllowList {
        OriginAllowList::new(["https://app.example.com", "https://localhost", "https://127.0.0.1"]).unwrap()
    }

    #[test]
    fn test_allows_listed_origins() {
        let list = default_list();
        assert!(list.allows(&url("https://app.example.com/index.html")));
        assert!(list.allows(&url("https://localhost/algorithms.wasm")));
        assert!(list.allows(&url("https://127.0.0.1/app.js")));
    }

    #[test]
    fn test_portless_entry_admits_any_port() {
        assert!(default_list().allows(&url("https://localhost:8443/")));
    }

    #[test]
    fn test_rejects_prefix_lookalike() {
        assert!(!default_list().allows(&url("https://localhost.evil.test/")));
    }

    #[test]
    fn test_rejects_other_scheme() {
        assert!(!default_list().allows(&url("http://localhost/")));
    }

    #[test]
    fn test_rejects_foreign_origin() {
        assert!(!default_list().allows(&url("https://cdn.example.net/lib.js")));
    }

    #[test]
    fn test_explicit_port_must_match() {
        let list = OriginAllowList::new(["http://localhost:8080"]).unwrap();
        assert!(list.allows(&url("http://localhost:8080/")));
        assert!(!list.allows(&url("http://localhost:9090/")));
    }

    #[test]
    fn test_explicit_default_port_is_kept() {
        let list = OriginAllowList::new(["https://localhost:443"]).unwrap();
        assert!(list.allows(&url("https://localhost/")));
        assert!(!list.allows(&url("https://localhost:8443/")));
    }

    #[test]
    fn test_invalid_origin() {
        assert!(matches!(OriginAllowList::new(["not an origin"]), Err(OriginError::Invalid(..))));
        assert!(matches!(OriginAllowList::new(["ftp://localhost"]), Err(OriginError::Scheme(_))));
    }

    #[test]
    fn test_empty_list_allows_nothing() {
        let list = OriginAllowList::default();
        assert!(list.is_empty());
        assert!(!list.allows(&url("https://localhost/")));
    }
}
