use crate::url::NormalizedUrl;
use std::fmt;

/// The single host a crawl is confined to
///
/// The scope is the exact host of the seed URL. There is no suffix or
/// wildcard matching: `api.example.com` is out of scope for `example.com`
/// and vice versa. A non-default port is part of the host identity.
///
/// # Examples
///
/// ```
/// use site_folio::url::{normalize, DomainScope};
///
/// let seed = normalize("https://example.com/", None).unwrap();
/// let scope = DomainScope::from_seed(&seed);
///
/// assert!(scope.contains(&normalize("https://example.com/path", None).unwrap()));
/// assert!(!scope.contains(&normalize("https://api.example.com/", None).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainScope {
    host: String,
}

impl DomainScope {
    /// Creates the scope from a normalized seed URL
    pub fn from_seed(seed: &NormalizedUrl) -> Self {
        Self {
            host: seed.host_key(),
        }
    }

    /// Returns the host string this scope matches
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if the URL's host equals the scope host exactly
    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        url.host_key() == self.host
    }
}

impl fmt::Display for DomainScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}
