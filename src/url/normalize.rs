use crate::UrlError;
use std::fmt;
use url::Url;

/// A canonical page URL
///
/// Two raw URLs that differ only by fragment or by trailing-slash style
/// normalize to the same value. Equality and hashing are defined on the
/// canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Normalizes an absolute URL string (no resolution context)
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        normalize(raw, None)
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host identity used for scope checks
    ///
    /// The host is already lowercased by the parser. A non-default port is
    /// part of the identity (`example.com:8080`).
    pub fn host_key(&self) -> String {
        let host = self.0.host_str().unwrap_or_default();
        match self.0.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Normalizes a URL according to Site-Folio's canonicalization rules
///
/// # Normalization Steps
///
/// 1. Resolve the raw string:
///    - with a `context`, it is joined against the context URL, so relative
///      and scheme-relative links take the context's scheme and host
///    - without a context, a missing scheme defaults to `https`
/// 2. Reject anything that is not `http`/`https` or has no host
/// 3. Remove the fragment (everything after #)
/// 4. Keep the query string verbatim; drop an empty trailing `?`
/// 5. Remove trailing slashes from the path unless the path is root
///
/// Scheme and host are lowercased and dot segments removed by the URL parser.
///
/// # Examples
///
/// ```
/// use site_folio::url::normalize;
///
/// let url = normalize("Example.COM/docs/#intro", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize(raw: &str, context: Option<&NormalizedUrl>) -> Result<NormalizedUrl, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    // Step 1: Resolve against the context or apply the default scheme
    let mut url = match context {
        Some(base) => base
            .as_url()
            .join(raw)
            .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?,
        None => Url::parse(&with_default_scheme(raw))
            .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?,
    };

    // Step 2: Validate scheme and host
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost(raw.to_string())),
    }

    // Step 3: Remove fragment
    url.set_fragment(None);

    // Step 4: Query is kept as-is, only an empty one is dropped
    if url.query() == Some("") {
        url.set_query(None);
    }

    // Step 5: Collapse trailing slashes
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&trimmed);
        }
    }

    Ok(NormalizedUrl(url))
}

/// Prefixes `https://` when the raw string carries no scheme
fn with_default_scheme(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{}", rest)
    } else if has_explicit_scheme(raw) {
        // Leave mailto:, ftp:// and friends for the scheme check to reject
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Detects a non-HTTP scheme such as `mailto:` or `ftp://`
///
/// `example.com:8080/path` is a host with a port, not a scheme, so a colon
/// followed by a digit does not count.
fn has_explicit_scheme(raw: &str) -> bool {
    let Some((scheme, rest)) = raw.split_once(':') else {
        return false;
    };

    let valid_scheme = scheme
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.');

    valid_scheme && !scheme.contains('.') && !rest.starts_with(|c: char| c.is_ascii_digit())
}
