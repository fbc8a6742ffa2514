// src/utils/url.rs

//! URL manipulation utilities.

/// Strip a leading `http://` or `https://` scheme, case-insensitively.
///
/// # Examples
/// ```
/// use modwatch::utils::url::strip_scheme;
///
/// assert_eq!(strip_scheme("https://example.com/a"), "example.com/a");
/// assert_eq!(strip_scheme("HTTP://example.com"), "example.com");
/// ```
pub fn strip_scheme(url: &str) -> &str {
    for scheme in ["http://", "https://"] {
        if url.len() >= scheme.len() && url[..scheme.len()].eq_ignore_ascii_case(scheme) {
            return &url[scheme.len()..];
        }
    }
    url
}

/// Rewrite a URL to route through the mirror prefix.
///
/// The target URL loses its scheme; the prefix carries its own.
///
/// # Examples
/// ```
/// use modwatch::utils::url::rewrite_for_mirror;
///
/// assert_eq!(
///     rewrite_for_mirror("https://r.jina.ai/http://", "https://example.com/page"),
///     "https://r.jina.ai/http://example.com/page"
/// );
/// ```
pub fn rewrite_for_mirror(prefix: &str, url: &str) -> String {
    format!("{}{}", prefix, strip_scheme(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_scheme_https() {
        assert_eq!(strip_scheme("https://example.com/x"), "example.com/x");
    }

    #[test]
    fn test_strip_scheme_case_insensitive() {
        assert_eq!(strip_scheme("HTTPS://Example.com"), "Example.com");
        assert_eq!(strip_scheme("Http://example.com"), "example.com");
    }

    #[test]
    fn test_strip_scheme_leaves_other_schemes() {
        assert_eq!(strip_scheme("ftp://example.com"), "ftp://example.com");
        assert_eq!(strip_scheme("example.com"), "example.com");
    }

    #[test]
    fn test_rewrite_for_mirror() {
        assert_eq!(
            rewrite_for_mirror("https://mirror.test/http://", "http://steamcommunity.com/app/1/"),
            "https://mirror.test/http://steamcommunity.com/app/1/"
        );
    }
}
