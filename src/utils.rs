/// Shared utility functions

use url::Url;

/// Derive a favicon image URL for a bookmarked page, using Google's favicon
/// service keyed by the page's host. None if the URL doesn't parse or has no
/// host (data:, mailto:, etc).
pub fn favicon_url(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("https://www.google.com/s2/favicons?domain={}&sz=32", host))
}

/// Whether a string is a usable http(s) bookmark target.
pub fn is_valid_bookmark_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Safely truncate a string at a UTF-8 boundary
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if max_bytes >= s.len() { return s; }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favicon_url() {
        assert_eq!(
            favicon_url("https://doc.rust-lang.org/book/ch01-00.html"),
            Some("https://www.google.com/s2/favicons?domain=doc.rust-lang.org&sz=32".to_string())
        );
        assert_eq!(favicon_url("not a url"), None);
        assert_eq!(favicon_url("mailto:someone@example.com"), None);
    }

    #[test]
    fn test_is_valid_bookmark_url() {
        assert!(is_valid_bookmark_url("https://example.com/page"));
        assert!(is_valid_bookmark_url("http://localhost:3000"));
        assert!(!is_valid_bookmark_url("example.com"));       // no scheme
        assert!(!is_valid_bookmark_url("ftp://example.com")); // wrong scheme
        assert!(!is_valid_bookmark_url(""));
    }

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello", 3), "hel");
        assert_eq!(safe_truncate("hello", 10), "hello");
        assert_eq!(safe_truncate("hello", 5), "hello");
    }

    #[test]
    fn test_safe_truncate_utf8() {
        // Multi-byte character straddling the cut point
        let s = "héllo";
        assert_eq!(safe_truncate(s, 2), "h");
    }
}
