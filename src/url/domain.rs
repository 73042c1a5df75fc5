use url::Url;

/// Extracts the lowercase host from a URL
///
/// Returns `None` for URLs without a host (e.g. `data:` URIs).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitesift::url::extract_domain;
///
/// let url = Url::parse("https://Portfolio.Example.COM/work").unwrap();
/// assert_eq!(extract_domain(&url), Some("portfolio.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a URL string and extracts its host in one step
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_no_host() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert_eq!(extract_domain(&url), None);
    }

    #[test]
    fn test_domain_of_string() {
        assert_eq!(
            domain_of("https://app.vercel.app/dashboard"),
            Some("app.vercel.app".to_string())
        );
        assert_eq!(domain_of("not a url"), None);
    }
}
