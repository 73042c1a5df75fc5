/// Checks if a host matches a wildcard pattern
///
/// Used to flag hosts whose pages are rendered client-side. A plain pattern
/// matches only itself; `*.base` matches `base` and any host under it at any
/// nesting level. Hosts are expected to be lowercased already.
///
/// # Examples
///
/// ```
/// use sitesift::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.vercel.app", "my-site.vercel.app"));
/// assert!(matches_wildcard("app.example.com", "app.example.com"));
/// assert!(!matches_wildcard("*.vercel.app", "vercel.app.example.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
