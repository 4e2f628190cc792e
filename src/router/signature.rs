use url::Url;

/// Asset extensions that are never worth scanning.
pub const STATIC_EXTENSIONS: &[&str] = &[
    ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg",
    ".woff", ".woff2", ".ttf", ".ico", ".pdf",
];

/// Path component of a URL. Strings the `url` crate rejects (bare hosts,
/// relative paths) are treated as a path with any query or fragment cut off.
pub fn url_path(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Query parameter names in order of first appearance, without repeats.
pub fn query_keys(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    if let Ok(parsed) = Url::parse(raw) {
        for (key, _) in parsed.query_pairs() {
            if !key.is_empty() && !keys.iter().any(|k| k.as_str() == &*key) {
                keys.push(key.into_owned());
            }
        }
    }
    keys
}

pub fn is_static_asset(raw: &str) -> bool {
    let path = url_path(raw).to_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Dedup key: host, port, path and the sorted parameter names with their
/// values blanked. `/p?id=1` and `/p?id=99` share a signature.
pub fn signature(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?;

    let mut keys = query_keys(raw);
    keys.sort();
    let params = keys
        .iter()
        .map(|k| format!("{}=", k))
        .collect::<Vec<_>>()
        .join("&");

    let netloc = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Some(format!("{}{}?{}", netloc, parsed.path(), params))
}

/// `signature`, falling back to the trimmed URL itself when it cannot be
/// parsed.
pub fn signature_or_raw(raw: &str) -> String {
    signature(raw).unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_ignores_values() {
        assert_eq!(
            signature("https://example.com/page.php?id=1"),
            signature("https://example.com/page.php?id=999"),
        );
    }

    #[test]
    fn test_signature_sorts_keys() {
        assert_eq!(
            signature("https://example.com/p?b=1&a=2").unwrap(),
            "example.com/p?a=&b=",
        );
        assert_eq!(
            signature("https://example.com/p?b=1&a=2"),
            signature("https://example.com/p?a=7&b=8"),
        );
    }

    #[test]
    fn test_signature_distinguishes_paths_and_keys() {
        assert_ne!(signature("https://example.com/a?id=1"), signature("https://example.com/b?id=1"));
        assert_ne!(signature("https://example.com/a?id=1"), signature("https://example.com/a?user=1"));
        assert_ne!(signature("https://a.example.com/p"), signature("https://b.example.com/p"));
    }

    #[test]
    fn test_signature_falls_back_to_raw_url() {
        assert_eq!(signature("not a url"), None);
        assert_eq!(signature_or_raw("not a url"), "not a url");
        assert_eq!(signature_or_raw("mailto:someone@example.com"), "mailto:someone@example.com");
    }

    #[test]
    fn test_static_assets() {
        assert!(is_static_asset("https://example.com/style.css"));
        assert!(is_static_asset("https://example.com/LOGO.PNG?v=3"));
        assert!(is_static_asset("example.com/font.woff2"));
        assert!(!is_static_asset("https://example.com/app.js"));
        assert!(!is_static_asset("https://example.com/download?file=a.pdf"));
    }

    #[test]
    fn test_query_keys_keep_first_seen_order() {
        assert_eq!(query_keys("https://example.com/?z=1&a=2&z=3"), vec!["z", "a"]);
        assert!(query_keys("https://example.com/").is_empty());
        assert!(query_keys("garbage").is_empty());
    }
}
