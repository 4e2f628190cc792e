use std::sync::LazyLock;
use regex::Regex;
use crate::models::target::{RoutedTarget, TargetType};
use super::signature::{query_keys, url_path};

static API_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/api/|/v\d+|/graphql|/rest").unwrap());
static CMS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/wp-|/joomla|/drupal|/magento|/wordpress").unwrap());
static LOGIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)login|signin|auth|admin|dashboard|panel|wp-login").unwrap());

/// Assign a URL to exactly one scan queue. The checks run in priority order
/// and the first match wins, so a login page with a query string is LOGIN.
pub fn classify(url: &str) -> RoutedTarget {
    let params = query_keys(url);

    if API_PATTERN.is_match(url) {
        return RoutedTarget::new(url, TargetType::Api).with_parameters(params);
    }
    if CMS_PATTERN.is_match(url) {
        return RoutedTarget::new(url, TargetType::Cms);
    }
    if url_path(url).to_lowercase().ends_with(".js") {
        return RoutedTarget::new(url, TargetType::JsFile);
    }
    if LOGIN_PATTERN.is_match(url) {
        return RoutedTarget::new(url, TargetType::Login);
    }
    if !params.is_empty() {
        return RoutedTarget::new(url, TargetType::Dynamic).with_parameters(params);
    }
    RoutedTarget::new(url, TargetType::Static)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> TargetType {
        classify(url).target_type
    }

    #[test]
    fn test_classify_api() {
        assert_eq!(kind("https://example.com/api/v1/users"), TargetType::Api);
        assert_eq!(kind("https://example.com/graphql"), TargetType::Api);
        assert_eq!(kind("https://example.com/rest/data"), TargetType::Api);
        assert_eq!(kind("https://example.com/v2/items?id=4"), TargetType::Api);
    }

    #[test]
    fn test_api_keeps_parameters() {
        let routed = classify("https://example.com/api/search?q=1&page=2");
        assert_eq!(routed.parameters, vec!["q", "page"]);
    }

    #[test]
    fn test_classify_cms() {
        assert_eq!(kind("https://example.com/wp-content/themes/theme"), TargetType::Cms);
        assert_eq!(kind("https://example.com/joomla/administrator"), TargetType::Cms);
        // wp-login.php matches the CMS fragment before the login keywords
        assert_eq!(kind("https://example.com/wp-login.php"), TargetType::Cms);
    }

    #[test]
    fn test_classify_js() {
        assert_eq!(kind("https://example.com/static/app.js"), TargetType::JsFile);
        assert_eq!(kind("https://example.com/assets/BUNDLE.MIN.JS?v=1"), TargetType::JsFile);
        assert_eq!(kind("https://example.com/admin/app.js"), TargetType::JsFile);
    }

    #[test]
    fn test_login_beats_dynamic() {
        assert_eq!(kind("https://example.com/login?next=/home"), TargetType::Login);
        assert_eq!(kind("https://example.com/Admin/Dashboard"), TargetType::Login);
        assert_eq!(kind("https://example.com/signin"), TargetType::Login);
    }

    #[test]
    fn test_classify_dynamic_and_static() {
        let routed = classify("https://example.com/search.php?q=test");
        assert_eq!(routed.target_type, TargetType::Dynamic);
        assert_eq!(routed.parameters, vec!["q"]);
        assert_eq!(kind("https://example.com/about"), TargetType::Static);
        assert_eq!(kind("https://example.com/"), TargetType::Static);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let url = "https://example.com/page.php?id=1";
        assert_eq!(classify(url), classify(url));
    }
}
