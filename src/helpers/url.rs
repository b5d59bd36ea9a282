//! URL helper functions

use url::form_urlencoded;

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello") // -> "/blog/post/hello"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a post page, without the root
pub fn post_path(uid: &str) -> String {
    format!("post/{}", encode_segment(uid))
}

/// Path of a home listing page, without the root
pub fn home_page_path(page: u32) -> String {
    if page <= 1 {
        String::new()
    } else {
        format!("page/{}", page)
    }
}

/// Append the preview reference to `location` as the `ref` query parameter
pub fn with_preview_ref(location: &str, reference: &str) -> String {
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("ref", reference)
        .finish();
    let separator = if location.contains('?') { '&' } else { '?' };
    format!("{}{}{}", location, separator, encoded)
}

fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &str) -> SiteConfig {
        SiteConfig {
            url: "https://blog.example.com/".to_string(),
            root: root.to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        assert_eq!(url_for(&config("/"), "/post/a"), "/post/a");
        assert_eq!(url_for(&config("/blog/"), "post/a"), "/blog/post/a");
        assert_eq!(url_for(&config("/blog/"), ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        assert_eq!(
            full_url_for(&config("/"), "post/a"),
            "https://blog.example.com/post/a"
        );
    }

    #[test]
    fn test_post_and_home_paths() {
        assert_eq!(post_path("como-utilizar-hooks"), "post/como-utilizar-hooks");
        assert_eq!(post_path("a b"), "post/a%20b");
        assert_eq!(home_page_path(1), "");
        assert_eq!(home_page_path(3), "page/3");
    }

    #[test]
    fn test_with_preview_ref() {
        assert_eq!(with_preview_ref("/post/a", "abc"), "/post/a?ref=abc");
        assert_eq!(
            with_preview_ref("/post/a?x=1", "a b&c"),
            "/post/a?x=1&ref=a+b%26c"
        );
    }
}
