// src/ingest/image.rs
//
// Best-effort thumbnail extraction from arbitrary HTML/RSS fragments, for
// feeds that carry no structured image field. Pure string-in/string-out so
// it stays unit-testable without any network.

use once_cell::sync::Lazy;
use regex::Regex;

// Tried in order; first usable match wins.
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)<img[^>]+data-src=["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)src=["']([^"']+\.(?:jpg|jpeg|png|gif|webp)[^"']*)["']"#).unwrap(),
        Regex::new(r#"(?i)url\(["']?([^"')]+\.(?:jpg|jpeg|png|gif|webp)[^"')]*)["']?\)"#).unwrap(),
    ]
});

/// Returns the first image URL found in `html` that resolves to an absolute
/// http(s) URL, or an empty string. Protocol-relative `//host/...` URLs are
/// normalized with an `https:` prefix.
pub fn extract_image_from_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    for pattern in PATTERNS.iter() {
        let Some(m) = pattern.captures(html).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let mut url = m.as_str().to_string();
        if url.starts_with("//") {
            url = format!("https:{url}");
        }
        if !url.starts_with("http") {
            continue;
        }
        return url;
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_img_tag() {
        assert_eq!(
            extract_image_from_html(r#"<img src="https://x.com/a.jpg">"#),
            "https://x.com/a.jpg"
        );
    }

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            extract_image_from_html(r#"<img src="//x.com/a.jpg">"#),
            "https://x.com/a.jpg"
        );
    }

    #[test]
    fn no_image_yields_empty() {
        assert_eq!(extract_image_from_html("no image here"), "");
        assert_eq!(extract_image_from_html(""), "");
    }

    #[test]
    fn data_src_attribute() {
        assert_eq!(
            extract_image_from_html(r#"<img class="lazy" data-src="https://x.com/lazy.png">"#),
            "https://x.com/lazy.png"
        );
    }

    #[test]
    fn css_url_reference() {
        assert_eq!(
            extract_image_from_html(r#"<div style="background: url('https://x.com/bg.webp')">"#),
            "https://x.com/bg.webp"
        );
    }

    #[test]
    fn relative_urls_are_not_usable() {
        assert_eq!(extract_image_from_html(r#"<img src="/img/a.jpg">"#), "");
        assert_eq!(extract_image_from_html(r#"<img src="a.jpg">"#), "");
    }

    #[test]
    fn first_pattern_in_chain_wins() {
        let html = concat!(
            r#"<img src="https://x.com/first.jpg">"#,
            r#"<img data-src="https://x.com/second.jpg">"#
        );
        assert_eq!(extract_image_from_html(html), "https://x.com/first.jpg");
    }

    #[test]
    fn embedded_inside_rss_description() {
        let html = r#"<p>Episode recap.</p><img width="640" src="https://img.example.com/ep12.jpeg?size=l"><p>More text</p>"#;
        assert_eq!(
            extract_image_from_html(html),
            "https://img.example.com/ep12.jpeg?size=l"
        );
    }
}
