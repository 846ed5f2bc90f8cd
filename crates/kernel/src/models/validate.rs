//! Field-level validation and normalization shared by the models.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid")
});

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("color pattern is valid")
});

/// Maximum slug length after normalization.
pub const MAX_SLUG_LEN: usize = 200;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Slugs are lowercase ASCII words joined by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.len() > MAX_SLUG_LEN || !SLUG_RE.is_match(slug) {
        return Err(error(
            "slug",
            "must be lowercase letters, digits and single hyphens",
        ));
    }
    Ok(())
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR_RE.is_match(color) {
        return Err(error("color", "must be a hex color such as #1a73e8"));
    }
    Ok(())
}

/// Site-relative path such as `/scholarships`.
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if !path.starts_with('/') || path.contains("..") || path.chars().any(char::is_whitespace) {
        return Err(error("path", "must be a site path starting with '/'"));
    }
    Ok(())
}

/// Menu link targets: fragments, root-relative paths, or absolute
/// http(s)/mailto/tel URLs.
pub fn validate_link_url(link: &str) -> Result<(), ValidationError> {
    if link.starts_with('#') {
        return Ok(());
    }
    if link.starts_with('/') && !link.starts_with("//") {
        return Ok(());
    }
    match url::Url::parse(link) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https" | "mailto" | "tel") => Ok(()),
        _ => Err(error(
            "url",
            "must be a path, a #fragment or an http(s) URL",
        )),
    }
}

/// Derive a slug from free text.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// Strip scripts, event handlers and other unsafe markup from HTML content.
pub fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("About Us"), "about-us");
        assert_eq!(slugify("  Fully -- Funded: 2025!  "), "fully-funded-2025");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("about").is_ok());
        assert!(validate_slug("masters-in-germany-2025").is_ok());
        assert!(validate_slug("About").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn link_url_validation() {
        assert!(validate_link_url("#").is_ok());
        assert!(validate_link_url("/contact").is_ok());
        assert!(validate_link_url("https://example.org/apply").is_ok());
        assert!(validate_link_url("mailto:info@example.org").is_ok());
        assert!(validate_link_url("//evil.example").is_err());
        assert!(validate_link_url("javascript:alert(1)").is_err());
        assert!(validate_link_url("not a url").is_err());
    }

    #[test]
    fn color_and_path_validation() {
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("#1A73e8").is_ok());
        assert!(validate_color("blue").is_err());
        assert!(validate_path("/scholarships").is_ok());
        assert!(validate_path("scholarships").is_err());
        assert!(validate_path("/a/../b").is_err());
    }

    #[test]
    fn sanitize_strips_scripts() {
        let clean = sanitize_html("<p>Hello</p><script>alert(1)</script>");
        assert_eq!(clean, "<p>Hello</p>");
    }

    #[test]
    fn double_option_distinguishes_null() {
        #[derive(serde::Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            value: Option<Option<i32>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"value":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"value":3}"#).unwrap();
        assert_eq!(absent.value, None);
        assert_eq!(null.value, Some(None));
        assert_eq!(set.value, Some(Some(3)));
    }
}
