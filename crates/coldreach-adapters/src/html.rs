//! Readable-text extraction from HTML.
//!
//! Pattern based: headline, paragraph and list-item elements in document
//! order, tags stripped, common entities decoded, whitespace collapsed.
use once_cell::sync::Lazy;
use regex::Regex;

static NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<!--.*?-->")
        .expect("valid noise pattern")
});

static TEXT_ELEMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:h1|h2|h3|p|li)\b[^>]*>(.*?)</(?:h1|h2|h3|p|li)\s*>")
        .expect("valid element pattern")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid anchor pattern")
});

/// Text of every `h1`-`h3`, `p` and `li` element joined by single spaces.
pub fn extract_text(html: &str) -> String {
    let html = NOISE.replace_all(html, " ");
    let pieces: Vec<String> = TEXT_ELEMENTS
        .captures_iter(&html)
        .filter_map(|caps| caps.get(1))
        .map(|inner| collapse_whitespace(&decode_entities(&TAG.replace_all(inner.as_str(), " "))))
        .filter(|text| !text.is_empty())
        .collect();
    pieces.join(" ")
}

/// First link whose href mentions "about", resolved against `base`.
pub fn find_about_link(html: &str, base: &str) -> Option<String> {
    let base = url::Url::parse(base).ok()?;
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| decode_entities(m.as_str().trim()))
        .find(|href| href.to_lowercase().contains("about"))
        .and_then(|href| base.join(&href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|url| url.to_string())
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

pub fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&hellip;", "\u{2026}");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x').or_else(|| raw.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    // Last so "&amp;lt;" stays "&lt;".
    numeric.replace("&amp;", "&")
}
