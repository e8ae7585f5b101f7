//! Verification-link extraction
//!
//! The confirmation email contains an action link whose visible text reads
//! "Verify my Email". Extraction is a plain pattern match over the HTML body,
//! kept behind this one function so the matching rule can change without
//! touching the orchestration around it. "No link found" is a normal typed
//! outcome, not an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Phrase the anchor's visible text must contain (case-insensitive)
pub const LINK_TEXT_MARKER: &str = "verify my email";

static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap()
});

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Extract the first verification link from an email HTML body.
///
/// Returns the `href` of the first anchor whose visible text contains
/// [`LINK_TEXT_MARKER`], ignoring case, surrounding whitespace, and markup
/// nested inside the anchor.
pub fn verification_link_from_html(html: &str) -> Option<String> {
    for captures in RE_ANCHOR.captures_iter(html) {
        let inner = RE_TAG.replace_all(&captures[2], " ");
        let text = inner
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if text.contains(LINK_TEXT_MARKER) {
            return Some(captures[1].to_string());
        }
    }

    None
}
