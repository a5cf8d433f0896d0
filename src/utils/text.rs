//! Text normalisation and address harvesting from raw page content.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("static regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

// Retina asset names such as `logo@2x.png` look like addresses.
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".css", ".js"];

/// Trims and collapses every whitespace run to a single space.
pub fn clean_text(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Finds email-looking strings in `texts`, lower-cased and de-duplicated,
/// in the order they first appear.
pub fn harvest_emails<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for text in texts {
        for m in EMAIL_RE.find_iter(text) {
            let email = m.as_str().trim_end_matches('.').to_lowercase();
            if ASSET_SUFFIXES.iter().any(|s| email.ends_with(s)) {
                continue;
            }
            if seen.insert(email.clone()) {
                found.push(email);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Jane \n\t Doe  "), "Jane Doe");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_harvest_emails() {
        let page = r#"<a href="mailto:Jane.Doe@Acme.co">Mail</a>
            <img src="/img/logo@2x.png"> Contact sales@acme.co or jane.doe@acme.co."#;
        assert_eq!(
            harvest_emails([page]),
            vec!["jane.doe@acme.co".to_string(), "sales@acme.co".to_string()]
        );
    }

    #[test]
    fn test_harvest_emails_keeps_discovery_order() {
        assert_eq!(
            harvest_emails(["zoe@acme.co then amy.lee@acme.co", "zoe@acme.co bob@acme.co"]),
            vec!["zoe@acme.co", "amy.lee@acme.co", "bob@acme.co"]
        );
    }
}
