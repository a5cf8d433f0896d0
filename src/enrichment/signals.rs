//! Local company signals sniffed from raw HTML.

use crate::core::models::{CompanySignals, SiteInput};
use crate::utils::text::clean_text;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

static SCRIPT_SRC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script[src]").expect("static selector"));

static LINK_HREF: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[href]").expect("static selector"));

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));

/// (marker, tag) pairs matched against lower-cased script sources.
const SCRIPT_MARKERS: &[(&str, &str)] = &[
    ("gtm", "Google Tag Manager"),
    ("googletagmanager", "Google Tag Manager"),
    ("analytics", "Google Analytics"),
    ("hotjar", "Hotjar"),
    ("segment", "Segment"),
    ("hubspot", "HubSpot"),
    ("intercom", "Intercom"),
    ("mixpanel", "Mixpanel"),
];

/// (marker, tag) pairs matched against lower-cased stylesheet/link targets.
const LINK_MARKERS: &[(&str, &str)] = &[
    ("wp-content", "WordPress"),
    ("shopify", "Shopify"),
    ("wix", "Wix"),
    ("webflow", "Webflow"),
];

fn tags_for(
    document: &Html,
    selector: &Selector,
    attr: &str,
    markers: &[(&str, &str)],
    tech: &mut BTreeSet<String>,
) {
    for element in document.select(selector) {
        let Some(target) = element.value().attr(attr) else {
            continue;
        };
        let target = target.to_lowercase();
        for (marker, tag) in markers {
            if target.contains(marker) {
                tech.insert((*tag).to_string());
            }
        }
    }
}

fn sniff_document(document: &Html) -> BTreeSet<String> {
    let mut tech = BTreeSet::new();
    tags_for(document, &SCRIPT_SRC, "src", SCRIPT_MARKERS, &mut tech);
    tags_for(document, &LINK_HREF, "href", LINK_MARKERS, &mut tech);
    tech
}

fn title_of(document: &Html) -> Option<String> {
    let raw: String = document.select(&TITLE).next()?.text().collect();
    let name = clean_text(raw.split('|').next().unwrap_or_default());
    (!name.is_empty()).then_some(name)
}

/// Technology tags detected in one page, sorted.
pub fn sniff_tech(html: &str) -> BTreeSet<String> {
    sniff_document(&Html::parse_document(html))
}

/// `<title>` text up to the first `|`, whitespace-collapsed, entities decoded.
pub fn page_title_name(html: &str) -> Option<String> {
    title_of(&Html::parse_document(html))
}

/// Builds the company signals for a site whose domain is already known.
///
/// The name is the provided one, else the first page title, else the
/// domain. Tags are the union of provided and sniffed ones.
pub fn enrich_company(site: &SiteInput, domain: &str) -> CompanySignals {
    let mut tech_stack: BTreeSet<String> = site
        .tech_stack
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    let mut title_name = None;
    for html in site.pages.values() {
        let document = Html::parse_document(html);
        if title_name.is_none() {
            title_name = title_of(&document);
        }
        tech_stack.extend(sniff_document(&document));
    }

    let name = site
        .company_name
        .as_deref()
        .map(clean_text)
        .filter(|n| !n.is_empty())
        .or(title_name)
        .unwrap_or_else(|| domain.to_string());

    tracing::debug!(target: "enrichment",
        "Company signals for {}: name='{}', {} tag(s)", domain, name, tech_stack.len()
    );
    CompanySignals {
        name,
        domain: domain.to_string(),
        tech_stack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><head>
        <title>
          Acme Rockets | Home
        </title>
        <script async SRC="https://www.googletagmanager.com/gtm.js?id=GTM-1"></script>
        <script src='//js.hs-scripts.com/hubspot.js'></script>
        <link rel="stylesheet" href="/wp-content/themes/acme/style.css">
        </head><body><p>hotjar mentioned in text only</p></body></html>"#;

    #[test]
    fn test_sniff_tech_script_and_link_markers() {
        let tags: Vec<String> = sniff_tech(PAGE).into_iter().collect();
        assert_eq!(tags, vec!["Google Tag Manager", "HubSpot", "WordPress"]);
    }

    #[test]
    fn test_sniff_tech_ignores_markers_outside_src_and_href() {
        assert!(sniff_tech("<p>mixpanel webflow</p>").is_empty());
        // Link markers are not looked up in script sources.
        assert!(sniff_tech(r#"<script src="/shopify.js"></script>"#).is_empty());
    }

    #[test]
    fn test_page_title_name() {
        assert_eq!(page_title_name(PAGE).as_deref(), Some("Acme Rockets"));
        assert_eq!(page_title_name("<title> | Home</title>"), None);
        assert_eq!(page_title_name("<p>no title</p>"), None);
    }

    #[test]
    fn test_unquoted_attributes_are_read() {
        let tags = sniff_tech("<script src=https://www.googletagmanager.com/gtm.js></script><link rel=stylesheet href=/wp-content/a.css>");
        assert!(tags.contains("Google Tag Manager"));
        assert!(tags.contains("WordPress"));
    }

    #[test]
    fn test_title_entities_are_decoded() {
        assert_eq!(
            page_title_name("<title>Smith &amp; Co | Home</title>").as_deref(),
            Some("Smith & Co")
        );
    }

    #[test]
    fn test_enrich_company_name_fallbacks() {
        let mut site = SiteInput {
            url: "https://acme.co".into(),
            tech_stack: vec!["Segment".into(), " ".into()],
            ..SiteInput::default()
        };
        site.pages.insert("/".into(), PAGE.into());

        let signals = enrich_company(&site, "acme.co");
        assert_eq!(signals.name, "Acme Rockets");
        assert_eq!(signals.domain, "acme.co");
        assert!(signals.has_tag("Segment"));
        assert!(signals.has_tag("HubSpot"));
        assert_eq!(signals.tech_stack.len(), 4);

        site.company_name = Some("Acme Inc".into());
        assert_eq!(enrich_company(&site, "acme.co").name, "Acme Inc");

        site.company_name = None;
        site.pages.clear();
        assert_eq!(enrich_company(&site, "acme.co").name, "acme.co");
    }
}
