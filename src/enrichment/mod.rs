//! Company-level enrichment: local HTML sniffing plus optional remote lookups.

pub mod api;
pub mod signals;

pub use api::{firmographics_enrich, wappalyzer_enrich, Enriched};
pub use signals::{enrich_company, page_title_name, sniff_tech};
