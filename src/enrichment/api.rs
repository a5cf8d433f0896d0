//! Optional remote enrichment lookups.
//!
//! Neither lookup ever fails the site: every outcome is reported as a short
//! status string next to whatever data could be fetched.

use crate::core::config::Config;
use crate::core::models::Firmographics;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

const WAPPALYZER_LOOKUP_URL: &str = "https://api.wappalyzer.com/v2/lookup/";

pub const STATUS_SKIP: &str = "skip";
pub const STATUS_OK: &str = "ok";

/// Data plus the status string stored on every lead of the site.
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched<T> {
    pub data: Option<T>,
    pub status: String,
}

impl<T> Enriched<T> {
    fn empty(status: impl Into<String>) -> Self {
        Self {
            data: None,
            status: status.into(),
        }
    }
}

fn http_status(status: StatusCode) -> String {
    format!("http_{}", status.as_u16())
}

async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    label: &str,
) -> Enriched<T> {
    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(target: "enrichment", "[{}] Request failed: {}", label, e);
            return Enriched::empty(format!("error:{}", e));
        }
    };
    let status = response.status();
    if status != StatusCode::OK {
        tracing::info!(target: "enrichment", "[{}] Lookup returned {}", label, status);
        return Enriched::empty(http_status(status));
    }
    match response.json::<T>().await {
        Ok(data) => Enriched {
            data: Some(data),
            status: STATUS_OK.to_string(),
        },
        Err(e) => {
            tracing::warn!(target: "enrichment", "[{}] Could not decode response: {}", label, e);
            Enriched::empty(format!("error:{}", e))
        }
    }
}

/// Technology lookup for `site_url`. Statuses: `skip`, `no_api_key`, `ok`,
/// `http_<code>`, `error:<msg>`.
pub async fn wappalyzer_enrich(
    client: &Client,
    config: &Config,
    site_url: &str,
) -> Enriched<serde_json::Value> {
    if !config.enable_wappalyzer {
        return Enriched::empty(STATUS_SKIP);
    }
    let Some(api_key) = config.wappalyzer_api_key.as_deref() else {
        return Enriched::empty("no_api_key");
    };

    tracing::debug!(target: "enrichment", "[wappalyzer] Looking up {}", site_url);
    let request = client
        .get(WAPPALYZER_LOOKUP_URL)
        .query(&[("urls", site_url)])
        .header("x-api-key", api_key)
        .timeout(config.request_timeout);
    fetch_json(request, "wappalyzer").await
}

/// Firmographics lookup for `domain` against `<base>/enrich`. Statuses:
/// `skip`, `no_api`, `ok`, `http_<code>`, `error:<msg>`.
pub async fn firmographics_enrich(
    client: &Client,
    config: &Config,
    domain: &str,
) -> Enriched<Firmographics> {
    if !config.enable_firmographics || domain.is_empty() {
        return Enriched::empty(STATUS_SKIP);
    }
    let (Some(base), Some(api_key)) = (
        config.firmographics_api_url.as_deref(),
        config.firmographics_api_key.as_deref(),
    ) else {
        return Enriched::empty("no_api");
    };

    let url = format!("{}/enrich", base.trim_end_matches('/'));
    tracing::debug!(target: "enrichment", "[firmographics] Looking up {}", domain);
    let request = client
        .get(url)
        .query(&[("domain", domain)])
        .bearer_auth(api_key)
        .timeout(config.request_timeout);
    fetch_json(request, "firmographics").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::{closed_url, direct_client, serve_canned};

    fn config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn test_disabled_lookups_are_skipped() {
        let client = Client::new();
        let cfg = config();
        assert_eq!(wappalyzer_enrich(&client, &cfg, "https://acme.co").await.status, "skip");
        assert_eq!(firmographics_enrich(&client, &cfg, "acme.co").await.status, "skip");
    }

    #[tokio::test]
    async fn test_missing_credentials_are_reported() {
        let client = Client::new();
        let mut cfg = config();
        cfg.enable_wappalyzer = true;
        cfg.enable_firmographics = true;
        let w = wappalyzer_enrich(&client, &cfg, "https://acme.co").await;
        assert_eq!(w.status, "no_api_key");
        assert!(w.data.is_none());

        cfg.firmographics_api_url = Some("https://firmo.example".into());
        assert_eq!(firmographics_enrich(&client, &cfg, "acme.co").await.status, "no_api");
    }

    #[test]
    fn test_http_status_label() {
        assert_eq!(http_status(StatusCode::SERVICE_UNAVAILABLE), "http_503");
    }

    #[test]
    fn test_firmographics_tolerates_partial_payload() {
        let firmo: Firmographics =
            serde_json::from_str(r#"{"size":"11-50","founded_year":2015,"extra":1}"#).unwrap();
        assert_eq!(firmo.size.as_deref(), Some("11-50"));
        assert_eq!(firmo.founded_year, Some(2015));
        assert_eq!(firmo.employees, None);
    }

    fn firmographics_config(base_url: String) -> Config {
        let mut cfg = config();
        cfg.enable_firmographics = true;
        cfg.firmographics_api_url = Some(base_url);
        cfg.firmographics_api_key = Some("key".into());
        cfg
    }

    #[tokio::test]
    async fn test_firmographics_lookup_outcomes() {
        let base = serve_canned(vec![
            (200, r#"{"size":"11-50","employees":42}"#.into()),
            (503, "unavailable".into()),
            (200, "<html>not json</html>".into()),
        ])
        .await;
        let client = direct_client();
        let cfg = firmographics_config(base);

        let ok = firmographics_enrich(&client, &cfg, "acme.co").await;
        assert_eq!(ok.status, STATUS_OK);
        let firmo = ok.data.unwrap();
        assert_eq!(firmo.size.as_deref(), Some("11-50"));
        assert_eq!(firmo.employees, Some(42));

        let unavailable = firmographics_enrich(&client, &cfg, "acme.co").await;
        assert_eq!(unavailable.status, "http_503");
        assert!(unavailable.data.is_none());

        let garbled = firmographics_enrich(&client, &cfg, "acme.co").await;
        assert!(garbled.status.starts_with("error:"));
        assert!(garbled.data.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_lookup_is_an_error_status() {
        let cfg = firmographics_config(closed_url().await);
        let result = firmographics_enrich(&direct_client(), &cfg, "acme.co").await;
        assert!(result.status.starts_with("error:"));
    }
}
