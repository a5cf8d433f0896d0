use super::{first_last, lead_summary, pushable, snippet, CrmSink, PushOutcome};
use crate::core::config::Config;
use crate::core::models::ScoredLead;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const BATCH_CREATE_PATH: &str = "/crm/v3/objects/contacts/batch/create";

/// HubSpot contacts via the v3 batch-create endpoint.
pub struct HubSpotSink {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl HubSpotSink {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.hubspot_base_url.trim_end_matches('/').to_string(),
            access_token: config.hubspot_access_token.clone(),
            timeout: config.request_timeout,
        }
    }
}

/// The `inputs` array of the batch-create body.
pub(crate) fn contact_inputs(leads: &[ScoredLead]) -> Vec<Value> {
    pushable(leads)
        .map(|(lead, email)| {
            let (first, last) = first_last(&lead.name);
            json!({
                "properties": {
                    "email": email,
                    "firstname": first,
                    "lastname": last,
                    "jobtitle": lead.role,
                    "company": lead.company_name,
                    "website": lead.company_domain,
                    "notes": lead_summary(lead)
                }
            })
        })
        .collect()
}

#[async_trait]
impl CrmSink for HubSpotSink {
    fn name(&self) -> &'static str {
        "hubspot"
    }

    async fn push(&self, leads: &[ScoredLead]) -> PushOutcome {
        let Some(token) = self.access_token.as_deref() else {
            return PushOutcome::failure("no_token");
        };
        let inputs = contact_inputs(leads);
        if inputs.is_empty() {
            return PushOutcome::failure("no_contacts");
        }
        let count = inputs.len();

        tracing::info!(target: "crm", "[hubspot] Creating {} contact(s)", count);
        let response = self
            .client
            .post(format!("{}{}", self.base_url, BATCH_CREATE_PATH))
            .bearer_auth(token)
            .json(&json!({ "inputs": inputs }))
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => PushOutcome::success(count),
            Ok(resp) => {
                let code = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                tracing::warn!(target: "crm", "[hubspot] Batch create returned {}", code);
                PushOutcome::failure(format!("http_{}: {}", code, snippet(&body, 300)))
            }
            Err(e) => {
                tracing::error!(target: "crm", "[hubspot] Request failed: {}", e);
                PushOutcome::failure(format!("error:{}", e))
            }
        }
    }
}
