use super::{first_last, lead_summary, pushable, CrmSink, PushOutcome};
use crate::core::config::Config;
use crate::core::models::ScoredLead;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const LEAD_PATH: &str = "/services/data/v59.0/sobjects/Lead";

/// Salesforce Leads, created one REST call per row.
pub struct SalesforceSink {
    client: Client,
    instance_url: Option<String>,
    access_token: Option<String>,
    timeout: Duration,
}

impl SalesforceSink {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            instance_url: config
                .salesforce_instance_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_string()),
            access_token: config.salesforce_access_token.clone(),
            timeout: config.request_timeout,
        }
    }

    async fn create_lead(&self, endpoint: &str, token: &str, payload: &Value) -> bool {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(target: "crm", "[salesforce] Lead create returned {}", resp.status());
                false
            }
            Err(e) => {
                tracing::warn!(target: "crm", "[salesforce] Lead create failed: {}", e);
                false
            }
        }
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Lead payloads for every row that has an email.
pub(crate) fn lead_payloads(leads: &[ScoredLead]) -> Vec<Value> {
    pushable(leads)
        .map(|(lead, email)| {
            let (first, last) = first_last(&lead.name);
            json!({
                "FirstName": first,
                "LastName": non_empty_or(last, "Unknown"),
                "Company": non_empty_or(&lead.company_name, "Unknown"),
                "Title": lead.role,
                "Email": email,
                "Website": lead.company_domain,
                "Description": lead_summary(lead)
            })
        })
        .collect()
}

#[async_trait]
impl CrmSink for SalesforceSink {
    fn name(&self) -> &'static str {
        "salesforce"
    }

    async fn push(&self, leads: &[ScoredLead]) -> PushOutcome {
        let (Some(instance), Some(token)) = (self.instance_url.as_deref(), self.access_token.as_deref())
        else {
            return PushOutcome::failure("no_token");
        };
        let endpoint = format!("{}{}", instance, LEAD_PATH);
        let payloads = lead_payloads(leads);

        tracing::info!(target: "crm", "[salesforce] Creating {} lead(s)", payloads.len());
        let mut created = 0;
        for payload in &payloads {
            if self.create_lead(&endpoint, token, payload).await {
                created += 1;
            }
        }
        if created < payloads.len() {
            tracing::warn!(target: "crm", "[salesforce] {} of {} lead(s) were not created", payloads.len() - created, payloads.len());
        }
        PushOutcome::success(created)
    }
}
