//! EmailJS REST client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use super::{MailRelay, RelayError, TemplateParams};
use crate::config::RelayConfig;

/// Request body for the EmailJS send endpoint
#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a TemplateParams,
}

/// EmailJS relay client
pub struct EmailJsRelay {
    client: reqwest::Client,
    config: RelayConfig,
}

impl EmailJsRelay {
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build mail relay HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl MailRelay for EmailJsRelay {
    async fn send(&self, params: &TemplateParams) -> Result<(), RelayError> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: params,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(template_id = %self.config.template_id, "Message relayed");

        Ok(())
    }
}
