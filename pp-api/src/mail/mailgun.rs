//! Mailgun messages client
//!
//! Plain-text mails are posted form-encoded to the domain's `messages`
//! endpoint with HTTP basic auth. Batch sends attach a `recipient-variables`
//! JSON object so each recipient sees only their own address and gets their
//! own substitutions (unsubscribe links).

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use pp_common::config::MailConfig;

const FROM_NAME: &str = "Przypis Powszechny";
const SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum MailSendError {
    #[error("Mail request error: {0}")]
    Network(String),

    #[error("Mail request to {url} unexpected status {status}. Response: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },
}

/// A mail recipient, optionally with a display name
#[derive(Debug, Clone)]
pub struct Recipient {
    pub address: String,
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    fn to_param(&self) -> String {
        format!("{} <{}>", self.name.as_deref().unwrap_or(""), self.address)
    }
}

/// Mailgun client shared by all handlers
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .expect("reqwest client with static configuration");
        Self { client, config }
    }

    /// Whether sending is configured; without an API key mails are skipped
    pub fn enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Send a plain-text mail from `{sender}@{mail_domain}`
    ///
    /// `recipient_variables` enables Mailgun batch mode: a JSON object keyed
    /// by recipient address whose values substitute `%recipient.xxx%`
    /// placeholders in the body.
    pub async fn send_mail(
        &self,
        sender: &str,
        receivers: &[Recipient],
        subject: &str,
        text: &str,
        recipient_variables: Option<&Value>,
    ) -> Result<(), MailSendError> {
        if !self.enabled() {
            debug!("Mail sending disabled (no API key); skipping '{}'", subject);
            return Ok(());
        }

        let from_addr = format!("{}@{}", sender, self.config.mail_domain);
        let mut form: Vec<(String, String)> = vec![
            ("from".to_string(), format!("{} <{}>", FROM_NAME, from_addr)),
            ("subject".to_string(), subject.to_string()),
            ("text".to_string(), text.to_string()),
        ];
        for receiver in receivers {
            form.push(("to".to_string(), receiver.to_param()));
        }
        if let Some(variables) = recipient_variables {
            form.push(("recipient-variables".to_string(), variables.to_string()));
        }

        let response = self
            .client
            .post(&self.config.api_url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| MailSendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailSendError::UnexpectedStatus {
                url: self.config.api_url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
