//! SMS delivery through the Twilio Messages API.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{NotifyConfig, TwilioCredentials};

use super::{Delivery, Notifier};

/// The subset of the Messages API response we care about.
#[derive(Debug, Deserialize)]
pub struct SmsResponse {
    pub sid: Option<String>,
    pub status: Option<String>,
}

/// Sends notifications as text messages.
#[derive(Debug, Clone)]
pub struct SmsNotifier {
    client: Client,
    api_base: String,
    credentials: Option<TwilioCredentials>,
}

impl SmsNotifier {
    pub fn new(client: Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
        }
    }

    /// Whether messages will actually leave the process.
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, account_sid
        )
    }
}

impl Notifier for SmsNotifier {
    fn send(&self, message: &str) -> Result<Delivery> {
        let Some(creds) = &self.credentials else {
            log::warn!("SMS credentials not configured. Would have sent this message:");
            log::warn!("{}", message);
            return Ok(Delivery::Skipped);
        };

        let form = [
            ("To", creds.to_number.as_str()),
            ("From", creds.from_number.as_str()),
            ("Body", message),
        ];

        let response = self
            .client
            .post(self.messages_url(&creds.account_sid))
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AppError::notify(format!("provider returned {status}: {body}")));
        }

        let parsed: SmsResponse = response.json()?;
        log::info!(
            "Sent message {} ({})",
            parsed.sid.as_deref().unwrap_or("?"),
            parsed.status.as_deref().unwrap_or("unknown")
        );
        Ok(Delivery::Sent { id: parsed.sid })
    }
}
