use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::config::AppConfig;

/// Thin client for a Resend-compatible transactional email API.
#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

impl Mailer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }

    pub async fn send_one_time_code(&self, to: &str, code: &str) -> Result<()> {
        let body = SendEmailRequest {
            from: &self.from,
            to,
            subject: "Your password reset code",
            text: format!("Your one-time code is: {}\nIt expires in 15 minutes.", code),
        };

        let response = self
            .http
            .post(format!("{}/emails", self.api_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("email API returned {}", response.status()));
        }

        Ok(())
    }
}
