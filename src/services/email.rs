// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional email over an HTTP JSON API.
//!
//! Sends are detached from the request that triggered them. Failures are
//! retried a few times and then only logged.

use std::time::Duration;

use serde::Serialize;

use crate::config::EmailConfig;
use crate::error::AppError;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body accepted by the email API.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    config: Option<EmailConfig>,
}

impl Mailer {
    pub fn new(config: Option<EmailConfig>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    /// Mailer that logs instead of sending.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Queue the onboarding email for a new gym owner.
    pub fn send_welcome(&self, to: &str, owner_name: &str, gym_name: &str) {
        self.spawn_send(
            to,
            "Welcome to GymHub".to_string(),
            welcome_html(owner_name, gym_name),
        );
    }

    /// Send in the background with bounded retries.
    fn spawn_send(&self, to: &str, subject: String, html: String) {
        let Some(config) = self.config.clone() else {
            tracing::info!(to, subject = %subject, "Email disabled, not sending");
            return;
        };

        let email = OutgoingEmail {
            from: config.from.clone(),
            to: to.to_string(),
            subject,
            html,
        };
        let http = self.http.clone();

        tokio::spawn(async move {
            let mut backoff = INITIAL_BACKOFF;
            for attempt in 1..=MAX_ATTEMPTS {
                match post_email(&http, &config, &email).await {
                    Ok(()) => {
                        tracing::info!(to = %email.to, attempt, "Email sent");
                        return;
                    }
                    Err(e) if attempt < MAX_ATTEMPTS => {
                        tracing::warn!(to = %email.to, attempt, error = %e, "Email send failed, retrying");
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                    Err(e) => {
                        tracing::error!(to = %email.to, attempt, error = %e, "Email send failed, giving up");
                    }
                }
            }
        });
    }
}

async fn post_email(
    http: &reqwest::Client,
    config: &EmailConfig,
    email: &OutgoingEmail,
) -> Result<(), AppError> {
    let response = http
        .post(&config.api_url)
        .bearer_auth(&config.api_key)
        .json(email)
        .send()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Email request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Internal(anyhow::anyhow!(
            "Email API returned {}: {}",
            status,
            body
        )));
    }
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Welcome message for a newly registered gym.
pub fn welcome_html(owner_name: &str, gym_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8" /><title>Welcome to GymHub</title></head>
<body style="margin:0;padding:30px 10px;background:#f4f6f8;font-family:sans-serif;">
  <table width="600" align="center" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:10px;">
    <tr><td style="padding:30px;">
      <h2 style="color:#111827;">Hello {owner}</h2>
      <p style="color:#374151;line-height:1.6;">
        Your gym, <b>{gym}</b>, has been registered. Sign in to manage your
        members and keep an eye on your plan's member allowance.
      </p>
      <p style="color:#6b7280;font-size:13px;">This is an automated message.</p>
    </td></tr>
  </table>
</body>
</html>"#,
        owner = escape_html(owner_name),
        gym = escape_html(gym_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_escapes_names() {
        let html = welcome_html("<b>Ann</b>", "Lift & Run");

        assert!(html.contains("&lt;b&gt;Ann&lt;/b&gt;"));
        assert!(html.contains("Lift &amp; Run"));
        assert!(!html.contains("<b>Ann</b>"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_does_not_spawn() {
        let mailer = Mailer::disabled();
        assert!(!mailer.is_enabled());
        mailer.send_welcome("owner@example.com", "Ann", "Lift");
    }

    #[test]
    fn test_outgoing_email_shape() {
        let email = OutgoingEmail {
            from: "no-reply@gymhub.local".to_string(),
            to: "owner@example.com".to_string(),
            subject: "Hi".to_string(),
            html: "<p>x</p>".to_string(),
        };
        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json["from"], "no-reply@gymhub.local");
        assert_eq!(json["to"], "owner@example.com");
        assert_eq!(json["subject"], "Hi");
        assert_eq!(json["html"], "<p>x</p>");
    }
}
