/// Chat webhook backend (Discord-compatible JSON body)
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::{BackendKind, Notifier};
use crate::errors::{NotifyError, NotifyResult};
use crate::models::Notification;

const WEBHOOK_USERNAME: &str = "ATC Monitor";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize, PartialEq)]
struct WebhookMessage<'a> {
    username: &'a str,
    avatar_url: &'a str,
    content: String,
    tts: bool,
}

#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook: Url,
}

impl DiscordNotifier {
    pub fn new(webhook: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook,
        }
    }

    fn build_message(notification: &Notification) -> Option<WebhookMessage<'static>> {
        let content = notification.to_text();
        if content.is_empty() {
            return None;
        }
        Some(WebhookMessage {
            username: WEBHOOK_USERNAME,
            avatar_url: "",
            content,
            tts: false,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn kind(&self) -> BackendKind {
        BackendKind::Discord
    }

    async fn deliver(&self, notification: &Notification) -> NotifyResult<()> {
        let Some(message) = Self::build_message(notification) else {
            debug!("Skipping empty webhook message");
            return Ok(());
        };

        let response = self
            .client
            .post(self.webhook.clone())
            .json(&message)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(NotifyError::Status(status.as_u16()));
        }

        debug!("Webhook accepted message with status {}", status);
        Ok(())
    }
}
