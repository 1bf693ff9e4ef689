/// Desktop toast backend driven through `notify-send`
use async_trait::async_trait;
use tokio::process::Command;

use super::{BackendKind, Notifier};
use crate::errors::{NotifyError, NotifyResult};
use crate::models::Notification;

const APP_NAME: &str = "ATC Monitor";
const EXPIRE_MS: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct SystemNotifier {
    program: String,
}

impl Default for SystemNotifier {
    fn default() -> Self {
        Self::new("notify-send")
    }
}

impl SystemNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Notifier for SystemNotifier {
    fn kind(&self) -> BackendKind {
        BackendKind::System
    }

    async fn deliver(&self, notification: &Notification) -> NotifyResult<()> {
        let summary = notification.title.as_deref().unwrap_or(APP_NAME);
        let body = notification.message.as_deref().unwrap_or_default();

        let status = Command::new(&self.program)
            .arg(format!("--app-name={}", APP_NAME))
            .arg(format!("--expire-time={}", EXPIRE_MS))
            .arg(summary)
            .arg(body)
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            return Err(NotifyError::Exit(status));
        }
        Ok(())
    }
}
