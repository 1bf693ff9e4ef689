use async_trait::async_trait;
use log::info;

use super::{BackendKind, Notifier};
use crate::errors::NotifyResult;
use crate::models::Notification;

/// Writes alerts to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerNotifier;

#[async_trait]
impl Notifier for LoggerNotifier {
    fn kind(&self) -> BackendKind {
        BackendKind::Logger
    }

    async fn deliver(&self, notification: &Notification) -> NotifyResult<()> {
        info!("*** START LOGGER NOTIFICATION ***");
        if let Some(title) = &notification.title {
            info!("Title: {}", title);
        }
        if let Some(message) = &notification.message {
            info!("Message: {}", message);
        }
        info!("*** END LOGGER NOTIFICATION ***");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let notifier = LoggerNotifier;
        assert!(notifier.deliver(&Notification::default()).await.is_ok());
        assert!(notifier
            .deliver(&Notification::new(Some("t".into()), Some("m".into())))
            .await
            .is_ok());
    }
}
