//! Alert fan-out to independently configured notification backends.
//!
//! Every backend exposes the same [`Notifier`] capability. The
//! [`NotificationDispatcher`] runs each delivery as its own task so that a
//! slow webhook never holds up telemetry ingestion, and a failing backend
//! never stops the others.

pub mod discord;
pub mod logger;
pub mod system;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::MonitorConfig;
use crate::errors::{ConfigError, NotifyError, NotifyResult};
use crate::models::Notification;

pub use discord::DiscordNotifier;
pub use logger::LoggerNotifier;
pub use system::SystemNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Logger,
    Discord,
    System,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Logger,
        BackendKind::Discord,
        BackendKind::System,
    ];

    /// Stable name used to select the backend in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Logger => "logger",
            BackendKind::Discord => "discord",
            BackendKind::System => "system",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownBackend(s.to_string()))
    }
}

/// A place alerts can be sent to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Attempt delivery of one notification.
    async fn deliver(&self, notification: &Notification) -> NotifyResult<()>;
}

/// Every backend this build knows how to construct from `config`.
///
/// The webhook backend is only available when a webhook URL is configured.
pub fn registered_backends(config: &MonitorConfig) -> Vec<Arc<dyn Notifier>> {
    let mut backends: Vec<Arc<dyn Notifier>> =
        vec![Arc::new(LoggerNotifier), Arc::new(SystemNotifier::default())];
    if let Some(webhook) = &config.discord_webhook {
        backends.push(Arc::new(DiscordNotifier::new(webhook.clone())));
    }
    backends
}

/// Keep the backends named in `selected`, in that order.
pub fn select_backends(
    registered: Vec<Arc<dyn Notifier>>,
    selected: &[BackendKind],
) -> Vec<Arc<dyn Notifier>> {
    selected
        .iter()
        .filter_map(|kind| {
            let found = registered.iter().find(|backend| backend.kind() == *kind).cloned();
            if found.is_none() {
                warn!("Notification backend '{}' is selected but not available", kind);
            }
            found
        })
        .collect()
}

pub struct NotificationDispatcher {
    backends: Vec<Arc<dyn Notifier>>,
    timeout: Duration,
    tracker: TaskTracker,
    token: CancellationToken,
}

impl NotificationDispatcher {
    pub fn new(backends: Vec<Arc<dyn Notifier>>, timeout: Duration) -> Self {
        Self {
            backends,
            timeout,
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        let backends = select_backends(registered_backends(config), &config.notifications);
        let dispatcher = Self::new(backends, config.notify_timeout);
        let names: Vec<&str> = dispatcher
            .backend_kinds()
            .iter()
            .map(BackendKind::name)
            .collect();
        if names.is_empty() {
            info!("Notification backends: none");
        } else {
            info!("Notification backends: {}", names.join(", "));
        }
        dispatcher
    }

    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Number of deliveries still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Hand the notification to every backend and return immediately.
    ///
    /// Must be called from within a tokio runtime. Errors, timeouts and
    /// panics of a backend are logged and go no further.
    pub fn dispatch(&self, title: Option<String>, message: Option<String>) {
        if self.backends.is_empty() {
            debug!("No notification backends enabled, dropping {:?}", title);
            return;
        }
        if self.tracker.is_closed() {
            warn!("Dispatcher is shut down, dropping {:?}", title);
            return;
        }

        let notification = Arc::new(Notification::new(title, message));
        for backend in &self.backends {
            let backend = Arc::clone(backend);
            let notification = Arc::clone(&notification);
            let token = self.token.clone();
            let timeout = self.timeout;

            self.tracker.spawn(async move {
                let kind = backend.kind();
                let delivery = tokio::spawn(async move {
                    tokio::time::timeout(timeout, backend.deliver(&notification)).await
                });
                let abort = delivery.abort_handle();

                tokio::select! {
                    _ = token.cancelled() => {
                        abort.abort();
                        warn!("Abandoned {} notification on shutdown", kind);
                    }
                    joined = delivery => match joined {
                        Ok(Ok(Ok(()))) => debug!("Notification delivered via {}", kind),
                        Ok(Ok(Err(e))) => error!("Notification via {} failed: {}", kind, e),
                        Ok(Err(_)) => error!(
                            "Notification via {} failed: {}",
                            kind,
                            NotifyError::Timeout(timeout.as_secs())
                        ),
                        Err(e) => error!("Notification via {} panicked: {}", kind, e),
                    },
                }
            });
        }
    }

    /// Stop accepting notifications and give in-flight ones `grace` to finish.
    /// Whatever is still running after that is abandoned.
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        if self.in_flight() > 0 {
            info!("Waiting for {} notification(s) to finish", self.in_flight());
        }
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                "Abandoning {} in-flight notification(s) after {:?}",
                self.in_flight(),
                grace
            );
            self.token.cancel();
            self.tracker.wait().await;
        }
    }
}
