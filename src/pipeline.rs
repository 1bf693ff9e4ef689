/// Ingestion loop: one transport event at a time, in arrival order
use log::{debug, info};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::alerts::{AlertRateLimiter, ThresholdMonitor};
use crate::bluetooth::decode_atc_data;
use crate::config::MonitorConfig;
use crate::display::DisplayCompositor;
use crate::models::TransportEvent;
use crate::notifications::NotificationDispatcher;
use crate::registry::{DeviceRegistry, ObserveResult};

const STARTUP_TITLE: &str = "BLE Scanner started with:";

/// What happened to a single transport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Payload could not be decoded; nothing was touched.
    Malformed,
    /// Same sequence counter as the previous broadcast.
    Duplicate,
    /// New reading, displayed, no alert due.
    Updated,
    /// New reading crossed a bound but is within the hysteresis delta.
    Suppressed,
    /// New reading crossed a bound and was sent to the backends.
    Alerted,
}

/// Owns all per-device state. Decode, registry update, threshold check and
/// rate limiting run synchronously in `process_event`; only notification
/// delivery is handed off to background tasks.
pub struct Pipeline {
    registry: DeviceRegistry,
    monitor: ThresholdMonitor,
    limiter: AlertRateLimiter,
    compositor: DisplayCompositor,
    dispatcher: NotificationDispatcher,
}

impl Pipeline {
    pub fn new(
        config: &MonitorConfig,
        compositor: DisplayCompositor,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            registry: DeviceRegistry::new(config.name_overrides.clone()),
            monitor: ThresholdMonitor::new(config.alert_low_threshold, config.alert_high_threshold),
            limiter: AlertRateLimiter::new(config.hysteresis_delta),
            compositor,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Announce the effective settings through every enabled backend.
    pub fn notify_startup(&self, config: &MonitorConfig) {
        self.dispatcher
            .dispatch(Some(STARTUP_TITLE.to_string()), Some(config.summary()));
    }

    pub fn process_event(&mut self, event: &TransportEvent) -> EventOutcome {
        let reading = match decode_atc_data(&event.service_data, event.rssi) {
            Ok(reading) => reading,
            Err(e) => {
                debug!("Dropping advertisement from {}: {}", event.address, e);
                return EventOutcome::Malformed;
            }
        };

        let first_device = self.registry.is_empty();
        let (device, previous_seen_at) =
            match self.registry.observe(&event.address, event.name.as_deref(), &reading) {
                ObserveResult::Duplicate => return EventOutcome::Duplicate,
                ObserveResult::Updated {
                    device,
                    previous_seen_at,
                } => (device, previous_seen_at),
            };

        // Start from a blank screen once the first device shows up
        if first_device {
            self.compositor.clear();
        }

        let seen_at = device.last_seen_at.unwrap_or_else(OffsetDateTime::now_utc);
        let since_previous = previous_seen_at.map(|previous| seen_at - previous);
        self.compositor.render(&device, &reading, seen_at, since_previous);

        debug!(
            "{} ({}): {:.2}°C {:.2}% seq={}",
            device.display_name,
            device.address,
            reading.temperature_c,
            reading.humidity_pct,
            reading.sequence
        );

        let Some(candidate) = self
            .monitor
            .evaluate(&device.display_name, reading.temperature_c)
        else {
            return EventOutcome::Updated;
        };
        if !self.limiter.should_alert(&candidate.device_name, candidate.temperature_c) {
            return EventOutcome::Suppressed;
        }

        let notification = candidate.to_notification();
        self.compositor.render_alert(self.registry.len(), &notification);
        self.dispatcher.dispatch(notification.title, notification.message);
        EventOutcome::Alerted
    }

    /// Consume events until the transport closes or `token` is cancelled.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Stop requested, leaving ingestion loop");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.process_event(&event);
                    }
                    None => {
                        info!("Transport feed closed");
                        break;
                    }
                },
            }
        }
    }

    /// Let in-flight notifications finish within `grace`, then drop them.
    pub async fn shutdown(&self, grace: Duration) {
        self.dispatcher.shutdown(grace).await;
    }
}
