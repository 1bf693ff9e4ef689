use std::fmt;

/// One decoded broadcast from an ATC thermometer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub battery_v: f32,
    pub battery_pct: u8,
    pub sequence: u8,
    pub rssi: i16,
}

/// "Device seen" event handed over by the transport.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub address: String,
    pub name: Option<String>,
    pub service_data: Vec<u8>,
    pub rssi: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Low,
    High,
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundKind::Low => write!(f, "lower"),
            BoundKind::High => write!(f, "higher"),
        }
    }
}

/// A threshold crossing, before rate limiting.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCandidate {
    pub device_name: String,
    pub temperature_c: f32,
    pub bound_kind: BoundKind,
    pub bound_value: f32,
}

impl AlertCandidate {
    pub fn title(&self) -> String {
        format!(
            "Temperature Alert for {} than {:?} °C",
            self.bound_kind, self.bound_value
        )
    }

    pub fn message(&self) -> String {
        format!("{}: {:.2} °C", self.device_name, self.temperature_c)
    }

    pub fn to_notification(&self) -> Notification {
        Notification::new(Some(self.title()), Some(self.message()))
    }
}

/// Payload every notification backend accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub title: Option<String>,
    pub message: Option<String>,
}

impl Notification {
    pub fn new(title: Option<String>, message: Option<String>) -> Self {
        Self { title, message }
    }

    /// Title and message joined by a newline, skipping whichever is missing.
    pub fn to_text(&self) -> String {
        [self.title.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n")
    }
}
