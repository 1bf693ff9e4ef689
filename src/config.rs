use log::{debug, warn};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;
use crate::notifications::BackendKind;

pub const DEFAULT_LOW_THRESHOLD: f32 = 6.0;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 36.0;
pub const DEFAULT_HYSTERESIS_DELTA: f32 = 1.0;
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// How the adapter should look for advertisements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Try passive first, fall back to active if the adapter refuses.
    Auto,
    Passive,
    Active,
}

impl FromStr for ScanMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ScanMode::Auto),
            "passive" => Ok(ScanMode::Passive),
            "active" => Ok(ScanMode::Active),
            _ => Err(ConfigError::InvalidValue {
                key: "BLE_SCANNER_MODE",
                value: s.to_string(),
            }),
        }
    }
}

/// Character grid used to place one block per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLayout {
    pub columns_per_row: usize,
    pub cell_width: usize,
    pub cell_height: usize,
}

impl Default for DisplayLayout {
    fn default() -> Self {
        Self {
            columns_per_row: 4,
            cell_width: 24,
            cell_height: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Ordered `suffix -> display name` overrides; first match wins.
    pub name_overrides: Vec<(String, String)>,
    pub alert_low_threshold: Option<f32>,
    pub alert_high_threshold: Option<f32>,
    pub hysteresis_delta: f32,
    pub notifications: Vec<BackendKind>,
    pub discord_webhook: Option<Url>,
    pub scan_mode: ScanMode,
    pub use_text_pos: bool,
    pub display: DisplayLayout,
    pub notify_timeout: Duration,
    pub debug: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            name_overrides: Vec::new(),
            alert_low_threshold: Some(DEFAULT_LOW_THRESHOLD),
            alert_high_threshold: Some(DEFAULT_HIGH_THRESHOLD),
            hysteresis_delta: DEFAULT_HYSTERESIS_DELTA,
            notifications: vec![BackendKind::Logger],
            discord_webhook: None,
            scan_mode: ScanMode::Auto,
            use_text_pos: true,
            display: DisplayLayout::default(),
            notify_timeout: Duration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECS),
            debug: false,
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let name_overrides = lookup("ATC_NAMES")
            .map(|raw| parse_name_overrides(&raw))
            .unwrap_or_default();

        let alert_low_threshold = match lookup("ALERT_LOW_THRESHOLD") {
            Some(raw) => parse_optional_f32("ALERT_LOW_THRESHOLD", &raw)?,
            None => defaults.alert_low_threshold,
        };
        let alert_high_threshold = match lookup("ALERT_HIGH_THRESHOLD") {
            Some(raw) => parse_optional_f32("ALERT_HIGH_THRESHOLD", &raw)?,
            None => defaults.alert_high_threshold,
        };

        let hysteresis_delta = match lookup("SENT_THRESHOLD_TEMP") {
            Some(raw) => parse_temperature("SENT_THRESHOLD_TEMP", &raw)?,
            None => defaults.hysteresis_delta,
        };
        if hysteresis_delta < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "SENT_THRESHOLD_TEMP",
                value: hysteresis_delta.to_string(),
            });
        }

        let notifications = match lookup("NOTIFICATION") {
            Some(raw) => parse_backends(&raw)?,
            None => defaults.notifications,
        };

        let discord_webhook = match lookup("DISCORD_WEB_HOOKS") {
            Some(raw) if !raw.trim().is_empty() => Some(Url::parse(raw.trim())?),
            _ => None,
        };

        let scan_mode = match lookup("BLE_SCANNER_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.scan_mode,
        };

        let use_text_pos = match lookup("USE_TEXT_POS") {
            Some(raw) => parse_bool("USE_TEXT_POS", &raw)?,
            None => defaults.use_text_pos,
        };

        let mut display = defaults.display;
        if let Some(raw) = lookup("DISPLAY_COLUMNS") {
            display.columns_per_row = parse_value("DISPLAY_COLUMNS", &raw)?;
        }
        if let Some(raw) = lookup("DISPLAY_CELL_WIDTH") {
            display.cell_width = parse_value("DISPLAY_CELL_WIDTH", &raw)?;
        }
        if let Some(raw) = lookup("DISPLAY_CELL_HEIGHT") {
            display.cell_height = parse_value("DISPLAY_CELL_HEIGHT", &raw)?;
        }
        if display.columns_per_row == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DISPLAY_COLUMNS",
                value: "0".to_string(),
            });
        }

        let notify_timeout = match lookup("NOTIFY_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value("NOTIFY_TIMEOUT_SECS", &raw)?),
            None => defaults.notify_timeout,
        };

        let debug = match lookup("DEBUG") {
            Some(raw) => parse_bool("DEBUG", &raw)?,
            None => defaults.debug,
        };

        Ok(MonitorConfig {
            name_overrides,
            alert_low_threshold,
            alert_high_threshold,
            hysteresis_delta,
            notifications,
            discord_webhook,
            scan_mode,
            use_text_pos,
            display,
            notify_timeout,
            debug,
        })
    }

    /// One-line description of the effective settings, sent at startup.
    pub fn summary(&self) -> String {
        let mut params = Vec::new();
        if !self.name_overrides.is_empty() {
            let names = self
                .name_overrides
                .iter()
                .map(|(suffix, name)| format!("{}='{}'", suffix, name))
                .collect::<Vec<_>>()
                .join(" ");
            params.push(format!("custom_names={}", names));
        }
        if let Some(low) = self.alert_low_threshold {
            params.push(format!("alert_low_threshold={}", low));
        }
        if let Some(high) = self.alert_high_threshold {
            params.push(format!("alert_high_threshold={}", high));
        }
        params.push(format!("sent_threshold_temp={}", self.hysteresis_delta));
        params.push(format!("use_text_pos={}", self.use_text_pos));
        params.join(", ")
    }
}

/// Parse `SUFFIX=NAME` pairs separated by commas. Bad pairs are skipped.
fn parse_name_overrides(raw: &str) -> Vec<(String, String)> {
    let mut overrides = Vec::new();
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((suffix, name)) => {
                let suffix = suffix.trim();
                let name = name.trim().trim_matches(|c| c == '"' || c == '\'');
                if suffix.is_empty() || name.is_empty() {
                    warn!("Ignoring empty name override: '{}'", pair);
                    continue;
                }
                debug!("Name override: '{}' -> '{}'", suffix, name);
                overrides.push((suffix.to_string(), name.to_string()));
            }
            None => warn!("Invalid entry format: {}. Expected KEY=VALUE.", pair),
        }
    }
    overrides
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// `none` (any case) or an empty string disables the bound.
fn parse_optional_f32(key: &'static str, raw: &str) -> Result<Option<f32>, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_temperature(key, trimmed).map(Some)
}

/// Finite temperatures only; `NaN` would never compare against a reading.
fn parse_temperature(key: &'static str, raw: &str) -> Result<f32, ConfigError> {
    let value: f32 = parse_value(key, raw)?;
    if !value.is_finite() {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_backends(raw: &str) -> Result<Vec<BackendKind>, ConfigError> {
    let mut kinds = Vec::new();
    for name in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        if name.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case("none") {
            return Ok(Vec::new());
        }
        let kind: BackendKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
