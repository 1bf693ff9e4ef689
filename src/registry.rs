/// Device identity, naming and duplicate-broadcast suppression
use log::debug;
use std::collections::HashMap;
use time::OffsetDateTime;

use crate::models::Reading;

/// Prefix for names synthesized from the transport address.
const SYNTHETIC_NAME_PREFIX: &str = "ATC_";

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub address: String,
    pub display_name: String,
    pub slot_index: usize,
    pub last_sequence: Option<u8>,
    pub last_seen_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObserveResult {
    /// Same sequence counter as last time, nothing was changed.
    Duplicate,
    Updated {
        device: Device,
        previous_seen_at: Option<OffsetDateTime>,
    },
}

/// All devices seen since startup, keyed by transport address.
///
/// Slots are handed out in insertion order and never reused, so the display
/// position of a device stays put for the whole process lifetime.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
    name_overrides: Vec<(String, String)>,
}

impl DeviceRegistry {
    pub fn new(name_overrides: Vec<(String, String)>) -> Self {
        Self {
            devices: HashMap::new(),
            name_overrides,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn observe(
        &mut self,
        address: &str,
        raw_name: Option<&str>,
        reading: &Reading,
    ) -> ObserveResult {
        self.observe_at(address, raw_name, reading, OffsetDateTime::now_utc())
    }

    /// Record a decoded reading seen at `now`.
    ///
    /// Returns `Duplicate` without touching any state when the sequence
    /// counter matches the stored one. A counter wrapping from 255 to 0 is a
    /// new reading like any other change.
    pub fn observe_at(
        &mut self,
        address: &str,
        raw_name: Option<&str>,
        reading: &Reading,
        now: OffsetDateTime,
    ) -> ObserveResult {
        let name = self.resolve_name(address, raw_name);

        if let Some(device) = self.devices.get_mut(address) {
            if device.last_sequence == Some(reading.sequence) {
                return ObserveResult::Duplicate;
            }
            if device.display_name != name {
                debug!(
                    "Device {} renamed: '{}' -> '{}'",
                    address, device.display_name, name
                );
                device.display_name = name;
            }
            device.last_sequence = Some(reading.sequence);
            let previous_seen_at = device.last_seen_at.replace(now);
            return ObserveResult::Updated {
                device: device.clone(),
                previous_seen_at,
            };
        }

        let device = Device {
            address: address.to_string(),
            display_name: name,
            slot_index: self.devices.len(),
            last_sequence: Some(reading.sequence),
            last_seen_at: Some(now),
        };
        debug!(
            "Registered device {} as '{}' in slot {}",
            address, device.display_name, device.slot_index
        );
        self.devices.insert(address.to_string(), device.clone());

        ObserveResult::Updated {
            device,
            previous_seen_at: None,
        }
    }

    /// Advertised name (or one synthesized from the address) with overrides applied.
    pub fn resolve_name(&self, address: &str, raw_name: Option<&str>) -> String {
        match raw_name.filter(|name| !name.trim().is_empty()) {
            Some(name) => self.apply_override(name),
            None => self.apply_override(&synthesize_name(address)),
        }
    }

    fn apply_override(&self, name: &str) -> String {
        self.name_overrides
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix.as_str()))
            .map(|(_, display)| display.clone())
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
impl DeviceRegistry {
    pub fn get(&self, address: &str) -> Option<&Device> {
        self.devices.get(address)
    }
}

/// `ATC_` followed by the last six hex digits of the address.
///
/// MAC addresses contribute their last three octets. Other identifiers
/// (such as platform UUIDs) contribute the tail of their final segment.
fn synthesize_name(address: &str) -> String {
    let suffix = if address.contains(':') {
        let octets: Vec<&str> = address.split(':').collect();
        octets[octets.len().saturating_sub(3)..].concat()
    } else {
        let segment = address.rsplit('-').next().unwrap_or(address);
        let start = segment
            .char_indices()
            .rev()
            .nth(5)
            .map(|(i, _)| i)
            .unwrap_or(0);
        segment[start..].to_string()
    };
    format!("{}{}", SYNTHETIC_NAME_PREFIX, suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn reading(sequence: u8) -> Reading {
        Reading {
            temperature_c: 21.5,
            humidity_pct: 45.0,
            battery_v: 3.0,
            battery_pct: 80,
            sequence,
            rssi: -60,
        }
    }

    fn overrides() -> Vec<(String, String)> {
        vec![
            ("5EDB77".to_string(), "OUTSIDE ROOM".to_string()),
            ("995B".to_string(), "MAIN ROOM".to_string()),
        ]
    }

    #[test]
    fn test_duplicate_sequence_is_idempotent() {
        let mut registry = DeviceRegistry::default();
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let t1 = t0 + Duration::seconds(5);

        assert!(matches!(
            registry.observe_at("A4:C1:38:00:00:01", None, &reading(7), t0),
            ObserveResult::Updated { previous_seen_at: None, .. }
        ));
        assert_eq!(
            registry.observe_at("A4:C1:38:00:00:01", None, &reading(7), t1),
            ObserveResult::Duplicate
        );
        assert_eq!(registry.get("A4:C1:38:00:00:01").unwrap().last_seen_at, Some(t0));
    }

    #[test]
    fn test_sequence_wraparound_is_new_data() {
        let mut registry = DeviceRegistry::default();
        let t0 = OffsetDateTime::UNIX_EPOCH;
        let t1 = t0 + Duration::seconds(10);

        registry.observe_at("A4:C1:38:00:00:01", None, &reading(255), t0);
        match registry.observe_at("A4:C1:38:00:00:01", None, &reading(0), t1) {
            ObserveResult::Updated { device, previous_seen_at } => {
                assert_eq!(previous_seen_at, Some(t0));
                assert_eq!(device.last_sequence, Some(0));
                assert_eq!(device.last_seen_at, Some(t1));
            }
            ObserveResult::Duplicate => panic!("wraparound treated as duplicate"),
        }
    }

    #[test]
    fn test_slots_follow_first_sighting_order() {
        let mut registry = DeviceRegistry::default();
        let addresses = ["AA:00:00:00:00:01", "AA:00:00:00:00:02", "AA:00:00:00:00:03"];

        // The first device reports many times before the others show up
        for seq in 0..10 {
            registry.observe(addresses[0], None, &reading(seq));
        }
        registry.observe(addresses[1], None, &reading(0));
        registry.observe(addresses[0], None, &reading(10));
        registry.observe(addresses[2], None, &reading(0));

        for (n, address) in addresses.iter().enumerate() {
            assert_eq!(registry.get(address).unwrap().slot_index, n);
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_rename_keeps_slot() {
        let mut registry = DeviceRegistry::default();
        registry.observe("AA:00:00:00:00:01", Some("ATC_000001"), &reading(1));
        registry.observe("AA:00:00:00:00:02", Some("ATC_000002"), &reading(1));

        match registry.observe("AA:00:00:00:00:02", Some("Kitchen"), &reading(2)) {
            ObserveResult::Updated { device, .. } => {
                assert_eq!(device.display_name, "Kitchen");
                assert_eq!(device.slot_index, 1);
            }
            ObserveResult::Duplicate => panic!("expected update"),
        }
    }

    #[test]
    fn test_duplicate_does_not_rename() {
        let mut registry = DeviceRegistry::default();
        registry.observe("AA:00:00:00:00:01", Some("Old"), &reading(1));
        registry.observe("AA:00:00:00:00:01", Some("New"), &reading(1));
        assert_eq!(registry.get("AA:00:00:00:00:01").unwrap().display_name, "Old");
    }

    #[test]
    fn test_name_resolution() {
        let registry = DeviceRegistry::new(overrides());

        // Advertised name matching an override by suffix
        assert_eq!(
            registry.resolve_name("A4:C1:38:5E:DB:77", Some("ATC_5EDB77")),
            "OUTSIDE ROOM"
        );
        // Exact match
        assert_eq!(registry.resolve_name("A4:C1:38:00:99:5B", Some("995B")), "MAIN ROOM");
        // Advertised name without override is used verbatim
        assert_eq!(registry.resolve_name("A4:C1:38:12:34:56", Some("LYWSD03")), "LYWSD03");
        // Missing name is synthesized, then overridden
        assert_eq!(registry.resolve_name("a4:c1:38:5e:db:77", None), "OUTSIDE ROOM");
        assert_eq!(registry.resolve_name("A4:C1:38:12:34:56", Some("")), "ATC_123456");
        assert_eq!(registry.resolve_name("A4:C1:38:12:34:56", Some("  ")), "ATC_123456");
        // Surrounding whitespace in an advertised name is kept
        assert_eq!(
            registry.resolve_name("A4:C1:38:12:34:56", Some(" Kitchen ")),
            " Kitchen "
        );
    }

    #[test]
    fn test_synthesized_name_from_uuid_address() {
        assert_eq!(
            synthesize_name("3F2504E0-4F89-11D3-9A0C-0305E82C3301"),
            "ATC_2C3301"
        );
        assert_eq!(synthesize_name("abc"), "ATC_ABC");
    }
}
