use log::debug;
use std::collections::HashMap;

/// Remembers the temperature of the last alert sent for each device name
/// and holds back repeats until the reading moves by more than the delta.
#[derive(Debug)]
pub struct AlertRateLimiter {
    hysteresis_delta: f32,
    last_alerted: HashMap<String, f32>,
}

impl AlertRateLimiter {
    pub fn new(hysteresis_delta: f32) -> Self {
        Self {
            hysteresis_delta,
            last_alerted: HashMap::new(),
        }
    }

    /// Accepting an alert makes `temperature_c` the new baseline for the
    /// name. A rejected alert leaves the baseline as it was.
    pub fn should_alert(&mut self, device_name: &str, temperature_c: f32) -> bool {
        match self.last_alerted.get_mut(device_name) {
            None => {
                self.last_alerted.insert(device_name.to_string(), temperature_c);
                true
            }
            Some(last) if (*last - temperature_c).abs() > self.hysteresis_delta => {
                *last = temperature_c;
                true
            }
            Some(last) => {
                debug!(
                    "Suppressing alert for {}: {:.2} °C within {} of {:.2} °C",
                    device_name, temperature_c, self.hysteresis_delta, last
                );
                false
            }
        }
    }
}

#[cfg(test)]
impl AlertRateLimiter {
    pub fn last_alerted(&self, device_name: &str) -> Option<f32> {
        self.last_alerted.get(device_name).copied()
    }
}

impl Default for AlertRateLimiter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HYSTERESIS_DELTA)
    }
}
