use crate::models::{AlertCandidate, BoundKind};

/// Checks temperatures against optional low/high bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdMonitor {
    low_bound: Option<f32>,
    high_bound: Option<f32>,
}

impl ThresholdMonitor {
    pub fn new(low_bound: Option<f32>, high_bound: Option<f32>) -> Self {
        Self {
            low_bound,
            high_bound,
        }
    }

    /// Both bounds are inclusive. The low bound is checked first and wins
    /// when both would trigger.
    pub fn evaluate(&self, device_name: &str, temperature_c: f32) -> Option<AlertCandidate> {
        let (bound_kind, bound_value) = match (self.low_bound, self.high_bound) {
            (Some(low), _) if temperature_c <= low => (BoundKind::Low, low),
            (_, Some(high)) if temperature_c >= high => (BoundKind::High, high),
            _ => return None,
        };

        Some(AlertCandidate {
            device_name: device_name.to_string(),
            temperature_c,
            bound_kind,
            bound_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_bound_inclusive() {
        let monitor = ThresholdMonitor::new(Some(6.0), None);

        let candidate = monitor.evaluate("OUTSIDE", 6.0).unwrap();
        assert_eq!(candidate.bound_kind, BoundKind::Low);
        assert_eq!(candidate.bound_value, 6.0);
        assert_eq!(candidate.temperature_c, 6.0);

        assert!(monitor.evaluate("OUTSIDE", 6.01).is_none());
    }

    #[test]
    fn test_high_bound_inclusive() {
        let monitor = ThresholdMonitor::new(None, Some(36.0));
        assert_eq!(
            monitor.evaluate("ATTIC", 36.0).unwrap().bound_kind,
            BoundKind::High
        );
        assert!(monitor.evaluate("ATTIC", 35.99).is_none());
    }

    #[test]
    fn test_low_wins_over_high() {
        // Overlapping bounds: both would trigger
        let monitor = ThresholdMonitor::new(Some(30.0), Some(20.0));
        let candidate = monitor.evaluate("LAB", 25.0).unwrap();
        assert_eq!(candidate.bound_kind, BoundKind::Low);
        assert_eq!(candidate.bound_value, 30.0);
    }

    #[test]
    fn test_unset_bounds_never_trigger() {
        let monitor = ThresholdMonitor::default();
        assert!(monitor.evaluate("ANY", -100.0).is_none());
        assert!(monitor.evaluate("ANY", 100.0).is_none());
    }

    #[test]
    fn test_between_bounds() {
        let monitor = ThresholdMonitor::new(Some(6.0), Some(36.0));
        assert!(monitor.evaluate("MAIN ROOM", 21.5).is_none());
    }
}
