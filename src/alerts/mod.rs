//! Threshold evaluation and alert rate limiting.

pub mod rate_limiter;
pub mod threshold;

pub use rate_limiter::AlertRateLimiter;
pub use threshold::ThresholdMonitor;
