use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Engine configuration
///
/// The tick cadence belongs to the external scheduler, but it is explicit
/// configuration here so nothing in the core hard-codes an interval.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Interval between ticks for one index.
    pub execution_period: Duration,

    /// Fixed delay before the first tick of a newly managed index.
    pub execution_fixed_delay: Duration,

    /// Spread first ticks across one period instead of ticking every index
    /// at the same instant.
    pub execution_random_delay_enabled: bool,

    /// Upper bound on ticks running at the same time.
    pub max_concurrent_ticks: usize,
}

impl EngineSettings {
    pub fn new() -> Self {
        Self {
            execution_period: Duration::from_secs(300), // 5 minutes
            execution_fixed_delay: Duration::ZERO,
            execution_random_delay_enabled: true,
            max_concurrent_ticks: 8,
        }
    }

    /// Set the tick interval
    pub fn execution_period(mut self, period: Duration) -> Self {
        self.execution_period = period;
        self
    }

    /// Set the fixed first-tick delay
    pub fn execution_fixed_delay(mut self, delay: Duration) -> Self {
        self.execution_fixed_delay = delay;
        self
    }

    /// Enable or disable first-tick spreading
    pub fn execution_random_delay_enabled(mut self, enabled: bool) -> Self {
        self.execution_random_delay_enabled = enabled;
        self
    }

    /// Set the tick concurrency bound
    pub fn max_concurrent_ticks(mut self, max: usize) -> Self {
        self.max_concurrent_ticks = max;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.execution_period.is_zero() {
            return Err("execution_period must be greater than zero".to_string());
        }
        if self.max_concurrent_ticks == 0 {
            return Err("max_concurrent_ticks must be at least 1".to_string());
        }
        Ok(())
    }

    /// Delay before the first tick of `index`: the fixed delay, plus a
    /// deterministic per-index offset within one period when spreading is
    /// enabled.
    pub fn initial_delay_for(&self, index: &str) -> Duration {
        let mut delay = self.execution_fixed_delay;
        if self.execution_random_delay_enabled {
            let mut hasher = DefaultHasher::new();
            index.hash(&mut hasher);
            let offset_ms = hasher.finish() % self.execution_period.as_millis().max(1) as u64;
            delay += Duration::from_millis(offset_ms);
        }
        delay
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineSettings::new().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let zero_period = EngineSettings::new().execution_period(Duration::ZERO);
        assert!(zero_period.validate().is_err());

        let no_workers = EngineSettings::new().max_concurrent_ticks(0);
        assert!(no_workers.validate().is_err());
    }

    #[test]
    fn test_initial_delay_spread() {
        let settings = EngineSettings::new()
            .execution_period(Duration::from_secs(60))
            .execution_fixed_delay(Duration::from_secs(10));

        let delay = settings.initial_delay_for("logs-000001");
        assert!(delay >= Duration::from_secs(10));
        assert!(delay < Duration::from_secs(70));
        // Deterministic per index.
        assert_eq!(delay, settings.initial_delay_for("logs-000001"));
    }

    #[test]
    fn test_initial_delay_without_spread() {
        let settings = EngineSettings::new()
            .execution_fixed_delay(Duration::from_secs(3))
            .execution_random_delay_enabled(false);
        assert_eq!(
            settings.initial_delay_for("anything"),
            Duration::from_secs(3)
        );
    }
}
