//! Tuning knobs for the deletion pipeline.

/// Number of workers used when none is configured.
pub const DEFAULT_WORKERS: usize = 3;

/// Capacity of the work and outcome channels when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// How to classify an update that matched no record.
///
/// A zero-row update happens when the code does not exist or belongs to
/// another owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Count the item as failed, so the batch rolls back.
    #[default]
    Fail,
    /// Count the item as succeeded; nothing was changed for it.
    Ignore,
}

/// Configuration of a [`BatchDeleter`](crate::BatchDeleter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfig {
    workers: usize,
    channel_capacity: usize,
    unmatched: UnmatchedPolicy,
}

impl DeleteConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of concurrent workers. Values below 1 are raised to 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the capacity of the work and outcome channels. Values below 1 are raised to 1.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Sets how zero-row updates are classified.
    pub fn with_unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn unmatched(&self) -> UnmatchedPolicy {
        self.unmatched
    }
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            unmatched: UnmatchedPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = DeleteConfig::default();
        assert_eq!(config.workers(), 3);
        assert_eq!(config.channel_capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.unmatched(), UnmatchedPolicy::Fail);
    }

    #[test]
    fn test_zero_workers_is_raised_to_one() {
        let config = DeleteConfig::new().with_workers(0).with_channel_capacity(0);
        assert_eq!(config.workers(), 1);
        assert_eq!(config.channel_capacity(), 1);
    }

    #[test]
    fn test_builder_overrides() {
        let config = DeleteConfig::new()
            .with_workers(8)
            .with_unmatched(UnmatchedPolicy::Ignore);
        assert_eq!(config.workers(), 8);
        assert_eq!(config.unmatched(), UnmatchedPolicy::Ignore);
    }
}
