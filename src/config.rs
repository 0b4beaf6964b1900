/// Tuning knobs for a [`ThreadPool`](crate::ThreadPool).
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads spawned by `start`. May be zero, in which
    /// case enqueued work is accepted but never drained.
    pub thread_count: usize,
    /// Stack size for worker threads, in bytes. `None` uses the platform
    /// default.
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            thread_count: num_cpus::get(),
            stack_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_available_cpus() {
        let config = PoolConfig::default();
        assert!(config.thread_count >= 1);
        assert!(config.stack_size.is_none());
    }
}
