use std::cell::Cell;

#[derive(Clone, Copy, Debug)]
pub struct HostConfig {
    /// Renders of one instance allowed within a single [`flush`](crate::flush)
    /// before the update is treated as an infinite loop.
    pub max_update_iterations: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_update_iterations: 100,
        }
    }
}

thread_local! {
    static HOST_CONFIG: Cell<HostConfig> = Cell::new(HostConfig::default());
}

pub fn configure(config: HostConfig) {
    HOST_CONFIG.with(|c| c.set(config));
}

pub fn host_config() -> HostConfig {
    HOST_CONFIG.with(|c| c.get())
}
