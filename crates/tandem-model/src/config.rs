use std::cell::Cell;

/// When a field write must happen inside [`run_in_action`](crate::run_in_action).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EnforceActions {
    /// Writes are allowed anywhere.
    #[default]
    Never,
    /// Writes to a field someone is observing must happen inside an action.
    Observed,
    /// Every write must happen inside an action.
    Always,
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub enforce_actions: EnforceActions,
    /// How often one reaction may re-run within a single flush before it is
    /// considered cyclic and dropped.
    pub max_reaction_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enforce_actions: EnforceActions::Never,
            max_reaction_iterations: 100,
        }
    }
}

thread_local! {
    static CONFIG: Cell<Config> = Cell::new(Config::default());
}

/// Replaces the model system configuration for the current thread.
pub fn configure(config: Config) {
    CONFIG.with(|c| c.set(config));
}

pub fn config() -> Config {
    CONFIG.with(|c| c.get())
}
