use crate::graph;

/// Runs `f` as a named action.
///
/// Writes inside an action are allowed under every
/// [`EnforceActions`](crate::EnforceActions) mode, and their notifications are
/// held back until the outermost action returns: each affected reaction and
/// each listener runs once for the whole action.
pub fn run_in_action<R>(name: &str, f: impl FnOnce() -> R) -> R {
    log::trace!("action `{name}`");
    graph::action(f)
}

/// Groups writes like an action, without counting as one for enforcement.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    graph::batch(f)
}
