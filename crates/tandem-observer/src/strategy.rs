use std::rc::Rc;

use tandem_host::{RenderHook, Vm};
use tandem_model::Model;

use crate::cleanup::Cleanup;

/// How a bridged component learns that a model it depends on changed.
///
/// One value is created per instance, right after its state is classified.
/// The strategy is picked when the component is bridged, see
/// [`observer_with`](crate::observer_with).
pub trait Strategy: Sized + 'static {
    /// Short name for diagnostics.
    const NAME: &'static str;

    fn new(vm: &Vm, component: &str) -> Self;

    /// Subscribes to the instance's models. Every handle created here must
    /// go into `cleanup`.
    fn attach(&self, vm: &Vm, models: &[Model], cleanup: &Cleanup);

    /// Runs one property-driven model write.
    fn write<R>(&self, write: impl FnOnce() -> R) -> R {
        write()
    }

    /// Called at teardown, after `cleanup` has run.
    fn detach(&self) {}

    /// Hook installed in the component's render-trigger slot, if the
    /// strategy needs one.
    fn render_hook() -> Option<Rc<dyn RenderHook>> {
        None
    }
}
