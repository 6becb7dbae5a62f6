use std::cell::Cell;
use std::rc::Rc;

use tandem_host::{Vm, WeakVm};
use tandem_model::{Change, Model};

use crate::cleanup::Cleanup;
use crate::strategy::Strategy;

/// Re-renders by subscribing to every model and forcing an update.
///
/// Listeners fire once per model batch. While a property-driven write is in
/// progress all notifications are held back (the suppression is coarse, not
/// per field); when the outermost write finishes, one forced update is
/// requested if anything was held back. A forced update never re-enters
/// itself: notifications arriving while it is being requested are dropped.
pub struct Push(Rc<PushState>);

struct PushState {
    vm: WeakVm,
    name: String,
    updating: Cell<bool>,
    suppressed: Cell<bool>,
    forced: Cell<usize>,
}

impl PushState {
    fn on_change(&self, changes: &[Change]) {
        if self.updating.get() {
            log::trace!("{}: holding back {} change(s)", self.name, changes.len());
            self.suppressed.set(true);
            return;
        }
        self.request_update();
    }

    fn request_update(&self) {
        let Some(vm) = self.vm.upgrade() else {
            return;
        };
        self.updating.set(true);
        vm.force_update();
        self.forced.set(self.forced.get() + 1);
        self.updating.set(false);
        self.suppressed.set(false);
    }
}

impl Push {
    /// Forced updates requested so far.
    pub fn forced_updates(&self) -> usize {
        self.0.forced.get()
    }

    pub fn is_updating(&self) -> bool {
        self.0.updating.get()
    }
}

impl Strategy for Push {
    const NAME: &'static str = "push";

    fn new(vm: &Vm, component: &str) -> Self {
        Push(Rc::new(PushState {
            vm: vm.downgrade(),
            name: component.to_string(),
            updating: Cell::new(false),
            suppressed: Cell::new(false),
            forced: Cell::new(0),
        }))
    }

    fn attach(&self, _vm: &Vm, models: &[Model], cleanup: &Cleanup) {
        for model in models {
            log::debug!("{}: observing {}", self.0.name, model.name());
            let state = Rc::downgrade(&self.0);
            cleanup.push(model.observe(move |changes| {
                if let Some(state) = state.upgrade() {
                    state.on_change(changes);
                }
            }));
        }
    }

    fn write<R>(&self, write: impl FnOnce() -> R) -> R {
        let outermost = !self.0.updating.replace(true);
        let out = write();
        if outermost {
            self.0.updating.set(false);
            if self.0.suppressed.take() {
                self.0.request_update();
            }
        }
        out
    }
}
