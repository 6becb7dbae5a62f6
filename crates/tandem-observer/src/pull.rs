use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tandem_host::{RenderHook, RenderTrigger, Vm, WeakVm};
use tandem_model::{Model, Reaction};

use crate::cleanup::Cleanup;
use crate::observer::InstanceBridge;
use crate::strategy::Strategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The render hook has not run yet.
    Unmounted,
    /// Every render runs inside the instance's reaction.
    Tracking,
    Disposed,
}

/// Re-renders by running each render inside a [`Reaction`].
///
/// The reaction records exactly the model fields the render read; a write to
/// any of them queues one update, and the next render re-collects the set.
/// Fields the render never read do not cause updates.
pub struct Pull(Rc<PullState>);

struct PullState {
    vm: WeakVm,
    name: String,
    phase: Cell<Phase>,
    reaction: RefCell<Option<Reaction>>,
}

impl Pull {
    pub fn phase(&self) -> Phase {
        self.0.phase.get()
    }

    /// The render reaction, once the instance is mounted.
    pub fn reaction(&self) -> Option<Reaction> {
        self.0.reaction.borrow().clone()
    }

    /// Builds the tracked trigger around the host's native render.
    fn install(&self, native: RenderTrigger, cleanup: &Cleanup) -> RenderTrigger {
        let vm = self.0.vm.clone();
        let reaction = Reaction::new(format!("{}.render()", self.0.name), move || {
            if let Some(vm) = vm.upgrade() {
                vm.force_update();
            }
        });
        cleanup.push(reaction.disposer());
        *self.0.reaction.borrow_mut() = Some(reaction.clone());

        let state = Rc::downgrade(&self.0);
        Rc::new(move |vm: &Vm| {
            if let Some(state) = state.upgrade()
                && state.phase.get() == Phase::Unmounted
            {
                state.phase.set(Phase::Tracking);
            }
            reaction.track(|| native(vm));
        })
    }
}

impl Strategy for Pull {
    const NAME: &'static str = "pull";

    fn new(vm: &Vm, component: &str) -> Self {
        Pull(Rc::new(PullState {
            vm: vm.downgrade(),
            name: component.to_string(),
            phase: Cell::new(Phase::Unmounted),
            reaction: RefCell::new(None),
        }))
    }

    fn attach(&self, vm: &Vm, models: &[Model], _cleanup: &Cleanup) {
        log::debug!(
            "{}#{}: renders will track {} model(s)",
            self.0.name,
            vm.id(),
            models.len()
        );
    }

    fn detach(&self) {
        self.0.phase.set(Phase::Disposed);
    }

    fn render_hook() -> Option<Rc<dyn RenderHook>> {
        Some(Rc::new(PullHook))
    }
}

struct PullHook;

impl RenderHook for PullHook {
    fn wrap(&self, vm: &Vm, native: RenderTrigger) -> RenderTrigger {
        match vm.ext::<InstanceBridge<Pull>>() {
            Some(bridge) if bridge.strategy().reaction().is_none() => {
                bridge.strategy().install(native, bridge.cleanup())
            }
            _ => native,
        }
    }
}
