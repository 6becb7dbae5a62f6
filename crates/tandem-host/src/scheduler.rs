use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::host_config;
use crate::instance::{Lifecycle, Vm, WeakVm};

thread_local! {
    static QUEUE: RefCell<UpdateQueue> = RefCell::new(UpdateQueue::default());
}

#[derive(Default)]
struct UpdateQueue {
    pending: VecDeque<WeakVm>,
    queued: HashSet<u64>,
    flushing: bool,
}

/// Queues `vm` for re-rendering. An instance is queued at most once until the
/// next flush picks it up; instances that are not mounted are ignored.
pub fn queue_update(vm: &Vm) {
    if vm.lifecycle() != Lifecycle::Mounted {
        log::trace!("ignoring update for {}#{} ({:?})", vm.name(), vm.id(), vm.lifecycle());
        return;
    }
    QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        if q.queued.insert(vm.id()) {
            q.pending.push_back(vm.downgrade());
        }
    });
}

pub fn has_pending_updates() -> bool {
    QUEUE.with(|q| !q.borrow().pending.is_empty())
}

/// Re-renders every queued instance, including the ones queued while
/// flushing. Returns the number of renders performed.
pub fn flush() -> usize {
    let entered = QUEUE.with(|q| {
        let mut q = q.borrow_mut();
        !std::mem::replace(&mut q.flushing, true)
    });
    if !entered {
        return 0;
    }

    struct Flushing;
    impl Drop for Flushing {
        fn drop(&mut self) {
            QUEUE.with(|q| q.borrow_mut().flushing = false);
        }
    }
    let _flushing = Flushing;

    let limit = host_config().max_update_iterations;
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut rendered = 0;

    loop {
        let next = QUEUE.with(|q| {
            let mut q = q.borrow_mut();
            let next = q.pending.pop_front()?;
            q.queued.remove(&next.id());
            Some(next)
        });
        let Some(next) = next else { break };
        let Some(vm) = next.upgrade() else { continue };
        if vm.lifecycle() != Lifecycle::Mounted {
            continue;
        }

        let n = counts.entry(vm.id()).or_default();
        *n += 1;
        if *n > limit {
            log::error!(
                "{}#{} re-rendered more than {limit} times in one flush; possible infinite update loop",
                vm.name(),
                vm.id()
            );
            continue;
        }
        vm.run_trigger();
        rendered += 1;
    }
    rendered
}
