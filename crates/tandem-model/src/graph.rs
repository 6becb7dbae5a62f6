//! Field/observer dependency graph and batch bookkeeping.
//!
//! Everything lives in thread locals: a model and the reactions observing it
//! always belong to the same thread.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::{Rc, Weak};

use crate::config::config;

pub type FieldId = usize;
pub type ObserverId = usize;

/// Something that wants one call at the end of a batch in which it changed.
pub(crate) trait Notifier {
    fn deliver(&self);
}

enum Job {
    React(ObserverId),
    Notify(Weak<dyn Notifier>),
}

thread_local! {
    static TRACKING: RefCell<Vec<Option<ObserverId>>> = const { RefCell::new(Vec::new()) };
    static GRAPH: RefCell<DepGraph> = RefCell::new(DepGraph::default());
}

#[derive(Default)]
struct DepGraph {
    next_field: FieldId,
    next_observer: ObserverId,
    // field_id -> observers that read it during their last run
    edges: HashMap<FieldId, HashSet<ObserverId>>,
    // observer_id -> fields it read
    back: HashMap<ObserverId, HashSet<FieldId>>,
    // invalidation callbacks
    observers: HashMap<ObserverId, Rc<dyn Fn()>>,
    batch_depth: usize,
    action_depth: usize,
    flushing: bool,
    queue: VecDeque<Job>,
    queued: HashSet<ObserverId>,
}

impl DepGraph {
    fn remove_all_edges_for(&mut self, obs: ObserverId) {
        if let Some(fields) = self.back.remove(&obs) {
            for f in fields {
                if let Some(set) = self.edges.get_mut(&f) {
                    set.remove(&obs);
                    if set.is_empty() {
                        self.edges.remove(&f);
                    }
                }
            }
        }
    }

    fn remove_observer(&mut self, obs: ObserverId) -> Option<Rc<dyn Fn()>> {
        self.remove_all_edges_for(obs);
        self.queued.remove(&obs);
        self.observers.remove(&obs)
    }
}

pub(crate) fn new_field() -> FieldId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_field;
        g.next_field += 1;
        id
    })
}

pub(crate) fn new_observer(f: impl Fn() + 'static) -> ObserverId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_observer;
        g.next_observer += 1;
        g.observers.insert(id, Rc::new(f));
        id
    })
}

/// Remove an observer and all of its dependency edges.
pub(crate) fn remove_observer(id: ObserverId) {
    // The callback may own models or reactions; drop it outside the borrow.
    let callback = GRAPH.with(|g| g.borrow_mut().remove_observer(id));
    drop(callback);
}

pub(crate) fn is_observed(field: FieldId) -> bool {
    GRAPH.with(|g| g.borrow().edges.get(&field).is_some_and(|s| !s.is_empty()))
}

pub(crate) fn dependency_count(obs: ObserverId) -> usize {
    GRAPH.with(|g| g.borrow().back.get(&obs).map_or(0, HashSet::len))
}

pub(crate) fn report_read(field: FieldId) {
    let current = TRACKING.with(|t| t.borrow().last().copied().flatten());
    if let Some(obs) = current {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            if !g.observers.contains_key(&obs) {
                return;
            }
            g.edges.entry(field).or_default().insert(obs);
            g.back.entry(obs).or_default().insert(field);
        });
    }
}

/// Queues every observer of `field`. Must be called inside a batch.
pub(crate) fn report_write(field: FieldId) {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let observers: Vec<ObserverId> = g
            .edges
            .get(&field)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for obs in observers {
            if g.queued.insert(obs) {
                g.queue.push_back(Job::React(obs));
            }
        }
    });
}

pub(crate) fn queue_notify(target: Weak<dyn Notifier>) {
    GRAPH.with(|g| g.borrow_mut().queue.push_back(Job::Notify(target)));
}

pub(crate) fn in_action() -> bool {
    GRAPH.with(|g| g.borrow().action_depth > 0)
}

struct BatchGuard {
    action: bool,
}

impl BatchGuard {
    fn enter(action: bool) -> Self {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            g.batch_depth += 1;
            if action {
                g.action_depth += 1;
            }
        });
        BatchGuard { action }
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            g.batch_depth -= 1;
            if self.action {
                g.action_depth -= 1;
            }
        });
    }
}

/// Runs `f` as one batch; pending jobs run once the outermost batch ends.
pub(crate) fn batch<R>(f: impl FnOnce() -> R) -> R {
    let out = {
        let _batch = BatchGuard::enter(false);
        f()
    };
    flush_if_idle();
    out
}

/// Like [`batch`], but writes inside count as happening within an action.
pub(crate) fn action<R>(f: impl FnOnce() -> R) -> R {
    let out = {
        let _batch = BatchGuard::enter(true);
        f()
    };
    flush_if_idle();
    out
}

/// Runs `f` with `obs` collecting every field read, replacing its previous
/// dependency set.
pub(crate) fn track<R>(obs: ObserverId, f: impl FnOnce() -> R) -> R {
    struct Pop;
    impl Drop for Pop {
        fn drop(&mut self) {
            TRACKING.with(|t| {
                t.borrow_mut().pop();
            });
        }
    }

    GRAPH.with(|g| g.borrow_mut().remove_all_edges_for(obs));
    let out = {
        let _batch = BatchGuard::enter(false);
        TRACKING.with(|t| t.borrow_mut().push(Some(obs)));
        let _pop = Pop;
        f()
    };
    flush_if_idle();
    out
}

/// Runs `f` without recording reads for the enclosing reaction.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    struct Pop;
    impl Drop for Pop {
        fn drop(&mut self) {
            TRACKING.with(|t| {
                t.borrow_mut().pop();
            });
        }
    }

    TRACKING.with(|t| t.borrow_mut().push(None));
    let _pop = Pop;
    f()
}

fn flush_if_idle() {
    let idle = GRAPH.with(|g| {
        let g = g.borrow();
        g.batch_depth == 0 && !g.flushing && !g.queue.is_empty()
    });
    if idle {
        flush();
    }
}

fn flush() {
    struct Flushing;
    impl Drop for Flushing {
        fn drop(&mut self) {
            GRAPH.with(|g| g.borrow_mut().flushing = false);
        }
    }

    GRAPH.with(|g| g.borrow_mut().flushing = true);
    let _flushing = Flushing;
    let limit = config().max_reaction_iterations;
    let mut runs: HashMap<ObserverId, usize> = HashMap::new();

    loop {
        let job = GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            let job = g.queue.pop_front();
            if let Some(Job::React(id)) = &job {
                g.queued.remove(id);
            }
            job
        });
        let Some(job) = job else { break };

        match job {
            Job::React(id) => {
                let n = runs.entry(id).or_default();
                *n += 1;
                if *n > limit {
                    log::error!(
                        "reaction {id} did not converge after {limit} iterations; dropping it from this batch"
                    );
                    continue;
                }
                let callback = GRAPH.with(|g| g.borrow().observers.get(&id).cloned());
                if let Some(callback) = callback {
                    log::trace!("running reaction {id}");
                    let _batch = BatchGuard::enter(false);
                    callback();
                }
            }
            Job::Notify(target) => {
                if let Some(target) = target.upgrade() {
                    let _batch = BatchGuard::enter(false);
                    target.deliver();
                }
            }
        }
    }
}
