use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tandem_core::Dispose;

use crate::graph::{self, ObserverId};

/// A tracked transaction.
///
/// [`track`](Reaction::track) runs a function while recording every model
/// field it reads. When any of those fields is written, the reaction's
/// invalidation callback runs once, at the end of the writing batch. The
/// callback usually calls `track` again, which re-collects the dependencies.
#[derive(Clone)]
pub struct Reaction(Rc<ReactionInner>);

struct ReactionInner {
    id: ObserverId,
    name: String,
    disposed: Cell<bool>,
    runs: Cell<usize>,
}

impl Reaction {
    pub fn new(name: impl Into<String>, on_invalidate: impl Fn() + 'static) -> Self {
        let name = name.into();
        let id = graph::new_observer(on_invalidate);
        log::trace!("reaction `{name}` created as {id}");
        Self(Rc::new(ReactionInner {
            id,
            name,
            disposed: Cell::new(false),
            runs: Cell::new(0),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Runs `f` and makes the fields it reads the reaction's only
    /// dependencies. After disposal `f` still runs, untracked.
    pub fn track<R>(&self, f: impl FnOnce() -> R) -> R {
        if self.0.disposed.get() {
            return f();
        }
        self.0.runs.set(self.0.runs.get() + 1);
        graph::track(self.0.id, f)
    }

    /// Number of fields read during the last [`track`](Reaction::track).
    pub fn dependency_count(&self) -> usize {
        graph::dependency_count(self.0.id)
    }

    /// How many times [`track`](Reaction::track) ran.
    pub fn runs(&self) -> usize {
        self.0.runs.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    pub fn dispose(&self) {
        if self.0.disposed.replace(true) {
            return;
        }
        log::trace!("reaction `{}` disposed", self.0.name);
        graph::remove_observer(self.0.id);
    }

    pub fn disposer(&self) -> Dispose {
        let this = self.clone();
        Dispose::new(move || this.dispose())
    }
}

/// Runs `f` now and again whenever a field it read changes, until the
/// returned disposer runs.
pub fn autorun(name: impl Into<String>, f: impl Fn() + 'static) -> Dispose {
    let f = Rc::new(f);
    let slot: Rc<RefCell<Option<Reaction>>> = Rc::new(RefCell::new(None));

    let reaction = Reaction::new(name, {
        let slot = slot.clone();
        let f = f.clone();
        move || {
            let reaction = slot.borrow().clone();
            if let Some(reaction) = reaction {
                reaction.track(|| f());
            }
        }
    });
    *slot.borrow_mut() = Some(reaction.clone());
    reaction.track(|| f());

    Dispose::new(move || {
        if let Some(reaction) = slot.borrow_mut().take() {
            reaction.dispose();
        }
    })
}
