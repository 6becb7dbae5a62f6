use std::cell::{Cell, RefCell};

use tandem_core::Dispose;

/// Per-instance list of release handles.
///
/// Every handle pushed here runs exactly once: on [`run`](Cleanup::run), on
/// drop if `run` never happened, or immediately if pushed after `run`.
#[derive(Default)]
pub struct Cleanup {
    disposers: RefCell<Vec<Dispose>>,
    done: Cell<bool>,
}

impl Cleanup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, disposer: Dispose) {
        if self.done.get() {
            disposer.run();
            return;
        }
        self.disposers.borrow_mut().push(disposer);
    }

    pub fn len(&self) -> usize {
        self.disposers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.borrow().is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.done.get()
    }

    pub fn run(&self) {
        self.done.set(true);
        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer.run();
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.run();
    }
}
