use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use tandem_core::{Dispose, Handle, Value};

use crate::config::{EnforceActions, config};
use crate::error::ModelError;
use crate::graph::{self, FieldId, Notifier};

pub type ModelId = usize;

thread_local! {
    static NEXT_MODEL: Cell<ModelId> = const { Cell::new(0) };
}

new_key_type! {
    struct ListenerKey;
}

/// One field write, as delivered to [`Model::observe`] listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

type Listener = Rc<dyn Fn(&[Change])>;

struct Field {
    id: FieldId,
    value: Value,
}

pub(crate) struct ModelInner {
    id: ModelId,
    name: String,
    fields: RefCell<BTreeMap<String, Field>>,
    listeners: RefCell<SlotMap<ListenerKey, Listener>>,
    // changes of the running batch, only collected while someone listens
    pending: RefCell<SmallVec<[Change; 4]>>,
}

impl Notifier for ModelInner {
    fn deliver(&self) {
        let changes = std::mem::take(&mut *self.pending.borrow_mut());
        if changes.is_empty() {
            return;
        }
        let listeners: Vec<Listener> = self.listeners.borrow().values().cloned().collect();
        log::trace!(
            "{}: delivering {} change(s) to {} listener(s)",
            self.name,
            changes.len(),
            listeners.len()
        );
        for listener in listeners {
            listener(&changes);
        }
    }
}

/// An observable object with named fields.
///
/// `Model` is a cheap `Rc` handle; clones refer to the same object. Reads
/// inside [`Reaction::track`](crate::Reaction::track) become dependencies of
/// that reaction, writes notify dependents and listeners once per batch.
///
/// ```rust
/// use tandem_model::*;
///
/// let todo = Model::new("Todo")
///     .with_field("title", "write docs")
///     .with_field("done", false);
///
/// run_in_action("finish", || todo.set("done", true)).unwrap();
/// assert_eq!(todo.get("done"), Some(true.into()));
/// ```
#[derive(Clone)]
pub struct Model(Rc<ModelInner>);

/// Non-owning reference to a [`Model`].
#[derive(Clone)]
pub struct WeakModel(Weak<ModelInner>);

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        let id = NEXT_MODEL.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        Self(Rc::new(ModelInner {
            id,
            name: name.into(),
            fields: RefCell::new(BTreeMap::new()),
            listeners: RefCell::new(SlotMap::with_key()),
            pending: RefCell::new(SmallVec::new()),
        }))
    }

    /// Declares an observable field. Redeclaring a field replaces its value
    /// without notifying anyone.
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        {
            let mut fields = self.0.fields.borrow_mut();
            match fields.entry(name.into()) {
                std::collections::btree_map::Entry::Occupied(mut e) => e.get_mut().value = value,
                std::collections::btree_map::Entry::Vacant(e) => {
                    e.insert(Field {
                        id: graph::new_field(),
                        value,
                    });
                }
            }
        }
        self
    }

    /// Returns the model stored in `value`, if it holds one.
    ///
    /// The returned handle shares the stored `Rc`; nothing is copied. Plain
    /// maps are never models, whatever their keys.
    pub fn detect(value: &Value) -> Option<Model> {
        value.as_handle()?.downcast::<ModelInner>().map(Model)
    }

    pub fn id(&self) -> ModelId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.fields.borrow().contains_key(field)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    /// Reads a field, recording it as a dependency of the running reaction.
    pub fn get(&self, field: &str) -> Option<Value> {
        let (id, value) = {
            let fields = self.0.fields.borrow();
            let f = fields.get(field)?;
            (f.id, f.value.clone())
        };
        graph::report_read(id);
        Some(value)
    }

    pub fn get_untracked(&self, field: &str) -> Option<Value> {
        self.0.fields.borrow().get(field).map(|f| f.value.clone())
    }

    /// Writes a field. Equal values are ignored.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        let (id, old) = {
            let fields = self.0.fields.borrow();
            let f = fields.get(field).ok_or_else(|| ModelError::UnknownField {
                model: self.0.name.clone(),
                field: field.to_string(),
            })?;
            (f.id, f.value.clone())
        };
        if old == value {
            return Ok(());
        }
        self.check_enforced(field, id)?;

        if let Some(f) = self.0.fields.borrow_mut().get_mut(field) {
            f.value = value.clone();
        }
        log::trace!("{}.{field}: {old} -> {value}", self.0.name);

        graph::batch(|| {
            graph::report_write(id);
            if self.0.listeners.borrow().is_empty() {
                return;
            }
            let first = {
                let mut pending = self.0.pending.borrow_mut();
                pending.push(Change {
                    field: field.to_string(),
                    old,
                    new: value,
                });
                pending.len() == 1
            };
            if first {
                let target: Weak<dyn Notifier> = Rc::downgrade(&self.0) as Weak<dyn Notifier>;
                graph::queue_notify(target);
            }
        });
        Ok(())
    }

    fn check_enforced(&self, field: &str, id: FieldId) -> Result<(), ModelError> {
        if graph::in_action() {
            return Ok(());
        }
        let violated = match config().enforce_actions {
            EnforceActions::Never => false,
            EnforceActions::Observed => {
                graph::is_observed(id) || !self.0.listeners.borrow().is_empty()
            }
            EnforceActions::Always => true,
        };
        if violated {
            return Err(ModelError::OutsideAction {
                model: self.0.name.clone(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    /// Subscribes to mutations. The listener runs once at the end of every
    /// batch that changed at least one field, with all changes of that batch.
    pub fn observe(&self, listener: impl Fn(&[Change]) + 'static) -> Dispose {
        let key = self.0.listeners.borrow_mut().insert(Rc::new(listener));
        let model = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(model) = model.upgrade() {
                model.listeners.borrow_mut().remove(key);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().len()
    }

    pub fn downgrade(&self) -> WeakModel {
        WeakModel(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl WeakModel {
    pub fn upgrade(&self) -> Option<Model> {
        self.0.upgrade().map(Model)
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        Value::Handle(Handle::new(model.0))
    }
}

impl From<&Model> for Value {
    fn from(model: &Model) -> Self {
        Value::from(model.clone())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.0.fields.borrow();
        let mut s = f.debug_struct(&self.0.name);
        for (name, field) in fields.iter() {
            s.field(name, &field.value);
        }
        s.finish()
    }
}
