use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};
use tandem_core::{Dispose, Value};

use crate::component::{ANONYMOUS, Component, RenderTrigger};
use crate::error::HostError;
use crate::scheduler;
use crate::watch::WatchOptions;

thread_local! {
    static NEXT_VM: Cell<u64> = const { Cell::new(1) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Mounted,
    Destroyed,
}

// What the last render read; only these re-render on change.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Dep {
    Prop(String),
    State(String),
}

new_key_type! {
    struct WatcherKey;
}

type Getter = Rc<dyn Fn(&Vm) -> Value>;

struct Watcher {
    getter: Getter,
    callback: Rc<dyn Fn(&Value)>,
    last: Value,
}

struct VmInner {
    id: u64,
    name: String,
    component: Component,
    props: RefCell<BTreeMap<String, Value>>,
    state: RefCell<Value>,
    watchers: RefCell<SlotMap<WatcherKey, Watcher>>,
    deps: RefCell<HashSet<Dep>>,
    recording: Cell<bool>,
    trigger: RefCell<Option<RenderTrigger>>,
    output: RefCell<Option<String>>,
    renders: Cell<usize>,
    lifecycle: Cell<Lifecycle>,
    ext: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

/// A live component instance.
///
/// `Vm` is a cheap `Rc` handle. Closures stored on the instance itself
/// (watchers, hooks, the render trigger) should hold a [`WeakVm`] instead.
#[derive(Clone)]
pub struct Vm(Rc<VmInner>);

#[derive(Clone)]
pub struct WeakVm {
    id: u64,
    inner: Weak<VmInner>,
}

impl WeakVm {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn upgrade(&self) -> Option<Vm> {
        self.inner.upgrade().map(Vm)
    }
}

pub(crate) fn mount(component: &Component, given: Vec<(String, Value)>) -> Result<Vm, HostError> {
    let name = component.name().unwrap_or_else(|| ANONYMOUS.to_string());
    let declared = component.props();

    let mut props: BTreeMap<String, Value> = declared
        .iter()
        .map(|p| (p.clone(), Value::Null))
        .collect();
    for (prop, value) in given {
        if !declared.contains(&prop) {
            return Err(HostError::UnknownProp {
                component: name,
                prop,
            });
        }
        props.insert(prop, value);
    }

    let id = NEXT_VM.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    });
    let vm = Vm(Rc::new(VmInner {
        id,
        name,
        component: component.clone(),
        props: RefCell::new(props),
        state: RefCell::new(Value::Null),
        watchers: RefCell::new(SlotMap::with_key()),
        deps: RefCell::new(HashSet::new()),
        recording: Cell::new(false),
        trigger: RefCell::new(None),
        output: RefCell::new(None),
        renders: Cell::new(0),
        lifecycle: Cell::new(Lifecycle::Created),
        ext: RefCell::new(HashMap::new()),
    }));
    log::debug!("mounting {}#{}", vm.name(), vm.id());

    if let Some(data) = component.data() {
        let state = data(&vm);
        *vm.0.state.borrow_mut() = state;
    }
    for mixin in component.mixins() {
        if let Some(created) = &mixin.created {
            created(&vm);
        }
    }

    let native: RenderTrigger = Rc::new(native_render);
    let trigger = match component.render_hook() {
        Some(hook) => hook.wrap(&vm, native),
        None => native,
    };
    *vm.0.trigger.borrow_mut() = Some(trigger);

    vm.0.lifecycle.set(Lifecycle::Mounted);
    vm.run_trigger();
    Ok(vm)
}

/// The host's own render entry point: runs the component's render function
/// and records which props and state keys it read.
fn native_render(vm: &Vm) {
    let render = vm.0.component.render();
    vm.0.deps.borrow_mut().clear();
    let prev = vm.0.recording.replace(true);
    let out = render.map(|r| r(vm)).unwrap_or_default();
    vm.0.recording.set(prev);

    *vm.0.output.borrow_mut() = Some(out);
    vm.0.renders.set(vm.0.renders.get() + 1);
    log::trace!("rendered {}#{} ({})", vm.name(), vm.id(), vm.0.renders.get());
}

impl Vm {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn component(&self) -> &Component {
        &self.0.component
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.0.lifecycle.get()
    }

    pub fn downgrade(&self) -> WeakVm {
        WeakVm {
            id: self.0.id,
            inner: Rc::downgrade(&self.0),
        }
    }

    fn record(&self, dep: Dep) {
        if self.0.recording.get() {
            self.0.deps.borrow_mut().insert(dep);
        }
    }

    fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = self.0.recording.replace(false);
        let out = f();
        self.0.recording.set(prev);
        out
    }

    fn ensure_alive(&self) -> Result<(), HostError> {
        if self.lifecycle() == Lifecycle::Destroyed {
            return Err(HostError::Destroyed {
                component: self.0.name.clone(),
            });
        }
        Ok(())
    }

    /// Current value of a declared prop; `Null` for unknown names.
    pub fn prop(&self, name: &str) -> Value {
        self.record(Dep::Prop(name.to_string()));
        self.0.props.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn props(&self) -> BTreeMap<String, Value> {
        self.0.props.borrow().clone()
    }

    /// Updates a prop. Watchers run before any re-render is queued.
    pub fn set_prop(&self, name: &str, value: impl Into<Value>) -> Result<(), HostError> {
        self.set_props([(name, value)])
    }

    /// Updates several props as one change: every value is applied first,
    /// then watchers run once and at most one re-render is queued. Nothing is
    /// applied if any name is not a declared prop.
    pub fn set_props<K, V>(&self, props: impl IntoIterator<Item = (K, V)>) -> Result<(), HostError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.ensure_alive()?;
        let props: Vec<(String, Value)> = props
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_string(), value.into()))
            .collect();

        let mut changed = Vec::new();
        {
            let mut current = self.0.props.borrow_mut();
            if let Some((name, _)) = props.iter().find(|(name, _)| !current.contains_key(name)) {
                return Err(HostError::UnknownProp {
                    component: self.0.name.clone(),
                    prop: name.clone(),
                });
            }
            for (name, value) in props {
                let Some(slot) = current.get_mut(&name) else {
                    continue;
                };
                if *slot != value {
                    *slot = value;
                    changed.push(name);
                }
            }
        }
        if changed.is_empty() {
            return Ok(());
        }
        log::trace!("{}#{}: props {changed:?} changed", self.name(), self.id());

        self.run_watchers();
        let rendered = {
            let deps = self.0.deps.borrow();
            changed
                .into_iter()
                .any(|name| deps.contains(&Dep::Prop(name)))
        };
        if rendered {
            self.force_update();
        }
        Ok(())
    }

    /// One key of the local state tree.
    pub fn state(&self, key: &str) -> Value {
        self.record(Dep::State(key.to_string()));
        self.0.state.borrow().get(key).cloned().unwrap_or_default()
    }

    /// The whole local state tree, untracked.
    pub fn state_tree(&self) -> Value {
        self.0.state.borrow().clone()
    }

    pub fn set_state(&self, key: &str, value: impl Into<Value>) -> Result<(), HostError> {
        self.ensure_alive()?;
        let value = value.into();
        {
            let mut state = self.0.state.borrow_mut();
            if !matches!(*state, Value::Map(_)) {
                *state = Value::Map(BTreeMap::new());
            }
            if let Value::Map(map) = &mut *state {
                if map.get(key) == Some(&value) {
                    return Ok(());
                }
                map.insert(key.to_string(), value);
            }
        }

        self.run_watchers();
        if self.0.deps.borrow().contains(&Dep::State(key.to_string())) {
            self.force_update();
        }
        Ok(())
    }

    /// Watches a value computed from the instance. The callback runs whenever
    /// a prop or state change makes `getter` return something different.
    pub fn watch(
        &self,
        getter: impl Fn(&Vm) -> Value + 'static,
        callback: impl Fn(&Value) + 'static,
        options: WatchOptions,
    ) -> Dispose {
        let getter: Getter = Rc::new(getter);
        let callback: Rc<dyn Fn(&Value)> = Rc::new(callback);
        let initial = self.untracked(|| getter(self));

        let key = self.0.watchers.borrow_mut().insert(Watcher {
            getter,
            callback: callback.clone(),
            last: initial.clone(),
        });
        if options.contains(WatchOptions::IMMEDIATE) {
            callback(&initial);
        }

        let vm = self.downgrade();
        Dispose::new(move || {
            if let Some(vm) = vm.upgrade() {
                let removed = vm.0.watchers.borrow_mut().remove(key);
                drop(removed);
            }
        })
    }

    pub fn watch_prop(
        &self,
        name: &str,
        callback: impl Fn(&Value) + 'static,
        options: WatchOptions,
    ) -> Dispose {
        let name = name.to_string();
        self.watch(move |vm| vm.prop(&name), callback, options)
    }

    pub fn watcher_count(&self) -> usize {
        self.0.watchers.borrow().len()
    }

    fn run_watchers(&self) {
        let getters: Vec<(WatcherKey, Getter)> = self
            .0
            .watchers
            .borrow()
            .iter()
            .map(|(k, w)| (k, w.getter.clone()))
            .collect();

        for (key, getter) in getters {
            let value = self.untracked(|| getter(self));
            let callback = {
                let mut watchers = self.0.watchers.borrow_mut();
                let Some(w) = watchers.get_mut(key) else {
                    continue;
                };
                if w.last == value {
                    continue;
                }
                w.last = value.clone();
                w.callback.clone()
            };
            callback(&value);
        }
    }

    /// Queues a re-render for the next [`flush`](crate::flush).
    pub fn force_update(&self) {
        scheduler::queue_update(self);
    }

    pub(crate) fn run_trigger(&self) {
        if self.lifecycle() == Lifecycle::Destroyed {
            return;
        }
        let trigger = self.0.trigger.borrow().clone();
        if let Some(trigger) = trigger {
            trigger(self);
        }
    }

    pub fn render_output(&self) -> Option<String> {
        self.0.output.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.0.renders.get()
    }

    /// Attaches per-instance extension state, one value per type.
    pub fn insert_ext<T: Any>(&self, value: Rc<T>) {
        let old = self.0.ext.borrow_mut().insert(TypeId::of::<T>(), value);
        drop(old);
    }

    pub fn ext<T: Any>(&self) -> Option<Rc<T>> {
        let ext = self.0.ext.borrow().get(&TypeId::of::<T>()).cloned()?;
        ext.downcast::<T>().ok()
    }

    /// Tears the instance down: runs `destroyed` hooks, then releases the
    /// render trigger, watchers and extension state. Runs once; the release
    /// also happens if a hook panics.
    pub fn destroy(&self) {
        if self.0.lifecycle.replace(Lifecycle::Destroyed) == Lifecycle::Destroyed {
            return;
        }
        log::debug!("destroying {}#{}", self.name(), self.id());

        struct Teardown<'a>(&'a VmInner);
        impl Drop for Teardown<'_> {
            fn drop(&mut self) {
                let trigger = self.0.trigger.borrow_mut().take();
                drop(trigger);
                let watchers = std::mem::take(&mut *self.0.watchers.borrow_mut());
                drop(watchers);
                let ext = std::mem::take(&mut *self.0.ext.borrow_mut());
                drop(ext);
            }
        }

        let _teardown = Teardown(&self.0);
        for mixin in self.0.component.mixins() {
            if let Some(destroyed) = &mixin.destroyed {
                destroyed(self);
            }
        }
    }
}
