use std::cell::RefCell;
use std::rc::Rc;

use tandem_core::Value;
use tandem_host::{
    ANONYMOUS, Component, ComponentDef, ComponentOptions, DataFn, Mixin, RenderHook,
    RenderTrigger, Vm,
};
use tandem_model::Model;

use crate::binding::{Binding, bind};
use crate::classify::{Classified, classify};
use crate::cleanup::Cleanup;
use crate::pull::Pull;
use crate::strategy::Strategy;

/// Bridge state of one mounted instance, stored as instance extension state.
pub struct InstanceBridge<S: Strategy> {
    name: String,
    strategy: S,
    cleanup: Cleanup,
    bindings: RefCell<Vec<Binding>>,
}

impl<S: Strategy> InstanceBridge<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn cleanup(&self) -> &Cleanup {
        &self.cleanup
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.bindings.borrow().clone()
    }
}

/// The bridge state of `vm`, if it was mounted from a component bridged with
/// strategy `S`.
pub fn bridge_of<S: Strategy>(vm: &Vm) -> Option<Rc<InstanceBridge<S>>> {
    vm.ext::<InstanceBridge<S>>()
}

/// Looks up a model stored under `key` in the instance's state.
pub fn state_model(vm: &Vm, key: &str) -> Option<Model> {
    Model::detect(&vm.state(key))
}

/// Bridges a component with the [`Pull`] strategy.
pub fn observer(def: impl Into<ComponentDef>) -> Component {
    observer_with::<Pull>(def)
}

/// Returns a component equivalent to `def` whose instances are driven by the
/// models found in their state.
///
/// - props whose names match a model field are written into that field,
///   immediately at mount and on every change;
/// - `S` decides how model changes re-render the instance;
/// - every subscription is released when the instance is destroyed.
///
/// The result keeps `def`'s name (falling back to its tag, then
/// [`ANONYMOUS`]). A class keeps its lifecycle and is extended; its state
/// producer moves into the bridge so it runs once per instance.
///
/// Bridging an already bridged component with the same strategy adds no
/// second set of watchers or reactions: the inner bridge keeps owning each
/// instance. Mixing strategies this way gives an instance one bridge per
/// strategy.
pub fn observer_with<S: Strategy>(def: impl Into<ComponentDef>) -> Component {
    let def = def.into();
    let name = def.name().unwrap_or_else(|| ANONYMOUS.to_string());

    let (base, mut options, data, props, existing_hook) = match def {
        ComponentDef::Options(mut options) => {
            let data = options.data.take();
            let hook = options.render_hook.take();
            let props = options.props.clone();
            (None, options, data, props, hook)
        }
        ComponentDef::Class(class) => {
            let data = class.data();
            let hook = class.render_hook();
            let props = class.props();
            (Some(class), ComponentOptions::default(), data, props, hook)
        }
    };
    log::debug!("bridging `{name}` with the {} strategy", S::NAME);

    options.name = Some(name.clone());
    options.data = Some(Rc::new(move |vm: &Vm| {
        init_instance::<S>(vm, &name, data.as_ref(), &props)
    }));
    options.mixins.push(Mixin::destroyed(teardown::<S>));
    options.render_hook = match (S::render_hook(), existing_hook) {
        (Some(outer), Some(inner)) => Some(Rc::new(Chain { inner, outer }) as Rc<dyn RenderHook>),
        (Some(hook), None) | (None, Some(hook)) => Some(hook),
        (None, None) => None,
    };

    match base {
        Some(class) => class.extend(options),
        None => Component::new(options),
    }
}

fn init_instance<S: Strategy>(
    vm: &Vm,
    name: &str,
    data: Option<&DataFn>,
    props: &[String],
) -> Value {
    let Classified { state, models } = classify(vm, data);
    if vm.ext::<InstanceBridge<S>>().is_some() {
        // `data` was an inner bridge's producer; it owns this instance
        log::trace!("{name}#{}: already bridged", vm.id());
        return state;
    }

    let bridge = Rc::new(InstanceBridge {
        name: name.to_string(),
        strategy: S::new(vm, name),
        cleanup: Cleanup::new(),
        bindings: RefCell::new(Vec::new()),
    });
    vm.insert_ext(bridge.clone());

    if models.is_empty() {
        log::trace!("{name}#{}: no models in state", vm.id());
    }
    let bindings = bind(vm, &models, props, &bridge);
    bridge.strategy.attach(vm, &models, &bridge.cleanup);
    *bridge.bindings.borrow_mut() = bindings;

    state
}

fn teardown<S: Strategy>(vm: &Vm) {
    let Some(bridge) = vm.ext::<InstanceBridge<S>>() else {
        return;
    };
    log::debug!(
        "{}#{}: releasing {} handle(s)",
        bridge.name,
        vm.id(),
        bridge.cleanup.len()
    );
    bridge.cleanup.run();
    bridge.strategy.detach();
}

/// Applies the bridge's hook on top of one the component already had.
struct Chain {
    inner: Rc<dyn RenderHook>,
    outer: Rc<dyn RenderHook>,
}

impl RenderHook for Chain {
    fn wrap(&self, vm: &Vm, native: RenderTrigger) -> RenderTrigger {
        let inner = self.inner.wrap(vm, native);
        self.outer.wrap(vm, inner)
    }
}
