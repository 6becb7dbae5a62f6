use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tandem_core::Value;
use tandem_host::{Vm, WatchOptions};
use tandem_model::{Model, WeakModel, run_in_action};

use crate::observer::InstanceBridge;
use crate::strategy::Strategy;

/// One prop → model field channel of an instance.
#[derive(Clone)]
pub struct Binding {
    model: WeakModel,
    model_name: String,
    field: String,
}

impl Binding {
    pub fn model(&self) -> Option<Model> {
        self.model.upgrade()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Binds every declared prop to the same-named field of every model that has
/// one. Props matching no field are skipped silently.
///
/// The instance gets a single immediate watcher over all bound props, so the
/// models see the mount-time values before the first render. Whatever props
/// changed together (one `set_prop` or `set_props` call) are written to their
/// models inside one strategy write and one action.
pub(crate) fn bind<S: Strategy>(
    vm: &Vm,
    models: &[Model],
    props: &[String],
    bridge: &Rc<InstanceBridge<S>>,
) -> Vec<Binding> {
    let mut bindings = Vec::new();
    let mut targets: BTreeMap<String, Vec<WeakModel>> = BTreeMap::new();

    for prop in props {
        for model in models.iter().filter(|m| m.has_field(prop)) {
            log::debug!("{}: binding prop `{prop}` to {}.{prop}", bridge.name(), model.name());
            bindings.push(Binding {
                model: model.downgrade(),
                model_name: model.name().to_string(),
                field: prop.clone(),
            });
            targets.entry(prop.clone()).or_default().push(model.downgrade());
        }
    }
    if targets.is_empty() {
        return bindings;
    }

    let bound: Vec<String> = targets.keys().cloned().collect();
    // values last written per prop; empty until the immediate run
    let written: RefCell<BTreeMap<String, Value>> = RefCell::new(BTreeMap::new());
    let weak: Weak<InstanceBridge<S>> = Rc::downgrade(bridge);
    let dispose = vm.watch(
        move |vm| Value::map(bound.iter().map(|p| (p.clone(), vm.prop(p)))),
        move |values| {
            let Some(bridge) = weak.upgrade() else {
                return;
            };
            let Value::Map(values) = values else {
                return;
            };
            let changed: Vec<(&String, &Value)> = {
                let mut written = written.borrow_mut();
                values
                    .iter()
                    .filter(|(prop, value)| {
                        if written.get(*prop) == Some(*value) {
                            return false;
                        }
                        written.insert((*prop).clone(), (*value).clone());
                        true
                    })
                    .collect()
            };
            if changed.is_empty() {
                return;
            }
            bridge
                .strategy()
                .write(|| write_through(bridge.name(), &targets, &changed));
        },
        WatchOptions::IMMEDIATE,
    );
    bridge.cleanup().push(dispose);
    bindings
}

fn write_through(
    component: &str,
    targets: &BTreeMap<String, Vec<WeakModel>>,
    changed: &[(&String, &Value)],
) {
    let fields: Vec<&str> = changed.iter().map(|(prop, _)| prop.as_str()).collect();
    run_in_action(&format!("{component}.{}", fields.join("+")), || {
        for (field, value) in changed {
            for target in targets.get(*field).into_iter().flatten() {
                let Some(model) = target.upgrade() else {
                    log::debug!("{component}: model for `{field}` is gone; skipping write");
                    continue;
                };
                if let Err(err) = model.set(field, (*value).clone()) {
                    log::warn!("{component}: could not write prop `{field}`: {err}");
                }
            }
        }
    });
}
