use tandem_core::Value;
use tandem_host::{DataFn, Vm};
use tandem_model::{Model, untracked};

/// An instance's initial state, split by owner.
pub struct Classified {
    /// The produced tree, untouched. Model handles stay where they were; the
    /// host treats them as opaque values.
    pub state: Value,
    /// Every distinct model reachable from `state`, in discovery order.
    pub models: Vec<Model>,
}

/// Runs the state producer and collects the models it returned.
///
/// Lists and maps are searched recursively; a model's own fields are not.
/// The same model found twice is reported once. Without a producer the
/// instance gets `Null` state and nothing to bind.
pub fn classify(vm: &Vm, data: Option<&DataFn>) -> Classified {
    let Some(data) = data else {
        return Classified {
            state: Value::Null,
            models: Vec::new(),
        };
    };

    // reads in the producer belong to no enclosing reaction
    let state = untracked(|| data(vm));
    let mut models = Vec::new();
    collect(&state, &mut models);
    Classified { state, models }
}

fn collect(value: &Value, out: &mut Vec<Model>) {
    match value {
        Value::Handle(_) => {
            if let Some(model) = Model::detect(value)
                && !out.iter().any(|m| m.ptr_eq(&model))
            {
                out.push(model);
            }
        }
        Value::List(items) => {
            for item in items {
                collect(item, out);
            }
        }
        Value::Map(map) => {
            for item in map.values() {
                collect(item, out);
            }
        }
        _ => {}
    }
}
