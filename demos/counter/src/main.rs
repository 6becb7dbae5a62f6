use tandem_host::{Component, ComponentOptions, Value, Vm, flush};
use tandem_model::{Model, run_in_action};
use tandem_observer::{Push, observer, observer_with, state_model};

fn counter(store: &Model) -> ComponentOptions {
    let store = store.clone();
    ComponentOptions::new("Counter")
        .prop("count")
        .data(move |_| Value::map([("store", Value::from(&store)), ("clicks", Value::from(0))]))
        .render(|vm: &Vm| {
            let Some(store) = state_model(vm, "store") else {
                return String::new();
            };
            format!(
                "Count: {} ({} clicks, {})",
                store.get("count").unwrap_or_default(),
                vm.state("clicks"),
                store.get("status").unwrap_or_default(),
            )
        })
}

fn show(label: &str, vm: &Vm) {
    println!("{label:>6} | {}", vm.render_output().unwrap_or_default());
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = Model::new("Store")
        .with_field("count", 0)
        .with_field("status", "idle");

    let pulled: Component = observer(counter(&store));
    let pushed: Component = observer_with::<Push>(counter(&store));

    let a = pulled.mount([("count", 1)])?;
    let b = pushed.mount([("count", 1)])?;
    flush();
    show("pull", &a);
    show("push", &b);

    // a prop change is written into the store and both instances follow
    a.set_prop("count", 2)?;
    a.set_state("clicks", 1)?;
    flush();
    show("pull", &a);
    show("push", &b);

    run_in_action("reset", || -> anyhow::Result<()> {
        store.set("count", 0)?;
        store.set("status", "reset")?;
        Ok(())
    })?;
    flush();
    show("pull", &a);
    show("push", &b);

    a.destroy();
    b.destroy();
    store.set("count", 99)?;
    println!("renders after teardown: {}", flush());
    Ok(())
}
