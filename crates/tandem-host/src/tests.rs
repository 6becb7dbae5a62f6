#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::*;

    fn counter_options() -> ComponentOptions {
        ComponentOptions::new("Counter")
            .prop("count")
            .prop("label")
            .render(|vm| format!("{}: {}", vm.prop("label"), vm.prop("count")))
    }

    #[test]
    fn test_mount_renders_once() {
        let vm = Component::new(counter_options())
            .mount([("count", Value::from(1)), ("label", "clicks".into())])
            .unwrap();
        assert_eq!(vm.lifecycle(), Lifecycle::Mounted);
        assert_eq!(vm.name(), "Counter");
        assert_eq!(vm.render_count(), 1);
        assert_eq!(vm.render_output().as_deref(), Some("clicks: 1"));
        assert!(!has_pending_updates());
    }

    #[test]
    fn test_unknown_prop_is_rejected() {
        let c = Component::new(counter_options());
        let err = c.mount([("total", 1)]).err().unwrap();
        assert_eq!(
            err,
            HostError::UnknownProp {
                component: "Counter".into(),
                prop: "total".into()
            }
        );

        let vm = c.mount([("count", 1)]).unwrap();
        assert!(vm.set_prop("total", 2).is_err());
    }

    #[test]
    fn test_prop_change_rerenders_once_per_flush() {
        let vm = Component::new(counter_options())
            .mount([("count", 0)])
            .unwrap();

        vm.set_prop("count", 1).unwrap();
        vm.set_prop("count", 2).unwrap();
        vm.set_prop("label", "n").unwrap();
        assert_eq!(vm.render_count(), 1);

        assert_eq!(flush(), 1);
        assert_eq!(vm.render_count(), 2);
        assert_eq!(vm.render_output().as_deref(), Some("n: 2"));
    }

    #[test]
    fn test_set_props_is_one_change() {
        let vm = Component::new(counter_options())
            .mount([("count", Value::from(0)), ("label", "a".into())])
            .unwrap();
        let calls = Rc::new(Cell::new(0));
        let _stop = vm.watch(
            |vm| Value::List(vec![vm.prop("count"), vm.prop("label")]),
            {
                let calls = calls.clone();
                move |_| calls.set(calls.get() + 1)
            },
            WatchOptions::empty(),
        );

        vm.set_props([("count", Value::from(1)), ("label", "b".into())])
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(flush(), 1);
        assert_eq!(vm.render_output().as_deref(), Some("b: 1"));

        // nothing is applied when one name is unknown
        assert!(
            vm.set_props([("count", Value::from(2)), ("total", 3.into())])
                .is_err()
        );
        assert_eq!(vm.props()["count"], Value::from(1));
        assert_eq!(calls.get(), 1);
        assert!(!has_pending_updates());
    }

    #[test]
    fn test_unread_prop_does_not_rerender() {
        let vm = Component::new(
            ComponentOptions::new("Static")
                .prop("ignored")
                .render(|_| "static".to_string()),
        )
        .mount([("ignored", 0)])
        .unwrap();

        vm.set_prop("ignored", 1).unwrap();
        assert_eq!(flush(), 0);
        assert_eq!(vm.render_count(), 1);

        vm.force_update();
        assert_eq!(flush(), 1);
        assert_eq!(vm.render_count(), 2);
    }

    #[test]
    fn test_local_state() {
        let vm = Component::new(
            ComponentOptions::new("Toggle")
                .data(|_| Value::map([("on", false)]))
                .render(|vm| format!("on={}", vm.state("on"))),
        )
        .mount(Vec::<(String, Value)>::new())
        .unwrap();
        assert_eq!(vm.render_output().as_deref(), Some("on=false"));

        vm.set_state("on", true).unwrap();
        flush();
        assert_eq!(vm.render_output().as_deref(), Some("on=true"));
        assert_eq!(vm.state_tree(), Value::map([("on", true)]));
    }

    #[test]
    fn test_watch_immediate_and_changes() {
        let vm = Component::new(counter_options())
            .mount([("count", 3)])
            .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let stop = vm.watch_prop(
            "count",
            {
                let seen = seen.clone();
                move |v| seen.borrow_mut().push(v.as_int().unwrap_or(-1))
            },
            WatchOptions::IMMEDIATE,
        );
        assert_eq!(*seen.borrow(), vec![3]);

        vm.set_prop("label", "x").unwrap();
        vm.set_prop("count", 4).unwrap();
        assert_eq!(*seen.borrow(), vec![3, 4]);
        assert_eq!(vm.watcher_count(), 1);

        stop.run();
        vm.set_prop("count", 5).unwrap();
        assert_eq!(*seen.borrow(), vec![3, 4]);
        assert_eq!(vm.watcher_count(), 0);
    }

    #[test]
    fn test_watch_computed_value() {
        let vm = Component::new(counter_options())
            .mount([("count", 1)])
            .unwrap();
        let parity = Rc::new(Cell::new(0));
        let _stop = vm.watch(
            |vm| Value::from(vm.prop("count").as_int().unwrap_or(0) % 2 == 0),
            {
                let parity = parity.clone();
                move |_| parity.set(parity.get() + 1)
            },
            WatchOptions::empty(),
        );

        vm.set_prop("count", 3).unwrap();
        assert_eq!(parity.get(), 0);
        vm.set_prop("count", 4).unwrap();
        assert_eq!(parity.get(), 1);
    }

    #[test]
    fn test_extend_resolution() {
        let base = Component::new(
            ComponentOptions::new("Base")
                .prop("a")
                .render(|vm| format!("base {}", vm.prop("a"))),
        );
        let child = base.extend(ComponentOptions::default().prop("b"));
        assert_eq!(child.name().as_deref(), Some("Base"));
        assert_eq!(child.props(), vec!["a".to_string(), "b".to_string()]);
        assert!(child.parent().unwrap().ptr_eq(&base));

        let vm = child.mount([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(vm.render_output().as_deref(), Some("base 1"));

        let tagged = Component::new(ComponentOptions {
            tag: Some("x-tagged".into()),
            ..Default::default()
        });
        assert_eq!(tagged.name().as_deref(), Some("x-tagged"));
        let anonymous = Component::new(ComponentOptions::default());
        let vm = anonymous.mount(Vec::<(String, Value)>::new()).unwrap();
        assert_eq!(vm.name(), ANONYMOUS);
        assert_eq!(vm.render_output().as_deref(), Some(""));
    }

    #[test]
    fn test_mixins_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let push = |tag: &'static str| {
            let log = log.clone();
            move |_: &Vm| log.borrow_mut().push(tag)
        };

        let base = Component::new(
            ComponentOptions::new("Base")
                .mixin(Mixin::created(push("base created")))
                .mixin(Mixin::destroyed(push("base destroyed"))),
        );
        let child = base.extend(
            ComponentOptions::new("Child")
                .mixin(Mixin::created(push("child created")))
                .mixin(Mixin::destroyed(push("child destroyed"))),
        );

        let vm = child.mount(Vec::<(String, Value)>::new()).unwrap();
        vm.destroy();
        vm.destroy();
        assert_eq!(
            *log.borrow(),
            vec![
                "base created",
                "child created",
                "base destroyed",
                "child destroyed"
            ]
        );
    }

    #[test]
    fn test_destroyed_instance_ignores_updates() {
        let vm = Component::new(counter_options())
            .mount([("count", 1)])
            .unwrap();
        vm.set_prop("count", 2).unwrap();
        vm.destroy();

        assert_eq!(flush(), 0);
        assert_eq!(vm.render_count(), 1);
        assert_eq!(
            vm.set_prop("count", 3),
            Err(HostError::Destroyed {
                component: "Counter".into()
            })
        );
        vm.force_update();
        assert!(!has_pending_updates());
    }

    struct Counting {
        wraps: Rc<Cell<usize>>,
        calls: Rc<Cell<usize>>,
    }

    impl RenderHook for Counting {
        fn wrap(&self, _vm: &Vm, native: RenderTrigger) -> RenderTrigger {
            self.wraps.set(self.wraps.get() + 1);
            let calls = self.calls.clone();
            Rc::new(move |vm: &Vm| {
                calls.set(calls.get() + 1);
                native(vm)
            })
        }
    }

    #[test]
    fn test_render_hook_wraps_trigger() {
        let wraps = Rc::new(Cell::new(0));
        let calls = Rc::new(Cell::new(0));
        let c = Component::new(counter_options().render_hook(Counting {
            wraps: wraps.clone(),
            calls: calls.clone(),
        }));

        let vm = c.mount([("count", 1)]).unwrap();
        assert_eq!((wraps.get(), calls.get()), (1, 1));

        vm.set_prop("count", 2).unwrap();
        flush();
        assert_eq!((wraps.get(), calls.get()), (1, 2));
        assert_eq!(vm.render_count(), 2);
    }

    #[test]
    fn test_ext_dropped_on_destroy() {
        struct Tracker(Rc<Cell<bool>>);
        impl Drop for Tracker {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let vm = Component::new(counter_options())
            .mount([("count", 1)])
            .unwrap();
        vm.insert_ext(Rc::new(Tracker(dropped.clone())));
        assert!(vm.ext::<Tracker>().is_some());
        assert!(vm.ext::<String>().is_none());

        vm.destroy();
        assert!(dropped.get());
        assert!(vm.ext::<Tracker>().is_none());
    }

    #[test]
    fn test_update_loop_is_cut() {
        configure(HostConfig {
            max_update_iterations: 3,
        });
        let vm = Component::new(ComponentOptions::new("Looping").render(|vm| {
            vm.force_update();
            String::new()
        }))
        .mount(Vec::<(String, Value)>::new())
        .unwrap();

        // mount queued one update; every render queues another
        assert_eq!(flush(), 3);
        assert_eq!(vm.render_count(), 4);
        configure(HostConfig::default());
    }
}
