//! # Observer components
//!
//! `tandem-observer` lets a `tandem-host` component be driven by
//! `tandem-model` models. Wrap a component definition with [`observer`] and
//! put models in its state:
//!
//! ```rust
//! use tandem_host::*;
//! use tandem_model::Model;
//! use tandem_observer::{observer, state_model};
//!
//! let store = Model::new("Store").with_field("count", 0);
//!
//! let counter = observer(
//!     ComponentOptions::new("Counter")
//!         .prop("count")
//!         .data({
//!             let store = store.clone();
//!             move |_| Value::map([("store", Value::from(&store))])
//!         })
//!         .render(|vm| {
//!             let store = state_model(vm, "store").unwrap();
//!             format!("count = {}", store.get("count").unwrap_or_default())
//!         }),
//! );
//!
//! // the prop is written into the model before the first render
//! let vm = counter.mount([("count", 3)]).unwrap();
//! assert_eq!(vm.render_output().as_deref(), Some("count = 3"));
//!
//! vm.set_prop("count", 5).unwrap();
//! flush();
//! assert_eq!(store.get_untracked("count"), Some(5.into()));
//! assert_eq!(vm.render_output().as_deref(), Some("count = 5"));
//! ```
//!
//! ## What happens per instance
//!
//! 1. The state producer runs and its result is classified: models anywhere
//!    in the tree are collected by identity, everything else stays with the
//!    host ([`classify`]).
//! 2. Every prop whose name is a field of a collected model gets an
//!    immediate watcher that writes the prop into the field inside an action
//!    ([`Binding`]).
//! 3. A [`Strategy`] makes model changes re-render the instance:
//!    [`Pull`] (the default) tracks the fields each render reads,
//!    [`Push`] subscribes to whole models and forces updates.
//! 4. Every handle created above sits in the instance's [`Cleanup`] and is
//!    released when the instance is destroyed.

pub mod binding;
pub mod classify;
pub mod cleanup;
pub mod observer;
pub mod pull;
pub mod push;
pub mod strategy;


pub use binding::Binding;
pub use classify::{Classified, classify};
pub use cleanup::Cleanup;
pub use observer::{InstanceBridge, bridge_of, observer, observer as Observer, observer_with, state_model};
pub use pull::{Phase, Pull};
pub use push::Push;
pub use strategy::Strategy;
