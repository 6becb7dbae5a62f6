//! # Components
//!
//! `tandem-host` is a small retained component framework. A component is
//! declared with [`ComponentOptions`] (or extended into a [`Component`]
//! "class") and mounted into a [`Vm`] instance:
//!
//! ```rust
//! use tandem_host::*;
//!
//! let greeting = Component::new(
//!     ComponentOptions::new("Greeting")
//!         .prop("who")
//!         .render(|vm| format!("hello {}", vm.prop("who"))),
//! );
//!
//! let vm = greeting.mount([("who", "world")]).unwrap();
//! assert_eq!(vm.render_output().as_deref(), Some("hello world"));
//!
//! vm.set_prop("who", "there").unwrap();
//! flush();
//! assert_eq!(vm.render_output().as_deref(), Some("hello there"));
//! ```
//!
//! ## Updates
//!
//! Renders record which props and state keys they read. Changing one of
//! those queues the instance; [`flush`] re-renders everything queued, once
//! per instance. [`Vm::force_update`] queues unconditionally.
//!
//! ## Extension points
//!
//! - `data` produces the initial state tree.
//! - [`Mixin`]s add `created`/`destroyed` hooks.
//! - [`Vm::watch`] / [`Vm::watch_prop`] observe computed values, optionally
//!   firing immediately ([`WatchOptions::IMMEDIATE`]).
//! - [`RenderHook`] wraps the render-trigger slot at mount time.
//! - [`Vm::insert_ext`] attaches per-instance state for libraries.

pub mod component;
pub mod config;
pub mod error;
pub mod instance;
pub mod scheduler;
pub mod watch;

mod tests;

pub use component::{
    ANONYMOUS, Component, ComponentDef, ComponentOptions, DataFn, Hook, Mixin, RenderFn,
    RenderHook, RenderTrigger,
};
pub use config::{HostConfig, configure, host_config};
pub use error::HostError;
pub use instance::{Lifecycle, Vm, WeakVm};
pub use scheduler::{flush, has_pending_updates, queue_update};
pub use tandem_core::{Dispose, Value};
pub use watch::WatchOptions;
