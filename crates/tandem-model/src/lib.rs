//! # Observable models
//!
//! `tandem-model` is a small reactive-model system in the style of
//! observable stores:
//!
//! - [`Model`] - an `Rc`-shared object with named, individually observable
//!   fields.
//! - [`run_in_action`] - groups writes into one transaction; listeners and
//!   reactions run once when the outermost action returns.
//! - [`Model::observe`] - mutation listener returning a [`Dispose`].
//! - [`Reaction`] - tracked transaction that records which fields a function
//!   read and is invalidated when one of them changes. [`autorun`] builds on
//!   it.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tandem_model::*;
//!
//! let counter = Model::new("Counter").with_field("count", 0);
//! let seen = Rc::new(Cell::new(0));
//!
//! let stop = autorun("print", {
//!     let counter = counter.clone();
//!     let seen = seen.clone();
//!     move || seen.set(counter.get("count").and_then(|v| v.as_int()).unwrap_or(0))
//! });
//!
//! run_in_action("bump", || counter.set("count", 2)).unwrap();
//! assert_eq!(seen.get(), 2);
//! stop.run();
//! ```
//!
//! All state is thread-local. Configuration (strict actions, cycle limits)
//! is set per thread with [`configure`].

pub mod action;
pub mod config;
pub mod error;
mod graph;
pub mod model;
pub mod reaction;


pub use action::{batch, run_in_action};
pub use config::{Config, EnforceActions, config, configure};
pub use error::ModelError;
pub use graph::untracked;
pub use model::{Change, Model, ModelId, WeakModel};
pub use reaction::{Reaction, autorun};
pub use tandem_core::{Dispose, Value};
