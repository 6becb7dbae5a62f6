//! Primitives shared by the tandem host framework, the model system and the
//! bridge between them.
//!
//! - [`Value`] is the dynamic data type used for props, component state and
//!   model fields. Foreign objects travel inside it as a [`Handle`], which is
//!   compared and cloned by identity.
//! - [`Dispose`] is the zero-argument release handle returned by every
//!   subscribe/watch API in the workspace.

pub mod dispose;
pub mod value;


pub use dispose::Dispose;
pub use value::{Handle, Value};
