//! Facade crate: re-exports the `qview-core` prelude as the public API.

pub use qview_core::prelude::*;
pub use qview_core::{container, error};
