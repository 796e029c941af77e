//! Core engine for qview: query construction, the apply traversal, view
//! accumulation, and materialization into a container-backed group.
#![warn(unreachable_pub)]

pub mod apply;
pub mod container;
pub mod error;
pub mod materialize;
pub mod query;
pub mod reference;
pub mod value;
pub mod view;

///
/// Prelude
///
/// Domain vocabulary only: no error types, no container backend.
///
pub mod prelude {
    pub use crate::{
        apply::{apply, apply_multi},
        materialize::materialize,
        query::{CombineOp, MatchOp, Operand, Query, QueryKind},
        reference::{Reference, RegionSelection},
        value::Value,
        view::{ResultMask, View},
    };
}
