//! Query expression model (C2) and atom evaluator (C1).

pub mod ast;
pub mod atom;
pub mod codec;

pub use ast::{CombineOp, Leaf, MatchOp, Operand, Query, QueryKind};
pub use atom::apply_atom;
pub use codec::{decode, encode};
