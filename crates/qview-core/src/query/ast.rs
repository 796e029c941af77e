//! Query expression tree: construction, typing, and introspection (C2).

use crate::{
    error::{QviewError, Result},
    value::Value,
};

///
/// QueryKind
///
/// The effective kind of a query tree, used by the apply engine (§4.2) to
/// dispatch traversal. `Misc` only arises from combining two leaves (or
/// subtrees) of different non-`DataElement` kinds.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryKind {
    LinkName,
    AttrName,
    AttrValue,
    DataElement,
    Misc,
}

///
/// MatchOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchOp {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl MatchOp {
    const fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }
}

///
/// CombineOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CombineOp {
    And,
    Or,
}

///
/// Operand
///
/// A leaf's literal: a name for `LinkName`/`AttrName` leaves, or a typed
/// scalar for `AttrValue`/`DataElement` leaves.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Name(String),
    Scalar(Value),
}

///
/// Leaf
///

#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    pub kind: QueryKind,
    pub op: MatchOp,
    pub operand: Operand,
}

///
/// Query
///
/// Immutable tree: a leaf predicate, or a binary `And`/`Or` combination of
/// two owned subtrees. `combine_op = Singleton` from §3 has no explicit
/// representation here — a bare `Query::Leaf` already means "no combinator".
///

#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    Leaf(Leaf),
    Combine {
        op: CombineOp,
        left: Box<Self>,
        right: Box<Self>,
    },
}

impl Query {
    /// Construct and validate a leaf query (§4.1 leaf constructor).
    ///
    /// # Errors
    /// Returns [`QviewError::InvalidQuery`] if `kind`, `op`, and the
    /// operand's type are not a legal triple.
    pub fn make_leaf(kind: QueryKind, op: MatchOp, operand: Operand) -> Result<Self> {
        match kind {
            QueryKind::LinkName | QueryKind::AttrName => {
                let Operand::Name(name) = &operand else {
                    return Err(QviewError::InvalidQuery(format!(
                        "{kind:?} leaves require a string operand"
                    )));
                };
                if name.is_empty() {
                    return Err(QviewError::InvalidQuery(
                        "name-kind leaves require a non-empty string".to_string(),
                    ));
                }
                if !op.is_equality() {
                    return Err(QviewError::InvalidQuery(format!(
                        "{kind:?} leaves only support Equal/NotEqual, got {op:?}"
                    )));
                }
            }
            QueryKind::AttrValue | QueryKind::DataElement => {
                let Operand::Scalar(value) = &operand else {
                    return Err(QviewError::InvalidQuery(format!(
                        "{kind:?} leaves require a typed scalar operand"
                    )));
                };
                if !value.is_numeric() && !op.is_equality() {
                    return Err(QviewError::InvalidQuery(
                        "string operands only support Equal/NotEqual".to_string(),
                    ));
                }
            }
            QueryKind::Misc => {
                return Err(QviewError::InvalidQuery(
                    "Misc is not a constructible leaf kind".to_string(),
                ));
            }
        }

        Ok(Self::Leaf(Leaf { kind, op, operand }))
    }

    /// Combine two owned subtrees under `And`/`Or` (§4.1 combinator).
    #[must_use]
    pub fn combine(op: CombineOp, left: Self, right: Self) -> Self {
        Self::Combine {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The effective kind the apply engine dispatches on (§4.2).
    ///
    /// A combination of two subtrees of the same kind keeps that kind.
    /// A combination where either side is `DataElement` collapses to
    /// `DataElement`, since element predicates must share one element
    /// stream rather than being evaluated by independent sub-applies.
    /// Any other mixed combination is `Misc`.
    #[must_use]
    pub fn get_kind(&self) -> QueryKind {
        match self {
            Self::Leaf(leaf) => leaf.kind,
            Self::Combine { left, right, .. } => {
                let (lk, rk) = (left.get_kind(), right.get_kind());
                if lk == rk {
                    lk
                } else if lk == QueryKind::DataElement || rk == QueryKind::DataElement {
                    QueryKind::DataElement
                } else {
                    QueryKind::Misc
                }
            }
        }
    }

    /// The node's own combinator, if any.
    #[must_use]
    pub const fn get_combine_op(&self) -> Option<CombineOp> {
        match self {
            Self::Leaf(_) => None,
            Self::Combine { op, .. } => Some(*op),
        }
    }

    /// Borrowed handles to the two children of a combinator node.
    ///
    /// # Errors
    /// Returns [`QviewError::BadHandle`] when called on a leaf.
    pub fn get_components(&self) -> Result<(&Self, &Self)> {
        match self {
            Self::Leaf(_) => Err(QviewError::BadHandle(
                "get_components called on a leaf query".to_string(),
            )),
            Self::Combine { left, right, .. } => Ok((left, right)),
        }
    }

    #[must_use]
    pub const fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Combine { .. } => None,
        }
    }
}
