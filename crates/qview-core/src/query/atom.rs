//! Atom evaluator (C1): compare one typed scalar/name against a query leaf.

use super::ast::{CombineOp, Leaf, MatchOp, Operand, Query};
use crate::value::{self, Value};

/// Evaluate one leaf's comparison against a supplied value (§4.1
/// `apply_atom`). Name-kind leaves expect `actual` to be `Value::Text`;
/// value-kind leaves compare under the numeric widening / `NaN` rules of
/// [`crate::value`].
#[must_use]
pub fn apply_atom(leaf: &Leaf, actual: &Value) -> bool {
    let Value::Text(actual_name) = actual else {
        return apply_atom_value(leaf, actual);
    };
    if let Operand::Name(expected) = &leaf.operand {
        return apply_atom_name_str(leaf.op, expected, actual_name);
    }
    apply_atom_value(leaf, actual)
}

/// Evaluate a name-kind leaf (`LinkName`/`AttrName`) against a supplied
/// name string, ignoring `actual`'s would-be type (§4.1: "Name-kind
/// leaves ignore `operand_type`").
#[must_use]
pub fn apply_atom_name(leaf: &Leaf, actual_name: &str) -> bool {
    let Operand::Name(expected) = &leaf.operand else {
        return false;
    };
    apply_atom_name_str(leaf.op, expected, actual_name)
}

fn apply_atom_name_str(op: MatchOp, expected: &str, actual: &str) -> bool {
    match op {
        MatchOp::Equal => expected == actual,
        MatchOp::NotEqual => expected != actual,
        MatchOp::Less | MatchOp::Greater | MatchOp::LessEq | MatchOp::GreaterEq => false,
    }
}

fn apply_atom_value(leaf: &Leaf, actual: &Value) -> bool {
    let Operand::Scalar(expected) = &leaf.operand else {
        return false;
    };
    match leaf.op {
        MatchOp::Equal => value::compare_eq(actual, expected),
        MatchOp::NotEqual => !value::compare_eq(actual, expected),
        MatchOp::Less => value::compare_order(actual, expected).is_some_and(std::cmp::Ordering::is_lt),
        MatchOp::Greater => value::compare_order(actual, expected).is_some_and(std::cmp::Ordering::is_gt),
        MatchOp::LessEq => value::compare_order(actual, expected).is_some_and(std::cmp::Ordering::is_le),
        MatchOp::GreaterEq => value::compare_order(actual, expected).is_some_and(std::cmp::Ordering::is_ge),
    }
}

/// Fold a homogeneous-kind query tree to a single boolean, evaluating
/// each leaf with `leaf_eval`. Used for `LinkName`/`AttrName` (name
/// leaves) and `AttrValue`/`DataElement` (value leaves) trees, each of
/// which never mixes with a different non-`DataElement` kind (§4.1).
pub fn fold_bool(query: &Query, leaf_eval: &mut impl FnMut(&Leaf) -> bool) -> bool {
    match query {
        Query::Leaf(leaf) => leaf_eval(leaf),
        Query::Combine { op, left, right } => {
            let l = fold_bool(left, leaf_eval);
            let r = fold_bool(right, leaf_eval);
            match op {
                CombineOp::And => l && r,
                CombineOp::Or => l || r,
            }
        }
    }
}

/// Evaluate a homogeneous name-kind tree against one name.
#[must_use]
pub fn eval_name_tree(query: &Query, name: &str) -> bool {
    fold_bool(query, &mut |leaf| apply_atom_name(leaf, name))
}

/// Evaluate a homogeneous value-kind tree against one scalar, matching
/// the "any element satisfies" rule at the call site (§4.2 attribute
/// path: "the attribute matches if any element satisfies the leaf").
#[must_use]
pub fn eval_value_tree(query: &Query, value: &Value) -> bool {
    fold_bool(query, &mut |leaf| apply_atom_value(leaf, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::{CombineOp, QueryKind};

    fn leaf(kind: QueryKind, op: MatchOp, operand: Operand) -> Leaf {
        Leaf { kind, op, operand }
    }

    // S1 — element predicate:
    // ((17 < x) AND (x < 22)) AND (x != 21.2) OR (x == 25)
    fn s1_query() -> Query {
        let gt17 = Query::Leaf(leaf(
            QueryKind::DataElement,
            MatchOp::Greater,
            Operand::Scalar(Value::Int(17)),
        ));
        let lt22 = Query::Leaf(leaf(
            QueryKind::DataElement,
            MatchOp::Less,
            Operand::Scalar(Value::Int(22)),
        ));
        let ne212 = Query::Leaf(leaf(
            QueryKind::DataElement,
            MatchOp::NotEqual,
            Operand::Scalar(Value::Float64(21.2)),
        ));
        let eq25 = Query::Leaf(leaf(
            QueryKind::DataElement,
            MatchOp::Equal,
            Operand::Scalar(Value::Int(25)),
        ));
        let range = Query::combine(CombineOp::And, gt17, lt22);
        let filtered = Query::combine(CombineOp::And, range, ne212);
        Query::combine(CombineOp::Or, filtered, eq25)
    }

    #[test]
    fn s1_element_predicate_table() {
        let q = s1_query();
        let inputs = [
            Value::Int(15),
            Value::Int(20),
            Value::Int(25),
            Value::Float64(21.2),
            Value::Float64(17.2),
            Value::Float64(18.0),
            Value::Float64(2.4),
            Value::Float64(25.0),
        ];
        let expected = [false, true, true, false, true, true, false, true];
        let actual: Vec<bool> = inputs.iter().map(|v| eval_value_tree(&q, v)).collect();
        assert_eq!(actual, expected);

        // The float32 input from the literal scenario.
        assert!(eval_value_tree(&q, &Value::Float32(17.2)));
    }

    #[test]
    fn name_leaf_ignores_ordering_ops() {
        let l = leaf(
            QueryKind::LinkName,
            MatchOp::Less,
            Operand::Name("Pressure".into()),
        );
        assert!(!apply_atom_name(&l, "Pressure"));
    }

    #[test]
    fn apply_atom_dispatches_on_operand_shape() {
        let name_leaf = leaf(
            QueryKind::LinkName,
            MatchOp::Equal,
            Operand::Name("Pressure".into()),
        );
        assert!(apply_atom(&name_leaf, &Value::Text("Pressure".into())));

        let value_leaf = leaf(
            QueryKind::AttrValue,
            MatchOp::Equal,
            Operand::Scalar(Value::Int(2)),
        );
        assert!(apply_atom(&value_leaf, &Value::Int(2)));
    }
}
