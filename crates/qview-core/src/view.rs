//! View accumulation and set-algebra combination (C4).

use crate::{
    query::ast::CombineOp,
    reference::{Reference, ReferenceKey},
};

///
/// ResultMask
///
/// Bits describing which reference kinds a view contains (§3).
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResultMask {
    bits: u8,
}

impl ResultMask {
    pub const HAS_REGION: Self = Self { bits: 0b001 };
    pub const HAS_OBJECT: Self = Self { bits: 0b010 };
    pub const HAS_ATTRIBUTE: Self = Self { bits: 0b100 };

    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn set(&mut self, bit: Self) {
        self.bits |= bit.bits;
    }

    #[must_use]
    pub const fn contains(self, bit: Self) -> bool {
        self.bits & bit.bits == bit.bits
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }
}

///
/// View
///
/// Three ordered FIFO queues of references, keyed by type (§4.3 C4).
/// Order mirrors traversal/append order; used for determinism in tests.
///

#[derive(Clone, Debug, Default)]
pub struct View {
    pub reg_refs: Vec<Reference>,
    pub obj_refs: Vec<Reference>,
    pub attr_refs: Vec<Reference>,
}

impl View {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one reference, routing it to the matching queue and
    /// returning the `ResultMask` bit it sets.
    pub fn append(&mut self, reference: Reference) -> ResultMask {
        match &reference {
            Reference::DatasetRegion { .. } => {
                self.reg_refs.push(reference);
                ResultMask::HAS_REGION
            }
            Reference::Object { .. } => {
                self.obj_refs.push(reference);
                ResultMask::HAS_OBJECT
            }
            Reference::Attribute { .. } => {
                self.attr_refs.push(reference);
                ResultMask::HAS_ATTRIBUTE
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reg_refs.len() + self.obj_refs.len() + self.attr_refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// O(1)-amortized splice: appends `other`'s queues after this view's,
    /// leaving `other` empty (§4.3 `concat`).
    pub fn concat(&mut self, mut other: Self) {
        self.reg_refs.append(&mut other.reg_refs);
        self.obj_refs.append(&mut other.obj_refs);
        self.attr_refs.append(&mut other.attr_refs);
    }

    #[must_use]
    pub fn result_mask(&self) -> ResultMask {
        let mut mask = ResultMask::empty();
        if !self.reg_refs.is_empty() {
            mask.set(ResultMask::HAS_REGION);
        }
        if !self.obj_refs.is_empty() {
            mask.set(ResultMask::HAS_OBJECT);
        }
        if !self.attr_refs.is_empty() {
            mask.set(ResultMask::HAS_ATTRIBUTE);
        }
        mask
    }
}

/// Combine two sibling views under `And`/`Or` set algebra (§4.2
/// `view_combine`). Consumes both inputs.
#[must_use]
pub fn view_combine(
    op: CombineOp,
    left: View,
    right: View,
    r1: ResultMask,
    r2: ResultMask,
) -> (View, ResultMask) {
    match op {
        CombineOp::Or => {
            let mut out = left;
            out.concat(right);
            (out, r1.union(r2))
        }
        CombineOp::And => {
            if r1.is_empty() || r2.is_empty() {
                return (View::new(), ResultMask::empty());
            }
            let out = View {
                reg_refs: intersect_queue(left.reg_refs, &right.reg_refs, true),
                obj_refs: intersect_queue(left.obj_refs, &right.obj_refs, false),
                attr_refs: intersect_queue(left.attr_refs, &right.attr_refs, false),
            };
            let mask = out.result_mask();
            (out, mask)
        }
    }
}

/// Filter `left`'s queue down to entries whose canonical key also
/// appears in `right`, preserving `left`'s order. When `merge_regions` is
/// set, a matching pair of `DatasetRegion` refs is replaced by one whose
/// selection is the element-wise intersection (§4.2); an empty
/// intersection drops the pair entirely.
fn intersect_queue(left: Vec<Reference>, right: &[Reference], merge_regions: bool) -> Vec<Reference> {
    let mut out = Vec::new();
    for l in left {
        let key = l.key();
        let Some(r) = right.iter().find(|r| r.key() == key) else {
            continue;
        };
        if merge_regions {
            if let (
                Reference::DatasetRegion {
                    container_name,
                    object_path,
                    selection: sel_l,
                },
                Reference::DatasetRegion { selection: sel_r, .. },
            ) = (&l, r)
            {
                let merged = sel_l.intersect(sel_r);
                if merged.is_empty() {
                    continue;
                }
                out.push(Reference::DatasetRegion {
                    container_name: container_name.clone(),
                    object_path: object_path.clone(),
                    selection: merged,
                });
                continue;
            }
        }
        out.push(l);
    }
    out
}

#[must_use]
pub fn dedupe_by_key(refs: Vec<Reference>) -> Vec<Reference> {
    let mut seen = std::collections::BTreeSet::<ReferenceKey>::new();
    let mut out = Vec::with_capacity(refs.len());
    for r in refs {
        if seen.insert(r.key()) {
            out.push(r);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RegionSelection;

    fn obj(path: &str) -> Reference {
        Reference::Object {
            container_name: "c".into(),
            object_path: path.into(),
        }
    }

    #[test]
    fn or_concatenates_in_order() {
        let mut left = View::new();
        left.append(obj("a"));
        let mut right = View::new();
        right.append(obj("b"));
        let (out, mask) = view_combine(
            CombineOp::Or,
            left,
            right,
            ResultMask::HAS_OBJECT,
            ResultMask::HAS_OBJECT,
        );
        assert_eq!(out.obj_refs.len(), 2);
        assert!(mask.contains(ResultMask::HAS_OBJECT));
    }

    #[test]
    fn and_intersects_by_key() {
        let mut left = View::new();
        left.append(obj("a"));
        left.append(obj("b"));
        let mut right = View::new();
        right.append(obj("b"));
        let (out, _) = view_combine(
            CombineOp::And,
            left,
            right,
            ResultMask::HAS_OBJECT,
            ResultMask::HAS_OBJECT,
        );
        assert_eq!(out.obj_refs, vec![obj("b")]);
    }

    #[test]
    fn and_empty_side_absorbs() {
        let left = View::new();
        let mut right = View::new();
        right.append(obj("b"));
        let (out, mask) = view_combine(
            CombineOp::And,
            left,
            right,
            ResultMask::empty(),
            ResultMask::HAS_OBJECT,
        );
        assert!(out.is_empty());
        assert!(mask.is_empty());
    }

    #[test]
    fn and_merges_region_selections() {
        let mut left = View::new();
        left.append(Reference::DatasetRegion {
            container_name: "c".into(),
            object_path: "d".into(),
            selection: RegionSelection::from_coords([18, 19, 20, 21]),
        });
        let mut right = View::new();
        right.append(Reference::DatasetRegion {
            container_name: "c".into(),
            object_path: "d".into(),
            selection: RegionSelection::from_coords([20, 21, 22]),
        });
        let (out, _) = view_combine(
            CombineOp::And,
            left,
            right,
            ResultMask::HAS_REGION,
            ResultMask::HAS_REGION,
        );
        let Reference::DatasetRegion { selection, .. } = &out.reg_refs[0] else {
            panic!("expected region ref");
        };
        assert_eq!(*selection, RegionSelection::from_coords([20, 21]));
    }

    fn arb_paths() -> impl proptest::strategy::Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-d]", 0..6)
    }

    fn view_of(paths: &[String]) -> View {
        let mut v = View::new();
        for p in paths {
            v.append(obj(p));
        }
        v
    }

    fn keys(refs: &[Reference]) -> std::collections::BTreeSet<ReferenceKey> {
        refs.iter().map(Reference::key).collect()
    }

    proptest::proptest! {
        #[test]
        fn or_combine_is_commutative_as_a_set(a in arb_paths(), b in arb_paths()) {
            let (fwd, _) = view_combine(
                CombineOp::Or, view_of(&a), view_of(&b), ResultMask::HAS_OBJECT, ResultMask::HAS_OBJECT,
            );
            let (rev, _) = view_combine(
                CombineOp::Or, view_of(&b), view_of(&a), ResultMask::HAS_OBJECT, ResultMask::HAS_OBJECT,
            );
            proptest::prop_assert_eq!(keys(&fwd.obj_refs), keys(&rev.obj_refs));
        }

        #[test]
        fn and_self_intersection_is_idempotent(a in arb_paths()) {
            let (out, _) = view_combine(
                CombineOp::And, view_of(&a), view_of(&a), ResultMask::HAS_OBJECT, ResultMask::HAS_OBJECT,
            );
            proptest::prop_assert_eq!(keys(&out.obj_refs), keys(&view_of(&a).obj_refs));
        }

        #[test]
        fn or_self_combine_dedupes_back_to_original(a in arb_paths()) {
            let (out, _) = view_combine(
                CombineOp::Or, view_of(&a), view_of(&a), ResultMask::HAS_OBJECT, ResultMask::HAS_OBJECT,
            );
            let deduped = dedupe_by_key(out.obj_refs);
            proptest::prop_assert_eq!(keys(&deduped), keys(&view_of(&a).obj_refs));
        }

        #[test]
        fn and_is_commutative_as_a_set(a in arb_paths(), b in arb_paths()) {
            let (fwd, _) = view_combine(
                CombineOp::And, view_of(&a), view_of(&b), ResultMask::HAS_OBJECT, ResultMask::HAS_OBJECT,
            );
            let (rev, _) = view_combine(
                CombineOp::And, view_of(&b), view_of(&a), ResultMask::HAS_OBJECT, ResultMask::HAS_OBJECT,
            );
            proptest::prop_assert_eq!(keys(&fwd.obj_refs), keys(&rev.obj_refs));
        }
    }
}
