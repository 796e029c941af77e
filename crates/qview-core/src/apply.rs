//! Apply engine (C5): drive a container traversal, dispatch by query
//! kind, and compose combinator results.

use tracing::{debug, instrument, trace};

use crate::{
    container::{Container, ObjectKind, ReadContext},
    error::{QviewError, Result},
    query::{
        ast::{CombineOp, Leaf, Query, QueryKind},
        atom::apply_atom,
    },
    reference::{Reference, RegionSelection},
    value::Value,
    view::{view_combine, ResultMask, View},
};

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Run `query` against `container`, producing a materializable [`View`]
/// and the [`ResultMask`] describing which reference kinds it holds
/// (§4.2 public contract).
///
/// # Errors
/// Returns [`crate::error::QviewError::ApplyFailed`]-shaped failures
/// (surfaced here as [`crate::error::QviewError::StorageError`]) if the
/// container reports a traversal, open, or read failure.
#[instrument(skip(container, query), fields(kind = ?query.get_kind(), container = container.canonical_filename()))]
pub fn apply(container: &impl Container, query: &Query) -> Result<(View, ResultMask)> {
    apply_with_context(container, query, ReadContext)
}

fn apply_with_context(
    container: &impl Container,
    query: &Query,
    rcxt: ReadContext,
) -> Result<(View, ResultMask)> {
    let (view, mask) = match query.get_kind() {
        QueryKind::LinkName => apply_link_name(container, query, rcxt)?,
        QueryKind::AttrName => apply_attr_kind(container, query, rcxt, AttrDispatch::Name)?,
        QueryKind::AttrValue => apply_attr_kind(container, query, rcxt, AttrDispatch::Value)?,
        QueryKind::DataElement => apply_data_element(container, query, rcxt)?,
        QueryKind::Misc => apply_misc(container, query, rcxt)?,
    };
    debug!(
        reg = view.reg_refs.len(),
        obj = view.obj_refs.len(),
        attr = view.attr_refs.len(),
        "apply complete"
    );
    Ok((view, mask))
}

/// Run `query` serially over each container in `containers`, concatenating
/// per-type queues and OR-ing the result masks (§4.3 `apply_multi`).
///
/// # Errors
/// Propagates the first container's failure, per §4.2's abort-on-error policy.
pub fn apply_multi(containers: &[impl Container], query: &Query) -> Result<(View, ResultMask)> {
    let mut out = View::new();
    let mut mask = ResultMask::empty();
    for container in containers {
        let (sub_view, sub_mask) = apply(container, query)?;
        out.concat(sub_view);
        mask = mask.union(sub_mask);
    }
    Ok((out, mask))
}

fn apply_link_name(
    container: &impl Container,
    query: &Query,
    rcxt: ReadContext,
) -> Result<(View, ResultMask)> {
    let mut view = View::new();
    let mut mask = ResultMask::empty();
    let name = container.canonical_filename().to_string();
    container.visit_objects(rcxt, &mut |path, _kind| {
        if apply_atom_leaf_tree(query, &Value::Text(basename(path).to_string())) {
            let bit = view.append(Reference::Object {
                container_name: name.clone(),
                object_path: path.to_string(),
            });
            mask.set(bit);
            trace!(path, "link name matched");
        }
        Ok(())
    })?;
    Ok((view, mask))
}

#[derive(Clone, Copy)]
enum AttrDispatch {
    Name,
    Value,
}

fn apply_attr_kind(
    container: &impl Container,
    query: &Query,
    rcxt: ReadContext,
    dispatch: AttrDispatch,
) -> Result<(View, ResultMask)> {
    let mut view = View::new();
    let mut mask = ResultMask::empty();
    let name = container.canonical_filename().to_string();

    let mut paths = vec![".".to_string()];
    container.visit_objects(rcxt, &mut |path, _kind| {
        paths.push(path.to_string());
        Ok(())
    })?;

    for path in paths {
        let mut attr_names = Vec::new();
        container.iterate_attributes(&path, rcxt, &mut |attr| {
            attr_names.push(attr.to_string());
            Ok(())
        })?;

        for attr in attr_names {
            let matched = match dispatch {
                AttrDispatch::Name => apply_atom_leaf_tree(query, &Value::Text(attr.clone())),
                AttrDispatch::Value => {
                    let values = container.read_attribute(&path, &attr, rcxt)?;
                    values.iter().any(|v| apply_atom_leaf_tree(query, v))
                }
            };
            if matched {
                let bit = view.append(Reference::Attribute {
                    container_name: name.clone(),
                    object_path: path.clone(),
                    attr_name: attr,
                });
                mask.set(bit);
            }
        }
    }
    Ok((view, mask))
}

fn apply_data_element(
    container: &impl Container,
    query: &Query,
    rcxt: ReadContext,
) -> Result<(View, ResultMask)> {
    let mut view = View::new();
    let mut mask = ResultMask::empty();
    let name = container.canonical_filename().to_string();

    container.visit_objects(rcxt, &mut |path, kind| {
        if kind != ObjectKind::Dataset {
            return Ok(());
        }
        let set = dataset_selection(query, container, path, basename(path), rcxt)?;
        let len = container.dataset_len(path, rcxt)?;
        let selection = set.into_selection(len);
        if !selection.is_empty() {
            let bit = view.append(Reference::DatasetRegion {
                container_name: name.clone(),
                object_path: path.to_string(),
                selection,
            });
            mask.set(bit);
        }
        Ok(())
    })?;
    Ok((view, mask))
}

fn apply_misc(
    container: &impl Container,
    query: &Query,
    rcxt: ReadContext,
) -> Result<(View, ResultMask)> {
    let (left, right) = query.get_components()?;
    let Some(op) = query.get_combine_op() else {
        return Err(QviewError::BadHandle(
            "apply_misc called on a leaf query".to_string(),
        ));
    };
    let (v1, r1) = apply_with_context(container, left, rcxt)?;
    let (v2, r2) = apply_with_context(container, right, rcxt)?;
    Ok(view_combine(op, v1, v2, r1, r2))
}

/// Evaluate a homogeneous leaf-kind tree (`LinkName`/`AttrName` use a
/// name value, `AttrValue` a scalar) by folding `apply_atom` over it.
fn apply_atom_leaf_tree(query: &Query, value: &Value) -> bool {
    crate::query::atom::fold_bool(query, &mut |leaf: &Leaf| apply_atom(leaf, value))
}

///
/// ElementSet
///
/// Per-dataset accumulator used while folding a (possibly mixed) query
/// tree down to element coordinates. `Universal` stands for "every
/// coordinate passes" — the result of a true non-`DataElement` gate leaf
/// (§4.1: a `Misc` combination involving `DataElement` shares one element
/// stream, so gate leaves act as per-object filters rather than
/// producing their own reference queue).
///
enum ElementSet {
    Universal,
    Set(RegionSelection),
}

impl ElementSet {
    fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Universal, Self::Universal) => Self::Universal,
            (Self::Universal, Self::Set(s)) | (Self::Set(s), Self::Universal) => Self::Set(s),
            (Self::Set(a), Self::Set(b)) => Self::Set(a.intersect(&b)),
        }
    }

    fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Universal, _) | (_, Self::Universal) => Self::Universal,
            (Self::Set(a), Self::Set(b)) => Self::Set(a.union(&b)),
        }
    }

    fn into_selection(self, full_len: u64) -> RegionSelection {
        match self {
            Self::Universal => RegionSelection::from_coords(0..full_len),
            Self::Set(s) => s,
        }
    }
}

const fn gate(matched: bool) -> ElementSet {
    if matched {
        ElementSet::Universal
    } else {
        // A `RegionSelection::new()` constant path; `matched == false` never
        // needs coordinates, so an empty set stands in for "no match".
        ElementSet::Set(RegionSelection::new())
    }
}

fn dataset_selection(
    query: &Query,
    container: &impl Container,
    path: &str,
    name: &str,
    rcxt: ReadContext,
) -> Result<ElementSet> {
    match query {
        Query::Leaf(leaf) => leaf_selection(leaf, container, path, name, rcxt),
        Query::Combine { op, left, right } => {
            let l = dataset_selection(left, container, path, name, rcxt)?;
            let r = dataset_selection(right, container, path, name, rcxt)?;
            Ok(match op {
                CombineOp::And => l.and(r),
                CombineOp::Or => l.or(r),
            })
        }
    }
}

fn leaf_selection(
    leaf: &Leaf,
    container: &impl Container,
    path: &str,
    name: &str,
    rcxt: ReadContext,
) -> Result<ElementSet> {
    match leaf.kind {
        QueryKind::DataElement => {
            Ok(ElementSet::Set(container.select_dataset_region(path, leaf, rcxt)?))
        }
        QueryKind::LinkName => Ok(gate(apply_atom(leaf, &Value::Text(name.to_string())))),
        QueryKind::AttrName => {
            let mut matched = false;
            container.iterate_attributes(path, rcxt, &mut |attr| {
                matched |= apply_atom(leaf, &Value::Text(attr.to_string()));
                Ok(())
            })?;
            Ok(gate(matched))
        }
        QueryKind::AttrValue => {
            let mut attr_names = Vec::new();
            container.iterate_attributes(path, rcxt, &mut |attr| {
                attr_names.push(attr.to_string());
                Ok(())
            })?;
            let mut matched = false;
            for attr in attr_names {
                let values = container.read_attribute(path, &attr, rcxt)?;
                if values.iter().any(|v| apply_atom(leaf, v)) {
                    matched = true;
                    break;
                }
            }
            Ok(gate(matched))
        }
        QueryKind::Misc => unreachable!("a leaf never reports Misc kind"),
    }
}
