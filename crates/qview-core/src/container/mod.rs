//! Storage container contract (§6, consumed) and its in-memory reference
//! backend (C7, ambient — ships as part of this crate so the engine is
//! testable end to end; see SPEC_FULL.md §10).

mod mem;

pub use mem::MemContainer;

use crate::{error::Result, query::ast::Leaf, reference::RegionSelection, value::Value};

///
/// ObjectKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectKind {
    Group,
    Dataset,
}

///
/// ReadContext
///
/// Caller-supplied version token under which reads see a consistent
/// snapshot of the container (§5, §6). The in-memory backend has no
/// concept of MVCC snapshots, so this is a zero-sized marker today; it
/// exists so engine call sites already carry the parameter a real
/// transactional backend would need.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReadContext;

///
/// GroupCreatePolicy / GroupAccessPolicy
///
/// Creation/access policy knobs for anonymous groups (§4.3 step 3).
/// `Default` mirrors "default creation/access policies" from the spec.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GroupCreatePolicy;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GroupAccessPolicy;

///
/// Container
///
/// The storage contract the apply engine (C5) and materialization (C6)
/// consume. Every method here corresponds to one operation named in §6.
///
pub trait Container {
    /// The container's own name, recorded into every [`crate::reference::Reference`].
    fn canonical_filename(&self) -> &str;

    /// Preorder, name-ordered walk of every object in the container.
    /// The callback sees `(path, kind)`; `"."` never appears here (the
    /// root is visited by the attribute dispatch path directly, matching
    /// §4.2's "including `.` = the root" note for attribute kinds).
    ///
    /// # Errors
    /// Propagates any error the callback returns, and any backend failure.
    fn visit_objects(
        &self,
        rcxt: ReadContext,
        cb: &mut dyn FnMut(&str, ObjectKind) -> Result<()>,
    ) -> Result<()>;

    /// Look up one object's kind by path (`"."` denotes the root group).
    ///
    /// # Errors
    /// Returns [`crate::error::QviewError::StorageError`] if the path does not exist.
    fn object_kind(&self, path: &str, rcxt: ReadContext) -> Result<ObjectKind>;

    /// Name-ordered iteration of one object's attributes.
    ///
    /// # Errors
    /// Propagates the callback's error and any backend failure.
    fn iterate_attributes(
        &self,
        path: &str,
        rcxt: ReadContext,
        cb: &mut dyn FnMut(&str) -> Result<()>,
    ) -> Result<()>;

    /// Read one attribute's element vector.
    ///
    /// # Errors
    /// Returns [`crate::error::QviewError::StorageError`] if the attribute does not exist.
    fn read_attribute(&self, path: &str, attr: &str, rcxt: ReadContext) -> Result<Vec<Value>>;

    /// Evaluate one `DataElement` leaf against a dataset's stored elements,
    /// returning the coordinates that satisfy it (§4.2 dataset data-element
    /// path). Returns an empty selection, never an error, for a leaf that
    /// matches nothing.
    ///
    /// # Errors
    /// Returns [`crate::error::QviewError::StorageError`] if `path` is not a dataset.
    fn select_dataset_region(
        &self,
        path: &str,
        leaf: &Leaf,
        rcxt: ReadContext,
    ) -> Result<RegionSelection>;

    /// Total element count of a dataset, used to build the "every
    /// coordinate" universal selection for gated element evaluation.
    ///
    /// # Errors
    /// Returns [`crate::error::QviewError::StorageError`] if `path` is not a dataset.
    fn dataset_len(&self, path: &str, rcxt: ReadContext) -> Result<u64>;

    /// Create a fresh anonymous group (§4.3 step 2-3).
    ///
    /// # Errors
    /// Returns [`crate::error::QviewError::ViewWriteFailed`] if the group cannot be created.
    fn create_anonymous_group(
        &mut self,
        gcpl: GroupCreatePolicy,
        gapl: GroupAccessPolicy,
    ) -> Result<String>;

    /// Write one 1-D reference dataset into a group (§4.3 step 4). Each
    /// element is already serialized per §6's reference element layout.
    ///
    /// # Errors
    /// Returns [`crate::error::QviewError::ViewWriteFailed`] if the write fails.
    fn write_dataset(&mut self, group_path: &str, name: &str, elements: Vec<Vec<u8>>) -> Result<()>;
}
