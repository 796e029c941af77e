//! Typed reference values (C3): handles to an object, attribute, or
//! dataset region across containers.

use std::collections::BTreeSet;

///
/// RegionSelection
///
/// An opaque (to callers) set of element coordinates within a dataset.
/// The storage layer is the only party that understands how coordinates
/// map onto a dataset's shape; the engine and view layer only need
/// `intersect`/`union`/emptiness per §9's "opaque region selections" note.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegionSelection(BTreeSet<u64>);

impl RegionSelection {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn from_coords(coords: impl IntoIterator<Item = u64>) -> Self {
        Self(coords.into_iter().collect())
    }

    pub fn insert(&mut self, coord: u64) {
        self.0.insert(coord);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn coords(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    /// Element-wise intersection, used by AND-combination (§4.2).
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }

    /// Element-wise union, used by OR-combination and gated-element
    /// evaluation of `Or` nodes (§4.1 Misc collapse to `DataElement`).
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).copied().collect())
    }
}

///
/// ReferenceKey
///
/// Canonical identity used by AND-combination's set intersection (§4.2):
/// `(container_name, object_path)` for object/region refs, plus
/// `attr_name` for attribute refs.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct ReferenceKey {
    pub container_name: String,
    pub object_path: String,
    pub attr_name: Option<String>,
}

///
/// Reference
///
/// A tagged union over {`Object`, `Attribute`, `DatasetRegion`} (§3).
///

#[derive(Clone, Debug, PartialEq)]
pub enum Reference {
    Object {
        container_name: String,
        object_path: String,
    },
    Attribute {
        container_name: String,
        object_path: String,
        attr_name: String,
    },
    DatasetRegion {
        container_name: String,
        object_path: String,
        selection: RegionSelection,
    },
}

impl Reference {
    #[must_use]
    pub fn key(&self) -> ReferenceKey {
        match self {
            Self::Object {
                container_name,
                object_path,
            }
            | Self::DatasetRegion {
                container_name,
                object_path,
                ..
            } => ReferenceKey {
                container_name: container_name.clone(),
                object_path: object_path.clone(),
                attr_name: None,
            },
            Self::Attribute {
                container_name,
                object_path,
                attr_name,
            } => ReferenceKey {
                container_name: container_name.clone(),
                object_path: object_path.clone(),
                attr_name: Some(attr_name.clone()),
            },
        }
    }

    /// Serialize per §6's reference element layout: length-prefixed
    /// `(kind:u8, container_name, object_path[, attr_name][, region])`,
    /// strings NUL-terminated.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Object {
                container_name,
                object_path,
            } => {
                buf.push(0);
                write_cstr(&mut buf, container_name);
                write_cstr(&mut buf, object_path);
            }
            Self::Attribute {
                container_name,
                object_path,
                attr_name,
            } => {
                buf.push(1);
                write_cstr(&mut buf, container_name);
                write_cstr(&mut buf, object_path);
                write_cstr(&mut buf, attr_name);
            }
            Self::DatasetRegion {
                container_name,
                object_path,
                selection,
            } => {
                buf.push(2);
                write_cstr(&mut buf, container_name);
                write_cstr(&mut buf, object_path);
                buf.extend_from_slice(&(selection.len() as u32).to_le_bytes());
                for coord in selection.coords() {
                    buf.extend_from_slice(&coord.to_le_bytes());
                }
            }
        }
        buf
    }
}

fn write_cstr(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}
