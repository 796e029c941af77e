//! In-memory reference container backend (C7, ambient): the "core"
//! backing store used both by materialization (§4.3 step 1) and by the
//! end-to-end test scenarios (§8).

use std::collections::BTreeMap;

use super::{Container, GroupAccessPolicy, GroupCreatePolicy, ObjectKind, ReadContext};
use crate::{
    error::{QviewError, Result, StoreError},
    query::ast::Leaf,
    query::atom::apply_atom,
    reference::RegionSelection,
    value::Value,
};

type AttrMap = BTreeMap<String, Vec<Value>>;

#[derive(Debug)]
enum Object {
    Group { attributes: AttrMap },
    Dataset { data: Vec<Value>, attributes: AttrMap },
    RefDataset { elements: Vec<Vec<u8>> },
}

impl Object {
    const fn kind(&self) -> ObjectKind {
        match self {
            Self::Group { .. } => ObjectKind::Group,
            Self::Dataset { .. } | Self::RefDataset { .. } => ObjectKind::Dataset,
        }
    }

    const fn attributes(&self) -> Option<&AttrMap> {
        match self {
            Self::Group { attributes } | Self::Dataset { attributes, .. } => Some(attributes),
            Self::RefDataset { .. } => None,
        }
    }
}

///
/// MemContainer
///
/// Objects are keyed by their full path (`"."` is the implicit root
/// group and is never stored in the map). Iteration order follows the
/// map's key order, matching the "Name" index convention (§6).
///
#[derive(Debug)]
pub struct MemContainer {
    name: String,
    root_attributes: AttrMap,
    objects: BTreeMap<String, Object>,
    next_anon_id: u64,
}

impl MemContainer {
    /// Create a fresh in-memory-backed container (§4.3 step 1 / §6
    /// `create_core_backed_container`). `growth_increment` and
    /// `exclusive_create` are accepted for interface fidelity; this
    /// backend has no on-disk growth policy to apply.
    #[must_use]
    pub fn create(name: impl Into<String>, _growth_increment: usize, _exclusive_create: bool) -> Self {
        Self {
            name: name.into(),
            root_attributes: AttrMap::new(),
            objects: BTreeMap::new(),
            next_anon_id: 0,
        }
    }

    /// # Errors
    /// Returns [`StoreError::DuplicatePath`] if `path` already exists.
    pub fn create_group(&mut self, path: impl Into<String>) -> Result<()> {
        let path = path.into();
        if self.objects.contains_key(&path) {
            return Err(QviewError::StorageError(StoreError::DuplicatePath { path }));
        }
        self.objects.insert(
            path,
            Object::Group {
                attributes: AttrMap::new(),
            },
        );
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreError::DuplicatePath`] if `path` already exists.
    pub fn create_dataset(&mut self, path: impl Into<String>, data: Vec<Value>) -> Result<()> {
        let path = path.into();
        if self.objects.contains_key(&path) {
            return Err(QviewError::StorageError(StoreError::DuplicatePath { path }));
        }
        self.objects.insert(
            path,
            Object::Dataset {
                data,
                attributes: AttrMap::new(),
            },
        );
        Ok(())
    }

    /// # Errors
    /// Returns [`StoreError::NotFound`] if `path` does not name an object.
    pub fn set_attribute(
        &mut self,
        path: &str,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<()> {
        let attrs = if path == "." {
            &mut self.root_attributes
        } else {
            match self.objects.get_mut(path) {
                Some(Object::Group { attributes } | Object::Dataset { attributes, .. }) => {
                    attributes
                }
                Some(Object::RefDataset { .. }) => {
                    return Err(QviewError::StorageError(StoreError::WrongKind {
                        path: path.to_string(),
                        expected: "group or dataset",
                    }));
                }
                None => {
                    return Err(QviewError::StorageError(StoreError::NotFound {
                        path: path.to_string(),
                    }));
                }
            }
        };
        attrs.insert(name.into(), values);
        Ok(())
    }

    fn object(&self, path: &str) -> Result<&Object> {
        self.objects
            .get(path)
            .ok_or_else(|| QviewError::StorageError(StoreError::NotFound { path: path.to_string() }))
    }

    fn attributes_of(&self, path: &str) -> Result<&AttrMap> {
        if path == "." {
            return Ok(&self.root_attributes);
        }
        self.object(path)?.attributes().ok_or_else(|| {
            QviewError::StorageError(StoreError::WrongKind {
                path: path.to_string(),
                expected: "group or dataset",
            })
        })
    }
}

impl Container for MemContainer {
    fn canonical_filename(&self) -> &str {
        &self.name
    }

    fn visit_objects(
        &self,
        _rcxt: ReadContext,
        cb: &mut dyn FnMut(&str, ObjectKind) -> Result<()>,
    ) -> Result<()> {
        for (path, object) in &self.objects {
            cb(path, object.kind())?;
        }
        Ok(())
    }

    fn object_kind(&self, path: &str, _rcxt: ReadContext) -> Result<ObjectKind> {
        if path == "." {
            return Ok(ObjectKind::Group);
        }
        Ok(self.object(path)?.kind())
    }

    fn iterate_attributes(
        &self,
        path: &str,
        _rcxt: ReadContext,
        cb: &mut dyn FnMut(&str) -> Result<()>,
    ) -> Result<()> {
        for name in self.attributes_of(path)?.keys() {
            cb(name)?;
        }
        Ok(())
    }

    fn read_attribute(&self, path: &str, attr: &str, _rcxt: ReadContext) -> Result<Vec<Value>> {
        self.attributes_of(path)?
            .get(attr)
            .cloned()
            .ok_or_else(|| {
                QviewError::StorageError(StoreError::AttributeNotFound {
                    path: path.to_string(),
                    attr: attr.to_string(),
                })
            })
    }

    fn select_dataset_region(
        &self,
        path: &str,
        leaf: &Leaf,
        _rcxt: ReadContext,
    ) -> Result<RegionSelection> {
        let Object::Dataset { data, .. } = self.object(path)? else {
            return Err(QviewError::StorageError(StoreError::WrongKind {
                path: path.to_string(),
                expected: "dataset",
            }));
        };
        let mut selection = RegionSelection::new();
        for (idx, value) in data.iter().enumerate() {
            if apply_atom(leaf, value) {
                selection.insert(idx as u64);
            }
        }
        Ok(selection)
    }

    fn dataset_len(&self, path: &str, _rcxt: ReadContext) -> Result<u64> {
        match self.object(path)? {
            Object::Dataset { data, .. } => Ok(data.len() as u64),
            Object::RefDataset { elements } => Ok(elements.len() as u64),
            Object::Group { .. } => Err(QviewError::StorageError(StoreError::WrongKind {
                path: path.to_string(),
                expected: "dataset",
            })),
        }
    }

    fn create_anonymous_group(
        &mut self,
        _gcpl: GroupCreatePolicy,
        _gapl: GroupAccessPolicy,
    ) -> Result<String> {
        let path = format!("__anon_{}", self.next_anon_id);
        self.next_anon_id += 1;
        self.objects.insert(
            path.clone(),
            Object::Group {
                attributes: AttrMap::new(),
            },
        );
        Ok(path)
    }

    fn write_dataset(&mut self, group_path: &str, name: &str, elements: Vec<Vec<u8>>) -> Result<()> {
        if !matches!(self.objects.get(group_path), Some(Object::Group { .. })) {
            return Err(QviewError::StorageError(StoreError::WrongKind {
                path: group_path.to_string(),
                expected: "group",
            }));
        }
        let path = format!("{group_path}/{name}");
        self.objects.insert(path, Object::RefDataset { elements });
        Ok(())
    }
}
