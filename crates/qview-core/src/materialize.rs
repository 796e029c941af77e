//! View materialization (C6): write an accumulated [`View`] into a fresh
//! anonymous group of typed reference datasets (§4.3 steps 1-4).

use tracing::{debug, instrument};

use crate::{
    container::{Container, GroupAccessPolicy, GroupCreatePolicy},
    error::Result,
    reference::Reference,
    view::View,
};

/// Default growth increment (bytes) passed to
/// [`crate::container::MemContainer::create`] when building the
/// core-backed container a materialized view is written into (§6).
pub const CORE_GROWTH_INCREMENT: usize = 1024;

const DATASET_REGION_NAME: &str = "region_refs";
const OBJECT_NAME: &str = "object_refs";
const ATTRIBUTE_NAME: &str = "attribute_refs";

/// Write `view` into a freshly created anonymous group of `container`,
/// producing up to three 1-D reference datasets, one per non-empty queue
/// (§4.3 step 2-4). Returns the anonymous group's path.
///
/// # Errors
/// Returns [`crate::error::QviewError::ViewWriteFailed`] if the group or
/// any dataset cannot be created.
#[instrument(skip(container, view))]
pub fn materialize(container: &mut impl Container, view: &View) -> Result<String> {
    let group_path = container.create_anonymous_group(GroupCreatePolicy, GroupAccessPolicy)?;

    write_queue(container, &group_path, DATASET_REGION_NAME, &view.reg_refs)?;
    write_queue(container, &group_path, OBJECT_NAME, &view.obj_refs)?;
    write_queue(container, &group_path, ATTRIBUTE_NAME, &view.attr_refs)?;

    debug!(group_path, "view materialized");
    Ok(group_path)
}

fn write_queue(
    container: &mut impl Container,
    group_path: &str,
    name: &str,
    queue: &[Reference],
) -> Result<()> {
    if queue.is_empty() {
        return Ok(());
    }
    let elements: Vec<Vec<u8>> = queue.iter().map(Reference::to_bytes).collect();
    container.write_dataset(group_path, name, elements)
}
