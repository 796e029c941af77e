//! End-to-end apply scenarios (S2-S5) over the in-memory container backend.

use qview_core::{
    apply::{apply, apply_multi},
    container::MemContainer,
    query::{CombineOp, MatchOp, Operand, Query, QueryKind},
    reference::Reference,
    value::Value,
};

const DATASET_LEN: i64 = 4096;

fn leaf(kind: QueryKind, op: MatchOp, operand: Operand) -> Query {
    Query::make_leaf(kind, op, operand).unwrap()
}

/// Three groups `Object1/2/3`, each with `Pressure`/`Temperature` datasets
/// of `data[i] = i`, each dataset carrying an integer `SensorID` attribute
/// matching its group index (1, 2, 3).
fn sensor_container(name: &str) -> MemContainer {
    let mut c = MemContainer::create(name, 1024, true);
    for (group_idx, group) in ["Object1", "Object2", "Object3"].iter().enumerate() {
        c.create_group(*group).unwrap();
        let sensor_id = (group_idx + 1) as i64;
        for dataset in ["Pressure", "Temperature"] {
            let path = format!("{group}/{dataset}");
            let data = (0..DATASET_LEN).map(Value::Int).collect();
            c.create_dataset(&path, data).unwrap();
            c.set_attribute(&path, "SensorID", vec![Value::Int(sensor_id)])
                .unwrap();
        }
    }
    c
}

fn element_range_link_sensor2_query() -> Query {
    let gt17 = leaf(
        QueryKind::DataElement,
        MatchOp::Greater,
        Operand::Scalar(Value::Int(17)),
    );
    let lt22 = leaf(
        QueryKind::DataElement,
        MatchOp::Less,
        Operand::Scalar(Value::Int(22)),
    );
    let range = Query::combine(CombineOp::And, gt17, lt22);
    let link = leaf(
        QueryKind::LinkName,
        MatchOp::Equal,
        Operand::Name("Pressure".into()),
    );
    let range_link = Query::combine(CombineOp::And, range, link);
    let attr_name = leaf(
        QueryKind::AttrName,
        MatchOp::Equal,
        Operand::Name("SensorID".into()),
    );
    let range_link_name = Query::combine(CombineOp::And, range_link, attr_name);
    let attr_value = leaf(
        QueryKind::AttrValue,
        MatchOp::Equal,
        Operand::Scalar(Value::Int(2)),
    );
    Query::combine(CombineOp::And, range_link_name, attr_value)
}

#[test]
fn s2_region_query_narrows_to_one_dataset() {
    let container = sensor_container("s2");
    let query = element_range_link_sensor2_query();
    let (view, mask) = apply(&container, &query).unwrap();

    assert!(mask.contains(qview_core::view::ResultMask::HAS_REGION));
    assert!(!mask.contains(qview_core::view::ResultMask::HAS_OBJECT));
    assert!(!mask.contains(qview_core::view::ResultMask::HAS_ATTRIBUTE));
    assert_eq!(view.reg_refs.len(), 1);

    let Reference::DatasetRegion {
        object_path,
        selection,
        ..
    } = &view.reg_refs[0]
    else {
        panic!("expected a dataset region reference");
    };
    assert_eq!(object_path, "Object2/Pressure");
    assert_eq!(
        selection.coords().collect::<Vec<_>>(),
        vec![18, 19, 20, 21]
    );
}

#[test]
fn s3_object_query_matches_every_pressure_dataset() {
    let container = sensor_container("s3");
    let query = leaf(
        QueryKind::LinkName,
        MatchOp::Equal,
        Operand::Name("Pressure".into()),
    );
    let (view, mask) = apply(&container, &query).unwrap();

    assert!(mask.contains(qview_core::view::ResultMask::HAS_OBJECT));
    let mut paths: Vec<&str> = view
        .obj_refs
        .iter()
        .map(|r| match r {
            Reference::Object { object_path, .. } => object_path.as_str(),
            _ => unreachable!(),
        })
        .collect();
    paths.sort_unstable();
    assert_eq!(
        paths,
        vec!["Object1/Pressure", "Object2/Pressure", "Object3/Pressure"]
    );
}

#[test]
fn s4_attribute_query_narrows_to_sensor_two() {
    let container = sensor_container("s4");
    let attr_name = leaf(
        QueryKind::AttrName,
        MatchOp::Equal,
        Operand::Name("SensorID".into()),
    );
    let attr_value = leaf(
        QueryKind::AttrValue,
        MatchOp::Equal,
        Operand::Scalar(Value::Int(2)),
    );
    let query = Query::combine(CombineOp::And, attr_name, attr_value);
    let (view, mask) = apply(&container, &query).unwrap();

    assert!(mask.contains(qview_core::view::ResultMask::HAS_ATTRIBUTE));
    let mut paths: Vec<&str> = view
        .attr_refs
        .iter()
        .map(|r| match r {
            Reference::Attribute { object_path, attr_name, .. } => {
                assert_eq!(attr_name, "SensorID");
                object_path.as_str()
            }
            _ => unreachable!(),
        })
        .collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["Object2/Pressure", "Object2/Temperature"]);
}

#[test]
fn s5_multi_container_concatenates_region_refs_in_order() {
    let containers = vec![
        sensor_container("s5a"),
        sensor_container("s5b"),
        sensor_container("s5c"),
    ];
    let query = element_range_link_sensor2_query();
    let (view, mask) = apply_multi(&containers, &query).unwrap();

    assert!(mask.contains(qview_core::view::ResultMask::HAS_REGION));
    assert_eq!(view.reg_refs.len(), 3);
    let names: Vec<&str> = view
        .reg_refs
        .iter()
        .map(|r| match r {
            Reference::DatasetRegion { container_name, .. } => container_name.as_str(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(names, vec!["s5a", "s5b", "s5c"]);
}
