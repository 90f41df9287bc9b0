//! Component tests for 3MF core models
//!
//! Tests for component hierarchies, transformations and flattening of
//! loaded documents

#[path = "../common/mod.rs"]
mod common;

use std::io::Cursor;

use common::{component_xml, mesh_xml, model_xml, package_from_model, tetra_mesh_xml};
use lib3mf_resolve::parser::parse_model_xml;
use lib3mf_resolve::resolver::{Resolver, flatten_build_with};
use lib3mf_resolve::{AffineTransform, Error, Model, ParserConfig, flatten, flatten_build};

const SQUARE: [(f64, f64, f64); 4] = [
    (0.0, 0.0, 0.0),
    (1.0, 0.0, 0.0),
    (1.0, 1.0, 0.0),
    (0.0, 1.0, 0.0),
];

fn surface_square() -> String {
    format!(
        r#"<object id="1" type="surface">{}</object>"#,
        mesh_xml(&SQUARE, &[(0, 1, 2), (0, 2, 3)])
    )
}

#[test]
fn test_parse_components_from_package() {
    let resources = format!(
        r#"<object id="1">{}</object>
        <object id="2">
          <components>
            {}
            {}
            {}
          </components>
        </object>"#,
        tetra_mesh_xml(),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 0 0 0")),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 20 0 0")),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 0 20 0")),
    );
    let data = package_from_model(&model_xml(&resources, r#"<item objectid="2"/>"#));
    let model = Model::from_reader(Cursor::new(data)).expect("Failed to load package");

    assert_eq!(model.resources.object_count(), 2);

    let leaf = model.resources.object(1).unwrap();
    assert!(!leaf.is_assembly());
    assert_eq!(leaf.mesh().unwrap().is_manifold(), Some(true));

    let assembly = model.resources.object(2).unwrap();
    assert!(assembly.mesh().is_none());
    let components = assembly.components();
    assert_eq!(components.len(), 3);

    let t2 = components[1].parsed_transform().unwrap();
    assert_eq!(t2.translation().x, 20.0);
    let t3 = components[2].parsed_transform().unwrap();
    assert_eq!(t3.translation().y, 20.0);

    assert_eq!(model.build.items.len(), 1);
    assert_eq!(model.build.items[0].objectid, 2);
}

#[test]
fn test_flatten_translated_square() {
    let resources = format!(
        r#"{}<object id="2" type="surface"><components>{}</components></object>"#,
        surface_square(),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 2 0 0"))
    );
    let model = parse_model_xml(&model_xml(&resources, "")).unwrap();

    let flat = flatten(2, &model.resources, &AffineTransform::identity()).unwrap();
    assert_eq!(flat.vertex_count(), 4);
    assert_eq!(flat.triangle_count(), 2);

    let xs: Vec<f64> = flat.vertices().iter().map(|v| v.x).collect();
    assert_eq!(xs, vec![2.0, 3.0, 3.0, 2.0]);
    assert_eq!(flat.triangles()[0].indices(), [0, 1, 2]);
    assert_eq!(flat.triangles()[1].indices(), [0, 2, 3]);
}

#[test]
fn test_flatten_mirrored_component_flips_winding() {
    let resources = format!(
        r#"{}<object id="2" type="surface"><components>{}</components></object>"#,
        surface_square(),
        component_xml(1, Some("-1 0 0 0 1 0 0 0 1 0 0 0"))
    );
    let model = parse_model_xml(&model_xml(&resources, "")).unwrap();

    let flat = flatten(2, &model.resources, &AffineTransform::identity()).unwrap();
    assert_eq!(flat.triangles()[0].indices(), [0, 2, 1]);
    assert_eq!(flat.triangles()[1].indices(), [0, 3, 2]);
    assert_eq!(flat.vertices()[1].x, -1.0);
}

#[test]
fn test_flatten_nested_assemblies_in_preorder() {
    let resources = format!(
        r#"{}
        <object id="2" type="surface"><components>{}{}</components></object>
        <object id="3" type="surface"><components>{}{}</components></object>"#,
        surface_square(),
        component_xml(1, None),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 0 0 5")),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 10 0 0")),
        component_xml(2, Some("1 0 0 0 1 0 0 0 1 0 10 0")),
    );
    let model = parse_model_xml(&model_xml(&resources, "")).unwrap();

    let flat = flatten(3, &model.resources, &AffineTransform::identity()).unwrap();
    assert_eq!(flat.vertex_count(), 12);
    assert_eq!(flat.triangle_count(), 6);

    let first = flat.vertices()[0];
    assert_eq!((first.x, first.y, first.z), (10.0, 0.0, 0.0));
    let second = flat.vertices()[4];
    assert_eq!((second.x, second.y, second.z), (0.0, 10.0, 0.0));
    let third = flat.vertices()[8];
    assert_eq!((third.x, third.y, third.z), (0.0, 10.0, 5.0));

    // Triangles of the last placement are offset past the first eight vertices
    assert_eq!(flat.triangles()[4].indices(), [8, 9, 10]);
}

#[test]
fn test_flatten_build_of_loaded_package() {
    let resources = format!(
        r#"<object id="1">{}</object>
        <object id="2"><components>{}</components></object>"#,
        tetra_mesh_xml(),
        component_xml(1, Some("1 0 0 0 1 0 0 0 1 1 0 0"))
    );
    let build = r#"<item objectid="2"/><item objectid="1" transform="1 0 0 0 1 0 0 0 1 0 0 3"/>"#;
    let data = package_from_model(&model_xml(&resources, build));
    let model = Model::from_reader(Cursor::new(data)).unwrap();

    let flat = flatten_build(&model).unwrap();
    assert_eq!(flat.vertex_count(), 8);
    assert_eq!(flat.triangle_count(), 8);
    assert_eq!(flat.vertices()[1].x, 2.0);
    assert_eq!(flat.vertices()[7].z, 4.0);
    assert_eq!(flat.is_manifold(), None);
}

#[test]
fn test_flatten_reports_malformed_component_transform() {
    let resources = format!(
        r#"{}<object id="2" type="surface"><components>{}</components></object>"#,
        surface_square(),
        component_xml(1, Some("1 0 0 0 1 0"))
    );
    let model = parse_model_xml(&model_xml(&resources, "")).unwrap();

    match flatten(2, &model.resources, &AffineTransform::identity()) {
        Err(Error::MalformedTransform { raw, owner, .. }) => {
            assert_eq!(raw, "1 0 0 0 1 0");
            assert_eq!(owner, Some(2));
        }
        other => panic!("expected malformed transform, got {other:?}"),
    }
}

#[test]
fn test_flatten_depth_limit_on_loaded_model() {
    let resources = format!(
        r#"{}
        <object id="2" type="surface"><components>{}</components></object>
        <object id="3" type="surface"><components>{}</components></object>"#,
        surface_square(),
        component_xml(1, None),
        component_xml(2, None),
    );
    let model = parse_model_xml(&model_xml(&resources, r#"<item objectid="3"/>"#)).unwrap();

    let shallow = Resolver::new(&model.resources).with_max_depth(1);
    assert!(matches!(
        flatten_build_with(&shallow, &model),
        Err(Error::DepthLimitExceeded {
            object_id: 1,
            limit: 1
        })
    ));

    let deep_enough = Resolver::new(&model.resources).with_max_depth(2);
    assert_eq!(flatten_build_with(&deep_enough, &model).unwrap().triangle_count(), 2);
}

#[test]
fn test_load_rejects_hierarchy_past_configured_depth() {
    let resources = format!(
        r#"<object id="1">{}</object>
        <object id="2"><components>{}</components></object>
        <object id="3"><components>{}</components></object>"#,
        tetra_mesh_xml(),
        component_xml(1, None),
        component_xml(2, None),
    );
    let data = package_from_model(&model_xml(&resources, r#"<item objectid="3"/>"#));

    let config = ParserConfig::new().with_max_component_depth(1);
    let err = Model::from_reader_with_config(Cursor::new(data.clone()), config).unwrap_err();
    assert!(matches!(err, Error::DepthLimitExceeded { limit: 1, .. }));

    assert!(Model::from_reader(Cursor::new(data)).is_ok());
}
