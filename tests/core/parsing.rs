//! Parsing tests for 3MF packages and model XML

#[path = "../common/mod.rs"]
mod common;

use std::fs::File;
use std::io::{Cursor, Write};

use common::{
    CONTENT_TYPES, CORE_NS, RELS, TETRA_VERTICES, mesh_xml, model_xml, package_from_model,
    package_from_parts, tetra_mesh_xml,
};
use lib3mf_resolve::opc::Package;
use lib3mf_resolve::parser::{parse_model_xml, parse_model_xml_with_config};
use lib3mf_resolve::{Error, Model, ObjectType, ParserConfig};

#[test]
fn test_load_package_from_file() {
    let resources = format!(r#"<object id="1" name="Tetra" partnumber="T-1">{}</object>"#, tetra_mesh_xml());
    let data = package_from_model(&model_xml(&resources, r#"<item objectid="1"/>"#));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let model = Model::from_reader(File::open(file.path()).unwrap()).unwrap();
    assert_eq!(model.unit, "millimeter");
    assert_eq!(model.language.as_deref(), Some("en-US"));

    let object = model.resources.object(1).unwrap();
    assert_eq!(object.name.as_deref(), Some("Tetra"));
    assert_eq!(object.partnumber.as_deref(), Some("T-1"));
    assert_eq!(object.object_type, ObjectType::Model);

    let mesh = object.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.has_consistent_orientation(), Some(true));
}

#[test]
fn test_package_exposes_text_parts() {
    let xml = model_xml(&format!(r#"<object id="1">{}</object>"#, tetra_mesh_xml()), "");
    let data = package_from_model(&xml);
    let mut package = Package::open(Cursor::new(data)).unwrap();

    assert_eq!(package.primary_model_path(), "3D/3dmodel.model");
    assert_eq!(package.get_model().unwrap(), xml);

    let parts = package.text_parts().unwrap();
    assert!(parts.contains_key("[Content_Types].xml"));
    assert!(parts.contains_key("_rels/.rels"));
    assert!(parts.contains_key("3D/3dmodel.model"));
}

#[test]
fn test_missing_relationships_part() {
    let data = package_from_parts(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("3D/3dmodel.model", "<model/>"),
    ]);
    let err = Model::from_reader(Cursor::new(data)).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("_rels/.rels"));
}

#[test]
fn test_relationship_target_must_exist() {
    let data = package_from_parts(&[("[Content_Types].xml", CONTENT_TYPES), ("_rels/.rels", RELS)]);
    assert!(Model::from_reader(Cursor::new(data)).is_err());
}

#[test]
fn test_not_a_zip_archive() {
    let err = Model::from_reader(Cursor::new(b"solid cube\nendsolid".to_vec())).unwrap_err();
    assert!(matches!(err, Error::Zip(_)), "unexpected error: {err}");
}

#[test]
fn test_load_rejects_inconsistent_winding() {
    let triangles = [(0, 2, 1), (0, 1, 3), (1, 2, 3), (0, 2, 3)];
    let resources = format!(r#"<object id="1">{}</object>"#, mesh_xml(&TETRA_VERTICES, &triangles));
    let data = package_from_model(&model_xml(&resources, r#"<item objectid="1"/>"#));

    let err = Model::from_reader(Cursor::new(data.clone())).unwrap_err();
    assert!(matches!(err, Error::InconsistentWinding { object_type: ObjectType::Model }));

    let config = ParserConfig::new().with_mesh_validation(false);
    let model = Model::from_reader_with_config(Cursor::new(data), config).unwrap();
    assert_eq!(model.resources.object(1).unwrap().mesh().unwrap().is_manifold(), None);
}

#[test]
fn test_load_rejects_build_item_for_missing_object() {
    let resources = format!(r#"<object id="1">{}</object>"#, tetra_mesh_xml());
    let data = package_from_model(&model_xml(&resources, r#"<item objectid="4"/>"#));
    assert!(matches!(
        Model::from_reader(Cursor::new(data)),
        Err(Error::ObjectNotFound(4))
    ));
}

#[test]
fn test_metadata_and_materials() {
    let xml = format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<model unit="centimeter" xmlns="{CORE_NS}">
  <metadata name="Title">Bracket</metadata>
  <metadata name="Copyright" preserve="false">ACME &lt;2026&gt;</metadata>
  <resources>
    <basematerials id="1">
      <base name="PLA white" displaycolor="#FFFFFF"/>
      <base name="PLA red" displaycolor="#FF0000FF"/>
    </basematerials>
    <object id="2" pid="1" pindex="1">{}</object>
  </resources>
  <build><item objectid="2"/></build>
</model>"##,
        tetra_mesh_xml()
    );
    let model = parse_model_xml(&xml).unwrap();

    assert_eq!(model.unit, "centimeter");
    assert_eq!(model.get_metadata("Title"), Some("Bracket"));
    assert_eq!(model.get_metadata("Copyright"), Some("ACME <2026>"));
    assert_eq!(model.metadata[1].preserve, Some(false));
    assert!(!model.has_metadata("Designer"));

    let group = model.resources.base_materials(1).unwrap();
    assert_eq!(group.materials[0].name, "PLA white");
    assert_eq!(group.materials[1].displaycolor, (255, 0, 0, 255));

    let object = model.resources.object(2).unwrap();
    assert_eq!((object.pid, object.pindex), (Some(1), Some(1)));
}

#[test]
fn test_lenient_attributes() {
    let resources = format!(r#"<object id="1" colour="red">{}</object>"#, tetra_mesh_xml());
    let xml = model_xml(&resources, "");

    let err = parse_model_xml(&xml).unwrap_err();
    assert!(err.to_string().contains("Unknown attribute 'colour' on <object>"));

    let lenient = ParserConfig::new().with_strict_attributes(false);
    assert!(parse_model_xml_with_config(&xml, &lenient).is_ok());
}

#[test]
fn test_non_finite_vertex_rejected() {
    let resources = r#"<object id="1"><mesh><vertices><vertex x="INF" y="0" z="0"/></vertices><triangles/></mesh></object>"#;
    let err = parse_model_xml(&model_xml(resources, "")).unwrap_err();
    assert!(err.to_string().contains("must be finite"));
}

#[test]
fn test_invalid_object_type_rejected() {
    let resources = format!(r#"<object id="1" type="assembly">{}</object>"#, tetra_mesh_xml());
    let err = parse_model_xml(&model_xml(&resources, "")).unwrap_err();
    assert!(err.to_string().contains("Invalid object type 'assembly'"));
}

#[test]
fn test_zero_object_id_rejected_on_load() {
    let resources = format!(r#"<object id="0">{}</object>"#, tetra_mesh_xml());
    let data = package_from_model(&model_xml(&resources, ""));
    let err = Model::from_reader(Cursor::new(data)).unwrap_err();
    assert!(err.to_string().contains("positive integer"));
}
