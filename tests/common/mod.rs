//! Shared helpers for integration tests
//!
//! Builds model XML snippets and in-memory 3MF packages so tests do not
//! depend on files checked into the repository.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CORE_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

pub const CONTENT_TYPES: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"##;

pub const RELS: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"##;

/// Tetrahedron vertices used throughout the tests
pub const TETRA_VERTICES: [(f64, f64, f64); 4] = [
    (0.0, 0.0, 0.0),
    (1.0, 0.0, 0.0),
    (0.0, 1.0, 0.0),
    (0.0, 0.0, 1.0),
];

/// Outward-facing winding of the tetrahedron
pub const TETRA_TRIANGLES: [(usize, usize, usize); 4] = [(0, 2, 1), (0, 1, 3), (1, 2, 3), (0, 3, 2)];

/// Render a `<mesh>` element
pub fn mesh_xml(vertices: &[(f64, f64, f64)], triangles: &[(usize, usize, usize)]) -> String {
    let mut xml = String::from("<mesh><vertices>");
    for (x, y, z) in vertices {
        xml.push_str(&format!(r#"<vertex x="{x}" y="{y}" z="{z}"/>"#));
    }
    xml.push_str("</vertices><triangles>");
    for (v1, v2, v3) in triangles {
        xml.push_str(&format!(r#"<triangle v1="{v1}" v2="{v2}" v3="{v3}"/>"#));
    }
    xml.push_str("</triangles></mesh>");
    xml
}

/// A closed, outward-wound tetrahedron mesh element
pub fn tetra_mesh_xml() -> String {
    mesh_xml(&TETRA_VERTICES, &TETRA_TRIANGLES)
}

/// Render a `<component>` element
pub fn component_xml(objectid: usize, transform: Option<&str>) -> String {
    match transform {
        Some(t) => format!(r#"<component objectid="{objectid}" transform="{t}"/>"#),
        None => format!(r#"<component objectid="{objectid}"/>"#),
    }
}

/// Wrap resources and build content in a model element
pub fn model_xml(resources: &str, build: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="{CORE_NS}">
  <resources>{resources}</resources>
  <build>{build}</build>
</model>"#
    )
}

/// Create a 3MF package in memory from arbitrary parts
pub fn package_from_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Create a 3MF package in memory holding the given model XML
pub fn package_from_model(model_xml: &str) -> Vec<u8> {
    package_from_parts(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("3D/3dmodel.model", model_xml),
    ])
}
