//! Mesh validation through the public API

#[path = "../common/mod.rs"]
mod common;

use common::{TETRA_TRIANGLES, TETRA_VERTICES, mesh_xml, model_xml};
use lib3mf_resolve::mesh_ops::{
    compute_mesh_aabb, compute_mesh_signed_volume, face_normal, has_consistent_orientation,
    is_manifold_edges, validate_mesh,
};
use lib3mf_resolve::parser::parse_model_xml;
use lib3mf_resolve::validator::validate_model;
use lib3mf_resolve::{Error, Mesh, ObjectType, Triangle, Vertex};

fn tetra_vertices() -> Vec<Vertex> {
    TETRA_VERTICES
        .iter()
        .map(|&(x, y, z)| Vertex::new(x, y, z))
        .collect()
}

fn mesh_of(triangles: &[(usize, usize, usize)]) -> Mesh {
    let triangles = triangles
        .iter()
        .map(|&(a, b, c)| Triangle::new(a, b, c))
        .collect();
    Mesh::new(tetra_vertices(), triangles).unwrap()
}

#[test]
fn test_closed_tetrahedron_is_valid() {
    let mut mesh = mesh_of(&TETRA_TRIANGLES);
    validate_mesh(&mut mesh, ObjectType::Model).unwrap();
    assert_eq!(mesh.is_manifold(), Some(true));
    assert_eq!(mesh.has_consistent_orientation(), Some(true));
    assert!(compute_mesh_signed_volume(&mesh) > 0.0);
}

#[test]
fn test_flipping_one_face_breaks_winding_only() {
    let mut mesh = mesh_of(&[(0, 2, 1), (0, 1, 3), (1, 2, 3), (0, 2, 3)]);
    assert!(is_manifold_edges(&mesh));
    assert!(!has_consistent_orientation(&mesh));

    let err = validate_mesh(&mut mesh, ObjectType::Model).unwrap_err();
    assert!(matches!(err, Error::InconsistentWinding { .. }));
    assert_eq!(mesh.is_manifold(), Some(true));
    assert_eq!(mesh.has_consistent_orientation(), Some(false));
}

#[test]
fn test_listed_tetrahedron_windings() {
    // Edge 0→1 runs the same way in the first two faces of both lists
    let mut listed = mesh_of(&[(0, 1, 2), (0, 1, 3), (1, 2, 3), (0, 2, 3)]);
    assert!(matches!(
        validate_mesh(&mut listed, ObjectType::Model),
        Err(Error::InconsistentWinding {
            object_type: ObjectType::Model
        })
    ));
    assert_eq!(listed.is_manifold(), Some(true));
    assert_eq!(listed.has_consistent_orientation(), Some(false));

    let mut last_face_swapped = mesh_of(&[(0, 1, 2), (0, 1, 3), (1, 2, 3), (0, 3, 2)]);
    assert!(matches!(
        validate_mesh(&mut last_face_swapped, ObjectType::Model),
        Err(Error::InconsistentWinding {
            object_type: ObjectType::Model
        })
    ));
    assert_eq!(last_face_swapped.is_manifold(), Some(true));
    assert_eq!(last_face_swapped.has_consistent_orientation(), Some(false));
}

#[test]
fn test_open_mesh_rejected_for_solids_only() {
    let open = [(0, 2, 1), (0, 1, 3), (1, 2, 3)];

    let mut mesh = mesh_of(&open);
    assert!(matches!(
        validate_mesh(&mut mesh, ObjectType::SolidSupport),
        Err(Error::NonManifoldGeometry { .. })
    ));

    for lenient in [ObjectType::Support, ObjectType::Surface, ObjectType::Other] {
        let mut mesh = mesh_of(&open);
        validate_mesh(&mut mesh, lenient).unwrap();
        assert_eq!(mesh.is_manifold(), Some(false));
        assert_eq!(mesh.has_consistent_orientation(), Some(false));
    }
}

#[test]
fn test_model_needs_four_triangles() {
    let mut mesh = mesh_of(&[(0, 1, 2)]);
    assert!(matches!(
        validate_mesh(&mut mesh, ObjectType::Model),
        Err(Error::InsufficientGeometry(_))
    ));
    assert_eq!(mesh.is_manifold(), None);

    let mut placeholder = Mesh::new(Vec::new(), Vec::new()).unwrap();
    validate_mesh(&mut placeholder, ObjectType::Model).unwrap();
    assert_eq!(placeholder.is_manifold(), Some(true));
}

#[test]
fn test_malformed_triangles() {
    let repeated = Mesh::new(tetra_vertices(), vec![Triangle::new(1, 1, 2)]);
    assert!(matches!(repeated, Err(Error::MalformedTriangle { index: 0, .. })));

    let out_of_range = Mesh::new(
        tetra_vertices(),
        vec![Triangle::new(0, 1, 2), Triangle::new(0, 1, 4)],
    );
    match out_of_range {
        Err(Error::MalformedTriangle {
            index,
            v3,
            vertex_count,
            ..
        }) => {
            assert_eq!(index, 1);
            assert_eq!(v3, 4);
            assert_eq!(vertex_count, 4);
        }
        other => panic!("expected malformed triangle, got {other:?}"),
    }
}

#[test]
fn test_face_normal_and_bounds() {
    let v = tetra_vertices();
    let n = face_normal(&v[0], &v[1], &v[2]).unwrap();
    assert!((n.z - 1.0).abs() < 1e-12);
    assert!(matches!(
        face_normal(&v[0], &v[1], &v[1]),
        Err(Error::DegenerateTriangle)
    ));

    let (min, max) = compute_mesh_aabb(&mesh_of(&TETRA_TRIANGLES)).unwrap();
    assert_eq!(min, (0.0, 0.0, 0.0));
    assert_eq!(max, (1.0, 1.0, 1.0));
}

#[test]
fn test_model_validation_uses_object_type() {
    let open = mesh_xml(&TETRA_VERTICES, &[(0, 2, 1), (0, 1, 3), (1, 2, 3)]);
    let resources = format!(
        r#"<object id="1" type="support">{open}</object><object id="2" type="model">{open}</object>"#
    );
    let mut model = parse_model_xml(&model_xml(&resources, "")).unwrap();

    let err = validate_model(&mut model).unwrap_err();
    assert!(
        matches!(err, Error::InsufficientGeometry(_)),
        "three triangles cannot close a model object: {err}"
    );

    let support = model.resources.object(1).and_then(|o| o.mesh()).unwrap();
    assert_eq!(support.is_manifold(), Some(false));
}
