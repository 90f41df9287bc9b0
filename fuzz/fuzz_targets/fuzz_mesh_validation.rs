#![no_main]

use libfuzzer_sys::arbitrary::{Arbitrary, Result, Unstructured};
use libfuzzer_sys::fuzz_target;
use lib3mf_resolve::{Mesh, ObjectType, Triangle, Vertex, mesh_ops};

#[derive(Debug)]
struct FuzzMesh {
    vertices: Vec<(f64, f64, f64)>,
    triangles: Vec<(usize, usize, usize)>,
    solid: bool,
}

impl<'a> Arbitrary<'a> for FuzzMesh {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let vertex_count = u.int_in_range(0..=100)?;
        let mut vertices = Vec::new();
        for _ in 0..vertex_count {
            vertices.push((u.arbitrary()?, u.arbitrary()?, u.arbitrary()?));
        }

        // Indices may run one past the end so Mesh::new rejections are covered
        let triangle_count = u.int_in_range(0..=50)?;
        let mut triangles = Vec::new();
        for _ in 0..triangle_count {
            let v1 = u.int_in_range(0..=vertex_count)?;
            let v2 = u.int_in_range(0..=vertex_count)?;
            let v3 = u.int_in_range(0..=vertex_count)?;
            triangles.push((v1, v2, v3));
        }

        Ok(FuzzMesh {
            vertices,
            triangles,
            solid: u.arbitrary()?,
        })
    }
}

fuzz_target!(|data: FuzzMesh| {
    let vertices = data
        .vertices
        .iter()
        .map(|&(x, y, z)| Vertex::new(x, y, z))
        .collect();
    let triangles = data
        .triangles
        .iter()
        .map(|&(a, b, c)| Triangle::new(a, b, c))
        .collect();

    let Ok(mut mesh) = Mesh::new(vertices, triangles) else {
        return;
    };

    let object_type = if data.solid {
        ObjectType::Model
    } else {
        ObjectType::Surface
    };
    let result = mesh_ops::validate_mesh(&mut mesh, object_type);

    // Flags are only set when the checks actually ran
    if result.is_ok() && !mesh.is_empty() {
        assert!(mesh.is_manifold().is_some());
    }

    let _ = mesh_ops::compute_mesh_signed_volume(&mesh);
    let _ = mesh_ops::compute_mesh_aabb(&mesh);
});
