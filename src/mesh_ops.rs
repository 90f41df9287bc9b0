//! Triangle mesh operations
//!
//! This module provides geometric checks and measurements on triangle meshes:
//! - Face normals
//! - Manifold edge and winding consistency checks
//! - Per object type mesh validation
//! - Signed volume and bounding box calculation

use std::collections::{HashMap, HashSet};

use log::debug;
use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::model::{Mesh, ObjectType, Vertex};

/// A 3D point represented as (x, y, z)
pub type Point3d = (f64, f64, f64);

/// An axis-aligned bounding box represented as (min_point, max_point)
pub type BoundingBox = (Point3d, Point3d);

/// Smallest triangle count for a closed `model` solid
const MIN_SOLID_TRIANGLES: usize = 4;

fn to_vector(v: &Vertex) -> Vector3<f64> {
    Vector3::new(v.x, v.y, v.z)
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Calculate the unit normal of the triangle `(a, b, c)`
///
/// The normal is `(b - a) × (c - a)` normalized, so it follows the
/// right-hand rule for the given winding.
///
/// # Errors
///
/// [`Error::DegenerateTriangle`] when the three points are collinear or
/// coincident.
///
/// # Example
/// ```
/// use lib3mf_resolve::{Vertex, mesh_ops::face_normal};
///
/// let n = face_normal(
///     &Vertex::new(0.0, 0.0, 0.0),
///     &Vertex::new(1.0, 0.0, 0.0),
///     &Vertex::new(0.0, 1.0, 0.0),
/// )
/// .unwrap();
/// assert_eq!(n.z, 1.0);
/// ```
pub fn face_normal(a: &Vertex, b: &Vertex, c: &Vertex) -> Result<Vector3<f64>> {
    let a = to_vector(a);
    let cross = (to_vector(b) - a).cross(&(to_vector(c) - a));
    let magnitude = cross.norm();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Err(Error::DegenerateTriangle);
    }
    Ok(cross / magnitude)
}

/// Count how many triangles use each undirected edge
fn edge_counts(mesh: &Mesh) -> HashMap<(usize, usize), usize> {
    // Closed meshes have 1.5 edges per triangle
    let mut counts = HashMap::with_capacity(mesh.triangle_count() * 2);
    for triangle in mesh.triangles() {
        for (a, b) in triangle.edges() {
            *counts.entry(edge_key(a, b)).or_insert(0) += 1;
        }
    }
    counts
}

/// Check that every edge is shared by exactly two triangles
///
/// Edges are compared without direction. An edge used once (a hole) or
/// three or more times (a fin or T-junction) makes the mesh non-manifold.
/// A mesh without triangles is manifold.
pub fn is_manifold_edges(mesh: &Mesh) -> bool {
    edge_counts(mesh).values().all(|&count| count == 2)
}

/// Check that adjacent triangles agree on winding
///
/// Each triangle walks its edges as `v1→v2`, `v2→v3`, `v3→v1`. Two
/// triangles sharing an edge are consistently wound when they walk it in
/// opposite directions. Non-manifold meshes are never consistent.
pub fn has_consistent_orientation(mesh: &Mesh) -> bool {
    if !is_manifold_edges(mesh) {
        return false;
    }

    // With every edge shared by exactly two triangles, a repeated directed
    // edge means both neighbours walk it the same way.
    let mut directed: HashSet<(usize, usize)> = HashSet::with_capacity(mesh.triangle_count() * 3);
    mesh.triangles()
        .iter()
        .flat_map(|t| t.edges())
        .all(|edge| directed.insert(edge))
}

/// Validate a mesh against the rules for its object type
///
/// Records the manifold and orientation flags on the mesh. `model` and
/// `solidsupport` meshes with triangles must be manifold and consistently
/// wound. Other types keep the flags without failing.
///
/// # Errors
///
/// - [`Error::InsufficientGeometry`] when triangles exist with fewer than
///   3 vertices, or a `model` mesh has 1 to 3 triangles
/// - [`Error::NonManifoldGeometry`] for an open or over-shared solid
/// - [`Error::InconsistentWinding`] for a solid with flipped faces
pub fn validate_mesh(mesh: &mut Mesh, object_type: ObjectType) -> Result<()> {
    let triangle_count = mesh.triangle_count();

    if triangle_count > 0 && mesh.vertex_count() < 3 {
        return Err(Error::InsufficientGeometry(format!(
            "mesh has {} triangle(s) but only {} vertices (at least 3 required)",
            triangle_count,
            mesh.vertex_count()
        )));
    }

    if object_type == ObjectType::Model && (1..MIN_SOLID_TRIANGLES).contains(&triangle_count) {
        return Err(Error::InsufficientGeometry(format!(
            "object of type 'model' has {} triangle(s); a closed solid needs at least {}",
            triangle_count, MIN_SOLID_TRIANGLES
        )));
    }

    let manifold = is_manifold_edges(mesh);
    let consistent = manifold && has_consistent_orientation(mesh);
    mesh.set_validation_flags(manifold, consistent);

    if triangle_count == 0 {
        return Ok(());
    }

    if object_type.requires_solid() {
        if !manifold {
            return Err(Error::NonManifoldGeometry { object_type });
        }
        if !consistent {
            return Err(Error::InconsistentWinding { object_type });
        }
    } else if !manifold || !consistent {
        debug!(
            "Accepting {} mesh with {} triangles (manifold: {}, consistent winding: {})",
            object_type, triangle_count, manifold, consistent
        );
    }

    Ok(())
}

/// Compute the signed volume of a mesh using the divergence theorem
///
/// For a closed mesh with outward winding the volume is positive. Negative
/// volume indicates inverted triangles. Empty meshes have zero volume.
pub fn compute_mesh_signed_volume(mesh: &Mesh) -> f64 {
    let vertices = mesh.vertices();
    let volume: f64 = mesh
        .triangles()
        .iter()
        .map(|t| {
            let a = to_vector(&vertices[t.v1]);
            let b = to_vector(&vertices[t.v2]);
            let c = to_vector(&vertices[t.v3]);
            a.dot(&b.cross(&c))
        })
        .sum();
    volume / 6.0
}

/// Compute the axis-aligned bounding box (AABB) of a mesh
///
/// Returns the minimum and maximum corners over all vertices.
///
/// # Errors
///
/// [`Error::InvalidModel`] if the mesh has no vertices.
pub fn compute_mesh_aabb(mesh: &Mesh) -> Result<BoundingBox> {
    let (first, rest) = mesh.vertices().split_first().ok_or_else(|| {
        Error::InvalidModel("Cannot compute bounding box of empty mesh".to_string())
    })?;

    let mut min = (first.x, first.y, first.z);
    let mut max = min;
    for v in rest {
        min = (min.0.min(v.x), min.1.min(v.y), min.2.min(v.z));
        max = (max.0.max(v.x), max.1.max(v.y), max.2.max(v.z));
    }
    Ok((min, max))
}
