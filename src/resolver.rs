//! Component hierarchy flattening
//!
//! An assembly object places other objects through components, each with an
//! optional transform. Flattening walks the hierarchy depth-first from a
//! root object and emits one mesh holding every leaf's triangles in world
//! space. Leaves appear in pre-order, left to right, so the output is
//! deterministic for a given graph.
//!
//! Mirroring transforms (negative determinant) reverse the winding of every
//! triangle they place. The resolver swaps the second and third corner of
//! those triangles so the emitted mesh keeps its outward orientation.

use log::trace;

use crate::error::{Error, Result};
use crate::model::{Mesh, Model, ObjectContent, ResourceGraph};
use crate::transform::AffineTransform;

/// Flattens component hierarchies of a borrowed [`ResourceGraph`]
///
/// The graph is never modified, so any number of resolvers may share it.
///
/// # Example
///
/// ```
/// use lib3mf_resolve::{
///     AffineTransform, Component, Mesh, Object, ResourceGraph, Triangle, Vertex,
///     resolver::Resolver,
/// };
///
/// let square = Mesh::new(
///     vec![
///         Vertex::new(0.0, 0.0, 0.0),
///         Vertex::new(1.0, 0.0, 0.0),
///         Vertex::new(1.0, 1.0, 0.0),
///         Vertex::new(0.0, 1.0, 0.0),
///     ],
///     vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)],
/// )
/// .unwrap();
///
/// let mut graph = ResourceGraph::new();
/// graph.add_object(Object::with_mesh(1, square)).unwrap();
/// graph
///     .add_object(Object::with_components(
///         2,
///         vec![Component::with_transform(1, "1 0 0 0 1 0 0 0 1 2 0 0")],
///     ))
///     .unwrap();
///
/// let flat = Resolver::new(&graph)
///     .flatten(2, &AffineTransform::identity())
///     .unwrap();
/// assert_eq!(flat.vertices()[0].x, 2.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    graph: &'a ResourceGraph,
    max_depth: Option<usize>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver without a depth ceiling
    pub fn new(graph: &'a ResourceGraph) -> Self {
        Self {
            graph,
            max_depth: None,
        }
    }

    /// Fail with [`Error::DepthLimitExceeded`] below `depth` component levels
    ///
    /// The root object is at depth 0.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Configured depth ceiling, if any
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Flatten the hierarchy rooted at `root_id` into one mesh
    ///
    /// `transform` places the root; pass the identity for object space.
    /// The validation flags of the result are left unset.
    ///
    /// # Errors
    ///
    /// - [`Error::ObjectNotFound`] if `root_id` is not in the graph
    /// - [`Error::DanglingReference`] for a component pointing at a missing object
    /// - [`Error::MalformedTransform`] for an unparsable component transform,
    ///   naming the object that owns the component
    /// - [`Error::CyclicReference`] if an object is reached from itself
    /// - [`Error::DepthLimitExceeded`] past the configured depth ceiling
    pub fn flatten(&self, root_id: usize, transform: &AffineTransform) -> Result<Mesh> {
        if !self.graph.contains_object(root_id) {
            return Err(Error::ObjectNotFound(root_id));
        }

        let mut output = Mesh::empty();
        let mut path = Vec::new();
        self.visit(root_id, transform, &mut path, &mut output)?;
        trace!(
            "Flattened object {} into {} vertices and {} triangles",
            root_id,
            output.vertex_count(),
            output.triangle_count()
        );
        Ok(output)
    }

    /// Flatten the hierarchy rooted at `root_id` into an existing mesh
    ///
    /// On error `output` is left exactly as it was passed in.
    pub fn flatten_into(
        &self,
        root_id: usize,
        transform: &AffineTransform,
        output: &mut Mesh,
    ) -> Result<()> {
        if !self.graph.contains_object(root_id) {
            return Err(Error::ObjectNotFound(root_id));
        }

        let (vertices, triangles) = (output.vertex_count(), output.triangle_count());
        let mut path = Vec::new();
        let result = self.visit(root_id, transform, &mut path, output);
        if result.is_err() {
            output.truncate(vertices, triangles);
        }
        result
    }

    fn visit(
        &self,
        object_id: usize,
        transform: &AffineTransform,
        path: &mut Vec<usize>,
        output: &mut Mesh,
    ) -> Result<()> {
        if let Some(cycle_start) = path.iter().position(|&id| id == object_id) {
            let mut cycle = path[cycle_start..].to_vec();
            cycle.push(object_id);
            return Err(Error::CyclicReference {
                object_id,
                path: cycle,
            });
        }

        if let Some(limit) = self.max_depth
            && path.len() > limit
        {
            return Err(Error::DepthLimitExceeded { object_id, limit });
        }

        // Missing roots are caught in flatten, so this is always a component target
        let object = self.graph.object(object_id).ok_or(Error::DanglingReference {
            parent: path.last().copied().unwrap_or(object_id),
            missing: object_id,
        })?;

        match &object.content {
            ObjectContent::Mesh(mesh) => {
                trace!(
                    "Placing mesh of object {} at depth {} (mirrored: {})",
                    object_id,
                    path.len(),
                    transform.is_mirroring()
                );
                append_transformed(output, mesh, transform);
            }
            ObjectContent::Components(components) => {
                path.push(object_id);
                for component in components {
                    let local = component
                        .parsed_transform()
                        .map_err(|e| e.with_transform_owner(object_id))?;
                    let child_transform = transform.compose(&local);
                    self.visit(component.objectid, &child_transform, path, output)?;
                }
                path.pop();
            }
        }

        Ok(())
    }
}

/// Append `source` to `output`, mapping vertices through `transform`
///
/// Triangle indices are shifted past the vertices already in `output`.
/// A mirroring transform flips the winding of every appended triangle.
fn append_transformed(output: &mut Mesh, source: &Mesh, transform: &AffineTransform) {
    let offset = output.vertex_count();
    let mirrored = transform.is_mirroring();

    for vertex in source.vertices() {
        output.push_vertex(transform.apply_vertex(vertex));
    }

    for triangle in source.triangles() {
        let mut placed = if mirrored {
            triangle.flipped()
        } else {
            triangle.clone()
        };
        placed.v1 += offset;
        placed.v2 += offset;
        placed.v3 += offset;
        output.push_triangle(placed);
    }
}

/// Flatten the hierarchy rooted at `root_id`, placing the root with `transform`
///
/// Shorthand for [`Resolver::flatten`] without a depth ceiling.
pub fn flatten(root_id: usize, graph: &ResourceGraph, transform: &AffineTransform) -> Result<Mesh> {
    Resolver::new(graph).flatten(root_id, transform)
}

/// Flatten every build item of a model into one mesh
///
/// Items are placed in document order, each seeded with its own transform.
pub fn flatten_build(model: &Model) -> Result<Mesh> {
    flatten_build_with(&Resolver::new(&model.resources), model)
}

/// Flatten every build item of a model using a configured resolver
pub fn flatten_build_with(resolver: &Resolver<'_>, model: &Model) -> Result<Mesh> {
    let mut output = Mesh::empty();
    for item in &model.build.items {
        resolver.flatten_into(item.objectid, &item.transform, &mut output)?;
    }
    Ok(output)
}
