//! Core validation functions for 3MF resource graphs

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::{Error, Result};
use crate::mesh_ops;
use crate::model::{Model, Object, ObjectType, ResourceGraph};

/// Validates that all object IDs are positive integers
pub fn validate_object_ids(graph: &ResourceGraph) -> Result<()> {
    if graph.contains_object(0) {
        return Err(Error::InvalidModel(
            "Object ID must be a positive integer, got 0. \
             Object IDs must be greater than zero."
                .to_string(),
        ));
    }
    Ok(())
}

/// Validates the mesh of a single object against its object type
pub fn validate_object_mesh(object: &mut Object) -> Result<()> {
    let object_id = object.id;
    let object_type = object.object_type;
    if let Some(mesh) = object.mesh_mut() {
        mesh_ops::validate_mesh(mesh, object_type).inspect_err(|e| {
            debug!("Object {}: mesh validation failed: {}", object_id, e);
        })?;
    }
    Ok(())
}

/// Validates mesh geometry for all objects in the graph
///
/// Stops at the first failing object, in ascending ID order.
pub fn validate_mesh_geometry(graph: &mut ResourceGraph) -> Result<()> {
    for object in graph.objects_mut() {
        validate_object_mesh(object)?;
    }
    Ok(())
}

/// Validates that all build items reference usable objects
pub fn validate_build_references(model: &Model) -> Result<()> {
    for (item_idx, item) in model.build.items.iter().enumerate() {
        let object = model
            .resources
            .object(item.objectid)
            .ok_or(Error::ObjectNotFound(item.objectid))?;

        if object.object_type == ObjectType::Other {
            return Err(Error::InvalidModel(format!(
                "Build item {} references object {} of type 'other'. \
                 Objects of type 'other' cannot be built.",
                item_idx, item.objectid
            )));
        }
    }
    Ok(())
}

/// Validates that every component references an existing object that is not of type `other`
pub fn validate_component_references(graph: &ResourceGraph) -> Result<()> {
    for object in graph.objects() {
        for component in object.components() {
            let target = graph
                .object(component.objectid)
                .ok_or(Error::DanglingReference {
                    parent: object.id,
                    missing: component.objectid,
                })?;

            if target.object_type == ObjectType::Other {
                return Err(Error::ForbiddenReferenceType {
                    parent: object.id,
                    target: target.id,
                });
            }
        }
    }
    Ok(())
}

/// Validates that following component references never leads back to an ancestor
///
/// Every assembly is used as a starting point. Diamond shaped sharing, where
/// two branches place the same object, is not a cycle.
pub fn validate_acyclic_components(graph: &ResourceGraph) -> Result<()> {
    let mut acyclic = HashSet::new();
    for object in graph.objects().filter(|o| o.is_assembly()) {
        let mut path = Vec::new();
        if let Some(cycle_path) =
            detect_circular_components(object.id, graph, &mut path, &mut acyclic)
        {
            let object_id = cycle_path[0];
            return Err(Error::CyclicReference {
                object_id,
                path: cycle_path,
            });
        }
    }
    Ok(())
}

/// Validates references and acyclicity of the component graph
pub fn validate_component_graph(graph: &ResourceGraph) -> Result<()> {
    validate_component_references(graph)?;
    validate_acyclic_components(graph)
}

/// Detects circular component references using depth-first search
///
/// `path` holds the ancestors of `object_id` on the current branch only.
/// `acyclic` collects objects whose whole subtree has been explored without
/// finding a cycle, so shared subtrees are walked once.
///
/// Returns the cycle, starting and ending at the revisited object.
pub fn detect_circular_components(
    object_id: usize,
    graph: &ResourceGraph,
    path: &mut Vec<usize>,
    acyclic: &mut HashSet<usize>,
) -> Option<Vec<usize>> {
    // If this object is already in the current path, we have a cycle
    if let Some(cycle_start) = path.iter().position(|&id| id == object_id) {
        let mut cycle_path = path[cycle_start..].to_vec();
        cycle_path.push(object_id);
        return Some(cycle_path);
    }

    if acyclic.contains(&object_id) {
        return None;
    }

    // Dangling references are reported by validate_component_references
    let object = graph.object(object_id)?;

    path.push(object_id);
    for component in object.components() {
        if let Some(cycle) = detect_circular_components(component.objectid, graph, path, acyclic)
        {
            return Some(cycle);
        }
    }
    path.pop();

    acyclic.insert(object_id);
    None
}

/// Validates that no component hierarchy nests deeper than `limit`
///
/// A leaf object has depth 0 and each component level adds one. Cycles are
/// reported as [`Error::CyclicReference`] before depths are measured.
pub fn validate_component_depth(graph: &ResourceGraph, limit: usize) -> Result<()> {
    validate_acyclic_components(graph)?;

    let mut heights = HashMap::new();
    for object in graph.objects().filter(|o| o.is_assembly()) {
        if hierarchy_height(object.id, graph, &mut heights) > limit {
            let object_id = object_at_depth(object.id, graph, &heights, limit + 1);
            return Err(Error::DepthLimitExceeded { object_id, limit });
        }
    }
    Ok(())
}

fn hierarchy_height(
    object_id: usize,
    graph: &ResourceGraph,
    heights: &mut HashMap<usize, usize>,
) -> usize {
    if let Some(&height) = heights.get(&object_id) {
        return height;
    }

    let height = match graph.object(object_id) {
        Some(object) if object.is_assembly() => {
            1 + object
                .components()
                .iter()
                .map(|c| hierarchy_height(c.objectid, graph, heights))
                .max()
                .unwrap_or(0)
        }
        _ => 0,
    };
    heights.insert(object_id, height);
    height
}

/// Follow the deepest branch from `root` for `depth` levels
fn object_at_depth(
    root: usize,
    graph: &ResourceGraph,
    heights: &HashMap<usize, usize>,
    depth: usize,
) -> usize {
    let mut current = root;
    for _ in 0..depth {
        let deepest = graph.object(current).and_then(|object| {
            object
                .components()
                .iter()
                .map(|c| c.objectid)
                .max_by_key(|id| heights.get(id).copied().unwrap_or(0))
        });
        match deepest {
            Some(child) => current = child,
            None => break,
        }
    }
    current
}
