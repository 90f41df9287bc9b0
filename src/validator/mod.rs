//! Validation logic for 3MF models
//!
//! This module contains functions to validate 3MF models according to the
//! 3MF Core Specification requirements. Validation ensures that:
//! - All object IDs are positive
//! - Meshes of `model` and `solidsupport` objects are closed and consistently wound
//! - Components reference existing objects that are not of type `other`
//! - Component hierarchies contain no cycles
//! - Build items reference existing objects

mod core;

pub use core::{
    detect_circular_components, validate_acyclic_components, validate_build_references,
    validate_component_depth, validate_component_graph, validate_component_references,
    validate_mesh_geometry, validate_object_ids, validate_object_mesh,
};

use log::debug;

use crate::error::{Error, Result};
use crate::model::{Model, ParserConfig};

/// Validate a parsed 3MF model with every check enabled
///
/// Records the manifold and orientation flags on every mesh. Returns the
/// first failure.
pub fn validate_model(model: &mut Model) -> Result<()> {
    validate_model_with_config(model, &ParserConfig::new())
}

/// Validate a parsed 3MF model, running the checks enabled in `config`
pub fn validate_model_with_config(model: &mut Model, config: &ParserConfig) -> Result<()> {
    validate_object_ids(&model.resources)?;

    if config.validate_meshes() {
        validate_mesh_geometry(&mut model.resources)?;
    }

    validate_build_references(model)?;

    if config.validate_components() {
        validate_component_graph(&model.resources)?;
    }

    if let Some(limit) = config.max_component_depth() {
        validate_component_depth(&model.resources, limit)?;
    }

    debug!(
        "Validated model with {} objects and {} build items",
        model.resources.object_count(),
        model.build.items.len()
    );
    Ok(())
}

/// Run every check independently and collect all failures
///
/// Each object's mesh is validated on its own, so one bad mesh does not
/// hide problems in others. An empty result means the model is valid.
pub fn validate_model_report(model: &mut Model) -> Vec<Error> {
    let mut issues = Vec::new();

    if let Err(e) = validate_object_ids(&model.resources) {
        issues.push(e);
    }

    for object in model.resources.objects_mut() {
        if let Err(e) = validate_object_mesh(object) {
            issues.push(e);
        }
    }

    if let Err(e) = validate_build_references(model) {
        issues.push(e);
    }
    if let Err(e) = validate_component_references(&model.resources) {
        issues.push(e);
    }
    if let Err(e) = validate_acyclic_components(&model.resources) {
        issues.push(e);
    }

    debug!("Validation report found {} issue(s)", issues.len());
    issues
}
