//! Data structures representing 3MF models

mod core;
mod extension;
mod material;

// Re-export all public types from core module
pub use core::{
    Build, BuildItem, Component, Mesh, MetadataEntry, Model, Object, ObjectContent, ObjectType,
    ParserConfig, ResourceGraph, Triangle, Vertex,
};

pub use extension::ExtensionAttributes;

pub use material::{BaseMaterial, BaseMaterialsGroup};
