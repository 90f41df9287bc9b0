//! # lib3mf-resolve
//!
//! Load, validate and flatten the resource graph of 3MF (3D Manufacturing
//! Format) documents.
//!
//! A 3MF model describes objects that are either triangle meshes or
//! assemblies placing other objects through affine transforms. This crate
//! reads the OPC/ZIP container and the model XML, checks meshes for closed
//! and consistently wound geometry, checks the component graph for dangling
//! references and cycles, and resolves any object into a single mesh in
//! world coordinates.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Parse the 3MF package structure (ZIP/OPC container)
//! - Manifold and winding validation per object type
//! - Component graph validation with cycle paths in the error
//! - Component flattening with winding correction under mirroring transforms
//!
//! ## Example
//!
//! ```no_run
//! use lib3mf_resolve::Model;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("model.3mf")?;
//! let model = Model::from_reader(file)?;
//!
//! let mesh = lib3mf_resolve::flatten_build(&model)?;
//! println!("Build plate holds {} triangles", mesh.triangle_count());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod mesh_ops;
pub mod model;
pub mod opc;
pub mod parser;
pub mod resolver;
pub mod transform;
pub mod validator;

pub use error::{Error, Result};
pub use model::{
    BaseMaterial, BaseMaterialsGroup, Build, BuildItem, Component, ExtensionAttributes, Mesh,
    MetadataEntry, Model, Object, ObjectContent, ObjectType, ParserConfig, ResourceGraph,
    Triangle, Vertex,
};
pub use resolver::{Resolver, flatten, flatten_build};
pub use transform::AffineTransform;

use std::io::{Read, Seek};

use log::debug;

impl Model {
    /// Load and validate a 3MF file from a reader
    ///
    /// Uses the default [`ParserConfig`], which runs every validation pass.
    ///
    /// # Arguments
    ///
    /// * `reader` - A reader containing the 3MF file data
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lib3mf_resolve::Model;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = File::open("model.3mf")?;
    /// let model = Model::from_reader(file)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_reader_with_config(reader, ParserConfig::new())
    }

    /// Load a 3MF file from a reader with custom configuration
    ///
    /// The package is opened, the primary model part is parsed, and the
    /// validation passes enabled in `config` run before the model is
    /// returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lib3mf_resolve::{Model, ParserConfig};
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = File::open("model.3mf")?;
    ///
    /// // Accept open surfaces, but refuse hierarchies deeper than 8 levels
    /// let config = ParserConfig::new()
    ///     .with_mesh_validation(false)
    ///     .with_max_component_depth(8);
    ///
    /// let model = Model::from_reader_with_config(file, config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader_with_config<R: Read + Seek>(reader: R, config: ParserConfig) -> Result<Self> {
        let mut package = opc::Package::open(reader)?;
        debug!("Reading model part {}", package.primary_model_path());

        let model_xml = package.get_model()?;
        let mut model = parser::parse_model_xml_with_config(&model_xml, &config)?;
        validator::validate_model_with_config(&mut model, &config)?;
        Ok(model)
    }
}
