//! Core 3MF types and structures

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::transform::AffineTransform;

use super::extension::ExtensionAttributes;
use super::material::BaseMaterialsGroup;

/// Configuration for loading 3MF documents
///
/// Controls which validation passes run after parsing and how deep a
/// component hierarchy may nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    validate_meshes: bool,
    validate_components: bool,
    max_component_depth: Option<usize>,
    strict_attributes: bool,
}

impl ParserConfig {
    /// Create a configuration with every validation pass enabled and no depth ceiling
    pub fn new() -> Self {
        Self {
            validate_meshes: true,
            validate_components: true,
            max_component_depth: None,
            strict_attributes: true,
        }
    }

    /// Enable or disable manifold and winding checks on loaded meshes
    pub fn with_mesh_validation(mut self, enabled: bool) -> Self {
        self.validate_meshes = enabled;
        self
    }

    /// Enable or disable reference and cycle checks on the component graph
    pub fn with_component_validation(mut self, enabled: bool) -> Self {
        self.validate_components = enabled;
        self
    }

    /// Limit how many component levels may be nested below a root object
    ///
    /// # Example
    ///
    /// ```
    /// use lib3mf_resolve::ParserConfig;
    ///
    /// let config = ParserConfig::new().with_max_component_depth(16);
    /// assert_eq!(config.max_component_depth(), Some(16));
    /// ```
    pub fn with_max_component_depth(mut self, depth: usize) -> Self {
        self.max_component_depth = Some(depth);
        self
    }

    /// Reject unknown un-prefixed attributes on core elements
    ///
    /// Prefixed attributes from extension namespaces are always accepted and
    /// kept in [`ExtensionAttributes`].
    pub fn with_strict_attributes(mut self, strict: bool) -> Self {
        self.strict_attributes = strict;
        self
    }

    /// Whether mesh validation runs after parsing
    pub fn validate_meshes(&self) -> bool {
        self.validate_meshes
    }

    /// Whether component graph validation runs after parsing
    pub fn validate_components(&self) -> bool {
        self.validate_components
    }

    /// Configured component depth ceiling, if any
    pub fn max_component_depth(&self) -> Option<usize> {
        self.max_component_depth
    }

    /// Whether unknown core attributes are rejected
    pub fn strict_attributes(&self) -> bool {
        self.strict_attributes
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A 3D vertex with x, y, z coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A triangle defined by three vertex indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangle {
    /// Index of first vertex
    pub v1: usize,
    /// Index of second vertex
    pub v2: usize,
    /// Index of third vertex
    pub v3: usize,
    /// Optional property index for vertex 1
    pub p1: Option<usize>,
    /// Optional property index for vertex 2
    pub p2: Option<usize>,
    /// Optional property index for vertex 3
    pub p3: Option<usize>,
    /// Optional property group ID
    pub pid: Option<usize>,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self {
            v1,
            v2,
            v3,
            p1: None,
            p2: None,
            p3: None,
            pid: None,
        }
    }

    /// Create a new triangle with a property group ID
    pub fn with_material(v1: usize, v2: usize, v3: usize, pid: usize) -> Self {
        Self {
            pid: Some(pid),
            ..Self::new(v1, v2, v3)
        }
    }

    /// The three vertex indices in winding order
    pub fn indices(&self) -> [usize; 3] {
        [self.v1, self.v2, self.v3]
    }

    /// The three directed edges `v1→v2`, `v2→v3`, `v3→v1`
    pub fn edges(&self) -> [(usize, usize); 3] {
        [(self.v1, self.v2), (self.v2, self.v3), (self.v3, self.v1)]
    }

    /// Same triangle with the opposite winding
    ///
    /// Swaps the second and third corners together with their property
    /// indices. `pid` is left untouched.
    pub fn flipped(&self) -> Self {
        Self {
            v1: self.v1,
            v2: self.v3,
            v3: self.v2,
            p1: self.p1,
            p2: self.p3,
            p3: self.p2,
            pid: self.pid,
        }
    }
}

/// A 3D mesh containing vertices and triangles
///
/// Every triangle's indices are distinct and in range for the vertex list.
/// The manifold and orientation flags are `None` until the mesh has been
/// validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    is_manifold: Option<bool>,
    has_consistent_orientation: Option<bool>,
}

impl Mesh {
    /// Create a mesh, checking every triangle against the vertex list
    ///
    /// # Example
    ///
    /// ```
    /// use lib3mf_resolve::{Mesh, Triangle, Vertex};
    ///
    /// let vertices = vec![
    ///     Vertex::new(0.0, 0.0, 0.0),
    ///     Vertex::new(1.0, 0.0, 0.0),
    ///     Vertex::new(0.0, 1.0, 0.0),
    /// ];
    /// assert!(Mesh::new(vertices.clone(), vec![Triangle::new(0, 1, 2)]).is_ok());
    /// assert!(Mesh::new(vertices, vec![Triangle::new(0, 1, 3)]).is_err());
    /// ```
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Result<Self> {
        let vertex_count = vertices.len();
        for (index, t) in triangles.iter().enumerate() {
            let out_of_range = t.v1 >= vertex_count || t.v2 >= vertex_count || t.v3 >= vertex_count;
            let repeated = t.v1 == t.v2 || t.v2 == t.v3 || t.v1 == t.v3;
            if out_of_range || repeated {
                return Err(Error::MalformedTriangle {
                    index,
                    v1: t.v1,
                    v2: t.v2,
                    v3: t.v3,
                    vertex_count,
                });
            }
        }

        Ok(Self {
            vertices,
            triangles,
            is_manifold: None,
            has_consistent_orientation: None,
        })
    }

    /// Create an empty mesh
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an empty mesh with pre-allocated capacity
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
            is_manifold: None,
            has_consistent_orientation: None,
        }
    }

    /// Vertices in input order
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangles in input order
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the mesh has no vertices and no triangles
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.triangles.is_empty()
    }

    /// Whether every edge is shared by exactly two triangles, once validated
    pub fn is_manifold(&self) -> Option<bool> {
        self.is_manifold
    }

    /// Whether adjacent triangles agree on winding, once validated
    pub fn has_consistent_orientation(&self) -> Option<bool> {
        self.has_consistent_orientation
    }

    pub(crate) fn set_validation_flags(&mut self, is_manifold: bool, consistent: bool) {
        self.is_manifold = Some(is_manifold);
        self.has_consistent_orientation = Some(consistent);
    }

    pub(crate) fn push_vertex(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub(crate) fn push_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Drop everything past the first `vertices` vertices and `triangles` triangles
    pub(crate) fn truncate(&mut self, vertices: usize, triangles: usize) {
        self.vertices.truncate(vertices);
        self.triangles.truncate(triangles);
    }
}

/// Type of 3D object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectType {
    /// A standard model object
    #[default]
    Model,
    /// A support structure
    Support,
    /// A solid support structure
    SolidSupport,
    /// A surface object
    Surface,
    /// Other types
    Other,
}

impl ObjectType {
    /// Attribute value used in 3MF markup
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Model => "model",
            ObjectType::Support => "support",
            ObjectType::SolidSupport => "solidsupport",
            ObjectType::Surface => "surface",
            ObjectType::Other => "other",
        }
    }

    /// Types whose meshes must be closed, consistently wound solids
    pub fn requires_solid(&self) -> bool {
        matches!(self, ObjectType::Model | ObjectType::SolidSupport)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "model" => Ok(ObjectType::Model),
            "support" => Ok(ObjectType::Support),
            "solidsupport" => Ok(ObjectType::SolidSupport),
            "surface" => Ok(ObjectType::Surface),
            "other" => Ok(ObjectType::Other),
            _ => Err(Error::InvalidXml(format!(
                "Invalid object type '{}'. Must be one of: model, support, solidsupport, surface, other",
                s
            ))),
        }
    }
}

/// A reference from an assembly to another object
///
/// The transform is kept as written in the document and parsed when the
/// hierarchy is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// ID of the referenced object
    pub objectid: usize,
    /// Optional transform text (12 numbers, row-major 4x3)
    pub transform: Option<String>,
    /// Extension attributes carried through untouched
    pub extensions: ExtensionAttributes,
}

impl Component {
    /// Create a new component with the given object reference
    pub fn new(objectid: usize) -> Self {
        Self {
            objectid,
            transform: None,
            extensions: ExtensionAttributes::new(),
        }
    }

    /// Create a new component with a transform string
    pub fn with_transform(objectid: usize, transform: impl Into<String>) -> Self {
        Self {
            transform: Some(transform.into()),
            ..Self::new(objectid)
        }
    }

    /// Parse the component transform, identity when absent
    pub fn parsed_transform(&self) -> Result<AffineTransform> {
        AffineTransform::from_attribute(self.transform.as_deref())
    }
}

/// Geometry carried by an object: either a mesh or a list of components
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectContent {
    /// A leaf object with its own triangles
    Mesh(Mesh),
    /// An assembly placing other objects
    Components(Vec<Component>),
}

/// A 3D object resource
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Object ID
    pub id: usize,
    /// Type of object
    pub object_type: ObjectType,
    /// Object name (optional)
    pub name: Option<String>,
    /// Part number (optional)
    pub partnumber: Option<String>,
    /// Optional default property group ID
    pub pid: Option<usize>,
    /// Optional default property index
    pub pindex: Option<usize>,
    /// Optional thumbnail part path
    pub thumbnail: Option<String>,
    /// Mesh or components
    pub content: ObjectContent,
    /// Extension attributes carried through untouched
    pub extensions: ExtensionAttributes,
}

impl Object {
    /// Create a new object of type `model`
    pub fn new(id: usize, content: ObjectContent) -> Self {
        Self {
            id,
            object_type: ObjectType::Model,
            name: None,
            partnumber: None,
            pid: None,
            pindex: None,
            thumbnail: None,
            content,
            extensions: ExtensionAttributes::new(),
        }
    }

    /// Create a mesh-bearing object
    pub fn with_mesh(id: usize, mesh: Mesh) -> Self {
        Self::new(id, ObjectContent::Mesh(mesh))
    }

    /// Create an assembly object
    pub fn with_components(id: usize, components: Vec<Component>) -> Self {
        Self::new(id, ObjectContent::Components(components))
    }

    /// Set the object type
    pub fn of_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = object_type;
        self
    }

    /// The mesh, if this is a leaf object
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.content {
            ObjectContent::Mesh(mesh) => Some(mesh),
            ObjectContent::Components(_) => None,
        }
    }

    /// Mutable access to the mesh, if this is a leaf object
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.content {
            ObjectContent::Mesh(mesh) => Some(mesh),
            ObjectContent::Components(_) => None,
        }
    }

    /// The components, empty for leaf objects
    pub fn components(&self) -> &[Component] {
        match &self.content {
            ObjectContent::Mesh(_) => &[],
            ObjectContent::Components(components) => components,
        }
    }

    /// True when this object places other objects
    pub fn is_assembly(&self) -> bool {
        matches!(self.content, ObjectContent::Components(_))
    }
}

/// The object and base material resources of a model
///
/// IDs are unique across both maps. Iteration is in ascending ID order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGraph {
    objects: BTreeMap<usize, Object>,
    base_materials: BTreeMap<usize, BaseMaterialsGroup>,
}

impl ResourceGraph {
    /// Create an empty resource graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, rejecting an ID that is already in use
    pub fn add_object(&mut self, object: Object) -> Result<()> {
        self.ensure_unused(object.id)?;
        self.objects.insert(object.id, object);
        Ok(())
    }

    /// Add a base material group, rejecting an ID that is already in use
    pub fn add_base_materials(&mut self, group: BaseMaterialsGroup) -> Result<()> {
        self.ensure_unused(group.id)?;
        self.base_materials.insert(group.id, group);
        Ok(())
    }

    fn ensure_unused(&self, id: usize) -> Result<()> {
        if self.objects.contains_key(&id) || self.base_materials.contains_key(&id) {
            return Err(Error::InvalidModel(format!(
                "Duplicate resource ID: {}. \
                 Each resource (object or base material group) must have a unique ID.",
                id
            )));
        }
        Ok(())
    }

    /// Look up an object by ID
    pub fn object(&self, id: usize) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Look up an object by ID for modification
    pub fn object_mut(&mut self, id: usize) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Look up a base material group by ID
    pub fn base_materials(&self, id: usize) -> Option<&BaseMaterialsGroup> {
        self.base_materials.get(&id)
    }

    /// All objects in ascending ID order
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// All objects in ascending ID order, mutably
    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.values_mut()
    }

    /// All base material groups in ascending ID order
    pub fn base_material_groups(&self) -> impl Iterator<Item = &BaseMaterialsGroup> {
        self.base_materials.values()
    }

    /// Whether an object with this ID exists
    pub fn contains_object(&self, id: usize) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// True when the graph holds no resources at all
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.base_materials.is_empty()
    }
}

/// An item to be built, referencing an object
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    /// Reference to object ID
    pub objectid: usize,
    /// Placement of the object on the build platform
    pub transform: AffineTransform,
    /// Part number (optional)
    pub partnumber: Option<String>,
    /// Extension attributes carried through untouched
    pub extensions: ExtensionAttributes,
}

impl BuildItem {
    /// Create a new build item placed with the identity transform
    pub fn new(objectid: usize) -> Self {
        Self {
            objectid,
            transform: AffineTransform::identity(),
            partnumber: None,
            extensions: ExtensionAttributes::new(),
        }
    }

    /// Create a new build item with a placement
    pub fn with_transform(objectid: usize, transform: AffineTransform) -> Self {
        Self {
            transform,
            ..Self::new(objectid)
        }
    }
}

/// Build section specifying which objects to manufacture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Build {
    /// List of items to build, in document order
    pub items: Vec<BuildItem>,
    /// Extension attributes on the build element
    pub extensions: ExtensionAttributes,
}

impl Build {
    /// Create a new empty build section
    pub fn new() -> Self {
        Self::default()
    }
}

/// Metadata entry for 3MF package
///
/// Metadata elements contain a required `name` attribute and text content
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Name of the metadata entry
    pub name: String,
    /// Value of the metadata entry
    pub value: String,
    /// Preservation flag (optional attribute)
    pub preserve: Option<bool>,
}

impl MetadataEntry {
    /// Create a new metadata entry
    pub fn new(name: String, value: String) -> Self {
        Self {
            name,
            value,
            preserve: None,
        }
    }

    /// Create a new metadata entry with preservation flag
    pub fn new_with_preserve(name: String, value: String, preserve: bool) -> Self {
        Self {
            name,
            value,
            preserve: Some(preserve),
        }
    }
}

/// Complete 3MF model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Unit of measurement (e.g., "millimeter", "inch")
    pub unit: String,
    /// Document language (`xml:lang`)
    pub language: Option<String>,
    /// Extension prefixes listed in `requiredextensions`
    pub required_extensions: Vec<String>,
    /// Extension prefixes listed in `recommendedextensions`
    pub recommended_extensions: Vec<String>,
    /// Metadata entries with name, value, and optional preservation flag
    pub metadata: Vec<MetadataEntry>,
    /// Object and material resources
    pub resources: ResourceGraph,
    /// Build specification
    pub build: Build,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self {
            unit: "millimeter".to_string(),
            language: None,
            required_extensions: Vec::new(),
            recommended_extensions: Vec::new(),
            metadata: Vec::new(),
            resources: ResourceGraph::new(),
            build: Build::new(),
        }
    }

    /// Get metadata value by name
    pub fn get_metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    /// Check if metadata entry exists with the given name
    pub fn has_metadata(&self, name: &str) -> bool {
        self.metadata.iter().any(|entry| entry.name == name)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
