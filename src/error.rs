//! Error types for 3MF resource graph operations
//!
//! All errors carry an error code for categorization and enough context
//! (object ids, indices, raw values) to locate the offending input.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML parsing and structure errors
//! - **E30xx**: General model errors
//! - **E31xx**: Transform and mesh geometry errors
//! - **E32xx**: Resource graph (component hierarchy) errors
//!
//! ## Geometry and graph codes
//!
//! - `E3101`: Malformed transform string
//! - `E3102`: Malformed triangle (index out of range or repeated)
//! - `E3103`: Degenerate triangle (zero-area face)
//! - `E3104`: Insufficient geometry for the object type
//! - `E3105`: Non-manifold geometry on a solid object
//! - `E3106`: Inconsistent triangle winding on a solid object
//! - `E3201`: Component references a missing object
//! - `E3202`: Component references an object of type `other`
//! - `E3203`: Cyclic component reference
//! - `E3204`: Object not found
//! - `E3205`: Component hierarchy deeper than the configured limit

use std::io;
use thiserror::Error;

use crate::model::ObjectType;

/// Result type for 3MF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when loading, validating or resolving 3MF resources
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading the file
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted ZIP file
    /// - Unsupported compression method
    /// - Truncated archive
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Missing required file in the 3MF archive
    ///
    /// **Error Code**: E1003
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required XML elements or attributes
    /// - Unknown attributes on core elements
    /// - Invalid element nesting
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Invalid 3MF package format
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Non-compliant OPC structure
    /// - Missing content type declarations
    /// - Missing model relationship
    #[error("[E2004] Invalid 3MF format: {0}")]
    InvalidFormat(String),

    /// Invalid model structure
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Duplicate resource IDs
    /// - Object with both a mesh and components, or with neither
    /// - Build item referencing an unusable object
    #[error("[E3001] Invalid model: {0}")]
    InvalidModel(String),

    /// Parse error for numeric values
    ///
    /// **Error Code**: E3002
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// A transform string is not 12 finite, whitespace-separated numbers
    ///
    /// **Error Code**: E3101
    ///
    /// `owner` is the id of the object whose component carried the transform,
    /// when the transform came from a component.
    #[error("[E3101] Malformed transform{}: '{raw}' ({reason})", owner_suffix(.owner))]
    MalformedTransform {
        /// The transform text exactly as supplied
        raw: String,
        /// What was wrong with it
        reason: String,
        /// Object owning the component that carried the transform
        owner: Option<usize>,
    },

    /// A triangle references vertices that are out of range or repeated
    ///
    /// **Error Code**: E3102
    #[error(
        "[E3102] Malformed triangle {index}: vertex indices ({v1}, {v2}, {v3}) must be distinct \
         and less than the vertex count {vertex_count}"
    )]
    MalformedTriangle {
        /// Position of the triangle in the mesh
        index: usize,
        /// First vertex index
        v1: usize,
        /// Second vertex index
        v2: usize,
        /// Third vertex index
        v3: usize,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// A face normal was requested for a zero-area triangle
    ///
    /// **Error Code**: E3103
    #[error("[E3103] Degenerate triangle: cannot compute a normal for a zero-area face")]
    DegenerateTriangle,

    /// The mesh has too little geometry for its object type
    ///
    /// **Error Code**: E3104
    ///
    /// **Common Causes**:
    /// - Triangles present but fewer than 3 vertices
    /// - A `model` object with 1 to 3 triangles (a closed solid needs at least 4)
    #[error("[E3104] Insufficient geometry: {0}")]
    InsufficientGeometry(String),

    /// A `model` or `solidsupport` mesh has an edge not shared by exactly two triangles
    ///
    /// **Error Code**: E3105
    ///
    /// **Suggestions**:
    /// - Check for holes, T-junctions or overlapping faces
    #[error("[E3105] Non-manifold geometry: mesh for object type '{object_type}' must have manifold edges")]
    NonManifoldGeometry {
        /// Type of the object owning the mesh
        object_type: ObjectType,
    },

    /// A `model` or `solidsupport` mesh has adjacent triangles with opposing winding
    ///
    /// **Error Code**: E3106
    #[error(
        "[E3106] Inconsistent winding: mesh for object type '{object_type}' must have consistent triangle orientation"
    )]
    InconsistentWinding {
        /// Type of the object owning the mesh
        object_type: ObjectType,
    },

    /// A component references an object id that is not in the resource graph
    ///
    /// **Error Code**: E3201
    #[error("[E3201] Dangling reference: object {parent} references non-existent object {missing}")]
    DanglingReference {
        /// Object owning the component
        parent: usize,
        /// Referenced id that could not be found
        missing: usize,
    },

    /// A component references an object of type `other`
    ///
    /// **Error Code**: E3202
    #[error(
        "[E3202] Forbidden reference: object {parent} references object {target} of type 'other', \
         which cannot be used as a component"
    )]
    ForbiddenReferenceType {
        /// Object owning the component
        parent: usize,
        /// Referenced object of type `other`
        target: usize,
    },

    /// Following component references leads back to an ancestor
    ///
    /// **Error Code**: E3203
    #[error("[E3203] Circular component reference involving object {object_id}: {}", format_path(.path))]
    CyclicReference {
        /// The object that was revisited
        object_id: usize,
        /// The cycle, starting and ending at `object_id`
        path: Vec<usize>,
    },

    /// An object id requested by the caller (or a build item) does not exist
    ///
    /// **Error Code**: E3204
    #[error("[E3204] Object {0} not found in resources")]
    ObjectNotFound(usize),

    /// The component hierarchy is nested deeper than the configured ceiling
    ///
    /// **Error Code**: E3205
    #[error("[E3205] Component hierarchy exceeds depth limit of {limit} at object {object_id}")]
    DepthLimitExceeded {
        /// Object at which the limit was crossed
        object_id: usize,
        /// Configured maximum depth
        limit: usize,
    },
}

fn owner_suffix(owner: &Option<usize>) -> String {
    match owner {
        Some(id) => format!(" in component of object {}", id),
        None => String::new(),
    }
}

fn format_path(path: &[usize]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" → ")
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error for a missing required attribute
    ///
    /// # Example
    /// ```ignore
    /// Error::missing_attribute("object", "id")
    /// ```
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>' is missing required attribute '{}'",
            element, attribute
        ))
    }

    /// Create an InvalidFormat error with context about what structure is invalid
    pub fn invalid_format_context(context: &str, message: &str) -> Self {
        Error::InvalidFormat(format!("{}: {}", context, message))
    }

    /// Create a ParseError with context about what was being parsed
    ///
    /// # Arguments
    /// * `field_name` - The name of the field being parsed (e.g., "vertex x coordinate")
    /// * `value` - The value that failed to parse
    /// * `expected_type` - The expected type (e.g., "finite floating-point number")
    pub fn parse_error_with_context(field_name: &str, value: &str, expected_type: &str) -> Self {
        Error::ParseError(format!(
            "Failed to parse '{}': expected {}, got '{}'",
            field_name, expected_type, value
        ))
    }

    /// Attach the owning object id to a [`Error::MalformedTransform`]
    ///
    /// Other variants are returned unchanged.
    pub fn with_transform_owner(self, object_id: usize) -> Self {
        match self {
            Error::MalformedTransform { raw, reason, .. } => Error::MalformedTransform {
                raw,
                reason,
                owner: Some(object_id),
            },
            other => other,
        }
    }
}
