//! OPC (Open Packaging Conventions) handling for 3MF files
//!
//! 3MF files are ZIP archives following the OPC standard, containing
//! various parts including the main 3D model file and relationships.
//! [`Package::open`] checks the package structure up front and locates the
//! primary model part through the root relationships.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use urlencoding::decode;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationships file path
pub const RELS_PATH: &str = "_rels/.rels";

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// Content type of relationship parts
pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Content type of 3D model parts
pub const MODEL_CONTENT_TYPE: &str = "application/vnd.ms-package.3dmanufacturing-3dmodel+xml";

/// Part extensions holding markup text
const TEXT_PART_EXTENSIONS: [&str; 3] = ["model", "rels", "xml"];

/// A package-level relationship from `_rels/.rels`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target part name as written
    pub target: String,
}

/// Represents an OPC package (3MF file)
pub struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
    model_path: String,
}

impl<R: Read + Seek> Package<R> {
    /// Open a 3MF package from a reader
    ///
    /// # Errors
    ///
    /// - [`Error::Zip`] if the data is not a ZIP archive
    /// - [`Error::InvalidFormat`] for missing or invalid content types and
    ///   relationships, or a model relationship to a missing part
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut package = Self {
            archive,
            model_path: String::new(),
        };

        package.validate_opc_structure()?;
        debug!(
            "Opened 3MF package with {} parts, primary model at {}",
            package.len(),
            package.model_path
        );

        Ok(package)
    }

    /// Validate OPC package structure according to 3MF spec
    fn validate_opc_structure(&mut self) -> Result<()> {
        for required in [CONTENT_TYPES_PATH, RELS_PATH] {
            if !self.has_file(required) {
                return Err(Error::invalid_format_context(
                    "OPC package structure",
                    &format!(
                        "Missing required file '{}'. \
                         The 3MF file may be corrupt or improperly formatted.",
                        required
                    ),
                ));
            }
        }

        self.validate_content_types()?;

        let relationships = self.relationships()?;
        for rel in &relationships {
            let path = part_path(&rel.target)?;
            if !self.has_file(&path) {
                return Err(Error::InvalidFormat(format!(
                    "Relationship '{}' points to non-existent file: {}",
                    rel.id, path
                )));
            }
        }

        let model_rel = relationships
            .iter()
            .find(|rel| rel.rel_type == MODEL_REL_TYPE)
            .ok_or_else(|| Error::MissingFile("3D model relationship not found".to_string()))?;
        self.model_path = part_path(&model_rel.target)?;

        Ok(())
    }

    /// Validate [Content_Types].xml structure
    fn validate_content_types(&mut self) -> Result<()> {
        let content = self.get_file(CONTENT_TYPES_PATH)?;
        let mut reader = Reader::from_str(&content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut found_types = false;
        let mut found_rels = false;
        let mut found_model = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e)?.as_str() {
                        "Types" => found_types = true,
                        "Default" => {
                            let extension = required_attr(e, "Default", "Extension")?;
                            let content_type = required_attr(e, "Default", "ContentType")?;

                            if extension.eq_ignore_ascii_case("rels")
                                && content_type == RELS_CONTENT_TYPE
                            {
                                found_rels = true;
                            }
                            if content_type == MODEL_CONTENT_TYPE {
                                if !extension.eq_ignore_ascii_case("model") {
                                    return Err(Error::InvalidFormat(format!(
                                        "Content type '{}' must use Extension='model', not Extension='{}'",
                                        content_type, extension
                                    )));
                                }
                                found_model = true;
                            }
                        }
                        "Override" => {
                            required_attr(e, "Override", "PartName")?;
                            if required_attr(e, "Override", "ContentType")? == MODEL_CONTENT_TYPE {
                                found_model = true;
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if !found_types {
            return Err(Error::InvalidFormat(
                "Content Types missing root 'Types' element".to_string(),
            ));
        }
        if !found_rels {
            return Err(Error::InvalidFormat(
                "Content Types missing required 'rels' extension definition".to_string(),
            ));
        }
        if !found_model {
            return Err(Error::InvalidFormat(
                "Content Types missing required model content type (Default or Override)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Parse the package-level relationships
    pub fn relationships(&mut self) -> Result<Vec<Relationship>> {
        let rels_content = self.get_file(RELS_PATH)?;
        let mut reader = Reader::from_str(&rels_content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut relationships = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if local_name(e)? == "Relationship" {
                        let rel_type = required_attr(e, "Relationship", "Type")?;
                        if rel_type.contains('?') || rel_type.contains('#') {
                            return Err(Error::InvalidFormat(format!(
                                "Relationship Type cannot contain a query string or fragment: {}",
                                rel_type
                            )));
                        }
                        relationships.push(Relationship {
                            id: required_attr(e, "Relationship", "Id")?,
                            rel_type,
                            target: required_attr(e, "Relationship", "Target")?,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(relationships)
    }

    /// Path of the primary 3D model part, without a leading slash
    pub fn primary_model_path(&self) -> &str {
        &self.model_path
    }

    /// Get the main 3D model file content
    pub fn get_model(&mut self) -> Result<String> {
        let model_path = self.model_path.clone();
        self.get_file(&model_path)
    }

    /// Read every markup part (`.model`, `.rels`, `.xml`) into a path to text map
    pub fn text_parts(&mut self) -> Result<BTreeMap<String, String>> {
        let mut parts = BTreeMap::new();
        for name in self.file_names() {
            let is_text = name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| {
                    TEXT_PART_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                });
            if is_text {
                let content = self.get_file(&name)?;
                parts.insert(name, content);
            }
        }
        Ok(parts)
    }

    /// Get a file by name from the archive
    pub fn get_file(&mut self, name: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Check if a file exists in the archive
    pub fn has_file(&mut self, name: &str) -> bool {
        self.archive.by_name(name).is_ok()
    }

    /// Get the number of files in the archive
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Check if the archive is empty
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// List all file names in the archive
    pub fn file_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }
}

fn local_name(e: &BytesStart) -> Result<String> {
    let name = e.local_name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .map_err(|e| Error::InvalidXml(e.to_string()))
}

fn required_attr(e: &BytesStart, element: &str, attribute: &str) -> Result<String> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == attribute.as_bytes() {
            return std::str::from_utf8(&attr.value)
                .map(str::to_string)
                .map_err(|e| Error::InvalidXml(e.to_string()));
        }
    }
    Err(Error::missing_attribute(element, attribute))
}

/// Turn a relationship target into an archive path
///
/// The target is validated as an OPC part name, percent-decoded and
/// stripped of its leading slash.
fn part_path(target: &str) -> Result<String> {
    validate_opc_part_name(target)?;
    let decoded = decode(target).map_err(|e| {
        Error::InvalidFormat(format!(
            "Part name '{}' is not valid percent-encoded UTF-8: {}",
            target, e
        ))
    })?;
    Ok(decoded.strip_prefix('/').unwrap_or(&decoded).to_string())
}

/// Validate OPC part name according to OPC specification constraints
///
/// Part names must not contain:
/// - Control characters
/// - Fragment identifiers (#) or query strings (?)
/// - Path segments that are "." or ".."
/// - Empty path segments (consecutive slashes)
/// - Segments ending with "." (like "3D.")
pub fn validate_opc_part_name(part_name: &str) -> Result<()> {
    if part_name.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidFormat(format!(
            "Part name cannot contain control characters: {}",
            part_name.escape_debug()
        )));
    }

    if part_name.contains('#') {
        return Err(Error::InvalidFormat(format!(
            "Part name cannot contain fragment identifier: {}",
            part_name
        )));
    }

    if part_name.contains('?') {
        return Err(Error::InvalidFormat(format!(
            "Part name cannot contain query string: {}",
            part_name
        )));
    }

    for (idx, segment) in part_name.split('/').enumerate() {
        if segment.is_empty() {
            // Leading slash
            if idx == 0 && part_name.starts_with('/') {
                continue;
            }
            return Err(Error::InvalidFormat(format!(
                "Part name cannot contain empty path segments (consecutive slashes): {}",
                part_name
            )));
        }

        if segment == "." || segment == ".." {
            return Err(Error::InvalidFormat(format!(
                "Part name cannot contain '.' or '..' segments: {}",
                part_name
            )));
        }

        if segment.ends_with('.') {
            return Err(Error::InvalidFormat(format!(
                "Part name segments cannot end with '.': {}",
                part_name
            )));
        }
    }

    Ok(())
}
