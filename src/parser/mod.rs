//! XML parsing for 3MF model files
//!
//! The parser walks the model part with a streaming [`quick_xml::Reader`]
//! and builds a [`Model`]. It enforces the structural rules of the core
//! schema (element nesting, required attributes, one `<resources>` and one
//! `<build>`, exactly one of mesh or components per object, unique resource
//! ids) but leaves geometric and graph checks to [`crate::validator`].
//!
//! Elements and attributes from extension namespaces (`prefix:name`) are
//! not interpreted. Extension attributes on objects, components and build
//! items are kept in [`ExtensionAttributes`]; extension elements are skipped.

mod core;
mod material;

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::{
    BaseMaterialsGroup, Component, ExtensionAttributes, MetadataEntry, Mesh, Model, Object,
    ObjectContent, ParserConfig, Triangle, Vertex,
};

use material::{parse_base_element, parse_basematerials_start};

pub use core::{parse_build_item, parse_component, parse_object, parse_triangle, parse_vertex};

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Values accepted for the model `unit` attribute
pub const ALLOWED_UNITS: [&str; 6] = ["micron", "millimeter", "centimeter", "inch", "foot", "meter"];

/// Un-prefixed element names defined by the core schema
const CORE_ELEMENTS: [&str; 17] = [
    "model",
    "metadata",
    "metadatagroup",
    "resources",
    "build",
    "item",
    "basematerials",
    "base",
    "object",
    "mesh",
    "vertices",
    "vertex",
    "triangles",
    "triangle",
    "components",
    "component",
    "thumbnail",
];

/// Parse 3MF model XML with the default configuration
pub fn parse_model_xml(xml: &str) -> Result<Model> {
    parse_model_xml_with_config(xml, &ParserConfig::new())
}

/// Parse 3MF model XML
///
/// Only structural checks run here; call [`crate::validator::validate_model`]
/// afterwards for mesh and component graph validation.
///
/// # Example
///
/// ```
/// use lib3mf_resolve::parser::parse_model_xml;
///
/// let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
/// <model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
///   <resources>
///     <object id="1" type="model">
///       <components><component objectid="2"/></components>
///     </object>
///   </resources>
///   <build><item objectid="1"/></build>
/// </model>"#;
///
/// let model = parse_model_xml(xml).unwrap();
/// assert_eq!(model.resources.object(1).unwrap().components().len(), 1);
/// assert_eq!(model.build.items.len(), 1);
/// ```
pub fn parse_model_xml_with_config(xml: &str, config: &ParserConfig) -> Result<Model> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut skip_buf = Vec::new();
    let mut parser = ModelParser::new(config);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e)?;
                match parser.start_element(e, &name)? {
                    Flow::Descend => parser.stack.push(name),
                    Flow::Skip => {
                        let end = e.to_end().into_owned();
                        reader.read_to_end_into(end.name(), &mut skip_buf)?;
                        skip_buf.clear();
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e)?;
                if parser.start_element(e, &name)? == Flow::Descend {
                    parser.end_element(&name)?;
                }
            }
            Ok(Event::End(_)) => {
                if let Some(name) = parser.stack.pop() {
                    parser.end_element(&name)?;
                }
            }
            Ok(Event::Text(ref t)) => {
                let text = std::str::from_utf8(t)
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                parser.text(text);
            }
            Ok(Event::GeneralRef(ref r)) => {
                let text = resolve_reference(r)?;
                parser.text(&text);
            }
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in 3MF files".to_string(),
                ));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

/// Whether the children of an element should be read or skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Descend,
    Skip,
}

struct PendingMetadata {
    name: String,
    preserve: Option<bool>,
    value: String,
}

/// Streaming state while the model part is read
struct ModelParser<'c> {
    config: &'c ParserConfig,
    model: Model,
    stack: Vec<String>,
    seen_root: bool,
    seen_resources: bool,
    seen_build: bool,
    current_metadata: Option<PendingMetadata>,
    current_group: Option<BaseMaterialsGroup>,
    current_object: Option<Object>,
    object_content: Option<ObjectContent>,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    components: Vec<Component>,
}

impl<'c> ModelParser<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            model: Model::new(),
            stack: Vec::new(),
            seen_root: false,
            seen_resources: false,
            seen_build: false,
            current_metadata: None,
            current_group: None,
            current_object: None,
            object_content: None,
            vertices: Vec::new(),
            triangles: Vec::new(),
            components: Vec::new(),
        }
    }

    fn strict(&self) -> bool {
        self.config.strict_attributes()
    }

    fn start_element(&mut self, e: &BytesStart, name: &str) -> Result<Flow> {
        let strict = self.strict();

        if name.contains(':') {
            debug!("Skipping extension element <{}>", name);
            return Ok(Flow::Skip);
        }

        let parent = match self.stack.last() {
            Some(parent) => parent.as_str(),
            None => {
                if name != "model" || self.seen_root {
                    return Err(Error::InvalidXml(format!(
                        "Root element must be a single <model>, found <{}>",
                        name
                    )));
                }
                self.seen_root = true;
                self.parse_model_attributes(e)?;
                return Ok(Flow::Descend);
            }
        };

        match (parent, name) {
            ("model", "metadata") => {
                self.current_metadata = Some(parse_metadata_start(e, strict)?);
            }
            ("model", "resources") => {
                if self.seen_resources {
                    return Err(Error::InvalidXml(
                        "Model must contain exactly one <resources> element".to_string(),
                    ));
                }
                self.seen_resources = true;
            }
            ("model", "build") => {
                if self.seen_build {
                    return Err(Error::InvalidXml(
                        "Model must contain exactly one <build> element".to_string(),
                    ));
                }
                self.seen_build = true;
                validate_attributes(&parse_attributes(e)?, &[], "build", strict)?;
                self.model.build.extensions = extension_attributes(e)?;
            }
            ("resources", "basematerials") => {
                self.current_group = Some(parse_basematerials_start(e, strict)?);
            }
            ("basematerials", "base") => {
                let material = parse_base_element(e, strict)?;
                if let Some(group) = self.current_group.as_mut() {
                    group.materials.push(material);
                }
            }
            ("resources", "object") => {
                self.current_object = Some(parse_object(e, strict)?);
                self.object_content = None;
            }
            ("object", "mesh") => {
                self.ensure_single_content()?;
                self.vertices.clear();
                self.triangles.clear();
            }
            ("object", "components") => {
                self.ensure_single_content()?;
                self.components.clear();
            }
            ("object", "metadatagroup") => return Ok(Flow::Skip),
            ("mesh", "vertices") | ("mesh", "triangles") => {}
            ("vertices", "vertex") => self.vertices.push(parse_vertex(e, strict)?),
            ("triangles", "triangle") => self.triangles.push(parse_triangle(e, strict)?),
            ("components", "component") => self.components.push(parse_component(e, strict)?),
            ("build", "item") => self.model.build.items.push(parse_build_item(e, strict)?),
            (parent, name) if CORE_ELEMENTS.contains(&name) => {
                return Err(Error::InvalidXml(format!(
                    "Element <{}> is not allowed inside <{}>",
                    name, parent
                )));
            }
            (parent, name) => {
                if strict {
                    return Err(Error::InvalidXml(format!(
                        "Unknown element <{}> inside <{}>",
                        name, parent
                    )));
                }
                warn!("Skipping unknown element <{}> inside <{}>", name, parent);
                return Ok(Flow::Skip);
            }
        }

        Ok(Flow::Descend)
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        match name {
            "metadata" => {
                if let Some(pending) = self.current_metadata.take() {
                    self.push_metadata(pending)?;
                }
            }
            "basematerials" => {
                if let Some(group) = self.current_group.take() {
                    self.model.resources.add_base_materials(group)?;
                }
            }
            "mesh" => {
                let vertices = std::mem::take(&mut self.vertices);
                let triangles = std::mem::take(&mut self.triangles);
                let object_id = self.current_object.as_ref().map_or(0, |o| o.id);
                let mesh = Mesh::new(vertices, triangles).inspect_err(|e| {
                    debug!("Object {}: {}", object_id, e);
                })?;
                self.object_content = Some(ObjectContent::Mesh(mesh));
            }
            "components" => {
                let components = std::mem::take(&mut self.components);
                self.object_content = Some(ObjectContent::Components(components));
            }
            "object" => {
                if let Some(mut object) = self.current_object.take() {
                    object.content = self.object_content.take().ok_or_else(|| {
                        Error::InvalidModel(format!(
                            "Object {} has neither a mesh nor components",
                            object.id
                        ))
                    })?;
                    self.model.resources.add_object(object)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.stack.last().is_some_and(|top| top == "metadata")
            && let Some(pending) = self.current_metadata.as_mut()
        {
            pending.value.push_str(text);
        }
    }

    fn finish(self) -> Result<Model> {
        if !self.seen_root {
            return Err(Error::InvalidXml(
                "Document has no <model> root element".to_string(),
            ));
        }

        debug!(
            "Parsed model with {} objects, {} base material groups and {} build items",
            self.model.resources.object_count(),
            self.model.resources.base_material_groups().count(),
            self.model.build.items.len()
        );
        Ok(self.model)
    }

    fn ensure_single_content(&self) -> Result<()> {
        if self.object_content.is_some() {
            let id = self.current_object.as_ref().map_or(0, |o| o.id);
            return Err(Error::InvalidModel(format!(
                "Object {} has both a mesh and components",
                id
            )));
        }
        Ok(())
    }

    fn parse_model_attributes(&mut self, e: &BytesStart) -> Result<()> {
        let attrs = parse_attributes(e)?;

        // thumbnail is deprecated in v1.4+ but still allowed
        validate_attributes(
            &attrs,
            &["unit", "requiredextensions", "recommendedextensions", "thumbnail"],
            "model",
            self.strict(),
        )?;

        if let Some(unit) = attrs.get("unit") {
            if !ALLOWED_UNITS.contains(&unit.as_str()) {
                return Err(Error::InvalidXml(format!(
                    "Invalid unit '{}'. Must be one of: {}",
                    unit,
                    ALLOWED_UNITS.join(", ")
                )));
            }
            self.model.unit = unit.clone();
        }

        self.model.language = attrs.get("xml:lang").cloned();

        if let Some(required) = attrs.get("requiredextensions") {
            self.model.required_extensions =
                required.split_whitespace().map(str::to_string).collect();
        }
        if let Some(recommended) = attrs.get("recommendedextensions") {
            self.model.recommended_extensions =
                recommended.split_whitespace().map(str::to_string).collect();
        }
        Ok(())
    }

    fn push_metadata(&mut self, pending: PendingMetadata) -> Result<()> {
        if self.model.has_metadata(&pending.name) {
            return Err(Error::InvalidXml(format!(
                "Duplicate metadata name '{}'. Each metadata element must have a unique name attribute",
                pending.name
            )));
        }

        let value = pending.value.trim().to_string();
        let entry = match pending.preserve {
            Some(preserve) => MetadataEntry::new_with_preserve(pending.name, value, preserve),
            None => MetadataEntry::new(pending.name, value),
        };
        self.model.metadata.push(entry);
        Ok(())
    }
}

fn parse_metadata_start(e: &BytesStart, strict: bool) -> Result<PendingMetadata> {
    let attrs = parse_attributes(e)?;
    validate_attributes(&attrs, &["name", "preserve", "type"], "metadata", strict)?;

    let name = attrs
        .get("name")
        .ok_or_else(|| Error::missing_attribute("metadata", "name"))?
        .clone();

    let preserve = match attrs.get("preserve").map(String::as_str) {
        None => None,
        Some("0") | Some("false") => Some(false),
        Some("1") | Some("true") => Some(true),
        Some(other) => {
            return Err(Error::InvalidXml(format!(
                "Invalid preserve attribute value '{}'. Must be '0', '1', 'false', or 'true'",
                other
            )));
        }
    };

    Ok(PendingMetadata {
        name,
        preserve,
        value: String::new(),
    })
}

fn element_name(e: &BytesStart) -> Result<String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|e| Error::InvalidXml(e.to_string()))
}

/// Resolve a character or predefined entity reference in text content
fn resolve_reference(r: &quick_xml::events::BytesRef) -> Result<String> {
    if let Some(ch) = r.resolve_char_ref()? {
        return Ok(ch.to_string());
    }

    let name = std::str::from_utf8(r).map_err(|e| Error::InvalidXml(e.to_string()))?;
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidXml(format!("Unknown entity reference '&{};'", name)))
}

/// Collect all attributes of an element by qualified name
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlAttr(e.to_string()))?;

        attrs.insert(key.to_string(), value.into_owned());
    }

    Ok(attrs)
}

/// True for `prefix:name` attributes from an extension namespace
///
/// Namespace declarations and `xml:` attributes are not extension attributes.
pub(crate) fn is_extension_attribute(key: &str) -> bool {
    key.contains(':') && !key.starts_with("xmlns") && !key.starts_with("xml:")
}

/// Collect extension attributes in document order
pub(crate) fn extension_attributes(e: &BytesStart) -> Result<ExtensionAttributes> {
    let mut extensions = ExtensionAttributes::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        if is_extension_attribute(key) {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlAttr(e.to_string()))?;
            extensions.insert(key, value.into_owned());
        }
    }
    Ok(extensions)
}

/// Check if an attribute key should be skipped during validation
///
/// Returns true for namespace declarations, `xml:lang` and extension
/// attributes. `xml:space` is not allowed on 3MF elements.
fn should_skip_attribute(key: &str) -> bool {
    key.starts_with("xmlns") || key == "xml:lang" || is_extension_attribute(key)
}

/// Validate that all attributes in the map are in the allowed list
///
/// Does nothing unless `strict` is set.
pub(crate) fn validate_attributes(
    attrs: &HashMap<String, String>,
    allowed: &[&str],
    element_name: &str,
    strict: bool,
) -> Result<()> {
    if !strict {
        return Ok(());
    }

    let allowed_set: HashSet<&str> = allowed.iter().copied().collect();
    for key in attrs.keys() {
        if should_skip_attribute(key) {
            continue;
        }

        if !allowed_set.contains(key.as_str()) {
            return Err(Error::InvalidXml(format!(
                "Unknown attribute '{}' on <{}>",
                key, element_name
            )));
        }
    }
    Ok(())
}
