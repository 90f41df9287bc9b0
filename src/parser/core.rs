//! Core 3MF element parsing
//!
//! This module handles parsing of core 3MF elements including objects,
//! vertices, triangles, components, and build items.

use quick_xml::events::BytesStart;

use crate::error::{Error, Result};
use crate::model::{BuildItem, Component, Object, ObjectContent, ObjectType, Triangle, Vertex};
use crate::transform::AffineTransform;

use super::{extension_attributes, is_extension_attribute, parse_attributes, validate_attributes};

/// Parse object element attributes
///
/// The returned object has an empty component list as its content; the
/// caller replaces it once the nested mesh or components element is read.
pub fn parse_object(e: &BytesStart, strict: bool) -> Result<Object> {
    let attrs = parse_attributes(e)?;

    // thumbnail is deprecated but still common in valid files
    validate_attributes(
        &attrs,
        &["id", "name", "type", "pid", "pindex", "partnumber", "thumbnail"],
        "object",
        strict,
    )?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("object", "id"))?
        .parse::<usize>()?;

    let mut object = Object::new(id, ObjectContent::Components(Vec::new()));
    object.name = attrs.get("name").cloned();
    object.partnumber = attrs.get("partnumber").cloned();
    object.thumbnail = attrs.get("thumbnail").cloned();

    if let Some(type_str) = attrs.get("type") {
        object.object_type = type_str.parse::<ObjectType>()?;
    }

    if let Some(pid) = attrs.get("pid") {
        object.pid = Some(pid.parse::<usize>()?);
    }

    if let Some(pindex) = attrs.get("pindex") {
        object.pindex = Some(pindex.parse::<usize>()?);
    }

    object.extensions = extension_attributes(e)?;
    Ok(object)
}

/// Parse vertex element attributes
pub fn parse_vertex(e: &BytesStart, strict: bool) -> Result<Vertex> {
    // Parse attributes directly without building a map
    let mut x_opt: Option<f64> = None;
    let mut y_opt: Option<f64> = None;
    let mut z_opt: Option<f64> = None;
    let mut invalid_attr_name: Option<String> = None;

    let parse_f64 = |name: &str, value: &[u8]| -> Result<f64> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        value_str.trim().parse::<f64>().map_err(|_| {
            Error::parse_error_with_context(name, value_str, "floating-point number")
        })
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = attr.key.as_ref();

        match key {
            b"x" => x_opt = Some(parse_f64("vertex x coordinate", &attr.value)?),
            b"y" => y_opt = Some(parse_f64("vertex y coordinate", &attr.value)?),
            b"z" => z_opt = Some(parse_f64("vertex z coordinate", &attr.value)?),
            _ => {
                let name = String::from_utf8_lossy(key);
                if invalid_attr_name.is_none() && !is_extension_attribute(&name) {
                    invalid_attr_name = Some(name.into_owned());
                }
            }
        }
    }

    if strict && let Some(attr_name) = invalid_attr_name {
        return Err(Error::InvalidXml(format!(
            "Unexpected attribute '{}' in vertex element. Only x, y, z are allowed.",
            attr_name
        )));
    }

    let x = x_opt.ok_or_else(|| Error::missing_attribute("vertex", "x"))?;
    let y = y_opt.ok_or_else(|| Error::missing_attribute("vertex", "y"))?;
    let z = z_opt.ok_or_else(|| Error::missing_attribute("vertex", "z"))?;

    for (axis, value) in [("x", x), ("y", y), ("z", z)] {
        if !value.is_finite() {
            return Err(Error::InvalidXml(format!(
                "Vertex {} coordinate must be finite (got {})",
                axis, value
            )));
        }
    }

    Ok(Vertex::new(x, y, z))
}

/// Parse triangle element attributes
///
/// Index ranges are checked when the enclosing mesh is complete.
pub fn parse_triangle(e: &BytesStart, strict: bool) -> Result<Triangle> {
    let mut v1_opt: Option<usize> = None;
    let mut v2_opt: Option<usize> = None;
    let mut v3_opt: Option<usize> = None;
    let mut p1_opt: Option<usize> = None;
    let mut p2_opt: Option<usize> = None;
    let mut p3_opt: Option<usize> = None;
    let mut pid_opt: Option<usize> = None;
    let mut invalid_attr_name: Option<String> = None;

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = attr.key.as_ref();

        match key {
            b"v1" | b"v2" | b"v3" | b"p1" | b"p2" | b"p3" | b"pid" => {
                let value_str = std::str::from_utf8(&attr.value)
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                let value = value_str.trim().parse::<usize>()?;

                match key {
                    b"v1" => v1_opt = Some(value),
                    b"v2" => v2_opt = Some(value),
                    b"v3" => v3_opt = Some(value),
                    b"p1" => p1_opt = Some(value),
                    b"p2" => p2_opt = Some(value),
                    b"p3" => p3_opt = Some(value),
                    _ => pid_opt = Some(value),
                }
            }
            _ => {
                let name = String::from_utf8_lossy(key);
                if invalid_attr_name.is_none() && !is_extension_attribute(&name) {
                    invalid_attr_name = Some(name.into_owned());
                }
            }
        }
    }

    if strict && let Some(attr_name) = invalid_attr_name {
        return Err(Error::InvalidXml(format!(
            "Unexpected attribute '{}' in triangle element. Only v1, v2, v3, p1, p2, p3, pid are allowed.",
            attr_name
        )));
    }

    let v1 = v1_opt.ok_or_else(|| Error::missing_attribute("triangle", "v1"))?;
    let v2 = v2_opt.ok_or_else(|| Error::missing_attribute("triangle", "v2"))?;
    let v3 = v3_opt.ok_or_else(|| Error::missing_attribute("triangle", "v3"))?;

    let mut triangle = Triangle::new(v1, v2, v3);
    triangle.p1 = p1_opt;
    triangle.p2 = p2_opt;
    triangle.p3 = p3_opt;
    triangle.pid = pid_opt;

    Ok(triangle)
}

/// Parse component element attributes
///
/// The transform is stored as written and only parsed when the hierarchy
/// is resolved.
pub fn parse_component(e: &BytesStart, strict: bool) -> Result<Component> {
    let attrs = parse_attributes(e)?;
    validate_attributes(&attrs, &["objectid", "transform"], "component", strict)?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("component", "objectid"))?
        .parse::<usize>()?;

    let mut component = Component::new(objectid);
    component.transform = attrs.get("transform").cloned();
    component.extensions = extension_attributes(e)?;
    Ok(component)
}

/// Parse build item element attributes
pub fn parse_build_item(e: &BytesStart, strict: bool) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;

    // thumbnail is deprecated but still common in valid files
    validate_attributes(
        &attrs,
        &["objectid", "transform", "partnumber", "thumbnail"],
        "item",
        strict,
    )?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("item", "objectid"))?
        .parse::<usize>()?;

    let transform = AffineTransform::from_attribute(attrs.get("transform").map(String::as_str))?;

    let mut item = BuildItem::with_transform(objectid, transform);
    item.partnumber = attrs.get("partnumber").cloned();
    item.extensions = extension_attributes(e)?;
    Ok(item)
}
