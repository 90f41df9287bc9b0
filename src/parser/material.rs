//! Base material parsing

use quick_xml::events::BytesStart;

use crate::error::{Error, Result};
use crate::model::{BaseMaterial, BaseMaterialsGroup};

use super::{parse_attributes, validate_attributes};

/// Parse a color in `#RRGGBB` or `#RRGGBBAA` format
///
/// Colors without an alpha channel are fully opaque.
pub(super) fn parse_color(color_str: &str) -> Option<(u8, u8, u8, u8)> {
    let hex = color_str.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        6 => Some((channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some((channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// Parse a basematerials start tag into an empty group
pub(super) fn parse_basematerials_start(
    e: &BytesStart,
    strict: bool,
) -> Result<BaseMaterialsGroup> {
    let attrs = parse_attributes(e)?;
    validate_attributes(&attrs, &["id"], "basematerials", strict)?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("basematerials", "id"))?
        .parse::<usize>()?;
    Ok(BaseMaterialsGroup::new(id))
}

/// Parse a base element inside a basematerials group
pub(super) fn parse_base_element(e: &BytesStart, strict: bool) -> Result<BaseMaterial> {
    let attrs = parse_attributes(e)?;
    validate_attributes(&attrs, &["name", "displaycolor"], "base", strict)?;

    let name = attrs
        .get("name")
        .ok_or_else(|| Error::missing_attribute("base", "name"))?
        .clone();
    let color_str = attrs
        .get("displaycolor")
        .ok_or_else(|| Error::missing_attribute("base", "displaycolor"))?;
    let displaycolor = parse_color(color_str).ok_or_else(|| {
        Error::parse_error_with_context("base displaycolor", color_str, "#RRGGBB or #RRGGBBAA")
    })?;

    Ok(BaseMaterial::new(name, displaycolor))
}
