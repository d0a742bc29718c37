//! CDXML reader.
//!
//! Element names map to object types and attribute names to property tags
//! through the same table the binary reader uses. Text objects take their
//! string from nested `<s>` style runs.

use roxmltree::{Document as XmlDocument, Node as XmlNode, ParsingOptions};
use tracing::{debug, trace};

use super::flags::{FlagKind, FontFace};
use super::tags::{ObjectType, Property};
use super::value::{self, PropertyValue, StyleRun, StyledText};
use super::{Decoded, DecodeState, ObjectId, RawObject};
use crate::config::DecodeOptions;
use crate::error::{FormatError, FormatErrorKind, Position, Result};

/// Elements that carry formatting or resources rather than objects.
const NON_OBJECT_ELEMENTS: &[&str] = &["s", "colortable", "color", "fonttable", "font"];

pub fn read(text: &str, options: &DecodeOptions) -> Result<Decoded> {
    let xml = XmlDocument::parse_with_options(
        text,
        ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        },
    )
    .map_err(|e| {
        let pos = e.pos();
        FormatError::at_line(pos.row, pos.col, FormatErrorKind::Xml(e.to_string()))
    })?;

    let root = xml.root_element();
    if ObjectType::from_element(root.tag_name().name()) != ObjectType::Document {
        let pos = xml.text_pos_at(root.range().start);
        return Err(FormatError::at_line(pos.row, pos.col, FormatErrorKind::MissingDocument).into());
    }

    let mut state = DecodeState::new(options);
    let root = read_element(&xml, root, &mut state, 0)?;
    Ok(Decoded {
        root,
        warnings: state.warnings,
    })
}

fn read_element(
    xml: &XmlDocument<'_>,
    element: XmlNode<'_, '_>,
    state: &mut DecodeState<'_>,
    depth: usize,
) -> Result<RawObject> {
    state.enter_object(depth)?;
    let name = element.tag_name().name();
    let kind = ObjectType::from_element(name);
    if matches!(kind, ObjectType::Unknown(_)) {
        debug!(element = name, "unrecognised element");
    }
    let pos = xml.text_pos_at(element.range().start);
    let position = Position::LineColumn {
        line: pos.row,
        column: pos.col,
    };

    let id: ObjectId = match element.attribute("id") {
        None => 0,
        Some(text) => match text.trim().parse() {
            Ok(id) => id,
            Err(_) => {
                state.malformed(FormatError::at_line(
                    pos.row,
                    pos.col,
                    FormatErrorKind::BadValue {
                        property: "id".into(),
                        text: text.to_string(),
                    },
                ))?;
                0
            }
        },
    };
    trace!(?kind, id, line = pos.row, "object");

    let mut object = RawObject::new(kind, id);
    object.position = position;

    for attr in element.attributes() {
        if attr.name() == "id" {
            continue;
        }
        let Some(property) = Property::from_attribute(attr.name()) else {
            trace!(attribute = attr.name(), "skipping unrecognised attribute");
            continue;
        };
        match value::parse_text(property.kind(), attr.value()) {
            Some(v) => object.properties.push((property, v)),
            None => {
                state.malformed(FormatError::at_line(
                    pos.row,
                    pos.col,
                    FormatErrorKind::BadValue {
                        property: attr.name().to_string(),
                        text: attr.value().to_string(),
                    },
                ))?;
            }
        }
    }

    if kind == ObjectType::Text && object.get(Property::Text).is_none() {
        let styled = style_runs(element);
        if !styled.text.is_empty() {
            object.properties.push((Property::Text, PropertyValue::Text(styled)));
        }
    }

    for child in element.children().filter(XmlNode::is_element) {
        if NON_OBJECT_ELEMENTS.contains(&child.tag_name().name()) {
            continue;
        }
        object
            .children
            .push(read_element(xml, child, state, depth + 1)?);
    }
    Ok(object)
}

/// Concatenate `<s>` runs into one string, keeping each run's formatting.
fn style_runs(element: XmlNode<'_, '_>) -> StyledText {
    let mut styled = StyledText::default();
    for s in element.children().filter(|c| c.has_tag_name("s")) {
        let number = |attr: &str| {
            s.attribute(attr)
                .and_then(|v| v.trim().parse::<u16>().ok())
                .unwrap_or(0)
        };
        let face = s
            .attribute("face")
            .map(|v| match v.trim().parse::<u32>() {
                Ok(bits) => bits,
                Err(_) => FlagKind::FontFace.bits_of(v),
            })
            .unwrap_or(0);
        styled.runs.push(StyleRun {
            start: styled.text.chars().count() as u16,
            font: number("font"),
            face: FontFace::from_bits(face),
            size: number("size"),
            color: number("color"),
        });
        styled.text.extend(s.children().filter_map(|t| t.text()));
    }
    styled
}

/// Serialise a record tree as CDXML. Text objects get one plain `<s>` run.
pub fn write(root: &RawObject) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
    write_element(&mut out, root, 0);
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_element(out: &mut String, object: &RawObject, depth: usize) {
    let indent = " ".repeat(depth);
    let name = object.kind.element();
    out.push_str(&format!("{indent}<{name}"));
    if object.id != 0 {
        out.push_str(&format!(" id=\"{}\"", object.id));
    }
    let mut text = None;
    for (property, v) in &object.properties {
        if object.kind == ObjectType::Text && *property == Property::Text {
            text = v.as_text();
            continue;
        }
        let formatted = value::format_text(property.kind(), v);
        out.push_str(&format!(" {}=\"{}\"", property.attribute(), escape(&formatted)));
    }
    if object.children.is_empty() && text.is_none() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    if let Some(text) = text {
        out.push_str(&format!("{indent} <s>{}</s>\n", escape(text)));
    }
    for child in &object.children {
        write_element(out, child, depth + 1);
    }
    out.push_str(&format!("{indent}</{name}>\n"));
}
