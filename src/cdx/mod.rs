//! CDX / CDXML property-stream decoding.
//!
//! Both readers produce the same [`RawObject`] tree: one node per object
//! record, carrying the typed properties the tag table recognises. The
//! object graph in [`crate::document`] is built from this tree.

pub mod binary;
pub mod enums;
pub mod flags;
pub mod tags;
pub mod value;
pub mod xml;

pub use tags::{ObjectType, Property};
pub use value::{PropertyValue, Rect, StyleRun, StyledText, ValueKind};

use crate::config::DecodeOptions;
use crate::error::{Error, FormatError, Position, Result, Warning};

/// Document-unique object identifier.
pub type ObjectId = u32;

/// One decoded object record and everything nested inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObject {
    pub kind: ObjectType,
    pub id: ObjectId,
    pub properties: Vec<(Property, PropertyValue)>,
    pub children: Vec<RawObject>,
    /// Where the object record starts in the input.
    pub position: Position,
}

impl RawObject {
    pub fn new(kind: ObjectType, id: ObjectId) -> Self {
        Self {
            kind,
            id,
            properties: Vec::new(),
            children: Vec::new(),
            position: Position::Offset(0),
        }
    }

    pub fn with(mut self, property: Property, value: PropertyValue) -> Self {
        self.properties.push((property, value));
        self
    }

    pub fn child(mut self, child: RawObject) -> Self {
        self.children.push(child);
        self
    }

    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v)
    }

    /// Number of objects in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RawObject::count).sum::<usize>()
    }
}

/// A decoded record tree plus the problems skipped over in lenient mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub root: RawObject,
    pub warnings: Vec<Warning>,
}

pub fn read_cdx(bytes: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    binary::read(bytes, options)
}

pub fn read_cdxml(text: &str, options: &DecodeOptions) -> Result<Decoded> {
    xml::read(text, options)
}

/// Shared bookkeeping for both readers: limits, and the strict/lenient
/// choice for malformed values.
pub(crate) struct DecodeState<'o> {
    options: &'o DecodeOptions,
    objects: usize,
    pub(crate) warnings: Vec<Warning>,
}

impl<'o> DecodeState<'o> {
    pub(crate) fn new(options: &'o DecodeOptions) -> Self {
        Self {
            options,
            objects: 0,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn enter_object(&mut self, depth: usize) -> Result<()> {
        self.objects += 1;
        let limits = &self.options.limits;
        if self.objects > limits.max_objects {
            return Err(Error::LimitExceeded {
                limit: "max_objects",
                max: limits.max_objects,
            });
        }
        if depth > limits.max_depth {
            return Err(Error::LimitExceeded {
                limit: "max_depth",
                max: limits.max_depth,
            });
        }
        Ok(())
    }

    /// Abort in strict mode, otherwise record the problem and carry on.
    pub(crate) fn malformed(&mut self, err: FormatError) -> Result<()> {
        if self.options.is_strict() || err.is_truncation() {
            return Err(err.into());
        }
        tracing::warn!(%err, "skipping malformed value");
        self.warnings.push(err.into());
        Ok(())
    }
}
