use thiserror::Error;

use crate::cdx::ObjectId;

/// Where in the input a decoding problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Byte offset into a binary CDX stream.
    Offset(usize),
    /// 1-based line and column in a CDXML document.
    LineColumn { line: u32, column: u32 },
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offset(offset) => write!(f, "byte {offset}"),
            Self::LineColumn { line, column } => write!(f, "line {line}, column {column}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatErrorKind {
    /// The stream does not start with the `VjCD0100` header.
    BadHeader,
    /// The first object is not a Document.
    MissingDocument,
    /// The stream ended inside a record.
    Truncated,
    /// An object was opened but never closed.
    UnclosedObject,
    /// A property payload has the wrong size for its declared type.
    BadLength { tag: u16, expected: usize, got: usize },
    /// A text attribute could not be parsed as its declared type.
    BadValue { property: String, text: String },
    /// The text document is not well-formed XML.
    Xml(String),
}

impl std::fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadHeader => write!(f, "missing CDX header"),
            Self::MissingDocument => write!(f, "root object is not a document"),
            Self::Truncated => write!(f, "stream truncated inside a record"),
            Self::UnclosedObject => write!(f, "object never closed"),
            Self::BadLength { tag, expected, got } => write!(
                f,
                "property 0x{tag:04X} has {got} bytes, expected {expected}"
            ),
            Self::BadValue { property, text } => {
                write!(f, "attribute '{property}' has unparseable value {text:?}")
            }
            Self::Xml(detail) => write!(f, "malformed XML: {detail}"),
        }
    }
}

/// A malformed input stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}")]
pub struct FormatError {
    pub position: Position,
    pub kind: FormatErrorKind,
}

impl FormatError {
    pub fn at_offset(offset: usize, kind: FormatErrorKind) -> Self {
        Self {
            position: Position::Offset(offset),
            kind,
        }
    }

    pub fn at_line(line: u32, column: u32, kind: FormatErrorKind) -> Self {
        Self {
            position: Position::LineColumn { line, column },
            kind,
        }
    }

    /// Truncation is the only condition that aborts a decode in every mode.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self.kind,
            FormatErrorKind::Truncated | FormatErrorKind::UnclosedObject
        )
    }
}

/// An ID-valued property that names no object in the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("object {from} property {property} references missing object {target}")]
pub struct ReferenceError {
    pub from: ObjectId,
    pub property: &'static str,
    pub target: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("bracket {bracket} has {count} crossing bonds, expected 0 or 2")]
    CrossingBondCount { bracket: ObjectId, count: usize },
    #[error("substituent for '{label}' has {count} connection points, expected 1 or 2")]
    ConnectionPointCount { label: String, count: usize },
    #[error("placeholder '{label}' has {count} neighbours, cannot attach substituent")]
    PlaceholderNeighbours { label: String, count: usize },
    #[error("bond {bond} joins atoms owned by different fragments")]
    ForeignBondEndpoint { bond: ObjectId },
    #[error("bracket {bracket} repeat count {count} exceeds the configured limit")]
    RepeatCount { bracket: ObjectId, count: usize },
    #[error("Markush enumeration would produce {count} variants, above the configured limit")]
    TooManyCombinations { count: usize },
}

/// Errors returned by the decoding and reconstruction entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
    #[error("no dictionary entry for '{0}'")]
    LookupMiss(String),
    #[error("document exceeds the {limit} limit of {max}")]
    LimitExceeded { limit: &'static str, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A recoverable problem recorded instead of aborting.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    Format(FormatError),
    Reference(ReferenceError),
    Constraint(ConstraintViolation),
    /// The chemistry toolkit rejected a reconstructed structure.
    Toolkit { fragment: ObjectId, message: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(e) => write!(f, "{e}"),
            Self::Reference(e) => write!(f, "{e}"),
            Self::Constraint(e) => write!(f, "{e}"),
            Self::Toolkit { fragment, message } => {
                write!(f, "toolkit failed on fragment {fragment}: {message}")
            }
        }
    }
}

impl From<FormatError> for Warning {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<ReferenceError> for Warning {
    fn from(e: ReferenceError) -> Self {
        Self::Reference(e)
    }
}

impl From<ConstraintViolation> for Warning {
    fn from(e: ConstraintViolation) -> Self {
        Self::Constraint(e)
    }
}
