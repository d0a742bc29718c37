//! Binary CDX reader and writer.
//!
//! Layout: a 28-byte header, then a stream of records.
//!
//! ```text
//! header    "VjCD0100" 04 03 02 01 <16 reserved bytes>
//! object    tag:u16 (>= 0x8000)  id:u32  ...records...  0x0000
//! property  tag:u16 (<  0x8000)  len:u16 [len:u32 if len == 0xFFFF]  payload
//! ```
//!
//! All integers are little-endian. The first object must be the Document.

use tracing::{debug, trace};

use super::tags::{ObjectType, Property};
use super::value;
use super::{Decoded, DecodeState, RawObject};
use crate::config::DecodeOptions;
use crate::error::{FormatError, FormatErrorKind, Position, Result};

pub const MAGIC: &[u8; 8] = b"VjCD0100";
pub const HEADER_LEN: usize = 28;
const HEADER_TAIL: [u8; 4] = [0x04, 0x03, 0x02, 0x01];
const LONG_LENGTH: u16 = 0xFFFF;
const END_OF_OBJECT: u16 = 0;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn truncated(&self) -> FormatError {
        FormatError::at_offset(self.pos, FormatErrorKind::Truncated)
    }

    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], FormatError> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.truncated())?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> std::result::Result<u16, FormatError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> std::result::Result<u32, FormatError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

pub fn read(bytes: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(FormatError::at_offset(0, FormatErrorKind::BadHeader).into());
    }
    let mut cursor = Cursor { bytes, pos: 0 };
    cursor.take(HEADER_LEN)?;

    let start = cursor.pos;
    let tag = cursor.u16()?;
    if ObjectType::from_tag(tag) != ObjectType::Document {
        return Err(FormatError::at_offset(start, FormatErrorKind::MissingDocument).into());
    }

    let mut state = DecodeState::new(options);
    let root = read_object(&mut cursor, &mut state, tag, start, 0)?;
    if !cursor.at_end() {
        debug!(trailing = bytes.len() - cursor.pos, "ignoring bytes after document end");
    }
    Ok(Decoded {
        root,
        warnings: state.warnings,
    })
}

fn read_object(
    cursor: &mut Cursor<'_>,
    state: &mut DecodeState<'_>,
    tag: u16,
    start: usize,
    depth: usize,
) -> Result<RawObject> {
    state.enter_object(depth)?;
    let id = cursor.u32()?;
    let kind = ObjectType::from_tag(tag);
    if let ObjectType::Unknown(tag) = kind {
        debug!(tag = format_args!("0x{tag:04X}"), id, "unrecognised object tag");
    }
    trace!(?kind, id, offset = start, "object");

    let mut object = RawObject::new(kind, id);
    object.position = Position::Offset(start);

    loop {
        if cursor.at_end() {
            return Err(FormatError::at_offset(start, FormatErrorKind::UnclosedObject).into());
        }
        let record = cursor.pos;
        let tag = cursor.u16()?;
        if tag == END_OF_OBJECT {
            return Ok(object);
        }
        if tag & 0x8000 != 0 {
            let child = read_object(cursor, state, tag, record, depth + 1)?;
            object.children.push(child);
            continue;
        }

        let len = match cursor.u16()? {
            LONG_LENGTH => cursor.u32()? as usize,
            short => short as usize,
        };
        let payload = cursor.take(len)?;
        let Some(property) = Property::from_tag(tag) else {
            debug!(tag = format_args!("0x{tag:04X}"), len, "skipping unrecognised property");
            continue;
        };
        match value::decode(property.kind(), payload) {
            Ok(v) => object.properties.push((property, v)),
            Err(expected) => state.malformed(FormatError::at_offset(
                record,
                FormatErrorKind::BadLength {
                    tag,
                    expected,
                    got: len,
                },
            ))?,
        }
    }
}

/// Encode a record tree as a complete CDX stream, header included.
pub fn write(root: &RawObject) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 64 * root.count());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&HEADER_TAIL);
    out.extend_from_slice(&[0; 16]);
    write_object(&mut out, root);
    out
}

fn write_object(out: &mut Vec<u8>, object: &RawObject) {
    out.extend_from_slice(&object.kind.tag().to_le_bytes());
    out.extend_from_slice(&object.id.to_le_bytes());
    for (property, v) in &object.properties {
        let payload = value::encode(property.kind(), v);
        out.extend_from_slice(&property.tag().to_le_bytes());
        if payload.len() >= LONG_LENGTH as usize {
            out.extend_from_slice(&LONG_LENGTH.to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        } else {
            out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(&payload);
    }
    for child in &object.children {
        write_object(out, child);
    }
    out.extend_from_slice(&END_OF_OBJECT.to_le_bytes());
}
