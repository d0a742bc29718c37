//! Scalar and composite property values, and their binary/text codecs.
//!
//! Every coordinate in a CDX stream is a 16.16 fixed-point number in
//! points: a little-endian `INT16` fraction followed by a little-endian
//! `INT16` integer part. Binary points store y before x; text points are
//! written `x y`.

use super::enums::EnumKind;
use super::flags::FlagKind;
use super::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub fn center(&self) -> [f64; 2] {
        [(self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0]
    }
}

/// One formatting run inside a CDX string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleRun {
    pub start: u16,
    pub font: u16,
    pub face: super::flags::FontFace,
    pub size: u16,
    pub color: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    pub runs: Vec<StyleRun>,
    pub text: String,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: Vec::new(),
            text: text.into(),
        }
    }
}

/// Integer width used when a value is written back to a binary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
        }
    }
}

/// Declared payload type of a property tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int(Width),
    UInt(Width),
    Boolean,
    Float64,
    Coordinate,
    Point2D,
    Point3D,
    Rect,
    ObjectId,
    ObjectIdList,
    String,
    Bytes,
    Enum(EnumKind),
    Flags(FlagKind),
}

/// A decoded property payload.
///
/// Enum and flag properties are kept as their integer encoding; the object
/// graph builder maps them onto typed values through the tables in
/// [`enums`](super::enums) and [`flags`](super::flags).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Bool(bool),
    Float(f64),
    Point2([f64; 2]),
    Point3([f64; 3]),
    Rect(Rect),
    Id(ObjectId),
    Ids(Vec<ObjectId>),
    Text(StyledText),
    Bytes(Vec<u8>),
}

impl PropertyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(b) => Some(*b as i64),
            Self::Float(f) => Some(f.round() as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<ObjectId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Int(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[ObjectId]> {
        match self {
            Self::Ids(ids) => Some(ids),
            _ => None,
        }
    }
}

/// Decode a 16.16 fixed-point value from its four little-endian bytes.
pub fn fixed_point(bytes: [u8; 4]) -> f64 {
    let fraction = u16::from_le_bytes([bytes[0], bytes[1]]);
    let integer = i16::from_le_bytes([bytes[2], bytes[3]]);
    integer as f64 + fraction as f64 / 65536.0
}

pub fn encode_fixed_point(value: f64) -> [u8; 4] {
    let raw = (value * 65536.0).round() as i32;
    raw.to_le_bytes()
}

pub fn float64(bytes: [u8; 8]) -> f64 {
    f64::from_le_bytes(bytes)
}

fn int_le(payload: &[u8], signed: bool) -> Option<i64> {
    Some(match (payload.len(), signed) {
        (1, true) => payload[0] as i8 as i64,
        (1, false) => payload[0] as i64,
        (2, true) => i16::from_le_bytes([payload[0], payload[1]]) as i64,
        (2, false) => u16::from_le_bytes([payload[0], payload[1]]) as i64,
        (4, true) => i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as i64,
        (4, false) => u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as i64,
        _ => return None,
    })
}

fn fixed_at(payload: &[u8], i: usize) -> f64 {
    fixed_point([
        payload[4 * i],
        payload[4 * i + 1],
        payload[4 * i + 2],
        payload[4 * i + 3],
    ])
}

fn id_at(payload: &[u8], i: usize) -> ObjectId {
    u32::from_le_bytes([
        payload[4 * i],
        payload[4 * i + 1],
        payload[4 * i + 2],
        payload[4 * i + 3],
    ])
}

/// Decode a binary payload of the given kind.
///
/// On a size mismatch returns the number of bytes the kind expects.
pub fn decode(kind: ValueKind, payload: &[u8]) -> Result<PropertyValue, usize> {
    match kind {
        ValueKind::Int(w) => int_le(payload, true).map(PropertyValue::Int).ok_or(w.bytes()),
        ValueKind::UInt(w) => int_le(payload, false).map(PropertyValue::Int).ok_or(w.bytes()),
        ValueKind::Enum(e) => int_le(payload, true)
            .map(PropertyValue::Int)
            .ok_or(e.width().bytes()),
        ValueKind::Flags(f) => int_le(payload, false)
            .map(PropertyValue::Int)
            .ok_or(f.width().bytes()),
        ValueKind::Boolean => Ok(PropertyValue::Bool(
            payload.is_empty() || payload.iter().any(|&b| b != 0),
        )),
        ValueKind::Float64 => {
            let bytes: [u8; 8] = payload.try_into().map_err(|_| 8usize)?;
            Ok(PropertyValue::Float(float64(bytes)))
        }
        ValueKind::Coordinate => {
            let bytes: [u8; 4] = payload.try_into().map_err(|_| 4usize)?;
            Ok(PropertyValue::Float(fixed_point(bytes)))
        }
        ValueKind::Point2D => {
            if payload.len() != 8 {
                return Err(8);
            }
            let y = fixed_at(payload, 0);
            let x = fixed_at(payload, 1);
            Ok(PropertyValue::Point2([x, y]))
        }
        ValueKind::Point3D => {
            if payload.len() != 12 {
                return Err(12);
            }
            Ok(PropertyValue::Point3([
                fixed_at(payload, 0),
                fixed_at(payload, 1),
                fixed_at(payload, 2),
            ]))
        }
        ValueKind::Rect => {
            if payload.len() != 16 {
                return Err(16);
            }
            Ok(PropertyValue::Rect(Rect {
                top: fixed_at(payload, 0),
                left: fixed_at(payload, 1),
                bottom: fixed_at(payload, 2),
                right: fixed_at(payload, 3),
            }))
        }
        ValueKind::ObjectId => match payload.len() {
            4 => Ok(PropertyValue::Id(id_at(payload, 0))),
            2 => Ok(PropertyValue::Id(
                u16::from_le_bytes([payload[0], payload[1]]) as ObjectId,
            )),
            _ => Err(4),
        },
        ValueKind::ObjectIdList => {
            if payload.len() % 4 != 0 {
                return Err(payload.len().next_multiple_of(4));
            }
            Ok(PropertyValue::Ids(
                (0..payload.len() / 4).map(|i| id_at(payload, i)).collect(),
            ))
        }
        ValueKind::String => decode_string(payload).map(PropertyValue::Text),
        ValueKind::Bytes => Ok(PropertyValue::Bytes(payload.to_vec())),
    }
}

const STYLE_RUN_LEN: usize = 10;

fn decode_string(payload: &[u8]) -> Result<StyledText, usize> {
    if payload.len() < 2 {
        return Err(2);
    }
    let run_count = u16::from_le_bytes([payload[0], payload[1]]) as usize;
    let text_start = 2 + run_count * STYLE_RUN_LEN;
    if payload.len() < text_start {
        return Err(text_start);
    }
    let word = |at: usize| u16::from_le_bytes([payload[at], payload[at + 1]]);
    let runs = (0..run_count)
        .map(|r| {
            let at = 2 + r * STYLE_RUN_LEN;
            StyleRun {
                start: word(at),
                font: word(at + 2),
                face: super::flags::FontFace::from_bits(word(at + 4) as u32),
                size: word(at + 6),
                color: word(at + 8),
            }
        })
        .collect();
    Ok(StyledText {
        runs,
        text: decode_chars(&payload[text_start..]),
    })
}

/// CDX strings are nominally Windows-1252; UTF-8 is accepted when valid and
/// anything else falls back to a byte-per-char Latin-1 reading.
fn decode_chars(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Encode a value of the given kind into a binary payload.
pub fn encode(kind: ValueKind, value: &PropertyValue) -> Vec<u8> {
    fn int_bytes(v: i64, w: Width) -> Vec<u8> {
        match w {
            Width::W8 => vec![v as u8],
            Width::W16 => (v as u16).to_le_bytes().to_vec(),
            Width::W32 => (v as u32).to_le_bytes().to_vec(),
        }
    }
    match (kind, value) {
        (ValueKind::Int(w) | ValueKind::UInt(w), v) => int_bytes(v.as_int().unwrap_or(0), w),
        (ValueKind::Enum(e), v) => int_bytes(v.as_int().unwrap_or(0), e.width()),
        (ValueKind::Flags(f), v) => int_bytes(v.as_int().unwrap_or(0), f.width()),
        (ValueKind::Boolean, v) => vec![v.as_bool().unwrap_or(false) as u8],
        (ValueKind::Float64, v) => v.as_float().unwrap_or(0.0).to_le_bytes().to_vec(),
        (ValueKind::Coordinate, v) => encode_fixed_point(v.as_float().unwrap_or(0.0)).to_vec(),
        (ValueKind::Point2D, PropertyValue::Point2([x, y])) => {
            [encode_fixed_point(*y), encode_fixed_point(*x)].concat()
        }
        (ValueKind::Point3D, PropertyValue::Point3(p)) => p
            .iter()
            .flat_map(|&c| encode_fixed_point(c))
            .collect(),
        (ValueKind::Rect, PropertyValue::Rect(r)) => [r.top, r.left, r.bottom, r.right]
            .iter()
            .flat_map(|&c| encode_fixed_point(c))
            .collect(),
        (ValueKind::ObjectId, v) => v.as_id().unwrap_or(0).to_le_bytes().to_vec(),
        (ValueKind::ObjectIdList, PropertyValue::Ids(ids)) => {
            ids.iter().flat_map(|id| id.to_le_bytes()).collect()
        }
        (ValueKind::String, PropertyValue::Text(t)) => {
            let mut out = (t.runs.len() as u16).to_le_bytes().to_vec();
            for run in &t.runs {
                for word in [run.start, run.font, run.face.bits() as u16, run.size, run.color] {
                    out.extend_from_slice(&word.to_le_bytes());
                }
            }
            out.extend_from_slice(t.text.as_bytes());
            out
        }
        (ValueKind::Bytes, PropertyValue::Bytes(b)) => b.clone(),
        _ => Vec::new(),
    }
}

fn floats<const N: usize>(text: &str) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    let mut parts = text.split_whitespace();
    for slot in out.iter_mut() {
        *slot = parts.next()?.parse().ok()?;
    }
    parts.next().is_none().then_some(out)
}

fn parse_int(text: &str) -> Option<i64> {
    let t = text.trim();
    t.parse::<i64>()
        .ok()
        .or_else(|| t.parse::<f64>().ok().map(|f| f.round() as i64))
}

/// Parse a CDXML attribute value of the given kind.
pub fn parse_text(kind: ValueKind, text: &str) -> Option<PropertyValue> {
    match kind {
        ValueKind::Int(_) | ValueKind::UInt(_) => parse_int(text).map(PropertyValue::Int),
        ValueKind::Boolean => match text.trim() {
            "yes" | "true" | "1" => Some(PropertyValue::Bool(true)),
            "no" | "false" | "0" => Some(PropertyValue::Bool(false)),
            _ => None,
        },
        ValueKind::Float64 | ValueKind::Coordinate => {
            text.trim().parse().ok().map(PropertyValue::Float)
        }
        ValueKind::Point2D => floats::<2>(text).map(PropertyValue::Point2),
        ValueKind::Point3D => floats::<3>(text).map(PropertyValue::Point3),
        ValueKind::Rect => floats::<4>(text).map(|[left, top, right, bottom]| {
            PropertyValue::Rect(Rect {
                top,
                left,
                bottom,
                right,
            })
        }),
        ValueKind::ObjectId => text.trim().parse().ok().map(PropertyValue::Id),
        ValueKind::ObjectIdList => text
            .split_whitespace()
            .map(|t| t.parse().ok())
            .collect::<Option<Vec<ObjectId>>>()
            .map(PropertyValue::Ids),
        ValueKind::String => Some(PropertyValue::Text(StyledText::plain(text))),
        ValueKind::Bytes => Some(PropertyValue::Bytes(text.as_bytes().to_vec())),
        ValueKind::Enum(e) => Some(PropertyValue::Int(
            parse_int(text).unwrap_or_else(|| e.ordinal_of(text.trim())),
        )),
        // Bond orders are written as tokens that look like numbers ("1.5").
        ValueKind::Flags(FlagKind::BondOrder) => {
            Some(PropertyValue::Int(FlagKind::BondOrder.bits_of(text) as i64))
        }
        ValueKind::Flags(f) => Some(PropertyValue::Int(
            parse_int(text).unwrap_or_else(|| f.bits_of(text) as i64),
        )),
    }
}

/// Format a value the way CDXML writes it.
pub fn format_text(kind: ValueKind, value: &PropertyValue) -> String {
    let num = |f: f64| {
        let s = format!("{f:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    match (kind, value) {
        (ValueKind::Enum(e), v) => e.token_of(v.as_int().unwrap_or(0)).to_string(),
        (ValueKind::Flags(f), v) => f.tokens_of(v.as_int().unwrap_or(0) as u32),
        (ValueKind::Boolean, v) => {
            if v.as_bool().unwrap_or(false) { "yes" } else { "no" }.to_string()
        }
        (_, PropertyValue::Int(v)) => v.to_string(),
        (_, PropertyValue::Bool(b)) => b.to_string(),
        (_, PropertyValue::Float(f)) => num(*f),
        (_, PropertyValue::Point2([x, y])) => format!("{} {}", num(*x), num(*y)),
        (_, PropertyValue::Point3([x, y, z])) => format!("{} {} {}", num(*x), num(*y), num(*z)),
        (_, PropertyValue::Rect(r)) => format!(
            "{} {} {} {}",
            num(r.left),
            num(r.top),
            num(r.right),
            num(r.bottom)
        ),
        (_, PropertyValue::Id(id)) => id.to_string(),
        (_, PropertyValue::Ids(ids)) => ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" "),
        (_, PropertyValue::Text(t)) => t.text.clone(),
        (_, PropertyValue::Bytes(b)) => String::from_utf8_lossy(b).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_reference_value() {
        let v = fixed_point([0x66, 0xA6, 0x4C, 0x00]);
        assert!((v - 76.65).abs() < 0.01, "got {v}");
    }

    #[test]
    fn fixed_point_negative() {
        let bytes = encode_fixed_point(-12.5);
        assert!((fixed_point(bytes) + 12.5).abs() < 1e-6);
    }

    #[test]
    fn float64_reference_value() {
        let v = float64([0, 0, 0, 0, 0, 0, 0x24, 0x40]);
        assert!((v - 10.0).abs() < 0.001);
    }

    #[test]
    fn point_is_stored_y_first() {
        let payload = [encode_fixed_point(20.0), encode_fixed_point(10.0)].concat();
        let v = decode(ValueKind::Point2D, &payload).unwrap();
        assert_eq!(v, PropertyValue::Point2([10.0, 20.0]));
        assert_eq!(encode(ValueKind::Point2D, &v), payload);
    }

    #[test]
    fn int_widths_follow_payload_length() {
        assert_eq!(
            decode(ValueKind::Int(Width::W8), &[0xFF]).unwrap(),
            PropertyValue::Int(-1)
        );
        assert_eq!(
            decode(ValueKind::Int(Width::W8), &[0xFE, 0xFF, 0xFF, 0xFF]).unwrap(),
            PropertyValue::Int(-2)
        );
        assert_eq!(
            decode(ValueKind::UInt(Width::W16), &[0xFF, 0xFF]).unwrap(),
            PropertyValue::Int(65535)
        );
        assert_eq!(decode(ValueKind::Int(Width::W16), &[1, 2, 3]), Err(2));
    }

    #[test]
    fn bad_lengths_report_expected_size() {
        assert_eq!(decode(ValueKind::Float64, &[0; 4]), Err(8));
        assert_eq!(decode(ValueKind::Point3D, &[0; 8]), Err(12));
        assert_eq!(decode(ValueKind::ObjectIdList, &[0; 6]), Err(8));
    }

    #[test]
    fn string_with_style_run() {
        let mut payload = vec![1, 0];
        for word in [0u16, 3, 1, 10, 0] {
            payload.extend_from_slice(&word.to_le_bytes());
        }
        payload.extend_from_slice(b"OMe");
        let v = decode(ValueKind::String, &payload).unwrap();
        let PropertyValue::Text(t) = &v else {
            panic!("expected text")
        };
        assert_eq!(t.text, "OMe");
        assert_eq!(t.runs.len(), 1);
        assert!(t.runs[0].face.bold);
        assert_eq!(encode(ValueKind::String, &v), payload);
    }

    #[test]
    fn latin1_fallback() {
        let payload = [0, 0, b'a', 0xB0];
        let v = decode(ValueKind::String, &payload).unwrap();
        assert_eq!(v.as_text(), Some("a\u{B0}"));
    }

    #[test]
    fn text_rect_is_left_top_right_bottom() {
        let v = parse_text(ValueKind::Rect, "1 2 3 4").unwrap();
        assert_eq!(
            v,
            PropertyValue::Rect(Rect {
                top: 2.0,
                left: 1.0,
                bottom: 4.0,
                right: 3.0
            })
        );
        assert_eq!(format_text(ValueKind::Rect, &v), "1 2 3 4");
    }

    #[test]
    fn text_points_and_ids() {
        assert_eq!(
            parse_text(ValueKind::Point2D, "1.5 -2").unwrap(),
            PropertyValue::Point2([1.5, -2.0])
        );
        assert!(parse_text(ValueKind::Point2D, "1.5").is_none());
        assert!(parse_text(ValueKind::Point2D, "1 2 3").is_none());
        assert_eq!(
            parse_text(ValueKind::ObjectIdList, "4 5 6").unwrap(),
            PropertyValue::Ids(vec![4, 5, 6])
        );
        assert!(parse_text(ValueKind::ObjectId, "x").is_none());
    }

    #[test]
    fn bond_order_tokens_are_not_integers() {
        let kind = ValueKind::Flags(FlagKind::BondOrder);
        assert_eq!(parse_text(kind, "3"), Some(PropertyValue::Int(0x4)));
        assert_eq!(parse_text(kind, "1.5"), Some(PropertyValue::Int(0x80)));
        assert_eq!(format_text(kind, &PropertyValue::Int(0x4)), "3");
    }
}
