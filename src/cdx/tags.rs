//! The object and property tag table.
//!
//! This table is the crate's wire contract: each object type has one binary
//! tag (≥ `0x8000`) and one CDXML element name; each property has one
//! binary tag (< `0x8000`), one CDXML attribute name and a declared payload
//! kind. Tags missing from the table are skipped by both readers.

use super::enums::EnumKind;
use super::flags::FlagKind;
use super::value::{ValueKind, Width};

macro_rules! object_types {
    ($($variant:ident = $tag:literal => $element:literal,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ObjectType {
            $($variant,)+
            /// An object tag the table does not list. CDXML elements that
            /// are not in the table carry tag 0.
            Unknown(u16),
        }

        impl ObjectType {
            pub fn from_tag(tag: u16) -> Self {
                match tag {
                    $($tag => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            pub fn tag(self) -> u16 {
                match self {
                    $(Self::$variant => $tag,)+
                    Self::Unknown(tag) => tag,
                }
            }

            pub fn from_element(name: &str) -> Self {
                match name {
                    $($element => Self::$variant,)+
                    _ => Self::Unknown(0),
                }
            }

            pub fn element(self) -> &'static str {
                match self {
                    $(Self::$variant => $element,)+
                    Self::Unknown(_) => "unknown",
                }
            }
        }
    };
}

object_types! {
    Document = 0x8000 => "CDXML",
    Page = 0x8001 => "page",
    Group = 0x8002 => "group",
    Fragment = 0x8003 => "fragment",
    Node = 0x8004 => "n",
    Bond = 0x8005 => "b",
    Text = 0x8006 => "t",
    Graphic = 0x8007 => "graphic",
    Curve = 0x8008 => "curve",
    Picture = 0x8009 => "embeddedobject",
    AltGroup = 0x800A => "altgroup",
    ReactionScheme = 0x800D => "scheme",
    ReactionStep = 0x800E => "step",
    Spectrum = 0x8010 => "spectrum",
    ObjectTag = 0x8011 => "objecttag",
    Table = 0x8016 => "table",
    Bracket = 0x8017 => "bracketedgroup",
    BracketAttachment = 0x8018 => "bracketattachment",
    CrossingBond = 0x8019 => "crossingbond",
    Border = 0x8020 => "border",
    Geometry = 0x8021 => "geometry",
    Constraint = 0x8022 => "constraint",
    TlcPlate = 0x8023 => "tlcplate",
    TlcLane = 0x8024 => "tlclane",
    TlcSpot = 0x8025 => "tlcspot",
    ChemicalProperty = 0x8026 => "chemicalproperty",
    Arrow = 0x8027 => "arrow",
}

macro_rules! properties {
    ($($variant:ident = $tag:literal => $attr:literal, $kind:expr;)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Property {
            $($variant,)+
        }

        impl Property {
            pub const ALL: &'static [Property] = &[$(Self::$variant,)+];

            pub fn from_tag(tag: u16) -> Option<Self> {
                match tag {
                    $($tag => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn tag(self) -> u16 {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }

            pub fn from_attribute(name: &str) -> Option<Self> {
                match name {
                    $($attr => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn attribute(self) -> &'static str {
                match self {
                    $(Self::$variant => $attr,)+
                }
            }

            pub fn kind(self) -> ValueKind {
                match self {
                    $(Self::$variant => $kind,)+
                }
            }
        }
    };
}

use ValueKind::{
    Boolean, Coordinate, Float64, ObjectId, ObjectIdList, Point2D, Point3D, Rect, String as Str,
};

const I8: ValueKind = ValueKind::Int(Width::W8);
const I16: ValueKind = ValueKind::Int(Width::W16);
const U16: ValueKind = ValueKind::UInt(Width::W16);

const fn e(kind: EnumKind) -> ValueKind {
    ValueKind::Enum(kind)
}

const fn f(kind: FlagKind) -> ValueKind {
    ValueKind::Flags(kind)
}

properties! {
    CreationProgram = 0x0003 => "CreationProgram", Str;
    Name = 0x0008 => "Name", Str;
    ZOrder = 0x000A => "Z", I16;
    SupersededBy = 0x0013 => "SupersededBy", ObjectId;

    Position2D = 0x0200 => "p", Point2D;
    Position3D = 0x0201 => "xyz", Point3D;
    BoundingBox = 0x0204 => "BoundingBox", Rect;
    Head3D = 0x0207 => "Head3D", Point3D;
    Tail3D = 0x0208 => "Tail3D", Point3D;
    Center3D = 0x020D => "Center3D", Point3D;

    ForegroundColor = 0x0301 => "color", U16;

    NodeType = 0x0400 => "NodeType", e(EnumKind::NodeType);
    Element = 0x0402 => "Element", I16;
    Isotope = 0x0420 => "Isotope", I16;
    Charge = 0x0421 => "Charge", I8;
    Radical = 0x0422 => "Radical", e(EnumKind::Radical);
    NumHydrogens = 0x042B => "NumHydrogens", U16;
    Geometry = 0x0430 => "Geometry", e(EnumKind::AtomGeometry);
    BondOrdering = 0x0431 => "BondOrdering", ObjectIdList;
    Attachments = 0x0432 => "Attachments", ObjectIdList;
    GenericNickname = 0x0433 => "GenericNickname", Str;
    AltGroupId = 0x0434 => "AltGroupID", ObjectId;
    AtomCip = 0x0437 => "AS", e(EnumKind::AtomCip);
    AtomNumber = 0x0439 => "AtomNumber", Str;
    LinkCountLow = 0x043D => "LinkCountLow", I16;
    LinkCountHigh = 0x043E => "LinkCountHigh", I16;
    ExternalConnectionType = 0x0440 => "ExternalConnectionType", e(EnumKind::ExternalConnectionType);
    EnhancedStereoType = 0x0446 => "EnhancedStereoType", e(EnumKind::EnhancedStereoType);
    EnhancedStereoGroup = 0x0447 => "EnhancedStereoGroupNum", I16;
    ExternalConnectionNum = 0x0449 => "ExternalConnectionNum", I16;

    Racemic = 0x0500 => "Racemic", Boolean;
    Absolute = 0x0501 => "Absolute", Boolean;
    Relative = 0x0502 => "Relative", Boolean;
    ConnectionOrder = 0x0505 => "ConnectionOrder", ObjectIdList;

    BondOrder = 0x0600 => "Order", f(FlagKind::BondOrder);
    BondDisplay = 0x0601 => "Display", e(EnumKind::BondDisplay);
    BondDisplay2 = 0x0602 => "Display2", e(EnumKind::BondDisplay);
    BondBegin = 0x0604 => "B", ObjectId;
    BondEnd = 0x0605 => "E", ObjectId;
    BondBeginAttach = 0x0608 => "BeginAttach", I8;
    BondEndAttach = 0x0609 => "EndAttach", I8;
    BondCip = 0x060A => "BS", e(EnumKind::BondCip);
    CrossingBonds = 0x060E => "CrossingBonds", ObjectIdList;

    Text = 0x0700 => "Text", Str;
    InterpretChemically = 0x0708 => "InterpretChemically", Boolean;

    BondLength = 0x0805 => "BondLength", Coordinate;

    GraphicType = 0x0A00 => "GraphicType", e(EnumKind::GraphicType);
    LineType = 0x0A02 => "LineType", f(FlagKind::LineStyle);
    RectangleType = 0x0A03 => "RectangleType", f(FlagKind::RectangleStyle);
    OvalType = 0x0A04 => "OvalType", f(FlagKind::OvalStyle);
    CurveType = 0x0A08 => "CurveType", f(FlagKind::SplineStyle);
    ArrowType = 0x0A0A => "ArrowType", e(EnumKind::ArrowType);
    ArrowheadHead = 0x0A25 => "ArrowheadHead", e(EnumKind::ArrowheadPosition);
    ArrowheadTail = 0x0A26 => "ArrowheadTail", e(EnumKind::ArrowheadPosition);
    ArrowheadType = 0x0A27 => "ArrowheadType", e(EnumKind::ArrowheadType);
    ArrowSource = 0x0A28 => "ArrowSource", ObjectIdList;
    ArrowTarget = 0x0A29 => "ArrowTarget", ObjectIdList;
    LabelFace = 0x0A30 => "LabelFace", f(FlagKind::FontFace);

    RepeatCount = 0x0A60 => "RepeatCount", Float64;
    BracketUsage = 0x0A61 => "BracketUsage", e(EnumKind::BracketUsage);
    SruLabel = 0x0A62 => "SRULabel", Str;
    BracketFlip = 0x0A63 => "PolymerFlipType", e(EnumKind::BracketFlip);
    BracketedObjects = 0x0A71 => "BracketedObjectIDs", ObjectIdList;
    GraphicId = 0x0A72 => "GraphicID", ObjectId;
    CrossingBondId = 0x0A73 => "BondID", ObjectId;
    InnerAtomId = 0x0A74 => "InnerAtomID", ObjectId;

    TextFrame = 0x0B80 => "TextFrame", Rect;
    GroupFrame = 0x0B81 => "GroupFrame", Rect;
    Valence = 0x0B82 => "Valence", I16;

    StepReactants = 0x0C01 => "ReactionStepReactants", ObjectIdList;
    StepProducts = 0x0C02 => "ReactionStepProducts", ObjectIdList;
    StepPlusses = 0x0C03 => "ReactionStepPlusses", ObjectIdList;
    StepArrows = 0x0C04 => "ReactionStepArrows", ObjectIdList;
    StepAboveArrow = 0x0C05 => "ReactionStepObjectsAboveArrow", ObjectIdList;
    StepBelowArrow = 0x0C06 => "ReactionStepObjectsBelowArrow", ObjectIdList;
    StepAtomMap = 0x0C07 => "ReactionStepAtomMap", ObjectIdList;
}
