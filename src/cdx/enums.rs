//! Enumerated property values.
//!
//! Each enum is a fixed ordinal ↔ token table. Ordinals outside the table,
//! and tokens the table does not list, decode to the enum's default rather
//! than failing.

use super::value::Width;

macro_rules! cdx_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $width:ident, default $default:ident {
            $($variant:ident = $ord:literal => $token:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant,)+];
            pub const WIDTH: Width = Width::$width;

            pub fn from_ordinal(ordinal: i64) -> Self {
                match ordinal {
                    $($ord => Self::$variant,)+
                    _ => Self::$default,
                }
            }

            pub fn ordinal(self) -> i64 {
                match self {
                    $(Self::$variant => $ord,)+
                }
            }

            pub fn from_token(token: &str) -> Self {
                match token {
                    $($token => Self::$variant,)+
                    _ => Self::$default,
                }
            }

            pub fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }
    };
}

cdx_enum! {
    /// What a node stands for: a plain element, a label, an attachment point, ...
    pub enum NodeType: W16, default Unspecified {
        Unspecified = 0 => "Unspecified",
        Element = 1 => "Element",
        ElementList = 2 => "ElementList",
        ElementListNickname = 3 => "ElementListNickname",
        Nickname = 4 => "Nickname",
        Fragment = 5 => "Fragment",
        Formula = 6 => "Formula",
        GenericNickname = 7 => "GenericNickname",
        AnonymousAlternativeGroup = 8 => "AnonymousAlternativeGroup",
        NamedAlternativeGroup = 9 => "NamedAlternativeGroup",
        MultiAttachment = 10 => "MultiAttachment",
        VariableAttachment = 11 => "VariableAttachment",
        ExternalConnectionPoint = 12 => "ExternalConnectionPoint",
        LinkNode = 13 => "LinkNode",
    }
}

impl NodeType {
    /// Node types that on their own make a fragment worth keeping.
    pub fn is_chemical(self) -> bool {
        matches!(
            self,
            Self::Element
                | Self::ElementList
                | Self::ElementListNickname
                | Self::Nickname
                | Self::Fragment
                | Self::Formula
        )
    }
}

cdx_enum! {
    pub enum AtomGeometry: W8, default Unknown {
        Unknown = 0 => "Unknown",
        OneLigand = 1 => "1",
        Linear = 2 => "Linear",
        Bent = 3 => "Bent",
        TrigonalPlanar = 4 => "TrigonalPlanar",
        TrigonalPyramidal = 5 => "TrigonalPyramidal",
        SquarePlanar = 6 => "SquarePlanar",
        Tetrahedral = 7 => "Tetrahedral",
        TrigonalBipyramidal = 8 => "TrigonalBipyramidal",
        SquarePyramidal = 9 => "SquarePyramidal",
        FiveLigand = 10 => "5",
        Octahedral = 11 => "Octahedral",
        SixLigand = 12 => "6",
        SevenLigand = 13 => "7",
        EightLigand = 14 => "8",
        NineLigand = 15 => "9",
        TenLigand = 16 => "10",
    }
}

cdx_enum! {
    pub enum AtomCip: W8, default Undetermined {
        Undetermined = 0 => "U",
        None = 1 => "N",
        R = 2 => "R",
        S = 3 => "S",
        PseudoR = 4 => "r",
        PseudoS = 5 => "s",
        Unspecified = 6 => "u",
    }
}

cdx_enum! {
    pub enum BondCip: W8, default Undetermined {
        Undetermined = 0 => "U",
        None = 1 => "N",
        E = 2 => "E",
        Z = 3 => "Z",
    }
}

cdx_enum! {
    pub enum BondDisplay: W16, default Solid {
        Solid = 0 => "Solid",
        Dash = 1 => "Dash",
        Hash = 2 => "Hash",
        WedgedHashBegin = 3 => "WedgedHashBegin",
        WedgedHashEnd = 4 => "WedgedHashEnd",
        Bold = 5 => "Bold",
        WedgeBegin = 6 => "WedgeBegin",
        WedgeEnd = 7 => "WedgeEnd",
        Wavy = 8 => "Wavy",
        HollowWedgeBegin = 9 => "HollowWedgeBegin",
        HollowWedgeEnd = 10 => "HollowWedgeEnd",
        WavyWedgeBegin = 11 => "WavyWedgeBegin",
        WavyWedgeEnd = 12 => "WavyWedgeEnd",
        Dot = 13 => "Dot",
        DashDot = 14 => "DashDot",
    }
}

cdx_enum! {
    pub enum Radical: W8, default None {
        None = 0 => "None",
        Singlet = 1 => "Singlet",
        Doublet = 2 => "Doublet",
        Triplet = 3 => "Triplet",
    }
}

cdx_enum! {
    pub enum BracketUsage: W8, default Unspecified {
        Unspecified = 0 => "Unspecified",
        Anypolymer = 18 => "Anypolymer",
        Component = 13 => "Component",
        Copolymer = 6 => "Copolymer",
        CopolymerAlternating = 7 => "CopolymerAlternating",
        CopolymerBlock = 9 => "CopolymerBlock",
        CopolymerRandom = 8 => "CopolymerRandom",
        Crosslink = 10 => "Crosslink",
        Generic = 17 => "Generic",
        Graft = 11 => "Graft",
        Mer = 5 => "Mer",
        MixtureOrdered = 15 => "MixtureOrdered",
        MixtureUnordered = 14 => "MixtureUnordered",
        Modification = 12 => "Modification",
        Monomer = 4 => "Monomer",
        MultipleGroup = 16 => "MultipleGroup",
        Sru = 3 => "SRU",
    }
}

cdx_enum! {
    pub enum BracketFlip: W8, default None {
        None = 0 => "None",
        HeadToTail = 1 => "HeadToTail",
        HeadToHead = 2 => "HeadToHead",
        EitherUnknown = 3 => "EitherUnknown",
    }
}

cdx_enum! {
    /// What sits on one end of an arrow.
    pub enum ArrowheadPosition: W16, default Unspecified {
        Unspecified = 0 => "Unspecified",
        None = 1 => "None",
        Full = 2 => "Full",
        HalfLeft = 3 => "HalfLeft",
        HalfRight = 4 => "HalfRight",
    }
}

impl ArrowheadPosition {
    pub fn is_half(self) -> bool {
        matches!(self, Self::HalfLeft | Self::HalfRight)
    }

    pub fn is_drawn(self) -> bool {
        matches!(self, Self::Full | Self::HalfLeft | Self::HalfRight)
    }
}

cdx_enum! {
    pub enum ArrowheadType: W16, default Unspecified {
        Unspecified = 0 => "Unspecified",
        Solid = 1 => "Solid",
        Hollow = 2 => "Hollow",
        Angle = 3 => "Angle",
    }
}

cdx_enum! {
    pub enum GraphicType: W16, default Undefined {
        Undefined = 0 => "Undefined",
        Line = 1 => "Line",
        Arc = 2 => "Arc",
        Rectangle = 3 => "Rectangle",
        Oval = 4 => "Oval",
        Orbital = 5 => "Orbital",
        Bracket = 6 => "Bracket",
        Symbol = 7 => "Symbol",
    }
}

cdx_enum! {
    /// Arrow style carried by legacy line graphics.
    pub enum ArrowType: W16, default NoHead {
        NoHead = 0 => "NoHead",
        HalfHead = 1 => "HalfHead",
        FullHead = 2 => "FullHead",
        Resonance = 4 => "Resonance",
        Equilibrium = 8 => "Equilibrium",
        Hollow = 16 => "Hollow",
        RetroSynthetic = 32 => "RetroSynthetic",
    }
}

cdx_enum! {
    pub enum ExternalConnectionType: W8, default Unspecified {
        Unspecified = 0 => "Unspecified",
        Diamond = 1 => "Diamond",
        Star = 2 => "Star",
        PolymerBead = 3 => "PolymerBead",
        Wavy = 4 => "Wavy",
    }
}

cdx_enum! {
    pub enum EnhancedStereoType: W8, default Unspecified {
        Unspecified = 0 => "Unspecified",
        None = 1 => "None",
        Absolute = 2 => "Absolute",
        Or = 3 => "Or",
        And = 4 => "And",
    }
}

/// Names every enum table, so a property tag can declare which one its
/// values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    NodeType,
    AtomGeometry,
    AtomCip,
    BondCip,
    BondDisplay,
    Radical,
    BracketUsage,
    BracketFlip,
    ArrowheadPosition,
    ArrowheadType,
    GraphicType,
    ArrowType,
    ExternalConnectionType,
    EnhancedStereoType,
}

macro_rules! dispatch {
    ($kind:expr, $ty:ident => $body:expr) => {
        match $kind {
            EnumKind::NodeType => { type $ty = NodeType; $body }
            EnumKind::AtomGeometry => { type $ty = AtomGeometry; $body }
            EnumKind::AtomCip => { type $ty = AtomCip; $body }
            EnumKind::BondCip => { type $ty = BondCip; $body }
            EnumKind::BondDisplay => { type $ty = BondDisplay; $body }
            EnumKind::Radical => { type $ty = Radical; $body }
            EnumKind::BracketUsage => { type $ty = BracketUsage; $body }
            EnumKind::BracketFlip => { type $ty = BracketFlip; $body }
            EnumKind::ArrowheadPosition => { type $ty = ArrowheadPosition; $body }
            EnumKind::ArrowheadType => { type $ty = ArrowheadType; $body }
            EnumKind::GraphicType => { type $ty = GraphicType; $body }
            EnumKind::ArrowType => { type $ty = ArrowType; $body }
            EnumKind::ExternalConnectionType => { type $ty = ExternalConnectionType; $body }
            EnumKind::EnhancedStereoType => { type $ty = EnhancedStereoType; $body }
        }
    };
}

impl EnumKind {
    pub fn width(self) -> Width {
        dispatch!(self, T => T::WIDTH)
    }

    /// Ordinal for a text token; unknown tokens give the default's ordinal.
    pub fn ordinal_of(self, token: &str) -> i64 {
        dispatch!(self, T => T::from_token(token).ordinal())
    }

    /// Token for an ordinal; unknown ordinals give the default's token.
    pub fn token_of(self, ordinal: i64) -> &'static str {
        dispatch!(self, T => T::from_ordinal(ordinal).token())
    }
}

/// Bond order bitmask. Query bonds set several bits at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BondOrder(pub u16);

impl Default for BondOrder {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl BondOrder {
    pub const SINGLE: Self = Self(0x0001);
    pub const DOUBLE: Self = Self(0x0002);
    pub const TRIPLE: Self = Self(0x0004);
    pub const QUADRUPLE: Self = Self(0x0008);
    pub const QUINTUPLE: Self = Self(0x0010);
    pub const SEXTUPLE: Self = Self(0x0020);
    pub const HALF: Self = Self(0x0040);
    pub const ONE_HALF: Self = Self(0x0080);
    pub const TWO_HALF: Self = Self(0x0100);
    pub const THREE_HALF: Self = Self(0x0200);
    pub const FOUR_HALF: Self = Self(0x0400);
    pub const FIVE_HALF: Self = Self(0x0800);
    pub const DATIVE: Self = Self(0x1000);
    pub const IONIC: Self = Self(0x2000);
    pub const HYDROGEN: Self = Self(0x4000);
    pub const THREE_CENTER: Self = Self(0x8000);
    pub const SINGLE_OR_AROMATIC: Self = Self(0x0081);

    pub const TOKENS: &'static [(&'static str, u32)] = &[
        ("1", 0x0001),
        ("2", 0x0002),
        ("3", 0x0004),
        ("4", 0x0008),
        ("5", 0x0010),
        ("6", 0x0020),
        ("0.5", 0x0040),
        ("1.5", 0x0080),
        ("2.5", 0x0100),
        ("3.5", 0x0200),
        ("4.5", 0x0400),
        ("5.5", 0x0800),
        ("dative", 0x1000),
        ("ionic", 0x2000),
        ("hydrogen", 0x4000),
        ("threecenter", 0x8000),
    ];

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, other: BondOrder) -> bool {
        self.0 & other.0 == other.0
    }

    /// More than one order bit set.
    pub fn is_query(self) -> bool {
        self.0.count_ones() > 1
    }

    /// Integer multiplicity for plain single/double/triple/... orders.
    pub fn multiplicity(self) -> Option<u8> {
        match self {
            Self::SINGLE => Some(1),
            Self::DOUBLE => Some(2),
            Self::TRIPLE => Some(3),
            Self::QUADRUPLE => Some(4),
            Self::QUINTUPLE => Some(5),
            Self::SEXTUPLE => Some(6),
            _ => None,
        }
    }
}
