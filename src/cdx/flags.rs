//! Bit-flag composites.
//!
//! One bit per boolean flag; the all-zero value is the plain style. In
//! CDXML the same flags are written as a space-separated token list.

use super::enums::BondOrder;
use super::value::Width;

macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $width:ident {
            $($field:ident = $bit:literal => $token:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name {
            $(pub $field: bool,)+
        }

        impl $name {
            pub const TOKENS: &'static [(&'static str, u32)] = &[$(($token, $bit),)+];
            pub const WIDTH: Width = Width::$width;

            pub fn from_bits(bits: u32) -> Self {
                Self {
                    $($field: bits & $bit != 0,)+
                }
            }

            pub fn bits(self) -> u32 {
                let mut bits = 0;
                $(if self.$field {
                    bits |= $bit;
                })+
                bits
            }

            pub fn all() -> Self {
                Self {
                    $($field: true,)+
                }
            }

            pub fn is_plain(self) -> bool {
                self.bits() == 0
            }
        }
    };
}

flag_set! {
    pub struct LineStyle: W16 {
        dashed = 0x1 => "Dashed",
        bold = 0x2 => "Bold",
        wavy = 0x4 => "Wavy",
    }
}

flag_set! {
    pub struct OvalStyle: W16 {
        circle = 0x1 => "Circle",
        shaded = 0x2 => "Shaded",
        filled = 0x4 => "Filled",
        dashed = 0x8 => "Dashed",
        bold = 0x10 => "Bold",
        shadowed = 0x20 => "Shadowed",
    }
}

flag_set! {
    pub struct RectangleStyle: W16 {
        round_edge = 0x1 => "RoundEdge",
        shadow = 0x2 => "Shadow",
        shaded = 0x4 => "Shaded",
        filled = 0x8 => "Filled",
        dashed = 0x10 => "Dashed",
        bold = 0x20 => "Bold",
    }
}

flag_set! {
    pub struct SplineStyle: W16 {
        closed = 0x1 => "Closed",
        dashed = 0x2 => "Dashed",
        bold = 0x4 => "Bold",
        arrow_at_end = 0x8 => "ArrowAtEnd",
        arrow_at_start = 0x10 => "ArrowAtStart",
        half_arrow_at_end = 0x20 => "HalfArrowAtEnd",
        half_arrow_at_start = 0x40 => "HalfArrowAtStart",
        filled = 0x80 => "Filled",
        shaded = 0x100 => "Shaded",
    }
}

flag_set! {
    pub struct FontFace: W16 {
        bold = 0x1 => "Bold",
        italic = 0x2 => "Italic",
        underline = 0x4 => "Underline",
        outline = 0x8 => "Outline",
        shadow = 0x10 => "Shadow",
        subscript = 0x20 => "Subscript",
        superscript = 0x40 => "Superscript",
    }
}

/// Names every bit table a property tag can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    LineStyle,
    OvalStyle,
    RectangleStyle,
    SplineStyle,
    FontFace,
    BondOrder,
}

impl FlagKind {
    fn table(self) -> &'static [(&'static str, u32)] {
        match self {
            Self::LineStyle => LineStyle::TOKENS,
            Self::OvalStyle => OvalStyle::TOKENS,
            Self::RectangleStyle => RectangleStyle::TOKENS,
            Self::SplineStyle => SplineStyle::TOKENS,
            Self::FontFace => FontFace::TOKENS,
            Self::BondOrder => BondOrder::TOKENS,
        }
    }

    pub fn width(self) -> Width {
        match self {
            Self::LineStyle => LineStyle::WIDTH,
            Self::OvalStyle => OvalStyle::WIDTH,
            Self::RectangleStyle => RectangleStyle::WIDTH,
            Self::SplineStyle => SplineStyle::WIDTH,
            Self::FontFace => FontFace::WIDTH,
            Self::BondOrder => Width::W16,
        }
    }

    /// OR together the bits of every recognised token; others are ignored.
    pub fn bits_of(self, text: &str) -> u32 {
        let table = self.table();
        text.split_whitespace()
            .filter_map(|tok| {
                table
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(tok))
                    .map(|&(_, bit)| bit)
            })
            .fold(0, |acc, bit| acc | bit)
    }

    pub fn tokens_of(self, bits: u32) -> String {
        let tokens: Vec<&str> = self
            .table()
            .iter()
            .filter(|&&(_, bit)| bits & bit != 0)
            .map(|&(name, _)| name)
            .collect();
        if tokens.is_empty() {
            match self {
                Self::BondOrder => "1".to_string(),
                Self::FontFace => "Plain".to_string(),
                _ => "Solid".to_string(),
            }
        } else {
            tokens.join(" ")
        }
    }
}
