use crate::cdx::enums::{BondCip, BondDisplay, BondOrder};
use crate::cdx::ObjectId;

/// Stereo flag handed to a toolkit, derived from how the bond was drawn.
///
/// `Up`/`Down` have their narrow end on the bond's begin atom; the
/// `Inverted` forms have it on the end atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    Down,
    UpInverted,
    DownInverted,
    UpOrDown,
}

impl BondStereo {
    pub fn from_display(display: BondDisplay) -> Self {
        match display {
            BondDisplay::WedgeBegin | BondDisplay::Bold => Self::Up,
            BondDisplay::Hash | BondDisplay::WedgedHashBegin => Self::Down,
            BondDisplay::WedgeEnd => Self::UpInverted,
            BondDisplay::WedgedHashEnd => Self::DownInverted,
            BondDisplay::Wavy => Self::UpOrDown,
            _ => Self::None,
        }
    }

    /// `+1` toward the viewer, `-1` away, `0` for plain and wavy bonds.
    pub fn elevation(self) -> i8 {
        match self {
            Self::Up | Self::UpInverted => 1,
            Self::Down | Self::DownInverted => -1,
            _ => 0,
        }
    }

    /// Whether the narrow end sits on the begin atom. Meaningless for
    /// `None` and `UpOrDown`.
    pub fn narrow_at_begin(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub display: BondDisplay,
    pub stereo: BondStereo,
    pub cip: BondCip,
    /// Document bond this edge was built from. Clones keep their original's
    /// source.
    pub source: Option<ObjectId>,
}

impl Default for Bond {
    fn default() -> Self {
        Self {
            order: BondOrder::SINGLE,
            display: BondDisplay::Solid,
            stereo: BondStereo::None,
            cip: BondCip::Undetermined,
            source: None,
        }
    }
}

impl Bond {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn with_order(order: BondOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }
}
