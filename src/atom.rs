use crate::cdx::enums::{AtomCip, AtomGeometry, NodeType, Radical};
use crate::cdx::ObjectId;

/// Atom weight of a reconstructed [`Molecule`](crate::Molecule).
///
/// Holds what was drawn, not what a toolkit would perceive: there is no
/// implicit hydrogen count, no aromaticity and no valence. Coordinates use
/// the toolkit convention, y pointing up.
///
/// # Examples
///
/// ```
/// use cdxcrab::Atom;
///
/// let oxygen = Atom { atomic_num: 8, formal_charge: -1, ..Atom::default() };
/// assert_eq!(oxygen.symbol(), "O");
/// assert!(!oxygen.is_placeholder());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atomic number; `0` for labels, attachment points and other pseudo atoms.
    pub atomic_num: u8,
    pub formal_charge: i8,
    /// Mass number. `0` means natural abundance.
    pub isotope: u16,
    pub radical: Radical,
    /// Hydrogens drawn explicitly in the label, if ChemDraw recorded them.
    pub explicit_hydrogens: Option<u8>,
    pub node_type: NodeType,
    /// Label text for nicknames, generic labels and R-groups.
    pub label: Option<String>,
    /// Structure of an unexpanded abbreviation, as dictionary SMILES.
    pub abbreviation: Option<String>,
    pub position_2d: Option<[f64; 2]>,
    pub position_3d: Option<[f64; 3]>,
    pub cip: AtomCip,
    pub geometry: AtomGeometry,
    /// Reaction atom-map number; `0` when unmapped.
    pub map_number: u16,
    /// Node this atom was built from.
    pub source: Option<ObjectId>,
    /// Alternative group a placeholder node points at.
    pub alt_group: Option<ObjectId>,
    pub link_count: Option<(i16, i16)>,
    pub external_connection_num: Option<i16>,
}

impl Default for Atom {
    fn default() -> Self {
        Self {
            atomic_num: 6,
            formal_charge: 0,
            isotope: 0,
            radical: Radical::None,
            explicit_hydrogens: None,
            node_type: NodeType::Element,
            label: None,
            abbreviation: None,
            position_2d: None,
            position_3d: None,
            cip: AtomCip::Undetermined,
            geometry: AtomGeometry::Unknown,
            map_number: 0,
            source: None,
            alt_group: None,
            link_count: None,
            external_connection_num: None,
        }
    }
}

impl Atom {
    pub fn symbol(&self) -> &str {
        match crate::element::symbol(self.atomic_num) {
            Some(sym) => sym,
            None => self.label.as_deref().unwrap_or("*"),
        }
    }

    /// Generic labels and alternative-group markers that stand for a
    /// substituent still to be chosen.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.node_type,
            NodeType::GenericNickname
                | NodeType::NamedAlternativeGroup
                | NodeType::AnonymousAlternativeGroup
        ) || self.alt_group.is_some()
    }

    pub fn is_connection_point(&self) -> bool {
        self.node_type == NodeType::ExternalConnectionPoint
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_num == 1
    }
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasPosition2D for Atom {
    fn position_2d(&self) -> Option<[f64; 2]> {
        self.position_2d
    }
}
