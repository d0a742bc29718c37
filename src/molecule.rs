//! Fragment → molecular graph.
//!
//! A [`Molecule`] is what the reconstruction passes work on and what the
//! toolkit finally receives. Extraction never touches the document.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::{debug, trace};

use crate::atom::Atom;
use crate::bond::{Bond, BondStereo};
use crate::cdx::enums::NodeType;
use crate::cdx::ObjectId;
use crate::dictionary;
use crate::document::{Document, Handle};
use crate::graph_ops;
use crate::mol::Mol;

pub type Molecule = Mol<Atom, Bond>;

impl Molecule {
    /// First atom built from the given document node. Originals precede
    /// their clones, so this is the drawn atom when one exists.
    pub fn atom_by_source(&self, id: ObjectId) -> Option<NodeIndex> {
        self.atoms().find(|&a| self.atom(a).source == Some(id))
    }

    pub fn bond_by_source(&self, id: ObjectId) -> Option<EdgeIndex> {
        self.bonds().find(|&b| self.bond(b).source == Some(id))
    }

    /// Atoms still standing for an unchosen substituent.
    pub fn placeholders(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.atoms().filter(|&a| self.atom(a).is_placeholder())
    }
}

/// Result of [`from_fragment`].
#[derive(Debug, Clone)]
pub struct Extraction {
    pub molecule: Molecule,
    /// Abbreviation labels neither drawn out nor in the dictionary.
    pub unknown_labels: BTreeSet<String>,
}

struct Expanded {
    /// Inner atoms the outer bonds attach to, in attachment order.
    anchors: Vec<NodeIndex>,
}

struct Extractor<'d> {
    doc: &'d Document,
    mol: Molecule,
    atoms: HashMap<Handle, NodeIndex>,
    expanded: HashMap<Handle, Expanded>,
    connection_points: Vec<NodeIndex>,
    unknown_labels: BTreeSet<String>,
}

/// Build the molecular graph of one fragment.
///
/// Abbreviation nodes that carry their own drawn fragment are replaced by
/// it, with outer bonds moved onto the atoms next to the inner
/// connection points. Undrawn abbreviations keep a pseudo atom and get
/// their structure from the dictionary when it knows the label.
pub fn from_fragment(doc: &Document, fragment: Handle) -> Extraction {
    let mut ex = Extractor {
        doc,
        mol: Molecule::new(),
        atoms: HashMap::new(),
        expanded: HashMap::new(),
        connection_points: Vec::new(),
        unknown_labels: BTreeSet::new(),
    };
    ex.add_fragment(fragment, false);

    let molecule = if ex.connection_points.is_empty() {
        ex.mol
    } else {
        graph_ops::remove_atoms(&ex.mol, &ex.connection_points).0
    };
    trace!(
        fragment = doc.get(fragment).id,
        atoms = molecule.atom_count(),
        bonds = molecule.bond_count(),
        "extracted fragment"
    );
    Extraction {
        molecule,
        unknown_labels: ex.unknown_labels,
    }
}

impl Extractor<'_> {
    fn add_fragment(&mut self, fragment: Handle, nested: bool) {
        let doc = self.doc;
        for node in doc.fragment_nodes(fragment) {
            match doc.nested_fragment(node) {
                Some(inner) if doc.fragment_nodes(inner).next().is_some() => {
                    self.expand_nested(node, inner);
                }
                _ => {
                    let atom = self.atom_for(node);
                    let idx = self.mol.add_atom(atom);
                    self.atoms.insert(node, idx);
                    if nested && self.mol.atom(idx).is_connection_point() {
                        self.connection_points.push(idx);
                    }
                }
            }
        }

        for bond in doc.fragment_bonds(fragment) {
            let Some(b) = doc.bond(bond) else { continue };
            let (Some(begin), Some(end)) = (b.begin.target, b.end.target) else {
                continue;
            };
            let begin = self.endpoint(begin, bond);
            let end = self.endpoint(end, bond);
            let (Some(begin), Some(end)) = (begin, end) else {
                debug!(bond = doc.get(bond).id, "bond endpoint outside fragment, skipped");
                continue;
            };
            if begin == end {
                continue;
            }
            self.mol.add_bond(
                begin,
                end,
                Bond {
                    order: b.order,
                    display: b.display,
                    stereo: BondStereo::from_display(b.display),
                    cip: b.cip,
                    source: Some(doc.get(bond).id),
                },
            );
        }
    }

    fn expand_nested(&mut self, node: Handle, inner: Handle) {
        let doc = self.doc;
        let before = self.connection_points.len();
        self.add_fragment(inner, true);

        let mut points: Vec<(Option<i16>, usize, NodeIndex)> = self.connection_points[before..]
            .iter()
            .enumerate()
            .map(|(order, &cp)| (self.mol.atom(cp).external_connection_num, order, cp))
            .collect();
        points.sort_by_key(|&(num, order, _)| (num.is_none(), num, order));

        let mut anchors: Vec<NodeIndex> = points
            .iter()
            .filter_map(|&(_, _, cp)| self.mol.neighbors(cp).next())
            .collect();
        if anchors.is_empty() {
            // no marked connection point: attach to the first inner atom
            if let Some(first) = doc.fragment_nodes(inner).find_map(|n| self.atoms.get(&n)) {
                anchors.push(*first);
            }
        }
        debug!(
            node = doc.get(node).id,
            anchors = anchors.len(),
            "expanded nested abbreviation"
        );
        self.expanded.insert(node, Expanded { anchors });
    }

    /// Atom an outer bond lands on. For an expanded abbreviation node the
    /// i-th bond (by the node's bond ordering, else document order) takes
    /// the i-th anchor.
    fn endpoint(&self, node: Handle, bond: Handle) -> Option<NodeIndex> {
        if let Some(idx) = self.atoms.get(&node) {
            return Some(*idx);
        }
        let expanded = self.expanded.get(&node)?;
        let doc = self.doc;
        let ordering = doc.node(node).map(|n| &n.bond_ordering);
        let slot = ordering
            .and_then(|links| links.iter().position(|l| l.target == Some(bond)))
            .or_else(|| {
                let parent = doc.parent(bond)?;
                doc.fragment_bonds(parent)
                    .filter(|&b| {
                        doc.bond(b).is_some_and(|b| {
                            b.begin.target == Some(node) || b.end.target == Some(node)
                        })
                    })
                    .position(|b| b == bond)
            })
            .unwrap_or(0);
        expanded
            .anchors
            .get(slot)
            .or_else(|| expanded.anchors.last())
            .copied()
    }

    fn atom_for(&mut self, handle: Handle) -> Atom {
        let doc = self.doc;
        let object = doc.get(handle);
        let Some(node) = object.as_node() else {
            return Atom::default();
        };

        let atomic_num = match node.node_type {
            NodeType::Element | NodeType::Unspecified | NodeType::LinkNode => node.element,
            _ => 0,
        };
        let label = match node.node_type {
            NodeType::GenericNickname => node
                .generic_nickname
                .clone()
                .or_else(|| doc.label(handle).map(str::to_owned)),
            NodeType::Element | NodeType::Unspecified => None,
            _ => doc.label(handle).map(str::to_owned),
        };

        let abbreviation = match (node.node_type, &label) {
            (NodeType::Nickname | NodeType::Fragment | NodeType::Formula, Some(text)) => {
                match dictionary::abbreviations().get(text) {
                    Some(smiles) => Some(smiles.to_owned()),
                    None => {
                        self.unknown_labels.insert(text.clone());
                        None
                    }
                }
            }
            _ => None,
        };

        let link_count = match node.link_count {
            (None, None) => None,
            (low, high) => Some((low.unwrap_or(1), high.or(low).unwrap_or(1))),
        };

        Atom {
            atomic_num,
            formal_charge: node.charge,
            isotope: node.isotope,
            radical: node.radical,
            explicit_hydrogens: node.num_hydrogens.map(|h| h.min(u8::MAX as u16) as u8),
            node_type: node.node_type,
            label,
            abbreviation,
            position_2d: node.position.map(flip_2d),
            position_3d: node.position_3d.map(flip_3d),
            cip: node.cip,
            geometry: node.geometry,
            map_number: 0,
            source: Some(object.id),
            alt_group: node.alt_group.as_ref().map(|l| l.id),
            link_count,
            external_connection_num: node.external_connection_num,
        }
    }
}

/// Document y grows downward; molecules use y up.
pub(crate) fn flip_2d([x, y]: [f64; 2]) -> [f64; 2] {
    [x, -y]
}

pub(crate) fn flip_3d([x, y, z]: [f64; 3]) -> [f64; 3] {
    [x, -y, z]
}

/// Molecules of every valid fragment under `handle`, in document order.
pub fn fragments(doc: &Document, handle: Handle) -> Vec<(Handle, Extraction)> {
    doc.fragments_under(handle)
        .into_iter()
        .map(|f| (f, from_fragment(doc, f)))
        .collect()
}
