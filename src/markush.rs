//! Markush (R-group) enumeration.
//!
//! Substituent alternatives come from the document's alternative groups.
//! Every combination of choices for the labels a molecule actually uses is
//! materialised as its own molecule with no placeholders left.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use crate::atom::Atom;
use crate::cdx::enums::{BondOrder, NodeType};
use crate::cdx::{ObjectId, ObjectType};
use crate::config::Limits;
use crate::document::Document;
use crate::error::{ConstraintViolation, Warning};
use crate::graph_ops;
use crate::mol::{EZStereo, TetrahedralStereo};
use crate::molecule::{self, Molecule};
use crate::stereo;

const RGROUP_BASES: &[&str] = &["Ar", "R", "X", "Y", "E", "L"];

/// `R`, `X`, `Y`, `Ar`, `E` or `L`, optionally followed by digits and/or
/// primes.
pub fn is_rgroup_label(label: &str) -> bool {
    let label = label.trim();
    RGROUP_BASES.iter().any(|base| {
        label.strip_prefix(base).is_some_and(|rest| {
            let rest = rest.trim_end_matches(['\'', '′', '"', '″']);
            rest.chars().all(|c| c.is_ascii_digit())
        })
    })
}

/// One alternative for a label.
#[derive(Debug, Clone)]
pub struct Substituent {
    pub molecule: Molecule,
    /// Connection-point atoms, ordered by connection number.
    pub connection_points: Vec<NodeIndex>,
}

impl Substituent {
    fn from_molecule(label: &str, molecule: Molecule) -> Result<Self, ConstraintViolation> {
        let mut connection_points: Vec<NodeIndex> = molecule
            .atoms()
            .filter(|&a| molecule.atom(a).is_connection_point())
            .collect();
        connection_points.sort_by_key(|&a| {
            let num = molecule.atom(a).external_connection_num;
            (num.is_none(), num, a)
        });
        let valid = match connection_points.len() {
            0 => molecule.atom_count() == 1,
            1 | 2 => true,
            _ => false,
        };
        if !valid {
            return Err(ConstraintViolation::ConnectionPointCount {
                label: label.to_owned(),
                count: connection_points.len(),
            });
        }
        Ok(Self {
            molecule,
            connection_points,
        })
    }

    /// Atoms other than connection points.
    fn body(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.molecule
            .atoms()
            .filter(|a| !self.connection_points.contains(a))
    }

    /// The lone atom of a one-atom substituent.
    fn single_atom(&self) -> Option<&Atom> {
        if self.connection_points.len() > 1 {
            return None;
        }
        let mut body = self.body();
        match (body.next(), body.next()) {
            (Some(only), None) => Some(self.molecule.atom(only)),
            _ => None,
        }
    }

    /// Body atom bonded to a connection point, with that bond's order.
    fn anchor(&self, cp: NodeIndex) -> Option<(NodeIndex, BondOrder)> {
        let anchor = self.molecule.neighbors(cp).next()?;
        let order = self
            .molecule
            .bond_between(cp, anchor)
            .map(|e| self.molecule.bond(e).order)
            .unwrap_or(BondOrder::SINGLE);
        Some((anchor, order))
    }
}

/// Label → alternatives table built from alternative groups.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    by_label: BTreeMap<String, Vec<Substituent>>,
    alt_group_labels: HashMap<ObjectId, String>,
}

impl Definitions {
    /// Collect every labelled alternative group. Members with an invalid
    /// connection-point count are skipped with a warning.
    pub fn from_document(doc: &Document, assign_stereo: bool) -> (Self, Vec<Warning>) {
        let mut defs = Self::default();
        let mut warnings = Vec::new();
        for group in doc.all_of_kind(ObjectType::AltGroup) {
            let Some(label) = doc.label(group).map(str::to_owned) else {
                debug!(alt_group = doc.get(group).id, "unlabelled alternative group");
                continue;
            };
            defs.alt_group_labels.insert(doc.get(group).id, label.clone());
            let members = doc
                .children(group)
                .iter()
                .filter(|&&c| doc.get(c).kind() != ObjectType::Text)
                .flat_map(|&c| doc.fragments_under(c));
            for member in members {
                let mut mol = molecule::from_fragment(doc, member).molecule;
                if assign_stereo {
                    stereo::assign(&mut mol);
                }
                match Substituent::from_molecule(&label, mol) {
                    Ok(sub) => defs.by_label.entry(label.clone()).or_default().push(sub),
                    Err(violation) => {
                        warn!(%violation, "substituent skipped");
                        warnings.push(violation.into());
                    }
                }
            }
        }
        (defs, warnings)
    }

    pub fn insert(&mut self, label: impl Into<String>, substituent: Substituent) {
        self.by_label.entry(label.into()).or_default().push(substituent);
    }

    pub fn get(&self, label: &str) -> Option<&[Substituent]> {
        self.by_label.get(label).map(Vec::as_slice)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.by_label.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// Label a placeholder atom stands for, if it is one.
    pub fn label_of(&self, atom: &Atom) -> Option<String> {
        if let Some(label) = atom.alt_group.and_then(|id| self.alt_group_labels.get(&id)) {
            return Some(label.clone());
        }
        let label = atom.label.as_deref()?.trim();
        let named = matches!(
            atom.node_type,
            NodeType::GenericNickname
                | NodeType::NamedAlternativeGroup
                | NodeType::AnonymousAlternativeGroup
        );
        let defined = is_rgroup_label(label) || self.by_label.contains_key(label);
        (atom.atomic_num == 0 && (named || defined)).then(|| label.to_owned())
    }
}

/// One enumerated structure.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Label → index of the chosen alternative.
    pub assignment: BTreeMap<String, usize>,
    pub molecule: Molecule,
}

#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub variants: Vec<Variant>,
    pub warnings: Vec<Warning>,
}

/// Enumerate every combination of alternatives for the labels present in
/// `mol`. A molecule without defined placeholders comes back as its only
/// variant, as does one whose combination count exceeds the limit.
pub fn enumerate(mol: &Molecule, defs: &Definitions, limits: &Limits) -> Enumeration {
    let placeholders: Vec<(NodeIndex, String)> = mol
        .atoms()
        .filter_map(|a| defs.label_of(mol.atom(a)).map(|l| (a, l)))
        .filter(|(_, l)| defs.get(l).is_some_and(|subs| !subs.is_empty()))
        .collect();
    let labels: Vec<&str> = placeholders
        .iter()
        .map(|(_, l)| l.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut out = Enumeration::default();
    let unchanged = |out: &mut Enumeration| {
        out.variants.push(Variant {
            assignment: BTreeMap::new(),
            molecule: mol.clone(),
        })
    };
    if labels.is_empty() {
        unchanged(&mut out);
        return out;
    }

    let sizes: Vec<usize> = labels
        .iter()
        .map(|l| defs.get(l).map_or(0, <[Substituent]>::len))
        .collect();
    let total = sizes.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n));
    match total {
        Some(n) if n <= limits.max_combinations => {}
        _ => {
            let violation = ConstraintViolation::TooManyCombinations {
                count: total.unwrap_or(usize::MAX),
            };
            warn!(%violation, "enumeration skipped");
            out.warnings.push(violation.into());
            unchanged(&mut out);
            return out;
        }
    }

    let mut choices = Vec::new();
    backtrack(&sizes, &mut Vec::with_capacity(sizes.len()), &mut choices);
    debug!(labels = labels.len(), variants = choices.len(), "enumerating");

    for choice in choices {
        let assignment: BTreeMap<String, usize> = labels
            .iter()
            .zip(&choice)
            .map(|(l, &c)| ((*l).to_owned(), c))
            .collect();
        let mut sub = Substitution {
            mol: mol.clone(),
            remove: Vec::new(),
            warnings: Vec::new(),
        };
        for (label, &index) in &assignment {
            let Some(substituent) = defs.get(label).and_then(|s| s.get(index)) else {
                continue;
            };
            let sites: Vec<NodeIndex> = placeholders
                .iter()
                .filter(|(_, l)| l == label)
                .map(|&(a, _)| a)
                .collect();
            sub.apply(label, substituent, &sites);
        }
        let (molecule, warnings) = sub.finish();
        out.warnings.extend(warnings);
        out.variants.push(Variant {
            assignment,
            molecule,
        });
    }
    out
}

/// Every index tuple with `choice[i] < sizes[i]`, first label slowest.
fn backtrack(sizes: &[usize], current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    let depth = current.len();
    if depth == sizes.len() {
        out.push(current.clone());
        return;
    }
    for i in 0..sizes[depth] {
        current.push(i);
        backtrack(sizes, current, out);
        current.pop();
    }
}

struct Substitution {
    mol: Molecule,
    remove: Vec<NodeIndex>,
    warnings: Vec<Warning>,
}

impl Substitution {
    fn apply(&mut self, label: &str, sub: &Substituent, sites: &[NodeIndex]) {
        if let Some(atom) = sub.single_atom() {
            for &p in sites {
                self.swap(p, atom);
            }
            return;
        }
        match sub.connection_points.as_slice() {
            [cp] => {
                for &p in sites {
                    match self.external_neighbors(p).as_slice() {
                        [n] => {
                            let copy = self.copy_in(sub, p, &[(*cp, *n)]);
                            self.fuse(p, *n, sub, *cp, &copy);
                            self.remove.push(p);
                        }
                        other => self.reject(label, other.len()),
                    }
                }
            }
            [cp1, cp2] => self.apply_bridging(label, sub, *cp1, *cp2, sites),
            _ => {}
        }
    }

    /// Direct atom swap; the placeholder keeps its place in the graph.
    fn swap(&mut self, p: NodeIndex, atom: &Atom) {
        let old = self.mol.atom(p);
        let replacement = Atom {
            position_2d: old.position_2d,
            position_3d: old.position_3d,
            map_number: old.map_number,
            ..atom.clone()
        };
        *self.mol.atom_mut(p) = replacement;
    }

    fn apply_bridging(
        &mut self,
        label: &str,
        sub: &Substituent,
        cp1: NodeIndex,
        cp2: NodeIndex,
        sites: &[NodeIndex],
    ) {
        let mut lone: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for &p in sites {
            match self.external_neighbors(p).as_slice() {
                [n1, n2] => {
                    let copy = self.copy_in(sub, p, &[(cp1, *n1), (cp2, *n2)]);
                    self.fuse(p, *n1, sub, cp1, &copy);
                    self.fuse(p, *n2, sub, cp2, &copy);
                    self.remove.push(p);
                }
                [n] => lone.push((p, *n)),
                other => self.reject(label, other.len()),
            }
        }

        // one-neighbour placeholders pair up with their nearest partner
        while let Some((p, n)) = lone.pop() {
            let partner = lone
                .iter()
                .enumerate()
                .filter_map(|(i, &(q, _))| {
                    graph_ops::shortest_path(&self.mol, p, q).map(|path| (path.len(), i))
                })
                .min()
                .map(|(_, i)| lone.remove(i));
            let Some((q, m)) = partner else {
                self.reject(label, 1);
                continue;
            };
            let copy = self.copy_in(sub, p, &[(cp1, n), (cp2, m)]);
            self.fuse(p, n, sub, cp1, &copy);
            self.fuse(q, m, sub, cp2, &copy);
            self.remove.extend([p, q]);
        }
    }

    fn reject(&mut self, label: &str, count: usize) {
        let violation = ConstraintViolation::PlaceholderNeighbours {
            label: label.to_owned(),
            count,
        };
        warn!(%violation, "placeholder left in place");
        self.warnings.push(violation.into());
    }

    /// Distinct neighbours of a placeholder, in bond order.
    fn external_neighbors(&self, p: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self.mol.bonds_of(p).collect();
        edges.sort();
        let mut out = Vec::new();
        for e in edges {
            if let Some((a, b)) = self.mol.bond_endpoints(e) {
                let other = if a == p { b } else { a };
                if other != p && !out.contains(&other) {
                    out.push(other);
                }
            }
        }
        out
    }

    /// Append the substituent body, moved so its first anchor sits where
    /// the placeholder was drawn. Connection points map onto the external
    /// atoms they will bond to, which carries the substituent's own stereo
    /// across.
    fn copy_in(
        &mut self,
        sub: &Substituent,
        p: NodeIndex,
        attachments: &[(NodeIndex, NodeIndex)],
    ) -> HashMap<NodeIndex, NodeIndex> {
        let delta = attachments
            .first()
            .and_then(|&(cp, _)| sub.anchor(cp))
            .and_then(|(anchor, _)| {
                let [ax, ay] = sub.molecule.atom(anchor).position_2d?;
                let [px, py] = self.mol.atom(p).position_2d?;
                Some([px - ax, py - ay])
            });

        let mut map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for a in sub.body() {
            let mut atom = sub.molecule.atom(a).clone();
            if let (Some([x, y]), Some([dx, dy])) = (atom.position_2d, delta) {
                atom.position_2d = Some([x + dx, y + dy]);
            }
            map.insert(a, self.mol.add_atom(atom));
        }
        for e in sub.molecule.bonds() {
            let Some((a, b)) = sub.molecule.bond_endpoints(e) else {
                continue;
            };
            if let (Some(&na), Some(&nb)) = (map.get(&a), map.get(&b)) {
                self.mol.add_bond(na, nb, sub.molecule.bond(e).clone());
            }
        }

        let mut with_externals = map.clone();
        with_externals.extend(attachments.iter().copied());
        let lookup = |n: NodeIndex| with_externals.get(&n).copied();
        for s in sub.molecule.tetrahedral_stereo() {
            let ligands: Option<Vec<NodeIndex>> = s.ligands.iter().map(|&l| lookup(l)).collect();
            if let (Some(focus), Some(ligands)) = (lookup(s.focus), ligands) {
                if let Ok(ligands) = ligands.try_into() {
                    self.mol.add_tetrahedral_stereo(TetrahedralStereo {
                        focus,
                        ligands,
                        winding: s.winding,
                    });
                }
            }
        }
        for s in sub.molecule.ez_stereo() {
            let ends = [s.bond.0, s.bond.1, s.refs[0], s.refs[1]].map(lookup);
            if let [Some(a), Some(b), Some(ra), Some(rb)] = ends {
                self.mol
                    .add_ez_stereo(EZStereo::new(a, b, ra, rb, s.conformation));
            }
        }
        map
    }

    /// Move the placeholder's bond to `n` onto the anchor of `cp`, keeping
    /// the bond's direction. A non-single connection-point bond sets the
    /// order.
    fn fuse(
        &mut self,
        p: NodeIndex,
        n: NodeIndex,
        sub: &Substituent,
        cp: NodeIndex,
        copy: &HashMap<NodeIndex, NodeIndex>,
    ) {
        let Some((anchor, order)) = sub.anchor(cp) else {
            return;
        };
        let Some(&anchor) = copy.get(&anchor) else {
            return;
        };
        let Some(edge) = self.mol.bond_between(p, n) else {
            return;
        };
        let Some((begin, _)) = self.mol.bond_endpoints(edge) else {
            return;
        };
        let Some(mut bond) = self.mol.remove_bond(edge) else {
            return;
        };
        if order != BondOrder::SINGLE {
            bond.order = order;
        }
        if begin == n {
            self.mol.add_bond(n, anchor, bond);
        } else {
            self.mol.add_bond(anchor, n, bond);
        }
        self.mol.replace_in_stereo(p, anchor);
    }

    fn finish(self) -> (Molecule, Vec<Warning>) {
        let mol = if self.remove.is_empty() {
            self.mol
        } else {
            graph_ops::remove_atoms(&self.mol, &self.remove).0
        };
        (mol, self.warnings)
    }
}
