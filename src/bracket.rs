//! Repeat-bracket (S-group) and link-node expansion.
//!
//! A bracket with repeat count `n` is replaced by `n` copies of its unit.
//! With two crossing bonds the copies are chained head to tail and the
//! last copy takes over the outgoing crossing bond; without crossing bonds
//! the copies stand alone. Expansion only appends atoms and bonds, except
//! for the outgoing crossing bond, which is re-added on its new endpoint.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use crate::bond::{Bond, BondStereo};
use crate::cdx::enums::NodeType;
use crate::cdx::{ObjectId, ObjectType};
use crate::config::Limits;
use crate::document::{Document, Handle};
use crate::error::{ConstraintViolation, Warning};
use crate::mol::{EZStereo, TetrahedralStereo};
use crate::molecule::Molecule;

/// A crossing bond resolved onto the molecule.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    inner: NodeIndex,
    outer: NodeIndex,
}

/// What one expansion did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub expanded: usize,
    pub warnings: Vec<Warning>,
}

impl Expansion {
    fn skip(&mut self, violation: ConstraintViolation) {
        warn!(%violation, "bracket skipped");
        self.warnings.push(violation.into());
    }
}

/// Expand every bracket of `doc` that encloses atoms of `mol`, then every
/// link node.
pub fn expand(doc: &Document, mol: &mut Molecule, limits: &Limits) -> Expansion {
    let mut out = Expansion::default();
    let mut units: HashMap<Handle, Vec<NodeIndex>> = HashMap::new();

    for bracket in innermost_first(doc) {
        let Some(data) = doc.get(bracket).as_bracket() else {
            continue;
        };
        let id = doc.get(bracket).id;

        let mut unit: BTreeSet<NodeIndex> = BTreeSet::new();
        for link in &data.objects {
            let Some(target) = link.target else { continue };
            match doc.get(target).kind() {
                ObjectType::Node => unit.extend(mol.atom_by_source(link.id)),
                ObjectType::Bracket => {
                    unit.extend(units.get(&target).into_iter().flatten().copied())
                }
                _ => {}
            }
        }
        if unit.is_empty() {
            continue;
        }

        let Some(count) = repeat_count(data.repeat_count) else {
            debug!(bracket = id, "no repeat to expand");
            units.insert(bracket, unit.into_iter().collect());
            continue;
        };
        if count > limits.max_repeat_count {
            out.skip(ConstraintViolation::RepeatCount { bracket: id, count });
            continue;
        }

        let crossing_links: Vec<(ObjectId, Option<ObjectId>)> = doc
            .children_of_kind(bracket, ObjectType::BracketAttachment)
            .flat_map(|att| doc.children_of_kind(att, ObjectType::CrossingBond))
            .filter_map(|cb| doc.get(cb).as_crossing_bond())
            .filter_map(|cb| Some((cb.bond.as_ref()?.id, cb.inner_atom.as_ref().map(|l| l.id))))
            .collect();
        if !matches!(crossing_links.len(), 0 | 2) {
            out.skip(ConstraintViolation::CrossingBondCount {
                bracket: id,
                count: crossing_links.len(),
            });
            continue;
        }
        let crossings: Option<Vec<Crossing>> = crossing_links
            .iter()
            .map(|&(bond, inner)| resolve_crossing(doc, mol, &unit, bond, inner))
            .collect();
        let Some(crossings) = crossings else {
            debug!(bracket = id, "crossing bond not in this molecule");
            continue;
        };

        let unit: Vec<NodeIndex> = unit.into_iter().collect();
        let ends = match crossings.as_slice() {
            [head, tail] => Some((*head, *tail)),
            _ => None,
        };
        let added = if unit.len() == 1 {
            repeat_atom(mol, unit[0], ends.map(|(_, tail)| tail), count)
        } else {
            repeat_unit(mol, &unit, ends, count)
        };
        debug!(bracket = id, count, added = added.len(), "expanded bracket");
        out.expanded += 1;
        units.insert(bracket, unit.into_iter().chain(added).collect());
    }

    expand_link_nodes(mol, limits, &mut out);
    out
}

/// Brackets ordered so that nested ones come before the brackets
/// enclosing them.
fn innermost_first(doc: &Document) -> Vec<Handle> {
    fn depth(
        doc: &Document,
        bracket: Handle,
        memo: &mut HashMap<Handle, usize>,
        guard: usize,
    ) -> usize {
        if let Some(&d) = memo.get(&bracket) {
            return d;
        }
        let nested: Vec<Handle> = doc
            .get(bracket)
            .as_bracket()
            .into_iter()
            .flat_map(|b| b.objects.iter().filter_map(|l| l.target))
            .filter(|&t| t != bracket && doc.get(t).kind() == ObjectType::Bracket)
            .collect();
        let d = if guard == 0 {
            0
        } else {
            nested
                .into_iter()
                .map(|n| depth(doc, n, memo, guard - 1) + 1)
                .max()
                .unwrap_or(0)
        };
        memo.insert(bracket, d);
        d
    }

    let mut memo = HashMap::new();
    let mut brackets: Vec<(usize, Handle)> = doc
        .all_of_kind(ObjectType::Bracket)
        .map(|b| (depth(doc, b, &mut memo, 64), b))
        .collect();
    brackets.sort();
    brackets.into_iter().map(|(_, b)| b).collect()
}

/// Rounded repeat count, or `None` when there is nothing to repeat.
fn repeat_count(raw: Option<f64>) -> Option<usize> {
    let n = raw?.round();
    (n.is_finite() && n >= 2.0).then_some(n as usize)
}

fn resolve_crossing(
    doc: &Document,
    mol: &Molecule,
    unit: &BTreeSet<NodeIndex>,
    bond: ObjectId,
    inner: Option<ObjectId>,
) -> Option<Crossing> {
    let b = doc.bond(doc.find(bond)?)?;
    let begin = mol.atom_by_source(b.begin.id)?;
    let end = mol.atom_by_source(b.end.id)?;
    let inner = match inner.and_then(|id| mol.atom_by_source(id)) {
        Some(atom) => atom,
        None if unit.contains(&begin) => begin,
        None => end,
    };
    let outer = if inner == begin { end } else { begin };
    Some(Crossing { inner, outer })
}

/// Bond linking consecutive repeats: the crossing bond's order and
/// display without its stereo flag.
fn link_bond(mol: &Molecule, crossing: Crossing) -> Bond {
    mol.bond_between(crossing.inner, crossing.outer)
        .map(|e| Bond {
            stereo: BondStereo::None,
            ..mol.bond(e).clone()
        })
        .unwrap_or_default()
}

/// Move the crossing bond's inner end onto `new_inner`, keeping its
/// direction. Stereo around the outer atom follows the bond; stereo at the
/// old inner atom now sees `successor`, the next repeat, where the outer
/// atom used to be.
fn redirect(
    mol: &mut Molecule,
    crossing: Crossing,
    new_inner: NodeIndex,
    successor: NodeIndex,
) {
    let Some(edge) = mol.bond_between(crossing.inner, crossing.outer) else {
        return;
    };
    let Some((begin, _)) = mol.bond_endpoints(edge) else {
        return;
    };
    let Some(bond) = mol.remove_bond(edge) else {
        return;
    };
    if begin == crossing.inner {
        mol.add_bond(new_inner, crossing.outer, bond);
    } else {
        mol.add_bond(crossing.outer, new_inner, bond);
    }
    mol.replace_neighbor_in_stereo(crossing.outer, crossing.inner, new_inner);
    mol.replace_neighbor_in_stereo(crossing.inner, crossing.outer, successor);
}

fn shifted(
    mol: &Molecule,
    atom: NodeIndex,
    delta: Option<[f64; 2]>,
    k: usize,
) -> crate::atom::Atom {
    let mut copy = mol.atom(atom).clone();
    if let (Some([x, y]), Some([dx, dy])) = (copy.position_2d, delta) {
        copy.position_2d = Some([x + dx * k as f64, y + dy * k as f64]);
    }
    copy
}

fn displacement(mol: &Molecule, from: NodeIndex, to: NodeIndex) -> Option<[f64; 2]> {
    let [fx, fy] = mol.atom(from).position_2d?;
    let [tx, ty] = mol.atom(to).position_2d?;
    Some([tx - fx, ty - fy])
}

/// Chain `count - 1` clones of `atom` behind it. With a tail crossing the
/// last clone takes over the outgoing bond.
fn repeat_atom(
    mol: &mut Molecule,
    atom: NodeIndex,
    tail: Option<Crossing>,
    count: usize,
) -> Vec<NodeIndex> {
    let link = tail.map(|t| link_bond(mol, t));
    let delta = tail.and_then(|t| displacement(mol, atom, t.outer));
    let mut added = Vec::with_capacity(count - 1);
    let mut prev = atom;
    for k in 1..count {
        let clone = mol.add_atom(shifted(mol, atom, delta, k));
        if let Some(bond) = &link {
            mol.add_bond(prev, clone, bond.clone());
        }
        added.push(clone);
        prev = clone;
    }
    if let (Some(tail), Some(&first)) = (tail, added.first()) {
        redirect(mol, tail, prev, first);
    }
    added
}

/// Append `count - 1` copies of a multi-atom unit. With head and tail
/// crossings each copy's head bonds to the previous copy's tail.
fn repeat_unit(
    mol: &mut Molecule,
    unit: &[NodeIndex],
    ends: Option<(Crossing, Crossing)>,
    count: usize,
) -> Vec<NodeIndex> {
    let bonds: Vec<(NodeIndex, NodeIndex, Bond)> = mol
        .bonds()
        .filter_map(|e| {
            let (a, b) = mol.bond_endpoints(e)?;
            (unit.contains(&a) && unit.contains(&b)).then(|| (a, b, mol.bond(e).clone()))
        })
        .collect();
    let inside = |a: &NodeIndex| unit.contains(a);
    let centres: Vec<TetrahedralStereo> = mol
        .tetrahedral_stereo()
        .iter()
        .filter(|s| inside(&s.focus) && s.ligands.iter().all(inside))
        .copied()
        .collect();
    let double_bonds: Vec<EZStereo> = mol
        .ez_stereo()
        .iter()
        .filter(|s| [s.bond.0, s.bond.1, s.refs[0], s.refs[1]].iter().all(inside))
        .copied()
        .collect();
    let link = ends.map(|(_, tail)| link_bond(mol, tail));
    let delta = match ends {
        Some((head, tail)) => displacement(mol, head.inner, tail.outer),
        None => unit_width(mol, unit).map(|w| [w, 0.0]),
    };

    let mut added = Vec::with_capacity(unit.len() * (count - 1));
    let mut prev_tail = ends.map(|(_, tail)| tail.inner);
    let mut successor = None;
    for k in 1..count {
        let copy: HashMap<NodeIndex, NodeIndex> = unit
            .iter()
            .map(|&a| (a, mol.add_atom(shifted(mol, a, delta, k))))
            .collect();
        for (a, b, bond) in &bonds {
            mol.add_bond(copy[a], copy[b], bond.clone());
        }
        for s in &centres {
            mol.add_tetrahedral_stereo(s.map(|a| copy[&a]));
        }
        for s in &double_bonds {
            mol.add_ez_stereo(s.map(|a| copy[&a]));
        }
        if let (Some((head, tail)), Some(prev), Some(bond)) = (ends, prev_tail, &link) {
            mol.add_bond(prev, copy[&head.inner], bond.clone());
            successor.get_or_insert(copy[&head.inner]);
            prev_tail = Some(copy[&tail.inner]);
        }
        added.extend(unit.iter().map(|a| copy[a]));
    }
    if let (Some((_, tail)), Some(last), Some(next)) = (ends, prev_tail, successor) {
        redirect(mol, tail, last, next);
    }
    added
}

/// Horizontal extent of the unit plus one typical bond, so free copies
/// do not overlap.
fn unit_width(mol: &Molecule, unit: &[NodeIndex]) -> Option<f64> {
    let xs: Vec<f64> = unit
        .iter()
        .filter_map(|&a| mol.atom(a).position_2d.map(|p| p[0]))
        .collect();
    let min = xs.iter().copied().reduce(f64::min)?;
    let max = xs.iter().copied().reduce(f64::max)?;
    Some(max - min + 14.4)
}

/// Link nodes stand for a chain of `link_count.1` identical atoms between
/// their two neighbours.
fn expand_link_nodes(mol: &mut Molecule, limits: &Limits, out: &mut Expansion) {
    let nodes: Vec<NodeIndex> = mol
        .atoms()
        .filter(|&a| mol.atom(a).node_type == NodeType::LinkNode && mol.degree(a) == 2)
        .collect();
    for atom in nodes {
        let Some((_, high)) = mol.atom(atom).link_count else {
            continue;
        };
        let Some(count) = repeat_count(Some(high as f64)) else {
            continue;
        };
        if count > limits.max_repeat_count {
            out.skip(ConstraintViolation::RepeatCount {
                bracket: mol.atom(atom).source.unwrap_or(0),
                count,
            });
            continue;
        }
        let Some(outer) = mol.neighbors(atom).max() else {
            continue;
        };
        let added = repeat_atom(mol, atom, Some(Crossing { inner: atom, outer }), count);
        debug!(added = added.len(), "expanded link node");
        out.expanded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeOptions;
    use crate::graph_ops::{num_components, shortest_path};
    use crate::mol::Winding;
    use crate::molecule::from_fragment;

    const CHAIN: &str = r#"
        <n id="11" p="0 0"/>
        <n id="12" p="15 0"/>
        <n id="13" p="30 0"/>
        <n id="14" p="45 0"/>
        <b id="21" B="11" E="12"/>
        <b id="22" B="12" E="13"/>
        <b id="23" B="13" E="14"/>"#;

    fn load(bracket: &str) -> (Document, Molecule) {
        load_with(CHAIN, bracket)
    }

    fn load_with(atoms: &str, bracket: &str) -> (Document, Molecule) {
        let xml = format!(
            r#"<CDXML><page id="1"><fragment id="2">{atoms}</fragment>{bracket}</page></CDXML>"#
        );
        let doc = Document::from_cdxml(&xml, &DecodeOptions::strict()).unwrap();
        let fragment = doc.fragments_under(doc.root())[0];
        let mol = from_fragment(&doc, fragment).molecule;
        (doc, mol)
    }

    fn attachment(id: u32, bond: u32, inner: u32) -> String {
        format!(
            r#"<bracketattachment id="{id}"><crossingbond id="{}" BondID="{bond}" InnerAtomID="{inner}"/></bracketattachment>"#,
            id + 1
        )
    }

    #[test]
    fn single_atom_repeat() {
        let bracket = format!(
            r#"<bracketedgroup id="30" BracketedObjectIDs="12" RepeatCount="3">{}{}</bracketedgroup>"#,
            attachment(31, 21, 12),
            attachment(33, 22, 12)
        );
        let (doc, mut mol) = load(&bracket);
        let out = expand(&doc, &mut mol, &Limits::default());
        assert_eq!(out.expanded, 1);
        assert!(out.warnings.is_empty());
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 5);
        assert_eq!(num_components(&mol), 1);
        let first = mol.atom_by_source(11).unwrap();
        let last = mol.atom_by_source(14).unwrap();
        assert_eq!(shortest_path(&mol, first, last).map(|p| p.len()), Some(6));
    }

    #[test]
    fn multi_atom_unit_is_chained() {
        let bracket = format!(
            r#"<bracketedgroup id="30" BracketedObjectIDs="12 13 22" RepeatCount="3">{}{}</bracketedgroup>"#,
            attachment(31, 21, 12),
            attachment(33, 23, 13)
        );
        let (doc, mut mol) = load(&bracket);
        expand(&doc, &mut mol, &Limits::default());
        // 2 atoms and 1 bond per extra repeat, plus one link bond each
        assert_eq!(mol.atom_count(), 4 + 2 * 2);
        assert_eq!(mol.bond_count(), 3 + 2 * 2);
        assert_eq!(num_components(&mol), 1);
        let first = mol.atom_by_source(11).unwrap();
        let last = mol.atom_by_source(14).unwrap();
        assert_eq!(shortest_path(&mol, first, last).map(|p| p.len()), Some(8));
        // the original tail no longer reaches the end group directly
        let tail = mol.atom_by_source(13).unwrap();
        assert!(mol.bond_between(tail, last).is_none());
    }

    fn assert_ligands_bonded(mol: &Molecule) {
        for s in mol.tetrahedral_stereo() {
            for &l in s.ligands.iter().filter(|&&l| l != s.focus) {
                assert!(
                    mol.bond_between(s.focus, l).is_some(),
                    "ligand {l:?} is not bonded to focus {:?}",
                    s.focus
                );
            }
        }
    }

    fn centre(focus: NodeIndex, ligands: [NodeIndex; 4]) -> TetrahedralStereo {
        TetrahedralStereo {
            focus,
            ligands,
            winding: Winding::Clockwise,
        }
    }

    #[test]
    fn stereo_follows_the_redirected_crossing_bond() {
        // 11 carries F, Cl and the bracketed carbon 14; 14 also holds an O
        let atoms = r#"
            <n id="11" p="0 0"/>
            <n id="12" p="0 -15" Element="9"/>
            <n id="13" p="-15 0" Element="17"/>
            <n id="14" p="15 0"/>
            <n id="15" p="30 0"/>
            <n id="16" p="15 15" Element="8"/>
            <b id="21" B="11" E="12"/>
            <b id="22" B="11" E="13"/>
            <b id="23" B="11" E="14"/>
            <b id="24" B="14" E="15"/>
            <b id="25" B="14" E="16"/>"#;
        let bracket = format!(
            r#"<bracketedgroup id="30" BracketedObjectIDs="14" RepeatCount="3">{}{}</bracketedgroup>"#,
            attachment(31, 24, 14),
            attachment(33, 23, 14)
        );
        let (doc, mut mol) = load_with(atoms, &bracket);
        let n = |id| mol.atom_by_source(id).unwrap();
        let (c11, f, cl, c14, c15, o) = (n(11), n(12), n(13), n(14), n(15), n(16));
        mol.add_tetrahedral_stereo(centre(c11, [f, cl, c14, c11]));
        mol.add_tetrahedral_stereo(centre(c14, [c11, c15, o, c14]));

        let out = expand(&doc, &mut mol, &Limits::default());
        assert_eq!(out.expanded, 1);
        assert_eq!(mol.atom_count(), 8);
        assert_ligands_bonded(&mol);

        let last = mol.neighbors(c11).find(|&a| ![f, cl].contains(&a)).unwrap();
        assert_ne!(last, c14);
        let outer = mol.tetrahedral_stereo_for(c11).unwrap();
        assert_eq!(outer.ligands, [f, cl, last, c11]);

        let next = mol.neighbors(c14).find(|&a| ![c15, o].contains(&a)).unwrap();
        let inner = mol.tetrahedral_stereo_for(c14).unwrap();
        assert_eq!(inner.ligands, [next, c15, o, c14]);
    }

    #[test]
    fn stereo_inside_the_unit_is_repeated() {
        // unit 12-13-14 with a centre at 13 (F, Cl)
        let atoms = r#"
            <n id="11" p="0 0"/>
            <n id="12" p="15 0"/>
            <n id="13" p="30 0"/>
            <n id="14" p="45 0"/>
            <n id="15" p="60 0"/>
            <n id="17" p="30 -15" Element="9"/>
            <n id="18" p="30 15" Element="17"/>
            <b id="21" B="11" E="12"/>
            <b id="22" B="12" E="13"/>
            <b id="23" B="13" E="14"/>
            <b id="24" B="14" E="15"/>
            <b id="25" B="13" E="17"/>
            <b id="26" B="13" E="18"/>"#;
        let bracket = format!(
            r#"<bracketedgroup id="30" BracketedObjectIDs="12 13 14 17 18" RepeatCount="3">{}{}</bracketedgroup>"#,
            attachment(31, 21, 12),
            attachment(33, 24, 14)
        );
        let (doc, mut mol) = load_with(atoms, &bracket);
        let n = |id| mol.atom_by_source(id).unwrap();
        let (c12, c13, c14, f, cl) = (n(12), n(13), n(14), n(17), n(18));
        mol.add_tetrahedral_stereo(centre(c13, [c12, c14, f, cl]));

        expand(&doc, &mut mol, &Limits::default());
        assert_eq!(mol.atom_count(), 7 + 2 * 5);
        assert_eq!(mol.tetrahedral_stereo().len(), 3);
        assert_ligands_bonded(&mol);
        let fluorines = mol
            .tetrahedral_stereo()
            .iter()
            .filter(|s| s.ligands.iter().any(|&l| mol.atom(l).atomic_num == 9))
            .count();
        assert_eq!(fluorines, 3);
    }

    #[test]
    fn no_crossing_bonds_gives_free_copies() {
        let bracket =
            r#"<bracketedgroup id="30" BracketedObjectIDs="11 12 13 14" RepeatCount="2"/>"#;
        let (doc, mut mol) = load(bracket);
        expand(&doc, &mut mol, &Limits::default());
        assert_eq!(mol.atom_count(), 8);
        assert_eq!(mol.bond_count(), 6);
        assert_eq!(num_components(&mol), 2);
    }

    #[test]
    fn one_crossing_bond_is_rejected() {
        let bracket = format!(
            r#"<bracketedgroup id="30" BracketedObjectIDs="12" RepeatCount="3">{}</bracketedgroup>"#,
            attachment(31, 21, 12)
        );
        let (doc, mut mol) = load(&bracket);
        let out = expand(&doc, &mut mol, &Limits::default());
        assert_eq!(out.expanded, 0);
        assert_eq!(
            out.warnings,
            vec![Warning::Constraint(ConstraintViolation::CrossingBondCount {
                bracket: 30,
                count: 1
            })]
        );
        assert_eq!(mol.atom_count(), 4);
    }

    #[test]
    fn repeat_counts_round_and_respect_limits() {
        assert_eq!(repeat_count(Some(2.6)), Some(3));
        assert_eq!(repeat_count(Some(1.2)), None);
        assert_eq!(repeat_count(None), None);

        let bracket =
            r#"<bracketedgroup id="30" BracketedObjectIDs="12" RepeatCount="50"/>"#;
        let (doc, mut mol) = load(bracket);
        let limits = Limits {
            max_repeat_count: 10,
            ..Limits::default()
        };
        let out = expand(&doc, &mut mol, &limits);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(mol.atom_count(), 4);
    }

    #[test]
    fn link_node_becomes_a_chain() {
        let xml = r#"<CDXML><page id="1"><fragment id="2">
            <n id="11" p="0 0" Element="8"/>
            <n id="12" p="15 0" NodeType="LinkNode" LinkCountLow="1" LinkCountHigh="4"/>
            <n id="13" p="30 0" Element="8"/>
            <b id="21" B="11" E="12"/>
            <b id="22" B="12" E="13"/>
        </fragment></page></CDXML>"#;
        let doc = Document::from_cdxml(xml, &DecodeOptions::strict()).unwrap();
        let mut mol = from_fragment(&doc, doc.fragments_under(doc.root())[0]).molecule;
        let out = expand(&doc, &mut mol, &Limits::default());
        assert_eq!(out.expanded, 1);
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 5);
        let a = mol.atom_by_source(11).unwrap();
        let b = mol.atom_by_source(13).unwrap();
        assert_eq!(shortest_path(&mol, a, b).map(|p| p.len()), Some(6));
    }
}
