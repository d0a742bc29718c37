use std::collections::VecDeque;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;
use crate::traits::HasAtomicNum;

pub fn shortest_path<A, B>(
    mol: &Mol<A, B>,
    from: NodeIndex,
    to: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    if from == to {
        return Some(vec![from]);
    }
    let n = mol.atom_count();
    let mut pred = vec![None; n];
    let mut visited = vec![false; n];
    visited[from.index()] = true;
    let mut queue = VecDeque::new();
    queue.push_back(from);
    while let Some(current) = queue.pop_front() {
        for neighbor in mol.neighbors(current) {
            if !visited[neighbor.index()] {
                visited[neighbor.index()] = true;
                pred[neighbor.index()] = Some(current);
                if neighbor == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while let Some(p) = pred[node.index()] {
                        path.push(p);
                        node = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }
    }
    None
}

pub fn connected_components<A, B>(mol: &Mol<A, B>) -> Vec<Vec<NodeIndex>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut components = Vec::new();
    for node in mol.atoms() {
        if visited[node.index()] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            component.push(current);
            for neighbor in mol.neighbors(current) {
                if !visited[neighbor.index()] {
                    stack.push(neighbor);
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

pub fn num_components<A, B>(mol: &Mol<A, B>) -> usize {
    connected_components(mol).len()
}

/// Size of the smallest ring through a bond, if the bond is in a ring.
pub fn smallest_ring_through<A, B>(mol: &Mol<A, B>, edge: EdgeIndex) -> Option<Vec<NodeIndex>> {
    let (a, b) = mol.bond_endpoints(edge)?;
    let n = mol.atom_count();
    let mut pred = vec![None; n];
    let mut visited = vec![false; n];
    visited[a.index()] = true;
    let mut queue = VecDeque::from([a]);
    while let Some(current) = queue.pop_front() {
        for neighbor in mol.neighbors(current) {
            // the bond itself does not count
            if current == a && neighbor == b {
                continue;
            }
            if visited[neighbor.index()] {
                continue;
            }
            visited[neighbor.index()] = true;
            pred[neighbor.index()] = Some(current);
            if neighbor == b {
                let mut ring = vec![b];
                let mut node = b;
                while let Some(p) = pred[node.index()] {
                    ring.push(p);
                    node = p;
                }
                return Some(ring);
            }
            queue.push_back(neighbor);
        }
    }
    None
}

/// Extended-connectivity ranks: equal ranks mean the atoms cannot be told
/// apart by element and topology.
pub fn morgan_ranks<A: HasAtomicNum, B>(mol: &Mol<A, B>) -> Vec<u64> {
    let mut ranks: Vec<u64> = mol
        .atoms()
        .map(|a| ((mol.atom(a).atomic_num() as u64) << 8) | mol.degree(a) as u64)
        .collect();
    let mut classes = count_classes(&ranks);
    for _ in 0..mol.atom_count() {
        let next: Vec<u64> = mol
            .atoms()
            .map(|a| {
                let mut around: Vec<u64> = mol.neighbors(a).map(|nb| ranks[nb.index()]).collect();
                around.sort_unstable();
                let mut h = ranks[a.index()].wrapping_mul(0x9E37_79B9_7F4A_7C15);
                for r in around {
                    h = (h ^ r).wrapping_mul(0x0100_0000_01B3).rotate_left(17);
                }
                h
            })
            .collect();
        let next_classes = count_classes(&next);
        ranks = next;
        if next_classes == classes {
            break;
        }
        classes = next_classes;
    }
    ranks
}

fn count_classes(ranks: &[u64]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Rebuild the molecule without the given atoms.
///
/// Returns the new molecule and the old → new index map. Stereo elements
/// that mention a removed atom are dropped; the rest are renumbered.
pub fn remove_atoms<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    remove: &[NodeIndex],
) -> (Mol<A, B>, Vec<Option<NodeIndex>>) {
    let mut out = Mol::new();
    let mut index_map = vec![None; mol.atom_count()];
    for idx in mol.atoms() {
        if !remove.contains(&idx) {
            index_map[idx.index()] = Some(out.add_atom(mol.atom(idx).clone()));
        }
    }
    for edge in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        if let (Some(na), Some(nb)) = (index_map[a.index()], index_map[b.index()]) {
            out.add_bond(na, nb, mol.bond(edge).clone());
        }
    }

    let kept = |n: NodeIndex| index_map[n.index()];
    let tetrahedral = mol
        .tetrahedral_stereo()
        .iter()
        .filter(|s| kept(s.focus).is_some() && s.ligands.iter().all(|&l| kept(l).is_some()))
        .map(|s| s.map(|n| kept(n).unwrap_or(n)))
        .collect();
    let ez = mol
        .ez_stereo()
        .iter()
        .filter(|s| {
            [s.bond.0, s.bond.1, s.refs[0], s.refs[1]]
                .iter()
                .all(|&n| kept(n).is_some())
        })
        .map(|s| s.map(|n| kept(n).unwrap_or(n)))
        .collect();
    out.set_tetrahedral_stereo(tetrahedral);
    out.set_ez_stereo(ez);
    (out, index_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::mol::{TetrahedralStereo, Winding};

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn chain(elements: &[u8]) -> Mol<Atom, Bond> {
        let mut mol = Mol::new();
        let mut prev = None;
        for &z in elements {
            let idx = mol.add_atom(Atom { atomic_num: z, ..Atom::default() });
            if let Some(p) = prev {
                mol.add_bond(p, idx, Bond::default());
            }
            prev = Some(idx);
        }
        mol
    }

    fn ring(size: usize) -> Mol<Atom, Bond> {
        let mut mol = chain(&vec![6; size]);
        mol.add_bond(n(size - 1), n(0), Bond::default());
        mol
    }

    #[test]
    fn shortest_path_linear() {
        let mol = chain(&[6, 6, 6, 6, 6]);
        let path = shortest_path(&mol, n(0), n(4));
        assert_eq!(path, Some(vec![n(0), n(1), n(2), n(3), n(4)]));
    }

    #[test]
    fn shortest_path_no_path() {
        let mut mol = chain(&[6]);
        mol.add_atom(Atom::default());
        assert_eq!(shortest_path(&mol, n(0), n(1)), None);
        assert_eq!(num_components(&mol), 2);
    }

    #[test]
    fn components_empty() {
        let mol: Mol<(), ()> = Mol::new();
        assert_eq!(num_components(&mol), 0);
    }

    #[test]
    fn ring_through_bond() {
        let mol = ring(6);
        let edge = mol.bond_between(n(0), n(1)).unwrap();
        assert_eq!(smallest_ring_through(&mol, edge).map(|r| r.len()), Some(6));

        let open = chain(&[6, 6, 6]);
        let edge = open.bond_between(n(0), n(1)).unwrap();
        assert_eq!(smallest_ring_through(&open, edge), None);
    }

    #[test]
    fn morgan_separates_ends_of_propanol() {
        let mol = chain(&[6, 6, 6, 8]);
        let ranks = morgan_ranks(&mol);
        assert_ne!(ranks[0], ranks[2]);
        assert_ne!(ranks[1], ranks[2]);

        let sym = chain(&[8, 6, 6, 8]);
        let ranks = morgan_ranks(&sym);
        assert_eq!(ranks[0], ranks[3]);
        assert_eq!(ranks[1], ranks[2]);
    }

    #[test]
    fn remove_atoms_renumbers_stereo() {
        let mut mol = chain(&[6, 6]);
        for z in [9, 17, 35] {
            let x = mol.add_atom(Atom { atomic_num: z, ..Atom::default() });
            mol.add_bond(n(1), x, Bond::default());
        }
        mol.add_tetrahedral_stereo(TetrahedralStereo {
            focus: n(1),
            ligands: [n(0), n(2), n(3), n(4)],
            winding: Winding::Clockwise,
        });
        let (out, map) = remove_atoms(&mol, &[n(0)]);
        assert_eq!(out.atom_count(), 4);
        assert_eq!(map[0], None);
        assert_eq!(map[1], Some(n(0)));
        assert!(out.tetrahedral_stereo().is_empty());

        let (out, _) = remove_atoms(&mol, &[]);
        assert_eq!(out.tetrahedral_stereo().len(), 1);
        assert_eq!(out.bond_count(), mol.bond_count());
    }
}
