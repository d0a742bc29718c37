//! Stereo elements from drawn geometry.
//!
//! Every centre is decided by the sign of a signed volume over four ligand
//! vectors. Wedge drawings, 3D coordinates and sugar projections differ
//! only in how those vectors are built:
//!
//! - wedges: unit in-plane direction, lifted to `z = ±1` when the bond's
//!   narrow end sits on the centre;
//! - 3D: the coordinates themselves;
//! - Haworth: the ring lies flat in the `xz` plane, substituents drawn
//!   up or down point along `±y`;
//! - Fischer: horizontal ligands toward the viewer, vertical ones away.
//!
//! A centre with three neighbours uses itself as the fourth ligand.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::bond::BondStereo;
use crate::cdx::enums::{AtomCip, AtomGeometry, BondOrder};
use crate::graph_ops;
use crate::mol::{Conformation, EZStereo, TetrahedralStereo, Winding};
use crate::molecule::Molecule;

type Vec3 = [f64; 3];

const EPS: f64 = 1e-6;
/// `|minor| / |major|` below which a bond counts as vertical or horizontal.
const AXIS_TOLERANCE: f64 = 0.2;
/// Double bonds in rings smaller than this cannot be E/Z.
const MIN_STEREO_RING: usize = 8;

/// How the stereo elements of a molecule were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    Haworth,
    Fischer,
    Geometry3D,
    Wedges2D,
    /// Geometry was unusable; centres come from stored R/S codes.
    CipFallback,
}

/// Perceive tetrahedral and double-bond stereo and store it on the
/// molecule, replacing whatever was there.
pub fn assign(mol: &mut Molecule) -> Interpretation {
    let ranks = graph_ops::morgan_ranks(mol);
    let use_3d = has_3d_geometry(mol);

    let (interpretation, mut tetrahedral, mut ez) = match projection(mol) {
        Some(Projection::Haworth(ring)) => (
            Interpretation::Haworth,
            haworth_centres(mol, &ring, &ranks),
            ez_2d(mol, &ranks),
        ),
        Some(Projection::Fischer(crosses)) => (
            Interpretation::Fischer,
            fischer_centres(mol, &crosses, &ranks),
            ez_2d(mol, &ranks),
        ),
        None if use_3d => (
            Interpretation::Geometry3D,
            centres_3d(mol, &ranks),
            ez_3d(mol, &ranks),
        ),
        None => (
            Interpretation::Wedges2D,
            centres_2d(mol, &ranks),
            ez_2d(mol, &ranks),
        ),
    };

    let interpretation =
        if (tetrahedral.is_empty() && ez.is_empty()) || has_duplicate_coordinates(mol, use_3d) {
            tetrahedral = cip_fallback(mol);
            ez.clear();
            Interpretation::CipFallback
        } else {
            interpretation
        };

    let wavy = atoms_on_wavy_bonds(mol);
    tetrahedral.retain(|s| !wavy.contains(&s.focus));
    ez.retain(|s| !wavy.contains(&s.bond.0) && !wavy.contains(&s.bond.1));

    debug!(
        ?interpretation,
        centres = tetrahedral.len(),
        double_bonds = ez.len(),
        "assigned stereo"
    );
    mol.set_tetrahedral_stereo(tetrahedral);
    mol.set_ez_stereo(ez);
    interpretation
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn unit_2d(dx: f64, dy: f64) -> Option<[f64; 2]> {
    let len = (dx * dx + dy * dy).sqrt();
    (len > EPS).then(|| [dx / len, dy / len])
}

fn unit(v: Vec3) -> Option<Vec3> {
    let len = dot(v, v).sqrt();
    (len > EPS).then(|| [v[0] / len, v[1] / len, v[2] / len])
}

fn winding_of(v: [Vec3; 4]) -> Option<Winding> {
    let volume = dot(sub(v[0], v[3]), cross(sub(v[1], v[3]), sub(v[2], v[3])));
    if volume.abs() < EPS {
        None
    } else if volume < 0.0 {
        Some(Winding::Clockwise)
    } else {
        Some(Winding::Anticlockwise)
    }
}

fn sorted_neighbors(mol: &Molecule, atom: NodeIndex) -> Vec<NodeIndex> {
    let mut out: Vec<NodeIndex> = mol.neighbors(atom).collect();
    out.sort();
    out
}

fn pairwise_distinct(ranks: &[u64], atoms: &[NodeIndex]) -> bool {
    let mut seen = HashSet::new();
    atoms.iter().all(|a| seen.insert(ranks[a.index()]))
}

/// Saturated, non-pseudo atom with three or four distinguishable
/// neighbours. Three-coordinate nitrogen inverts and never qualifies.
fn may_be_centre(mol: &Molecule, atom: NodeIndex, ranks: &[u64]) -> bool {
    let a = mol.atom(atom);
    let degree = mol.degree(atom);
    if a.atomic_num == 0 || !(3..=4).contains(&degree) || (a.atomic_num == 7 && degree == 3) {
        return false;
    }
    mol.bonds_of(atom)
        .all(|e| mol.bond(e).order == BondOrder::SINGLE)
        && pairwise_distinct(ranks, &sorted_neighbors(mol, atom))
}

/// Build a centre from per-ligand vectors relative to the focus.
fn centre_from(
    mol: &Molecule,
    focus: NodeIndex,
    mut vector: impl FnMut(NodeIndex) -> Option<Vec3>,
) -> Option<TetrahedralStereo> {
    let mut ligands = sorted_neighbors(mol, focus);
    let mut vectors = ligands
        .iter()
        .map(|&l| vector(l))
        .collect::<Option<Vec<Vec3>>>()?;
    if ligands.len() == 3 {
        ligands.push(focus);
        vectors.push([0.0; 3]);
    }
    let ligands: [NodeIndex; 4] = ligands.try_into().ok()?;
    let vectors: [Vec3; 4] = vectors.try_into().ok()?;
    Some(TetrahedralStereo {
        focus,
        ligands,
        winding: winding_of(vectors)?,
    })
}

/// `±1` when the bond between `centre` and `other` is a wedge whose
/// narrow end sits on `centre`.
fn wedge_elevation(mol: &Molecule, centre: NodeIndex, other: NodeIndex) -> i8 {
    let Some(edge) = mol.bond_between(centre, other) else {
        return 0;
    };
    let stereo = mol.bond(edge).stereo;
    let Some((begin, end)) = mol.bond_endpoints(edge) else {
        return 0;
    };
    let narrow = if stereo.narrow_at_begin() { begin } else { end };
    if narrow == centre {
        stereo.elevation()
    } else {
        0
    }
}

fn centres_2d(mol: &Molecule, ranks: &[u64]) -> Vec<TetrahedralStereo> {
    mol.atoms()
        .filter(|&c| may_be_centre(mol, c, ranks))
        .filter(|&c| mol.neighbors(c).any(|n| wedge_elevation(mol, c, n) != 0))
        .filter_map(|c| {
            let [cx, cy] = mol.atom(c).position_2d?;
            centre_from(mol, c, |l| {
                let [x, y] = mol.atom(l).position_2d?;
                let [dx, dy] = unit_2d(x - cx, y - cy)?;
                Some([dx, dy, wedge_elevation(mol, c, l) as f64])
            })
        })
        .collect()
}

fn centres_3d(mol: &Molecule, ranks: &[u64]) -> Vec<TetrahedralStereo> {
    mol.atoms()
        .filter(|&c| may_be_centre(mol, c, ranks))
        .filter_map(|c| {
            let origin = mol.atom(c).position_3d?;
            centre_from(mol, c, |l| unit(sub(mol.atom(l).position_3d?, origin)))
        })
        .collect()
}

/// The double bonds that can carry E/Z: plain double order, outside small
/// rings, with one or two distinguishable substituents on each end.
fn ez_candidates(
    mol: &Molecule,
    ranks: &[u64],
) -> Vec<(NodeIndex, NodeIndex, NodeIndex, NodeIndex)> {
    let mut out = Vec::new();
    for edge in mol.bonds() {
        if mol.bond(edge).order != BondOrder::DOUBLE {
            continue;
        }
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        if graph_ops::smallest_ring_through(mol, edge).is_some_and(|r| r.len() < MIN_STEREO_RING) {
            continue;
        }
        let side = |end: NodeIndex, other: NodeIndex| -> Option<NodeIndex> {
            let subs: Vec<NodeIndex> = sorted_neighbors(mol, end)
                .into_iter()
                .filter(|&n| n != other)
                .collect();
            match subs.len() {
                1 => Some(subs[0]),
                2 if ranks[subs[0].index()] != ranks[subs[1].index()] => Some(subs[0]),
                _ => None,
            }
        };
        if let (Some(ra), Some(rb)) = (side(a, b), side(b, a)) {
            out.push((a, b, ra, rb));
        }
    }
    out
}

fn ez_2d(mol: &Molecule, ranks: &[u64]) -> Vec<EZStereo> {
    ez_candidates(mol, ranks)
        .into_iter()
        .filter_map(|(a, b, ra, rb)| {
            let pos = |n: NodeIndex| mol.atom(n).position_2d;
            let ([ax, ay], [bx, by]) = (pos(a)?, pos(b)?);
            let ([rax, ray], [rbx, rby]) = (pos(ra)?, pos(rb)?);
            let (lx, ly) = (bx - ax, by - ay);
            let side_a = lx * (ray - ay) - ly * (rax - ax);
            let side_b = lx * (rby - ay) - ly * (rbx - ax);
            if side_a.abs() < EPS || side_b.abs() < EPS {
                return None;
            }
            let conformation = if (side_a > 0.0) == (side_b > 0.0) {
                Conformation::Together
            } else {
                Conformation::Opposite
            };
            Some(EZStereo::new(a, b, ra, rb, conformation))
        })
        .collect()
}

fn ez_3d(mol: &Molecule, ranks: &[u64]) -> Vec<EZStereo> {
    ez_candidates(mol, ranks)
        .into_iter()
        .filter_map(|(a, b, ra, rb)| {
            let pos = |n: NodeIndex| mol.atom(n).position_3d;
            let (pa, pb) = (pos(a)?, pos(b)?);
            let axis = sub(pb, pa);
            let axis_sq = dot(axis, axis);
            if axis_sq < EPS {
                return None;
            }
            let across = |v: Vec3| {
                let t = dot(v, axis) / axis_sq;
                [v[0] - axis[0] * t, v[1] - axis[1] * t, v[2] - axis[2] * t]
            };
            let pa_ref = across(sub(pos(ra)?, pa));
            let pb_ref = across(sub(pos(rb)?, pb));
            let d = dot(pa_ref, pb_ref);
            if d.abs() < EPS {
                return None;
            }
            let conformation = if d > 0.0 {
                Conformation::Together
            } else {
                Conformation::Opposite
            };
            Some(EZStereo::new(a, b, ra, rb, conformation))
        })
        .collect()
}

enum Projection {
    Haworth(Vec<NodeIndex>),
    Fischer(Vec<NodeIndex>),
}

fn is_vertical(dx: f64, dy: f64) -> bool {
    dy.abs() > EPS && dx.abs() <= AXIS_TOLERANCE * dy.abs()
}

fn is_horizontal(dx: f64, dy: f64) -> bool {
    dx.abs() > EPS && dy.abs() <= AXIS_TOLERANCE * dx.abs()
}

fn offset(mol: &Molecule, from: NodeIndex, to: NodeIndex) -> Option<(f64, f64)> {
    let [fx, fy] = mol.atom(from).position_2d?;
    let [tx, ty] = mol.atom(to).position_2d?;
    Some((tx - fx, ty - fy))
}

/// Sugar rings drawn as Haworth projections take precedence over Fischer
/// crosses; neither applies to an ordinary drawing.
fn projection(mol: &Molecule) -> Option<Projection> {
    let oxygens = mol.atoms().filter(|&a| mol.atom(a).atomic_num == 8).count();
    if oxygens >= 3 {
        for ring in small_rings(mol) {
            let ring_oxygens = ring.iter().filter(|&&a| mol.atom(a).atomic_num == 8).count();
            if ring_oxygens != 1 {
                continue;
            }
            let vertical_substituent = ring.iter().any(|&c| {
                mol.atom(c).atomic_num == 6
                    && mol.neighbors(c).any(|n| {
                        !ring.contains(&n)
                            && offset(mol, c, n).is_some_and(|(dx, dy)| is_vertical(dx, dy))
                    })
            });
            if vertical_substituent {
                return Some(Projection::Haworth(ring));
            }
        }
    }

    let crosses: Vec<NodeIndex> = mol.atoms().filter(|&a| is_fischer_cross(mol, a)).collect();
    (crosses.len() >= 2).then_some(Projection::Fischer(crosses))
}

/// Distinct five- and six-membered rings, smallest first.
fn small_rings(mol: &Molecule) -> Vec<Vec<NodeIndex>> {
    let mut seen = HashSet::new();
    let mut rings = Vec::new();
    for edge in mol.bonds() {
        let Some(ring) = graph_ops::smallest_ring_through(mol, edge) else {
            continue;
        };
        if !(5..=6).contains(&ring.len()) {
            continue;
        }
        let mut key = ring.clone();
        key.sort();
        if seen.insert(key) {
            rings.push(ring);
        }
    }
    rings.sort_by_key(Vec::len);
    rings
}

/// One neighbour straight above, one straight below, the rest straight
/// left and right, and no wedges.
fn is_fischer_cross(mol: &Molecule, atom: NodeIndex) -> bool {
    let degree = mol.degree(atom);
    let wedged = mol
        .bonds_of(atom)
        .any(|e| mol.bond(e).stereo != BondStereo::None);
    if !(3..=4).contains(&degree) || wedged {
        return false;
    }
    let (mut up, mut down, mut left, mut right) = (0, 0, 0, 0);
    for n in mol.neighbors(atom) {
        match offset(mol, atom, n) {
            Some((dx, dy)) if is_vertical(dx, dy) => {
                if dy > 0.0 {
                    up += 1
                } else {
                    down += 1
                }
            }
            Some((dx, dy)) if is_horizontal(dx, dy) => {
                if dx > 0.0 {
                    right += 1
                } else {
                    left += 1
                }
            }
            _ => return false,
        }
    }
    up == 1 && down == 1 && left <= 1 && right <= 1 && left + right == degree - 2
}

fn fischer_centres(mol: &Molecule, crosses: &[NodeIndex], ranks: &[u64]) -> Vec<TetrahedralStereo> {
    crosses
        .iter()
        .filter(|&&c| may_be_centre(mol, c, ranks))
        .filter_map(|&c| {
            centre_from(mol, c, |l| {
                let (dx, dy) = offset(mol, c, l)?;
                let [ux, uy] = unit_2d(dx, dy)?;
                let z = if is_vertical(dx, dy) { -1.0 } else { 1.0 };
                Some([ux, uy, z])
            })
        })
        .collect()
}

/// Ring atoms sit in the `xz` plane (screen y becomes depth); exocyclic
/// substituents point straight up or down. A non-vertical substituent next
/// to a vertical one takes the opposite direction.
fn haworth_centres(mol: &Molecule, ring: &[NodeIndex], ranks: &[u64]) -> Vec<TetrahedralStereo> {
    ring.iter()
        .filter(|&&c| mol.atom(c).atomic_num == 6 && may_be_centre(mol, c, ranks))
        .filter_map(|&c| {
            let exocyclic: Vec<(NodeIndex, f64, f64)> = mol
                .neighbors(c)
                .filter(|n| !ring.contains(n))
                .filter_map(|n| offset(mol, c, n).map(|(dx, dy)| (n, dx, dy)))
                .collect();
            let vertical_sign = exocyclic
                .iter()
                .find(|&&(_, dx, dy)| is_vertical(dx, dy))
                .map(|&(_, _, dy)| dy.signum());

            centre_from(mol, c, |l| {
                let (dx, dy) = offset(mol, c, l)?;
                if ring.contains(&l) {
                    return unit([dx, 0.0, -dy]);
                }
                let sign = match vertical_sign {
                    _ if is_vertical(dx, dy) => dy.signum(),
                    Some(v) => -v,
                    None if dy.abs() > EPS => dy.signum(),
                    None => return None,
                };
                Some([0.0, sign, 0.0])
            })
        })
        .collect()
}

/// 3D coordinates count only when every atom has them and they are not
/// all in one `z` plane.
fn has_3d_geometry(mol: &Molecule) -> bool {
    let mut zs = Vec::new();
    for a in mol.atoms() {
        match mol.atom(a).position_3d {
            Some(p) => zs.push(p[2]),
            None => return false,
        }
    }
    zs.first()
        .is_some_and(|&z0| zs.iter().any(|&z| (z - z0).abs() > EPS))
}

fn has_duplicate_coordinates(mol: &Molecule, use_3d: bool) -> bool {
    let quantise = |v: f64| (v * 1e4).round() as i64;
    let mut seen = HashSet::new();
    for a in mol.atoms() {
        let atom = mol.atom(a);
        let key = if use_3d {
            atom.position_3d.map(|p| [quantise(p[0]), quantise(p[1]), quantise(p[2])])
        } else {
            atom.position_2d.map(|p| [quantise(p[0]), quantise(p[1]), 0])
        };
        if let Some(key) = key {
            if !seen.insert(key) {
                return true;
            }
        }
    }
    false
}

/// Centres from stored R/S codes on tetrahedral atoms. R maps to a
/// clockwise ligand list and S to anticlockwise; an explicit hydrogen at
/// list position 0 or 2 flips the sense.
fn cip_fallback(mol: &Molecule) -> Vec<TetrahedralStereo> {
    let mut out = Vec::new();
    for focus in mol.atoms() {
        let atom = mol.atom(focus);
        if atom.geometry != AtomGeometry::Tetrahedral {
            continue;
        }
        let winding = match atom.cip {
            AtomCip::R => Winding::Clockwise,
            AtomCip::S => Winding::Anticlockwise,
            _ => continue,
        };
        let mut ligands = sorted_neighbors(mol, focus);
        if !(3..=4).contains(&ligands.len()) {
            continue;
        }
        let hydrogens: Vec<NodeIndex> = ligands
            .iter()
            .copied()
            .filter(|&l| mol.atom(l).is_hydrogen())
            .collect();
        if hydrogens.len() > 1 {
            continue;
        }
        if ligands.len() == 3 {
            ligands.push(focus);
        }
        let winding = match hydrogens.first().and_then(|h| ligands.iter().position(|l| l == h)) {
            Some(0 | 2) => winding.invert(),
            _ => winding,
        };
        let Ok(ligands) = ligands.try_into() else {
            continue;
        };
        out.push(TetrahedralStereo {
            focus,
            ligands,
            winding,
        });
    }
    out
}

fn atoms_on_wavy_bonds(mol: &Molecule) -> HashSet<NodeIndex> {
    mol.bonds()
        .filter(|&e| mol.bond(e).stereo == BondStereo::UpOrDown)
        .filter_map(|e| mol.bond_endpoints(e))
        .flat_map(|(a, b)| [a, b])
        .collect()
}
