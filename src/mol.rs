use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Handedness of a tetrahedral centre: looking from the first ligand toward
/// the focus, the remaining three ligands turn this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Clockwise,
    Anticlockwise,
}

impl Winding {
    pub fn invert(self) -> Self {
        match self {
            Self::Clockwise => Self::Anticlockwise,
            Self::Anticlockwise => Self::Clockwise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetrahedralStereo {
    pub focus: NodeIndex,
    /// Four ligands. A centre with three neighbours lists the focus itself
    /// in place of the missing one.
    pub ligands: [NodeIndex; 4],
    pub winding: Winding,
}

impl TetrahedralStereo {
    /// Winding of the same centre with its ligands listed in another order.
    pub fn winding_for(&self, ligands: [NodeIndex; 4]) -> Option<Winding> {
        if !ligands.iter().all(|l| self.ligands.contains(l)) {
            return None;
        }
        Some(if permutation_parity(&self.ligands, &ligands) {
            self.winding
        } else {
            self.winding.invert()
        })
    }

    pub fn map(&self, mut f: impl FnMut(NodeIndex) -> NodeIndex) -> Self {
        Self {
            focus: f(self.focus),
            ligands: self.ligands.map(&mut f),
            winding: self.winding,
        }
    }
}

/// Relative placement of the two reference atoms across a double bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conformation {
    /// Same side (cis).
    Together,
    /// Opposite sides (trans).
    Opposite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EZStereo {
    /// Double-bond atoms, lower index first.
    pub bond: (NodeIndex, NodeIndex),
    /// A substituent of `bond.0` and a substituent of `bond.1`.
    pub refs: [NodeIndex; 2],
    pub conformation: Conformation,
}

impl EZStereo {
    pub fn new(
        a: NodeIndex,
        b: NodeIndex,
        ref_a: NodeIndex,
        ref_b: NodeIndex,
        conformation: Conformation,
    ) -> Self {
        if a.index() < b.index() {
            Self {
                bond: (a, b),
                refs: [ref_a, ref_b],
                conformation,
            }
        } else {
            Self {
                bond: (b, a),
                refs: [ref_b, ref_a],
                conformation,
            }
        }
    }

    pub fn map(&self, mut f: impl FnMut(NodeIndex) -> NodeIndex) -> Self {
        Self::new(
            f(self.bond.0),
            f(self.bond.1),
            f(self.refs[0]),
            f(self.refs[1]),
            self.conformation,
        )
    }
}

pub struct Mol<A, B> {
    graph: UnGraph<A, B>,
    tetrahedral_stereo: Vec<TetrahedralStereo>,
    ez_stereo: Vec<EZStereo>,
}

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
            tetrahedral_stereo: Vec::new(),
            ez_stereo: Vec::new(),
        }
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut A {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &B {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut B {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    /// Remove a bond and return its weight. The last edge takes over the
    /// removed edge's index, so edge indices held elsewhere go stale.
    pub fn remove_bond(&mut self, idx: EdgeIndex) -> Option<B> {
        self.graph.remove_edge(idx)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    /// Endpoints in the order the bond was added (begin, end).
    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    pub fn tetrahedral_stereo(&self) -> &[TetrahedralStereo] {
        &self.tetrahedral_stereo
    }

    pub fn set_tetrahedral_stereo(&mut self, stereo: Vec<TetrahedralStereo>) {
        self.tetrahedral_stereo = stereo;
    }

    pub fn tetrahedral_stereo_for(&self, focus: NodeIndex) -> Option<&TetrahedralStereo> {
        self.tetrahedral_stereo.iter().find(|s| s.focus == focus)
    }

    pub fn add_tetrahedral_stereo(&mut self, stereo: TetrahedralStereo) {
        self.tetrahedral_stereo.push(stereo);
    }

    pub fn ez_stereo(&self) -> &[EZStereo] {
        &self.ez_stereo
    }

    pub fn set_ez_stereo(&mut self, stereo: Vec<EZStereo>) {
        self.ez_stereo = stereo;
    }

    pub fn ez_stereo_for(&self, a: NodeIndex, b: NodeIndex) -> Option<&EZStereo> {
        let key = if a.index() < b.index() { (a, b) } else { (b, a) };
        self.ez_stereo.iter().find(|s| s.bond == key)
    }

    pub fn add_ez_stereo(&mut self, stereo: EZStereo) {
        self.ez_stereo.push(stereo);
    }

    /// Replace `old` by `new` where it appears as a neighbour of `around`:
    /// as a ligand of the centre at `around`, or as the reference atom on
    /// `around`'s side of a double bond. Elements centred elsewhere keep
    /// `old`.
    pub fn replace_neighbor_in_stereo(
        &mut self,
        around: NodeIndex,
        old: NodeIndex,
        new: NodeIndex,
    ) {
        for s in self.tetrahedral_stereo.iter_mut().filter(|s| s.focus == around) {
            for l in s.ligands.iter_mut().filter(|l| **l == old) {
                *l = new;
            }
        }
        for s in &mut self.ez_stereo {
            let ends = [s.bond.0, s.bond.1];
            for (end, r) in ends.into_iter().zip(s.refs.iter_mut()) {
                if end == around && *r == old {
                    *r = new;
                }
            }
        }
    }

    /// Point every stereo reference to `old` at `new` instead.
    pub fn replace_in_stereo(&mut self, old: NodeIndex, new: NodeIndex) {
        let swap = |n: NodeIndex| if n == old { new } else { n };
        for s in &mut self.tetrahedral_stereo {
            *s = s.map(swap);
        }
        for s in &mut self.ez_stereo {
            *s = s.map(swap);
        }
    }
}

impl<A: Clone, B: Clone> Clone for Mol<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            tetrahedral_stereo: self.tetrahedral_stereo.clone(),
            ez_stereo: self.ez_stereo.clone(),
        }
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .field("tetrahedral_stereo", &self.tetrahedral_stereo)
            .field("ez_stereo", &self.ez_stereo)
            .finish()
    }
}

/// `true` when `to` is an even permutation of `from`.
pub(crate) fn permutation_parity<T: Eq>(from: &[T], to: &[T]) -> bool {
    let n = from.len();
    if n != to.len() {
        return true;
    }
    let perm: Vec<usize> = from
        .iter()
        .map(|f| to.iter().position(|t| t == f).unwrap_or(0))
        .collect();
    let mut visited = vec![false; n];
    let mut swaps = 0usize;
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut cycle_len = 0;
        let mut j = i;
        while !visited[j] {
            visited[j] = true;
            j = perm[j];
            cycle_len += 1;
        }
        swaps += cycle_len - 1;
    }
    swaps.is_multiple_of(2)
}
