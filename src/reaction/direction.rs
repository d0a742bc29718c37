use crate::cdx::enums::{ArrowType, ArrowheadPosition};
use crate::document::{Arrow, Graphic};
use crate::mol::Mol;
use crate::traits::HasPosition2D;

/// Which way a reaction step runs relative to its reactant/product lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
    Bidirectional,
}

/// Arrow endpoints in document coordinates plus the marker drawn at each
/// end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    pub head: [f64; 2],
    pub tail: [f64; 2],
    pub head_marker: ArrowheadPosition,
    pub tail_marker: ArrowheadPosition,
}

impl ArrowGeometry {
    pub fn from_arrow(arrow: &Arrow) -> Option<Self> {
        let [hx, hy, _] = arrow.head?;
        let [tx, ty, _] = arrow.tail?;
        Some(Self {
            head: [hx, hy],
            tail: [tx, ty],
            head_marker: arrow.head_marker,
            tail_marker: arrow.tail_marker,
        })
    }

    /// Legacy arrow drawn as a line graphic. Explicit head/tail points
    /// win; otherwise the bounding box runs from tail (left, top) to head
    /// (right, bottom).
    pub fn from_graphic(graphic: &Graphic) -> Option<Self> {
        let (head, tail) = match (graphic.head, graphic.tail) {
            (Some([hx, hy, _]), Some([tx, ty, _])) => ([hx, hy], [tx, ty]),
            _ => {
                let b = graphic.bounds?;
                ([b.right, b.bottom], [b.left, b.top])
            }
        };
        let (head_marker, tail_marker) = legacy_markers(graphic.arrow_type);
        Some(Self {
            head,
            tail,
            head_marker,
            tail_marker,
        })
    }

    /// Classify against the drawn reactant and product atoms.
    pub fn direction<'a, A, B>(
        &self,
        reactants: impl IntoIterator<Item = &'a Mol<A, B>>,
        products: impl IntoIterator<Item = &'a Mol<A, B>>,
    ) -> Direction
    where
        A: HasPosition2D + 'a,
        B: 'a,
    {
        if self.head_marker.is_half() && self.head_marker == self.tail_marker {
            return Direction::Bidirectional;
        }
        let [x, y] = self.head;
        let head = [x, -y];
        match (nearest(head, reactants), nearest(head, products)) {
            (Some(r), Some(p)) if r < p => Direction::Backward,
            _ => Direction::Forward,
        }
    }
}

fn legacy_markers(arrow_type: ArrowType) -> (ArrowheadPosition, ArrowheadPosition) {
    use ArrowheadPosition::{Full, HalfLeft, None};
    match arrow_type {
        ArrowType::HalfHead => (HalfLeft, None),
        ArrowType::FullHead | ArrowType::Hollow | ArrowType::RetroSynthetic => (Full, None),
        ArrowType::Equilibrium => (HalfLeft, HalfLeft),
        ArrowType::Resonance => (Full, Full),
        _ => (None, None),
    }
}

/// Squared distance from `point` to the closest positioned atom.
fn nearest<'a, A, B>(point: [f64; 2], mols: impl IntoIterator<Item = &'a Mol<A, B>>) -> Option<f64>
where
    A: HasPosition2D + 'a,
    B: 'a,
{
    mols.into_iter()
        .flat_map(|m| m.atoms().filter_map(|a| m.atom(a).position_2d()))
        .map(|[x, y]| (x - point[0]).powi(2) + (y - point[1]).powi(2))
        .min_by(f64::total_cmp)
}
