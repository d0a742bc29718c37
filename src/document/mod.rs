//! The typed object graph.
//!
//! Objects live in one arena owned by [`Document`]; a [`Handle`] is an index
//! into it. Parent/child structure follows the nesting of the input, and
//! every cross reference (bond endpoints, crossing bonds, bracket contents,
//! reaction-step lists, ...) is a [`Link`] that keeps the raw ID and, once
//! resolved, the handle of its target.

mod builder;
pub mod visit;

use std::collections::HashMap;

use crate::cdx::enums::{
    ArrowType, ArrowheadPosition, ArrowheadType, AtomCip, AtomGeometry, BondCip, BondDisplay,
    BondOrder, BracketFlip, BracketUsage, EnhancedStereoType, ExternalConnectionType,
    GraphicType, NodeType, Radical,
};
use crate::cdx::flags::{LineStyle, OvalStyle, RectangleStyle, SplineStyle};
use crate::cdx::{self, ObjectId, ObjectType, Rect, StyledText};
use crate::config::DecodeOptions;
use crate::error::{Result, Warning};

pub use visit::{Visitor, Walk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub(crate) u32);

impl Handle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An ID-valued property. `target` is filled in by the second build pass
/// and stays `None` when the ID names no object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub id: ObjectId,
    pub target: Option<Handle>,
}

impl Link {
    pub fn new(id: ObjectId) -> Self {
        Self { id, target: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub creation_program: Option<String>,
    pub bond_length: Option<f64>,
}

/// An atom, or anything drawn where an atom could be: a label, an
/// abbreviation, an attachment point.
#[derive(Debug, Clone)]
pub struct Node {
    pub element: u8,
    pub charge: i8,
    pub isotope: u16,
    pub node_type: NodeType,
    pub position: Option<[f64; 2]>,
    pub position_3d: Option<[f64; 3]>,
    pub cip: AtomCip,
    pub geometry: AtomGeometry,
    pub radical: Radical,
    pub num_hydrogens: Option<u16>,
    pub generic_nickname: Option<String>,
    pub atom_number: Option<String>,
    pub alt_group: Option<Link>,
    pub link_count: (Option<i16>, Option<i16>),
    pub external_connection_type: ExternalConnectionType,
    pub external_connection_num: Option<i16>,
    pub bond_ordering: Vec<Link>,
    pub attachments: Vec<Link>,
    pub enhanced_stereo_type: EnhancedStereoType,
    pub enhanced_stereo_group: Option<i16>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            element: 6,
            charge: 0,
            isotope: 0,
            node_type: NodeType::Element,
            position: None,
            position_3d: None,
            cip: AtomCip::default(),
            geometry: AtomGeometry::default(),
            radical: Radical::default(),
            num_hydrogens: None,
            generic_nickname: None,
            atom_number: None,
            alt_group: None,
            link_count: (None, None),
            external_connection_type: ExternalConnectionType::default(),
            external_connection_num: None,
            bond_ordering: Vec::new(),
            attachments: Vec::new(),
            enhanced_stereo_type: EnhancedStereoType::default(),
            enhanced_stereo_group: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bond {
    pub begin: Link,
    pub end: Link,
    pub order: BondOrder,
    pub display: BondDisplay,
    pub display2: BondDisplay,
    pub cip: BondCip,
    pub begin_attach: Option<i8>,
    pub end_attach: Option<i8>,
    pub crossing_bonds: Vec<Link>,
}

impl Default for Bond {
    fn default() -> Self {
        Self {
            begin: Link::new(0),
            end: Link::new(0),
            order: BondOrder::default(),
            display: BondDisplay::default(),
            display2: BondDisplay::default(),
            cip: BondCip::default(),
            begin_attach: None,
            end_attach: None,
            crossing_bonds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub racemic: bool,
    pub absolute: bool,
    pub relative: bool,
    pub connection_order: Vec<Link>,
}

#[derive(Debug, Clone, Default)]
pub struct Text {
    pub position: Option<[f64; 2]>,
    pub bounds: Option<Rect>,
    pub content: StyledText,
    pub interpret_chemically: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Graphic {
    pub graphic_type: GraphicType,
    pub bounds: Option<Rect>,
    pub line_style: LineStyle,
    pub oval_style: OvalStyle,
    pub rectangle_style: RectangleStyle,
    pub arrow_type: ArrowType,
    pub head: Option<[f64; 3]>,
    pub tail: Option<[f64; 3]>,
}

#[derive(Debug, Clone, Default)]
pub struct Curve {
    pub spline_style: SplineStyle,
    pub bounds: Option<Rect>,
}

#[derive(Debug, Clone, Default)]
pub struct Arrow {
    pub head: Option<[f64; 3]>,
    pub tail: Option<[f64; 3]>,
    pub center: Option<[f64; 3]>,
    pub head_marker: ArrowheadPosition,
    pub tail_marker: ArrowheadPosition,
    pub arrowhead_type: ArrowheadType,
    pub line_style: LineStyle,
    pub bounds: Option<Rect>,
    pub sources: Vec<Link>,
    pub targets: Vec<Link>,
}

/// A bracketed group. Attachments are child objects.
#[derive(Debug, Clone, Default)]
pub struct Bracket {
    pub objects: Vec<Link>,
    pub repeat_count: Option<f64>,
    pub usage: BracketUsage,
    pub flip: BracketFlip,
    pub sru_label: Option<String>,
}

/// One side of a bracket. Crossing bonds are child objects.
#[derive(Debug, Clone, Default)]
pub struct BracketAttachment {
    pub graphic: Option<Link>,
}

#[derive(Debug, Clone, Default)]
pub struct CrossingBond {
    pub bond: Option<Link>,
    pub inner_atom: Option<Link>,
}

/// A named set of alternative fragments, used to define R-groups.
#[derive(Debug, Clone, Default)]
pub struct AltGroup {
    pub text_frame: Option<Rect>,
    pub group_frame: Option<Rect>,
    pub valence: Option<i16>,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionStep {
    pub reactants: Vec<Link>,
    pub products: Vec<Link>,
    pub plusses: Vec<Link>,
    pub arrows: Vec<Link>,
    pub above_arrow: Vec<Link>,
    pub below_arrow: Vec<Link>,
    /// Reactant atom ↔ product atom pairs.
    pub atom_map: Vec<(Link, Link)>,
}

/// Per-kind payload of an arena object.
#[derive(Debug, Clone)]
pub enum ObjectData {
    Document(DocumentInfo),
    Page,
    Group,
    Fragment(Fragment),
    Node(Node),
    Bond(Bond),
    Text(Text),
    Graphic(Graphic),
    Curve(Curve),
    Arrow(Arrow),
    Bracket(Bracket),
    BracketAttachment(BracketAttachment),
    CrossingBond(CrossingBond),
    AltGroup(AltGroup),
    ReactionScheme,
    ReactionStep(ReactionStep),
    /// Objects kept for structure only: spectra, pictures, tables, TLC
    /// plates and anything unrecognised.
    Other(ObjectType),
}

impl ObjectData {
    pub fn kind(&self) -> ObjectType {
        match self {
            Self::Document(_) => ObjectType::Document,
            Self::Page => ObjectType::Page,
            Self::Group => ObjectType::Group,
            Self::Fragment(_) => ObjectType::Fragment,
            Self::Node(_) => ObjectType::Node,
            Self::Bond(_) => ObjectType::Bond,
            Self::Text(_) => ObjectType::Text,
            Self::Graphic(_) => ObjectType::Graphic,
            Self::Curve(_) => ObjectType::Curve,
            Self::Arrow(_) => ObjectType::Arrow,
            Self::Bracket(_) => ObjectType::Bracket,
            Self::BracketAttachment(_) => ObjectType::BracketAttachment,
            Self::CrossingBond(_) => ObjectType::CrossingBond,
            Self::AltGroup(_) => ObjectType::AltGroup,
            Self::ReactionScheme => ObjectType::ReactionScheme,
            Self::ReactionStep(_) => ObjectType::ReactionStep,
            Self::Other(kind) => *kind,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Object {
    pub id: ObjectId,
    pub parent: Option<Handle>,
    pub children: Vec<Handle>,
    pub name: Option<String>,
    pub z_order: Option<i16>,
    pub superseded_by: Option<Link>,
    pub data: ObjectData,
}

macro_rules! accessor {
    ($($fn_name:ident => $variant:ident($ty:ty),)+) => {
        impl Object {
            $(
                pub fn $fn_name(&self) -> Option<&$ty> {
                    match &self.data {
                        ObjectData::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            )+
        }
    };
}

accessor! {
    as_node => Node(Node),
    as_bond => Bond(Bond),
    as_fragment => Fragment(Fragment),
    as_text => Text(Text),
    as_graphic => Graphic(Graphic),
    as_curve => Curve(Curve),
    as_arrow => Arrow(Arrow),
    as_bracket => Bracket(Bracket),
    as_bracket_attachment => BracketAttachment(BracketAttachment),
    as_crossing_bond => CrossingBond(CrossingBond),
    as_alt_group => AltGroup(AltGroup),
    as_reaction_step => ReactionStep(ReactionStep),
}

impl Object {
    pub fn kind(&self) -> ObjectType {
        self.data.kind()
    }
}

/// A decoded ChemDraw document.
#[derive(Debug, Clone)]
pub struct Document {
    objects: Vec<Object>,
    by_id: HashMap<ObjectId, Handle>,
    warnings: Vec<Warning>,
}

impl Document {
    pub fn from_cdx(bytes: &[u8], options: &DecodeOptions) -> Result<Self> {
        let decoded = cdx::read_cdx(bytes, options)?;
        builder::build(decoded, options)
    }

    pub fn from_cdxml(text: &str, options: &DecodeOptions) -> Result<Self> {
        let decoded = cdx::read_cdxml(text, options)?;
        builder::build(decoded, options)
    }

    /// Build from an already decoded record tree.
    pub fn from_decoded(decoded: cdx::Decoded, options: &DecodeOptions) -> Result<Self> {
        builder::build(decoded, options)
    }

    pub fn root(&self) -> Handle {
        Handle(0)
    }

    pub fn info(&self) -> Option<&DocumentInfo> {
        match &self.objects.first()?.data {
            ObjectData::Document(info) => Some(info),
            _ => None,
        }
    }

    pub fn get(&self, handle: Handle) -> &Object {
        &self.objects[handle.index()]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        (0..self.objects.len() as u32).map(Handle)
    }

    /// Look up an object by its document ID.
    pub fn find(&self, id: ObjectId) -> Option<Handle> {
        self.by_id.get(&id).copied()
    }

    pub fn resolve(&self, link: &Link) -> Option<&Object> {
        link.target.map(|h| self.get(h))
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn parent(&self, handle: Handle) -> Option<Handle> {
        self.get(handle).parent
    }

    pub fn children(&self, handle: Handle) -> &[Handle] {
        &self.get(handle).children
    }

    pub fn children_of_kind(
        &self,
        handle: Handle,
        kind: ObjectType,
    ) -> impl Iterator<Item = Handle> + '_ {
        self.children(handle)
            .iter()
            .copied()
            .filter(move |&c| self.get(c).kind() == kind)
    }

    /// All objects of a kind, in document order.
    pub fn all_of_kind(&self, kind: ObjectType) -> impl Iterator<Item = Handle> + '_ {
        self.handles().filter(move |&h| self.get(h).kind() == kind)
    }

    /// Nearest ancestor (or self) of the given kind.
    pub fn enclosing(&self, handle: Handle, kind: ObjectType) -> Option<Handle> {
        let mut cur = Some(handle);
        while let Some(h) = cur {
            if self.get(h).kind() == kind {
                return Some(h);
            }
            cur = self.parent(h);
        }
        None
    }

    pub fn node(&self, handle: Handle) -> Option<&Node> {
        self.get(handle).as_node()
    }

    pub fn bond(&self, handle: Handle) -> Option<&Bond> {
        self.get(handle).as_bond()
    }

    /// The nodes a fragment owns directly.
    pub fn fragment_nodes(&self, fragment: Handle) -> impl Iterator<Item = Handle> + '_ {
        self.children_of_kind(fragment, ObjectType::Node)
    }

    pub fn fragment_bonds(&self, fragment: Handle) -> impl Iterator<Item = Handle> + '_ {
        self.children_of_kind(fragment, ObjectType::Bond)
    }

    /// Abbreviation or superatom contents drawn under a node.
    pub fn nested_fragment(&self, node: Handle) -> Option<Handle> {
        self.children_of_kind(node, ObjectType::Fragment).next()
    }

    /// Text of the first label attached to a node, fragment or alt group.
    pub fn label(&self, handle: Handle) -> Option<&str> {
        self.children_of_kind(handle, ObjectType::Text)
            .filter_map(|t| self.get(t).as_text())
            .map(|t| t.content.text.trim())
            .find(|t| !t.is_empty())
    }

    /// A fragment is worth reconstructing when it has two or more atoms, or
    /// a single atom of a chemically meaningful node type.
    pub fn is_valid_fragment(&self, fragment: Handle) -> bool {
        let mut nodes = self.fragment_nodes(fragment);
        match (nodes.next(), nodes.next()) {
            (None, _) => false,
            (Some(_), Some(_)) => true,
            (Some(only), None) => self
                .node(only)
                .is_some_and(|n| n.node_type.is_chemical()),
        }
    }

    /// Valid fragments reachable from `handle` without descending into
    /// nodes, alt groups or other fragments.
    pub fn fragments_under(&self, handle: Handle) -> Vec<Handle> {
        let mut out = Vec::new();
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            match self.get(h).kind() {
                ObjectType::Fragment => {
                    if self.is_valid_fragment(h) {
                        out.push(h);
                    }
                }
                ObjectType::Node | ObjectType::AltGroup => {}
                _ => stack.extend(self.children(h).iter().rev()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdx::{PropertyValue, Property, RawObject};

    fn doc() -> Document {
        let root = RawObject::new(ObjectType::Document, 1).child(
            RawObject::new(ObjectType::Page, 2)
                .child(
                    RawObject::new(ObjectType::Fragment, 3)
                        .child(RawObject::new(ObjectType::Node, 4))
                        .child(RawObject::new(ObjectType::Node, 5))
                        .child(
                            RawObject::new(ObjectType::Bond, 6)
                                .with(Property::BondBegin, PropertyValue::Id(4))
                                .with(Property::BondEnd, PropertyValue::Id(5)),
                        ),
                )
                .child(
                    RawObject::new(ObjectType::Fragment, 7).child(
                        RawObject::new(ObjectType::Node, 8)
                            .with(Property::NodeType, PropertyValue::Int(12)),
                    ),
                )
                .child(
                    RawObject::new(ObjectType::Group, 9).child(
                        RawObject::new(ObjectType::Fragment, 10)
                            .child(RawObject::new(ObjectType::Node, 11)),
                    ),
                ),
        );
        Document::from_decoded(
            cdx::Decoded {
                root,
                warnings: Vec::new(),
            },
            &DecodeOptions::strict(),
        )
        .unwrap()
    }

    #[test]
    fn fragment_validity() {
        let d = doc();
        assert!(d.is_valid_fragment(d.find(3).unwrap()));
        // a lone attachment point is not a molecule
        assert!(!d.is_valid_fragment(d.find(7).unwrap()));
        assert!(d.is_valid_fragment(d.find(10).unwrap()));
    }

    #[test]
    fn fragments_under_page_include_groups() {
        let d = doc();
        let page = d.find(2).unwrap();
        let ids: Vec<ObjectId> = d
            .fragments_under(page)
            .into_iter()
            .map(|h| d.get(h).id)
            .collect();
        assert_eq!(ids, vec![3, 10]);
    }

    #[test]
    fn enclosing_walks_up() {
        let d = doc();
        let node = d.find(11).unwrap();
        assert_eq!(d.enclosing(node, ObjectType::Group), d.find(9));
        assert_eq!(d.enclosing(node, ObjectType::Page), d.find(2));
        assert_eq!(d.enclosing(node, ObjectType::Arrow), None);
    }
}
