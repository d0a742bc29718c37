//! Two-pass construction of the object arena.
//!
//! Pass 1 walks the record tree, allocating one arena slot per object and
//! setting every direct-value property. ID-valued properties are stored as
//! unresolved [`Link`]s. Pass 2 resolves every link against the ID index.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::*;
use crate::cdx::{Decoded, Property, PropertyValue, RawObject};
use crate::error::{ConstraintViolation, Error, ReferenceError};

pub(super) fn build(decoded: Decoded, options: &DecodeOptions) -> Result<Document> {
    let mut doc = Document {
        objects: Vec::with_capacity(decoded.root.count()),
        by_id: HashMap::new(),
        warnings: decoded.warnings,
    };
    allocate(&mut doc, &decoded.root, None, options)?;
    resolve_links(&mut doc, options)?;
    check_bond_ownership(&mut doc);
    debug!(objects = doc.objects.len(), warnings = doc.warnings.len(), "document built");
    Ok(doc)
}

fn allocate(
    doc: &mut Document,
    raw: &RawObject,
    parent: Option<Handle>,
    options: &DecodeOptions,
) -> Result<Handle> {
    let handle = Handle(doc.objects.len() as u32);
    let mut object = Object {
        id: raw.id,
        parent,
        children: Vec::with_capacity(raw.children.len()),
        name: None,
        z_order: None,
        superseded_by: None,
        data: blank(raw.kind),
    };
    for (property, value) in &raw.properties {
        apply(&mut object, *property, value);
    }
    doc.objects.push(object);

    if raw.id != 0 {
        if let Some(&first) = doc.by_id.get(&raw.id) {
            let err = ReferenceError {
                from: raw.id,
                property: "id",
                target: doc.objects[first.index()].id,
            };
            if options.is_strict() {
                return Err(err.into());
            }
            warn!(id = raw.id, "duplicate object id, keeping the first");
            doc.warnings.push(err.into());
        } else {
            doc.by_id.insert(raw.id, handle);
        }
    }

    for child in &raw.children {
        let c = allocate(doc, child, Some(handle), options)?;
        doc.objects[handle.index()].children.push(c);
    }
    Ok(handle)
}

fn blank(kind: ObjectType) -> ObjectData {
    match kind {
        ObjectType::Document => ObjectData::Document(DocumentInfo::default()),
        ObjectType::Page => ObjectData::Page,
        ObjectType::Group => ObjectData::Group,
        ObjectType::Fragment => ObjectData::Fragment(Fragment::default()),
        ObjectType::Node => ObjectData::Node(Node::default()),
        ObjectType::Bond => ObjectData::Bond(Bond::default()),
        ObjectType::Text => ObjectData::Text(Text::default()),
        ObjectType::Graphic => ObjectData::Graphic(Graphic::default()),
        ObjectType::Curve => ObjectData::Curve(Curve::default()),
        ObjectType::Arrow => ObjectData::Arrow(Arrow::default()),
        ObjectType::Bracket => ObjectData::Bracket(Bracket::default()),
        ObjectType::BracketAttachment => {
            ObjectData::BracketAttachment(BracketAttachment::default())
        }
        ObjectType::CrossingBond => ObjectData::CrossingBond(CrossingBond::default()),
        ObjectType::AltGroup => ObjectData::AltGroup(AltGroup::default()),
        ObjectType::ReactionScheme => ObjectData::ReactionScheme,
        ObjectType::ReactionStep => ObjectData::ReactionStep(ReactionStep::default()),
        other => ObjectData::Other(other),
    }
}

fn links(v: &PropertyValue) -> Vec<Link> {
    v.as_ids()
        .map(|ids| ids.iter().copied().map(Link::new).collect())
        .unwrap_or_default()
}

fn text(v: &PropertyValue) -> Option<String> {
    v.as_text().map(str::to_string)
}

fn point2(v: &PropertyValue) -> Option<[f64; 2]> {
    match v {
        PropertyValue::Point2(p) => Some(*p),
        _ => None,
    }
}

fn point3(v: &PropertyValue) -> Option<[f64; 3]> {
    match v {
        PropertyValue::Point3(p) => Some(*p),
        _ => None,
    }
}

fn rect(v: &PropertyValue) -> Option<Rect> {
    match v {
        PropertyValue::Rect(r) => Some(*r),
        _ => None,
    }
}

fn small<T: TryFrom<i64>>(v: &PropertyValue) -> Option<T> {
    v.as_int().and_then(|i| T::try_from(i).ok())
}

/// Set one decoded property on an object. Properties that do not apply to
/// the object's kind are ignored.
fn apply(object: &mut Object, property: Property, v: &PropertyValue) {
    let ord = || v.as_int().unwrap_or(0);
    match property {
        Property::Name => {
            object.name = text(v);
            return;
        }
        Property::ZOrder => {
            object.z_order = small(v);
            return;
        }
        Property::SupersededBy => {
            object.superseded_by = v.as_id().map(Link::new);
            return;
        }
        _ => {}
    }

    match &mut object.data {
        ObjectData::Document(info) => match property {
            Property::CreationProgram => info.creation_program = text(v),
            Property::BondLength => info.bond_length = v.as_float(),
            _ => {}
        },
        ObjectData::Node(n) => match property {
            Property::Element => n.element = small(v).unwrap_or(n.element),
            Property::Charge => n.charge = small(v).unwrap_or(0),
            Property::Isotope => n.isotope = small(v).unwrap_or(0),
            Property::NodeType => n.node_type = NodeType::from_ordinal(ord()),
            Property::Position2D => n.position = point2(v),
            Property::Position3D => n.position_3d = point3(v),
            Property::AtomCip => n.cip = AtomCip::from_ordinal(ord()),
            Property::Geometry => n.geometry = AtomGeometry::from_ordinal(ord()),
            Property::Radical => n.radical = Radical::from_ordinal(ord()),
            Property::NumHydrogens => n.num_hydrogens = small(v),
            Property::GenericNickname => n.generic_nickname = text(v),
            Property::AtomNumber => n.atom_number = text(v),
            Property::AltGroupId => n.alt_group = v.as_id().map(Link::new),
            Property::LinkCountLow => n.link_count.0 = small(v),
            Property::LinkCountHigh => n.link_count.1 = small(v),
            Property::ExternalConnectionType => {
                n.external_connection_type = ExternalConnectionType::from_ordinal(ord())
            }
            Property::ExternalConnectionNum => n.external_connection_num = small(v),
            Property::BondOrdering => n.bond_ordering = links(v),
            Property::Attachments => n.attachments = links(v),
            Property::EnhancedStereoType => {
                n.enhanced_stereo_type = EnhancedStereoType::from_ordinal(ord())
            }
            Property::EnhancedStereoGroup => n.enhanced_stereo_group = small(v),
            _ => {}
        },
        ObjectData::Bond(b) => match property {
            Property::BondBegin => b.begin = Link::new(v.as_id().unwrap_or(0)),
            Property::BondEnd => b.end = Link::new(v.as_id().unwrap_or(0)),
            Property::BondOrder => {
                let bits = small::<u16>(v).unwrap_or(0);
                b.order = if bits == 0 {
                    BondOrder::default()
                } else {
                    BondOrder(bits)
                };
            }
            Property::BondDisplay => b.display = BondDisplay::from_ordinal(ord()),
            Property::BondDisplay2 => b.display2 = BondDisplay::from_ordinal(ord()),
            Property::BondCip => b.cip = BondCip::from_ordinal(ord()),
            Property::BondBeginAttach => b.begin_attach = small(v),
            Property::BondEndAttach => b.end_attach = small(v),
            Property::CrossingBonds => b.crossing_bonds = links(v),
            _ => {}
        },
        ObjectData::Fragment(f) => match property {
            Property::Racemic => f.racemic = v.as_bool().unwrap_or(false),
            Property::Absolute => f.absolute = v.as_bool().unwrap_or(false),
            Property::Relative => f.relative = v.as_bool().unwrap_or(false),
            Property::ConnectionOrder => f.connection_order = links(v),
            _ => {}
        },
        ObjectData::Text(t) => match property {
            Property::Position2D => t.position = point2(v),
            Property::BoundingBox => t.bounds = rect(v),
            Property::Text => {
                if let PropertyValue::Text(styled) = v {
                    t.content = styled.clone();
                }
            }
            Property::InterpretChemically => t.interpret_chemically = v.as_bool().unwrap_or(false),
            _ => {}
        },
        ObjectData::Graphic(g) => match property {
            Property::GraphicType => g.graphic_type = GraphicType::from_ordinal(ord()),
            Property::BoundingBox => g.bounds = rect(v),
            Property::LineType => g.line_style = LineStyle::from_bits(ord() as u32),
            Property::OvalType => g.oval_style = OvalStyle::from_bits(ord() as u32),
            Property::RectangleType => g.rectangle_style = RectangleStyle::from_bits(ord() as u32),
            Property::ArrowType => g.arrow_type = ArrowType::from_ordinal(ord()),
            Property::Head3D => g.head = point3(v),
            Property::Tail3D => g.tail = point3(v),
            _ => {}
        },
        ObjectData::Curve(c) => match property {
            Property::CurveType => c.spline_style = SplineStyle::from_bits(ord() as u32),
            Property::BoundingBox => c.bounds = rect(v),
            _ => {}
        },
        ObjectData::Arrow(a) => match property {
            Property::Head3D => a.head = point3(v),
            Property::Tail3D => a.tail = point3(v),
            Property::Center3D => a.center = point3(v),
            Property::ArrowheadHead => a.head_marker = ArrowheadPosition::from_ordinal(ord()),
            Property::ArrowheadTail => a.tail_marker = ArrowheadPosition::from_ordinal(ord()),
            Property::ArrowheadType => a.arrowhead_type = ArrowheadType::from_ordinal(ord()),
            Property::LineType => a.line_style = LineStyle::from_bits(ord() as u32),
            Property::BoundingBox => a.bounds = rect(v),
            Property::ArrowSource => a.sources = links(v),
            Property::ArrowTarget => a.targets = links(v),
            _ => {}
        },
        ObjectData::Bracket(br) => match property {
            Property::BracketedObjects => br.objects = links(v),
            Property::RepeatCount => br.repeat_count = v.as_float(),
            Property::BracketUsage => br.usage = BracketUsage::from_ordinal(ord()),
            Property::BracketFlip => br.flip = BracketFlip::from_ordinal(ord()),
            Property::SruLabel => br.sru_label = text(v),
            _ => {}
        },
        ObjectData::BracketAttachment(att) => {
            if property == Property::GraphicId {
                att.graphic = v.as_id().map(Link::new);
            }
        }
        ObjectData::CrossingBond(cb) => match property {
            Property::CrossingBondId => cb.bond = v.as_id().map(Link::new),
            Property::InnerAtomId => cb.inner_atom = v.as_id().map(Link::new),
            _ => {}
        },
        ObjectData::AltGroup(g) => match property {
            Property::TextFrame => g.text_frame = rect(v),
            Property::GroupFrame => g.group_frame = rect(v),
            Property::Valence => g.valence = small(v),
            _ => {}
        },
        ObjectData::ReactionStep(s) => match property {
            Property::StepReactants => s.reactants = links(v),
            Property::StepProducts => s.products = links(v),
            Property::StepPlusses => s.plusses = links(v),
            Property::StepArrows => s.arrows = links(v),
            Property::StepAboveArrow => s.above_arrow = links(v),
            Property::StepBelowArrow => s.below_arrow = links(v),
            Property::StepAtomMap => {
                s.atom_map = v
                    .as_ids()
                    .unwrap_or_default()
                    .chunks_exact(2)
                    .map(|pair| (Link::new(pair[0]), Link::new(pair[1])))
                    .collect();
            }
            _ => {}
        },
        ObjectData::Page
        | ObjectData::Group
        | ObjectData::ReactionScheme
        | ObjectData::Other(_) => {}
    }
}

/// Resolves links against the ID index, collecting failures.
struct Resolver<'a> {
    by_id: &'a HashMap<ObjectId, Handle>,
    from: ObjectId,
    failures: Vec<ReferenceError>,
}

impl Resolver<'_> {
    fn link(&mut self, property: &'static str, link: &mut Link) {
        link.target = self.by_id.get(&link.id).copied();
        if link.target.is_none() {
            self.failures.push(ReferenceError {
                from: self.from,
                property,
                target: link.id,
            });
        }
    }

    fn optional(&mut self, property: &'static str, link: &mut Option<Link>) {
        if let Some(link) = link {
            self.link(property, link);
        }
    }

    fn list(&mut self, property: &'static str, links: &mut [Link]) {
        for link in links {
            self.link(property, link);
        }
    }
}

fn resolve_links(doc: &mut Document, options: &DecodeOptions) -> Result<()> {
    let by_id = &doc.by_id;
    let mut failures = Vec::new();
    for object in &mut doc.objects {
        let mut r = Resolver {
            by_id,
            from: object.id,
            failures: Vec::new(),
        };
        r.optional("SupersededBy", &mut object.superseded_by);
        match &mut object.data {
            ObjectData::Node(n) => {
                r.optional("AltGroupID", &mut n.alt_group);
                r.list("BondOrdering", &mut n.bond_ordering);
                r.list("Attachments", &mut n.attachments);
            }
            ObjectData::Bond(b) => {
                r.link("B", &mut b.begin);
                r.link("E", &mut b.end);
                r.list("CrossingBonds", &mut b.crossing_bonds);
            }
            ObjectData::Fragment(f) => r.list("ConnectionOrder", &mut f.connection_order),
            ObjectData::Arrow(a) => {
                r.list("ArrowSource", &mut a.sources);
                r.list("ArrowTarget", &mut a.targets);
            }
            ObjectData::Bracket(br) => r.list("BracketedObjectIDs", &mut br.objects),
            ObjectData::BracketAttachment(att) => r.optional("GraphicID", &mut att.graphic),
            ObjectData::CrossingBond(cb) => {
                r.optional("BondID", &mut cb.bond);
                r.optional("InnerAtomID", &mut cb.inner_atom);
            }
            ObjectData::ReactionStep(s) => {
                r.list("ReactionStepReactants", &mut s.reactants);
                r.list("ReactionStepProducts", &mut s.products);
                r.list("ReactionStepPlusses", &mut s.plusses);
                r.list("ReactionStepArrows", &mut s.arrows);
                r.list("ReactionStepObjectsAboveArrow", &mut s.above_arrow);
                r.list("ReactionStepObjectsBelowArrow", &mut s.below_arrow);
                for (a, b) in &mut s.atom_map {
                    r.link("ReactionStepAtomMap", a);
                    r.link("ReactionStepAtomMap", b);
                }
            }
            _ => {}
        }
        failures.extend(r.failures);
    }

    if let Some(first) = failures.first() {
        if options.is_strict() {
            return Err(Error::Reference(first.clone()));
        }
    }
    for err in failures {
        warn!(%err, "unresolved reference");
        doc.warnings.push(err.into());
    }
    Ok(())
}

/// Record bonds whose endpoints are not children of the bond's own fragment.
fn check_bond_ownership(doc: &mut Document) {
    let mut violations = Vec::new();
    for h in doc.handles() {
        let object = doc.get(h);
        let Some(bond) = object.as_bond() else {
            continue;
        };
        let owned = |link: &Link| link.target.is_none_or(|t| doc.parent(t) == object.parent);
        if !owned(&bond.begin) || !owned(&bond.end) {
            violations.push(ConstraintViolation::ForeignBondEndpoint { bond: object.id });
        }
    }
    for v in violations {
        warn!(%v, "bond endpoint outside its fragment");
        doc.warnings.push(v.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;

    fn bond_doc(end: ObjectId) -> Decoded {
        let root = RawObject::new(ObjectType::Document, 1).child(
            RawObject::new(ObjectType::Page, 2).child(
                RawObject::new(ObjectType::Fragment, 3)
                    .child(RawObject::new(ObjectType::Node, 4))
                    .child(RawObject::new(ObjectType::Node, 5))
                    .child(
                        RawObject::new(ObjectType::Bond, 6)
                            .with(Property::BondBegin, PropertyValue::Id(4))
                            .with(Property::BondEnd, PropertyValue::Id(end))
                            .with(Property::BondCip, PropertyValue::Int(4)),
                    ),
            ),
        );
        Decoded {
            root,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn links_resolve_to_handles() {
        let doc = build(bond_doc(5), &DecodeOptions::strict()).unwrap();
        let bond = doc.bond(doc.find(6).unwrap()).unwrap();
        assert_eq!(bond.begin.target, doc.find(4));
        assert_eq!(bond.end.target, doc.find(5));
        assert_eq!(bond.cip, BondCip::Undetermined);
        assert!(doc.warnings().is_empty());
    }

    #[test]
    fn dangling_reference_is_a_warning_when_lenient() {
        let doc = build(bond_doc(99), &DecodeOptions::lenient()).unwrap();
        let bond = doc.bond(doc.find(6).unwrap()).unwrap();
        assert_eq!(bond.end.id, 99);
        assert!(bond.end.target.is_none());
        assert_eq!(
            doc.warnings(),
            &[Warning::Reference(ReferenceError {
                from: 6,
                property: "E",
                target: 99
            })]
        );
    }

    #[test]
    fn dangling_reference_aborts_when_strict() {
        let err = build(bond_doc(99), &DecodeOptions::strict()).unwrap_err();
        assert!(matches!(err, Error::Reference(ReferenceError { target: 99, .. })));
    }

    #[test]
    fn foreign_endpoint_is_recorded() {
        let root = RawObject::new(ObjectType::Document, 1).child(
            RawObject::new(ObjectType::Page, 2)
                .child(
                    RawObject::new(ObjectType::Fragment, 3)
                        .child(RawObject::new(ObjectType::Node, 4)),
                )
                .child(
                    RawObject::new(ObjectType::Fragment, 5)
                        .child(RawObject::new(ObjectType::Node, 6))
                        .child(
                            RawObject::new(ObjectType::Bond, 7)
                                .with(Property::BondBegin, PropertyValue::Id(4))
                                .with(Property::BondEnd, PropertyValue::Id(6)),
                        ),
                ),
        );
        let doc = build(
            Decoded {
                root,
                warnings: Vec::new(),
            },
            &DecodeOptions::strict(),
        )
        .unwrap();
        assert_eq!(
            doc.warnings(),
            &[Warning::Constraint(ConstraintViolation::ForeignBondEndpoint { bond: 7 })]
        );
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let root = RawObject::new(ObjectType::Document, 1).child(
            RawObject::new(ObjectType::Page, 2)
                .child(RawObject::new(ObjectType::Text, 3))
                .child(RawObject::new(ObjectType::Graphic, 3)),
        );
        let decoded = Decoded {
            root,
            warnings: Vec::new(),
        };
        let doc = build(decoded.clone(), &DecodeOptions::lenient()).unwrap();
        assert_eq!(doc.get(doc.find(3).unwrap()).kind(), ObjectType::Text);
        assert_eq!(doc.warnings().len(), 1);
        assert!(build(decoded, &DecodeOptions::strict()).is_err());
    }

    #[test]
    fn atom_map_pairs() {
        let root = RawObject::new(ObjectType::Document, 1).child(
            RawObject::new(ObjectType::Page, 2)
                .child(
                    RawObject::new(ObjectType::Fragment, 3)
                        .child(RawObject::new(ObjectType::Node, 4))
                        .child(RawObject::new(ObjectType::Node, 5)),
                )
                .child(
                    RawObject::new(ObjectType::ReactionScheme, 6).child(
                        RawObject::new(ObjectType::ReactionStep, 7)
                            .with(Property::StepAtomMap, PropertyValue::Ids(vec![4, 5, 5])),
                    ),
                ),
        );
        let doc = build(
            Decoded {
                root,
                warnings: Vec::new(),
            },
            &DecodeOptions::strict(),
        )
        .unwrap();
        let step = doc.get(doc.find(7).unwrap()).as_reaction_step().unwrap();
        assert_eq!(step.atom_map.len(), 1);
        assert_eq!(step.atom_map[0].0.target, doc.find(4));
        assert_eq!(step.atom_map[0].1.target, doc.find(5));
    }
}
