//! Depth-first traversal with a fixed child order per object kind.
//!
//! | parent                | children, in this order                         |
//! |-----------------------|-------------------------------------------------|
//! | Document              | Pages                                           |
//! | Page, Group           | Groups, Fragments, Graphics, Curves, Brackets,  |
//! |                       | Texts, Arrows, AltGroups, Spectra, Pictures,    |
//! |                       | Tables, Geometries, Constraints, TLC plates,    |
//! |                       | ReactionSchemes                                 |
//! | Fragment              | Nodes, Bonds, Texts, Graphics                   |
//! | Node                  | Fragments, Texts                                |
//! | Bracket               | BracketAttachments                              |
//! | BracketAttachment     | CrossingBonds                                   |
//! | AltGroup              | Fragments, Groups, Texts                        |
//! | ReactionScheme        | ReactionSteps                                   |
//! | TLC plate / lane      | TLC lanes / TLC spots                           |
//!
//! Children of a kind the parent's order does not list follow afterwards in
//! document order. Within one kind, document order is kept.

use super::{Document, Handle, Object};
use crate::cdx::ObjectType;

/// What the traversal should do after visiting an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
    Stop,
}

pub trait Visitor {
    fn enter(&mut self, doc: &Document, handle: Handle, object: &Object) -> Walk;

    fn leave(&mut self, _doc: &Document, _handle: Handle, _object: &Object) {}
}

impl<F> Visitor for F
where
    F: FnMut(&Document, Handle, &Object) -> Walk,
{
    fn enter(&mut self, doc: &Document, handle: Handle, object: &Object) -> Walk {
        self(doc, handle, object)
    }
}

const CONTAINER_ORDER: &[ObjectType] = &[
    ObjectType::Group,
    ObjectType::Fragment,
    ObjectType::Graphic,
    ObjectType::Curve,
    ObjectType::Bracket,
    ObjectType::Text,
    ObjectType::Arrow,
    ObjectType::AltGroup,
    ObjectType::Spectrum,
    ObjectType::Picture,
    ObjectType::Table,
    ObjectType::Geometry,
    ObjectType::Constraint,
    ObjectType::TlcPlate,
    ObjectType::ReactionScheme,
];

/// The documented child order for a parent kind.
pub fn child_order(kind: ObjectType) -> &'static [ObjectType] {
    match kind {
        ObjectType::Document => &[ObjectType::Page],
        ObjectType::Page | ObjectType::Group => CONTAINER_ORDER,
        ObjectType::Fragment => &[
            ObjectType::Node,
            ObjectType::Bond,
            ObjectType::Text,
            ObjectType::Graphic,
        ],
        ObjectType::Node => &[ObjectType::Fragment, ObjectType::Text],
        ObjectType::Bracket => &[ObjectType::BracketAttachment],
        ObjectType::BracketAttachment => &[ObjectType::CrossingBond],
        ObjectType::AltGroup => &[ObjectType::Fragment, ObjectType::Group, ObjectType::Text],
        ObjectType::ReactionScheme => &[ObjectType::ReactionStep],
        ObjectType::TlcPlate => &[ObjectType::TlcLane],
        ObjectType::TlcLane => &[ObjectType::TlcSpot],
        _ => &[],
    }
}

impl Document {
    /// Children of `handle` in traversal order.
    pub fn ordered_children(&self, handle: Handle) -> Vec<Handle> {
        let children = self.children(handle);
        let order = child_order(self.get(handle).kind());
        let rank = |h: &Handle| {
            let kind = self.get(*h).kind();
            order.iter().position(|&k| k == kind).unwrap_or(order.len())
        };
        let mut sorted = children.to_vec();
        // stable: document order within one rank
        sorted.sort_by_key(rank);
        sorted
    }

    /// Visit `start` and its descendants. Returns `false` if the visitor
    /// stopped early.
    pub fn walk<V: Visitor + ?Sized>(&self, start: Handle, visitor: &mut V) -> bool {
        let object = self.get(start);
        match visitor.enter(self, start, object) {
            Walk::Stop => return false,
            Walk::SkipChildren => {}
            Walk::Continue => {
                for child in self.ordered_children(start) {
                    if !self.walk(child, visitor) {
                        return false;
                    }
                }
            }
        }
        visitor.leave(self, start, object);
        true
    }

    /// Every object in traversal order, starting at the document root.
    pub fn traverse(&self) -> Vec<Handle> {
        let mut out = Vec::with_capacity(self.len());
        self.walk(self.root(), &mut |_: &Document, h: Handle, _: &Object| {
            out.push(h);
            Walk::Continue
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdx::{Decoded, RawObject};
    use crate::config::DecodeOptions;

    fn page_doc() -> Document {
        let page = RawObject::new(ObjectType::Page, 2)
            .child(RawObject::new(ObjectType::ReactionScheme, 10))
            .child(RawObject::new(ObjectType::Text, 11))
            .child(RawObject::new(ObjectType::Fragment, 12))
            .child(RawObject::new(ObjectType::ObjectTag, 13))
            .child(RawObject::new(ObjectType::Group, 14))
            .child(RawObject::new(ObjectType::Fragment, 15))
            .child(RawObject::new(ObjectType::Arrow, 16));
        let root = RawObject::new(ObjectType::Document, 1).child(page);
        Document::from_decoded(
            Decoded {
                root,
                warnings: Vec::new(),
            },
            &DecodeOptions::strict(),
        )
        .unwrap()
    }

    fn ids(doc: &Document, handles: &[Handle]) -> Vec<u32> {
        handles.iter().map(|&h| doc.get(h).id).collect()
    }

    #[test]
    fn page_children_follow_kind_order() {
        let doc = page_doc();
        let order = doc.ordered_children(doc.find(2).unwrap());
        assert_eq!(ids(&doc, &order), vec![14, 12, 15, 11, 16, 10, 13]);
    }

    #[test]
    fn traversal_is_preorder_and_repeatable() {
        let doc = page_doc();
        let first = doc.traverse();
        assert_eq!(ids(&doc, &first), vec![1, 2, 14, 12, 15, 11, 16, 10, 13]);
        assert_eq!(first, doc.traverse());
    }

    #[test]
    fn skip_and_stop() {
        struct Counter {
            seen: Vec<u32>,
        }
        impl Visitor for Counter {
            fn enter(&mut self, _: &Document, _: Handle, object: &Object) -> Walk {
                self.seen.push(object.id);
                match object.kind() {
                    ObjectType::Page => Walk::Continue,
                    ObjectType::Text => Walk::Stop,
                    _ => Walk::SkipChildren,
                }
            }
        }
        let doc = page_doc();
        let mut v = Counter { seen: Vec::new() };
        assert!(doc.walk(doc.root(), &mut v));
        assert_eq!(v.seen, vec![1]);

        let mut v = Counter { seen: Vec::new() };
        assert!(!doc.walk(doc.find(2).unwrap(), &mut v));
        assert_eq!(v.seen, vec![2, 14, 12, 15, 11]);
    }
}
