//! Reaction assembly from reaction steps.
//!
//! Each step lists reactant, product and agent objects around an arrow.
//! Structures are extracted per fragment, free text is read as reagent
//! names, and the arrow decides which way the step runs.

mod agents;
mod direction;

pub use agents::{read_text, TextAgents};
pub use direction::{ArrowGeometry, Direction};

use std::collections::BTreeSet;

use tracing::debug;

use crate::cdx::ObjectType;
use crate::document::{Document, Handle, Link};
use crate::molecule::{self, Molecule};

/// One resolved reactant, product or agent.
#[derive(Debug, Clone)]
pub enum Participant {
    Structure { fragment: Handle, molecule: Molecule },
    Named { name: String, smiles: String },
}

impl Participant {
    pub fn molecule(&self) -> Option<&Molecule> {
        match self {
            Self::Structure { molecule, .. } => Some(molecule),
            Self::Named { .. } => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Structure { .. } => None,
        }
    }
}

/// A reaction step with every participant resolved.
///
/// `reactants` and `products` keep the roles the document gave them; use
/// [`Reaction::starting_materials`] and [`Reaction::end_products`] for the
/// roles implied by the arrow.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub step: Handle,
    pub reactants: Vec<Participant>,
    pub products: Vec<Participant>,
    pub agents: Vec<Participant>,
    pub arrow: Option<ArrowGeometry>,
    pub direction: Direction,
}

impl Reaction {
    pub fn starting_materials(&self) -> &[Participant] {
        match self.direction {
            Direction::Backward => &self.products,
            _ => &self.reactants,
        }
    }

    pub fn end_products(&self) -> &[Participant] {
        match self.direction {
            Direction::Backward => &self.reactants,
            _ => &self.products,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// One entry per reaction step, in document order.
    pub reactions: Vec<Reaction>,
    /// Agent text that matched no dictionary entry.
    pub unknown_agents: BTreeSet<String>,
}

/// Assemble every reaction step with plain fragment extraction.
pub fn assemble(doc: &Document) -> Assembly {
    assemble_with(doc, |fragment| Some(molecule::from_fragment(doc, fragment).molecule))
}

/// Assemble every reaction step, asking `resolve` for each fragment's
/// molecule. Fragments it declines are left out of the step.
pub fn assemble_with(
    doc: &Document,
    mut resolve: impl FnMut(Handle) -> Option<Molecule>,
) -> Assembly {
    let mut out = Assembly::default();
    let steps: Vec<Handle> = doc
        .traverse()
        .into_iter()
        .filter(|&h| doc.get(h).kind() == ObjectType::ReactionStep)
        .collect();
    for step in steps {
        if let Some(reaction) = assemble_step(doc, step, &mut resolve, &mut out.unknown_agents) {
            out.reactions.push(reaction);
        }
    }
    out
}

fn assemble_step(
    doc: &Document,
    step: Handle,
    resolve: &mut impl FnMut(Handle) -> Option<Molecule>,
    unknown: &mut BTreeSet<String>,
) -> Option<Reaction> {
    let data = doc.get(step).as_reaction_step()?;
    let mut participants = |links: &[Link]| {
        let mut out = Vec::new();
        for target in links.iter().filter_map(|l| l.target) {
            participants_of(doc, target, resolve, unknown, &mut out);
        }
        out
    };
    let mut reactants = participants(&data.reactants);
    let mut products = participants(&data.products);
    let mut agents = participants(&data.above_arrow);
    agents.extend(participants(&data.below_arrow));

    let arrow = data.arrows.iter().filter_map(|l| l.target).find_map(|h| {
        let object = doc.get(h);
        object
            .as_arrow()
            .and_then(ArrowGeometry::from_arrow)
            .or_else(|| object.as_graphic().and_then(ArrowGeometry::from_graphic))
    });
    let direction = arrow.map_or(Direction::Forward, |a| {
        a.direction(
            reactants.iter().filter_map(Participant::molecule),
            products.iter().filter_map(Participant::molecule),
        )
    });

    for (n, (from, to)) in data.atom_map.iter().enumerate() {
        let number = u16::try_from(n + 1).unwrap_or(u16::MAX);
        set_map_number(&mut reactants, from.id, number);
        set_map_number(&mut products, to.id, number);
    }

    debug!(
        step = doc.get(step).id,
        reactants = reactants.len(),
        products = products.len(),
        agents = agents.len(),
        ?direction,
        "reaction step assembled"
    );
    Some(Reaction {
        step,
        reactants,
        products,
        agents,
        arrow,
        direction,
    })
}

/// Fragments are extracted, groups contribute every fragment inside them,
/// and texts go through the agent dictionary.
fn participants_of(
    doc: &Document,
    handle: Handle,
    resolve: &mut impl FnMut(Handle) -> Option<Molecule>,
    unknown: &mut BTreeSet<String>,
    out: &mut Vec<Participant>,
) {
    match doc.get(handle).kind() {
        ObjectType::Text => {
            let Some(text) = doc.get(handle).as_text() else {
                return;
            };
            let read = read_text(&text.content.text);
            out.extend(
                read.known
                    .into_iter()
                    .map(|(name, smiles)| Participant::Named { name, smiles }),
            );
            unknown.extend(read.unknown);
        }
        ObjectType::Fragment | ObjectType::Group => {
            for fragment in doc.fragments_under(handle) {
                if let Some(molecule) = resolve(fragment) {
                    out.push(Participant::Structure { fragment, molecule });
                }
            }
        }
        other => debug!(kind = ?other, "ignoring reaction participant"),
    }
}

fn set_map_number(participants: &mut [Participant], source: u32, number: u16) {
    for p in participants {
        if let Participant::Structure { molecule, .. } = p {
            if let Some(atom) = molecule.atom_by_source(source) {
                molecule.atom_mut(atom).map_number = number;
                return;
            }
        }
    }
}
