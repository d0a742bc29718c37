//! Boundary to an external chemistry toolkit.
//!
//! Atom typing, implicit hydrogens and identifier generation are left to
//! the toolkit; the pipeline only hands it finished molecules.

use std::convert::Infallible;

use crate::molecule::Molecule;

/// What a toolkit reports for one molecule. Every field is optional so a
/// toolkit can fill in only what it supports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Perception {
    /// One type string per atom, in atom index order.
    pub atom_types: Vec<String>,
    /// Implicit hydrogen count per atom, in atom index order.
    pub implicit_hydrogens: Vec<u8>,
    pub smiles: Option<String>,
    pub inchi: Option<String>,
    pub inchi_key: Option<String>,
}

pub trait Toolkit {
    type Error: std::error::Error;

    fn perceive(&self, molecule: &Molecule) -> Result<Perception, Self::Error>;
}

/// Type parameter of a pipeline built without a toolkit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToolkit;

impl Toolkit for NoToolkit {
    type Error = Infallible;

    fn perceive(&self, _molecule: &Molecule) -> Result<Perception, Self::Error> {
        Ok(Perception::default())
    }
}

impl<T: Toolkit + ?Sized> Toolkit for &T {
    type Error = T::Error;

    fn perceive(&self, molecule: &Molecule) -> Result<Perception, Self::Error> {
        (**self).perceive(molecule)
    }
}
