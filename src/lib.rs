pub mod atom;
pub mod bond;
pub mod bracket;
pub mod cdx;
pub mod config;
pub mod dictionary;
pub mod document;
pub mod element;
pub mod error;
pub mod formula;
pub mod graph_ops;
pub mod markush;
pub mod mol;
pub mod molecule;
pub mod pipeline;
pub mod reaction;
pub mod stereo;
pub mod toolkit;
pub mod traits;

pub use atom::Atom;
pub use bond::{Bond, BondStereo};
pub use cdx::enums::BondOrder;
pub use cdx::{read_cdx, read_cdxml, ObjectId, ObjectType, Property};
pub use config::{DecodeOptions, Limits, Mode, PipelineOptions};
pub use document::{Document, Handle, Link, Object, ObjectData, Visitor, Walk};
pub use error::{ConstraintViolation, Error, FormatError, ReferenceError, Result, Warning};
pub use formula::mol_formula;
pub use markush::{Definitions, Variant};
pub use mol::{Conformation, EZStereo, Mol, TetrahedralStereo, Winding};
pub use molecule::{from_fragment, Molecule};
pub use pipeline::{Input, Output, Pipeline, Resolved, Structure};
pub use reaction::{Direction, Participant, Reaction};
pub use stereo::Interpretation;
pub use toolkit::{NoToolkit, Perception, Toolkit};
pub use traits::{HasAtomicNum, HasPosition2D};
