//! End-to-end conversion: decode, build, reconstruct, perceive.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::bracket;
use crate::cdx::ObjectId;
use crate::config::PipelineOptions;
use crate::document::{Document, Handle};
use crate::error::{Result, Warning};
use crate::markush::{self, Definitions};
use crate::molecule::{self, Molecule};
use crate::reaction::{self, Reaction};
use crate::stereo::{self, Interpretation};
use crate::toolkit::{NoToolkit, Perception, Toolkit};

/// A document in either wire format.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Cdx(&'a [u8]),
    Cdxml(&'a str),
}

/// One molecule ready for use, with what the toolkit made of it.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Markush choices behind this molecule; empty when nothing was
    /// enumerated.
    pub assignment: BTreeMap<String, usize>,
    pub molecule: Molecule,
    /// `None` without a toolkit, or when the toolkit failed.
    pub perception: Option<Perception>,
}

/// Everything reconstructed from one drawn fragment.
#[derive(Debug, Clone)]
pub struct Structure {
    pub fragment: Handle,
    pub interpretation: Option<Interpretation>,
    pub variants: Vec<Resolved>,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub document: Document,
    pub structures: Vec<Structure>,
    pub reactions: Vec<Reaction>,
    pub unknown_labels: BTreeSet<String>,
    pub unknown_agents: BTreeSet<String>,
    /// Decode warnings followed by pass warnings, in the order recorded.
    pub warnings: Vec<Warning>,
}

/// Runs the reconstruction passes selected by [`PipelineOptions`] and
/// hands each resulting molecule to the toolkit, if one is attached.
///
/// ```
/// use cdxcrab::{Input, Pipeline, PipelineOptions};
///
/// let xml = r#"<CDXML><page id="1"><fragment id="2">
///     <n id="3" p="0 0"/><n id="4" p="14.4 0" Element="8"/>
///     <b id="5" B="3" E="4"/>
/// </fragment></page></CDXML>"#;
/// let out = Pipeline::new(PipelineOptions::default())
///     .run(Input::Cdxml(xml))
///     .unwrap();
/// assert_eq!(out.structures.len(), 1);
/// assert_eq!(out.structures[0].variants[0].molecule.atom_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline<T = NoToolkit> {
    options: PipelineOptions,
    toolkit: Option<T>,
}

impl Pipeline<NoToolkit> {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            toolkit: None,
        }
    }
}

impl<T: Toolkit> Pipeline<T> {
    pub fn with_toolkit(options: PipelineOptions, toolkit: T) -> Self {
        Self {
            options,
            toolkit: Some(toolkit),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Decode `input` and run every enabled pass. Only decoding can fail;
    /// pass problems are reported as warnings.
    pub fn run(&self, input: Input<'_>) -> Result<Output> {
        let document = match input {
            Input::Cdx(bytes) => Document::from_cdx(bytes, &self.options.decode)?,
            Input::Cdxml(text) => Document::from_cdxml(text, &self.options.decode)?,
        };
        Ok(self.run_document(document))
    }

    pub fn run_document(&self, document: Document) -> Output {
        let opts = &self.options;
        let limits = &opts.decode.limits;
        let mut warnings = document.warnings().to_vec();

        let defs = if opts.enumerate_markush {
            let (defs, w) = Definitions::from_document(&document, opts.assign_stereo);
            warnings.extend(w);
            defs
        } else {
            Definitions::default()
        };

        let mut unknown_labels = BTreeSet::new();
        let mut reconstructed: HashMap<Handle, Molecule> = HashMap::new();
        let mut structures = Vec::new();

        for (fragment, extraction) in molecule::fragments(&document, document.root()) {
            unknown_labels.extend(extraction.unknown_labels);
            let mut mol = extraction.molecule;
            let interpretation = opts.assign_stereo.then(|| stereo::assign(&mut mol));
            if opts.expand_brackets {
                warnings.extend(bracket::expand(&document, &mut mol, limits).warnings);
            }

            let variants: Vec<(BTreeMap<String, usize>, Molecule)> =
                if opts.enumerate_markush && !defs.is_empty() {
                    let e = markush::enumerate(&mol, &defs, limits);
                    warnings.extend(e.warnings);
                    e.variants
                        .into_iter()
                        .map(|v| (v.assignment, v.molecule))
                        .collect()
                } else {
                    vec![(BTreeMap::new(), mol.clone())]
                };

            let id = document.get(fragment).id;
            let variants = variants
                .into_iter()
                .map(|(assignment, molecule)| Resolved {
                    perception: self.perceive(id, &molecule, &mut warnings),
                    assignment,
                    molecule,
                })
                .collect();
            reconstructed.insert(fragment, mol);
            structures.push(Structure {
                fragment,
                interpretation,
                variants,
            });
        }

        let (reactions, unknown_agents) = if opts.assemble_reactions {
            let assembly = reaction::assemble_with(&document, |fragment| {
                reconstructed
                    .get(&fragment)
                    .cloned()
                    .or_else(|| Some(molecule::from_fragment(&document, fragment).molecule))
            });
            (assembly.reactions, assembly.unknown_agents)
        } else {
            debug!("reaction assembly disabled");
            Default::default()
        };

        info!(
            structures = structures.len(),
            reactions = reactions.len(),
            warnings = warnings.len(),
            "document processed"
        );
        Output {
            document,
            structures,
            reactions,
            unknown_labels,
            unknown_agents,
            warnings,
        }
    }

    fn perceive(
        &self,
        fragment: ObjectId,
        molecule: &Molecule,
        warnings: &mut Vec<Warning>,
    ) -> Option<Perception> {
        let toolkit = self.toolkit.as_ref()?;
        match toolkit.perceive(molecule) {
            Ok(perception) => Some(perception),
            Err(e) => {
                let warning = Warning::Toolkit {
                    fragment,
                    message: e.to_string(),
                };
                warn!(%warning, "perception failed");
                warnings.push(warning);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::Direction;

    #[derive(Debug)]
    struct Refused;

    impl std::fmt::Display for Refused {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "refused")
        }
    }

    impl std::error::Error for Refused {}

    /// Types atoms by symbol; refuses anything with a pseudo atom.
    struct SymbolToolkit;

    impl Toolkit for SymbolToolkit {
        type Error = Refused;

        fn perceive(&self, molecule: &Molecule) -> std::result::Result<Perception, Refused> {
            let atom_types = molecule
                .atoms()
                .map(|a| molecule.atom(a).symbol().to_owned())
                .collect::<Vec<_>>();
            if molecule.atoms().any(|a| molecule.atom(a).atomic_num == 0) {
                return Err(Refused);
            }
            Ok(Perception {
                atom_types,
                ..Perception::default()
            })
        }
    }

    const ETHANOL: &str = r#"<CDXML><page id="1"><fragment id="2">
        <n id="3" p="0 0"/><n id="4" p="14.4 0"/><n id="5" p="28.8 0" Element="8"/>
        <b id="6" B="3" E="4"/><b id="7" B="4" E="5"/>
    </fragment></page></CDXML>"#;

    #[test]
    fn toolkit_sees_every_variant() {
        let pipeline = Pipeline::with_toolkit(PipelineOptions::default(), SymbolToolkit);
        let out = pipeline.run(Input::Cdxml(ETHANOL)).unwrap();
        let p = out.structures[0].variants[0].perception.as_ref().unwrap();
        assert_eq!(p.atom_types, vec!["C", "C", "O"]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn toolkit_failure_becomes_a_warning() {
        let xml = r#"<CDXML><page id="1"><fragment id="2">
            <n id="3" p="0 0"/><n id="4" p="14.4 0" NodeType="GenericNickname" GenericNickname="R1"/>
            <b id="6" B="3" E="4"/>
        </fragment></page></CDXML>"#;
        let pipeline = Pipeline::with_toolkit(PipelineOptions::default(), SymbolToolkit);
        let out = pipeline.run(Input::Cdxml(xml)).unwrap();
        assert!(out.structures[0].variants[0].perception.is_none());
        assert_eq!(
            out.warnings,
            vec![Warning::Toolkit {
                fragment: 2,
                message: "refused".into()
            }]
        );
    }

    #[test]
    fn without_toolkit_nothing_is_perceived() {
        let out = Pipeline::new(PipelineOptions::default())
            .run(Input::Cdxml(ETHANOL))
            .unwrap();
        assert!(out.structures[0].variants[0].perception.is_none());
        assert!(out.structures[0].interpretation.is_some());
    }

    #[test]
    fn passes_can_be_switched_off() {
        let options = PipelineOptions {
            assign_stereo: false,
            assemble_reactions: false,
            ..PipelineOptions::default()
        };
        let out = Pipeline::new(options).run(Input::Cdxml(ETHANOL)).unwrap();
        assert_eq!(out.structures[0].interpretation, None);
        assert!(out.reactions.is_empty());
    }

    #[test]
    fn strict_decode_errors_propagate() {
        let mut options = PipelineOptions::default();
        options.decode = crate::config::DecodeOptions::strict();
        let xml = r#"<CDXML><page id="1"><fragment id="2">
            <n id="3"/><b id="6" B="3" E="99"/>
        </fragment></page></CDXML>"#;
        assert!(Pipeline::new(options).run(Input::Cdxml(xml)).is_err());
    }

    #[test]
    fn reactions_use_reconstructed_molecules() {
        let xml = r#"<CDXML><page id="1">
            <fragment id="10"><n id="11" p="0 100"/><n id="12" p="15 100" Element="8"/><b id="13" B="11" E="12"/></fragment>
            <fragment id="20"><n id="21" p="200 100"/><n id="22" p="215 100" Element="7"/><b id="23" B="21" E="22"/></fragment>
            <arrow id="30" Head3D="180 100 0" Tail3D="40 100 0" ArrowheadHead="Full"/>
            <scheme id="50"><step id="51" ReactionStepReactants="10" ReactionStepProducts="20" ReactionStepArrows="30"/></scheme>
        </page></CDXML>"#;
        let out = Pipeline::new(PipelineOptions::default())
            .run(Input::Cdxml(xml))
            .unwrap();
        assert_eq!(out.structures.len(), 2);
        assert_eq!(out.reactions.len(), 1);
        assert_eq!(out.reactions[0].direction, Direction::Forward);
        assert_eq!(out.reactions[0].reactants.len(), 1);
    }
}
