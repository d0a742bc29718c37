use serde::Deserialize;

use cdxcrab::{mol_formula, Input, Output, Pipeline, PipelineOptions};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/approval_data/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {path}: {e}"))
}

fn run(name: &str) -> Output {
    Pipeline::new(PipelineOptions::default())
        .run(Input::Cdxml(&fixture(name)))
        .unwrap_or_else(|e| panic!("{name}: {e}"))
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct StructureEntry {
    file: String,
    structures: usize,
    formulas: Vec<String>,
    tetrahedral: usize,
    interpretation: Option<String>,
}

#[test]
fn approval_structures() {
    let data: Vec<StructureEntry> =
        serde_json::from_str(include_str!("approval_data/structures.json")).unwrap();

    let mut failures = Vec::new();
    for entry in &data {
        let out = run(&entry.file);

        if out.structures.len() != entry.structures {
            failures.push(format!(
                "[count] {}: expected {} structures, got {}",
                entry.file,
                entry.structures,
                out.structures.len()
            ));
        }

        let mut formulas: Vec<String> = out
            .structures
            .iter()
            .flat_map(|s| &s.variants)
            .map(|v| mol_formula(&v.molecule))
            .collect();
        formulas.sort();
        if formulas != entry.formulas {
            failures.push(format!(
                "[formula] {}: expected {:?}, got {:?}",
                entry.file, entry.formulas, formulas
            ));
        }

        let centres: usize = out
            .structures
            .iter()
            .filter_map(|s| s.variants.first())
            .map(|v| v.molecule.tetrahedral_stereo().len())
            .sum();
        if centres != entry.tetrahedral {
            failures.push(format!(
                "[stereo] {}: expected {} centres, got {}",
                entry.file, entry.tetrahedral, centres
            ));
        }

        if let Some(expected) = &entry.interpretation {
            let got = out.structures.first().and_then(|s| s.interpretation);
            if got.map(|i| format!("{i:?}")).as_ref() != Some(expected) {
                failures.push(format!(
                    "[interpretation] {}: expected {expected}, got {got:?}",
                    entry.file
                ));
            }
        }

        let placeholders: usize = out
            .structures
            .iter()
            .flat_map(|s| &s.variants)
            .map(|v| v.molecule.placeholders().count())
            .sum();
        if placeholders != 0 {
            failures.push(format!(
                "[markush] {}: {placeholders} placeholders left after enumeration",
                entry.file
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "{} structure approval failures:\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}

// ---------------------------------------------------------------------------
// Bracket connectivity
// ---------------------------------------------------------------------------

#[test]
fn approval_polymer_is_one_chain() {
    let out = run("polymer_repeat.cdxml");
    let mol = &out.structures[0].variants[0].molecule;
    assert_eq!(mol.atom_count(), 7);
    assert_eq!(mol.bond_count(), 6);
    assert_eq!(cdxcrab::graph_ops::num_components(mol), 1);
    let ends: Vec<_> = mol.atoms().filter(|&a| mol.degree(a) == 1).collect();
    assert_eq!(ends.len(), 2);
    let path = cdxcrab::graph_ops::shortest_path(mol, ends[0], ends[1]).unwrap();
    assert_eq!(path.len(), 7);
}

#[test]
fn approval_stereo_survives_repeat_expansion() {
    let out = run("wedged_repeat.cdxml");
    let mol = &out.structures[0].variants[0].molecule;
    assert_eq!(mol.atom_count(), 8);
    assert_eq!(mol.tetrahedral_stereo().len(), 1);
    for s in mol.tetrahedral_stereo() {
        for &l in s.ligands.iter().filter(|&&l| l != s.focus) {
            assert!(
                mol.bond_between(s.focus, l).is_some(),
                "ligand {l:?} is not bonded to focus {:?}",
                s.focus
            );
        }
    }
    let centre = mol.atom_by_source(11).unwrap();
    let repeat = mol.atom_by_source(14).unwrap();
    assert!(mol.bond_between(centre, repeat).is_none());
}

#[test]
fn approval_markush_assignments_cover_every_choice() {
    let out = run("markush_2x3.cdxml");
    let mut seen: Vec<(usize, usize)> = out.structures[0]
        .variants
        .iter()
        .map(|v| (v.assignment["R1"], v.assignment["R2"]))
        .collect();
    seen.sort();
    let expected: Vec<(usize, usize)> = (0..2).flat_map(|a| (0..3).map(move |b| (a, b))).collect();
    assert_eq!(seen, expected);
}
