//! Hill-system formula of the drawn atoms.
//!
//! Only explicit hydrogens count: implicit hydrogens are the toolkit's job.
//! Pseudo atoms (labels, attachment points) are listed by label in
//! brackets after the elements, so unexpanded placeholders stay visible.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::atom::Atom;
use crate::mol::Mol;

pub fn mol_formula<B>(mol: &Mol<Atom, B>) -> String {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    let mut pseudo: BTreeMap<&str, u32> = BTreeMap::new();
    let mut net_charge: i32 = 0;

    for idx in mol.atoms() {
        let a = mol.atom(idx);
        match crate::element::symbol(a.atomic_num) {
            Some(sym) => *counts.entry(sym).or_default() += 1,
            None => *pseudo.entry(a.label.as_deref().unwrap_or("*")).or_default() += 1,
        }
        let hc = a.explicit_hydrogens.unwrap_or(0) as u32;
        if hc > 0 {
            *counts.entry("H").or_default() += hc;
        }
        net_charge += a.formal_charge as i32;
    }

    let mut result = String::new();

    if let Some(c) = counts.remove("C") {
        append_element(&mut result, "C", c);
        if let Some(h) = counts.remove("H") {
            append_element(&mut result, "H", h);
        }
    }
    for (sym, count) in &counts {
        append_element(&mut result, sym, *count);
    }
    for (label, count) in &pseudo {
        result.push('[');
        result.push_str(label);
        result.push(']');
        if *count > 1 {
            let _ = write!(result, "{count}");
        }
    }

    match net_charge {
        0 => {}
        1 => result.push('+'),
        -1 => result.push('-'),
        c if c > 0 => {
            let _ = write!(result, "{c}+");
        }
        c => {
            let _ = write!(result, "{}-", c.unsigned_abs());
        }
    }
    result
}

fn append_element(buf: &mut String, symbol: &str, count: u32) {
    buf.push_str(symbol);
    if count > 1 {
        let _ = write!(buf, "{count}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::Bond;

    fn mol(atoms: &[Atom]) -> Mol<Atom, Bond> {
        let mut m = Mol::new();
        for a in atoms {
            m.add_atom(a.clone());
        }
        m
    }

    fn el(z: u8) -> Atom {
        Atom { atomic_num: z, ..Atom::default() }
    }

    #[test]
    fn hill_order() {
        let m = mol(&[el(8), el(6), el(6), Atom { explicit_hydrogens: Some(3), ..el(6) }, el(17)]);
        assert_eq!(mol_formula(&m), "C3H3ClO");
    }

    #[test]
    fn no_carbon_is_alphabetical() {
        let sodium = Atom {
            atomic_num: 11,
            formal_charge: 1,
            ..Atom::default()
        };
        let chloride = Atom {
            atomic_num: 17,
            formal_charge: -1,
            ..Atom::default()
        };
        let m = mol(&[sodium, chloride]);
        assert_eq!(mol_formula(&m), "ClNa");
    }

    #[test]
    fn pseudo_atoms_by_label() {
        let r = Atom { atomic_num: 0, label: Some("R1".into()), ..Atom::default() };
        let m = mol(&[el(6), r.clone(), r, Atom { formal_charge: -1, ..el(8) }]);
        assert_eq!(mol_formula(&m), "CO[R1]2-");
    }
}
