use cdxcrab::{
    mol_formula, BondOrder, DecodeOptions, Document, Error, Input, ObjectType, Pipeline,
    PipelineOptions, Warning,
};

// ---------------------------------------------------------------------------
// Hand-assembled CDX streams
// ---------------------------------------------------------------------------

const DOCUMENT: u16 = 0x8000;
const PAGE: u16 = 0x8001;
const FRAGMENT: u16 = 0x8003;
const NODE: u16 = 0x8004;
const BOND: u16 = 0x8005;

const POSITION_2D: u16 = 0x0200;
const ELEMENT: u16 = 0x0402;
const CHARGE: u16 = 0x0421;
const BOND_ORDER: u16 = 0x0600;
const BOND_BEGIN: u16 = 0x0604;
const BOND_END: u16 = 0x0605;

struct Cdx(Vec<u8>);

impl Cdx {
    fn new() -> Self {
        let mut bytes = b"VjCD0100".to_vec();
        bytes.extend_from_slice(&[4, 3, 2, 1]);
        bytes.extend_from_slice(&[0; 16]);
        Self(bytes)
    }

    fn open(mut self, tag: u16, id: u32) -> Self {
        self.0.extend_from_slice(&tag.to_le_bytes());
        self.0.extend_from_slice(&id.to_le_bytes());
        self
    }

    fn prop(mut self, tag: u16, payload: &[u8]) -> Self {
        self.0.extend_from_slice(&tag.to_le_bytes());
        self.0.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        self.0.extend_from_slice(payload);
        self
    }

    fn close(mut self) -> Self {
        self.0.extend_from_slice(&[0, 0]);
        self
    }

    fn node(self, id: u32, x: f64, y: f64, element: i16) -> Self {
        self.open(NODE, id)
            .prop(POSITION_2D, &point(x, y))
            .prop(ELEMENT, &element.to_le_bytes())
            .close()
    }

    fn bond(self, id: u32, begin: u32, end: u32, order: u16) -> Self {
        self.open(BOND, id)
            .prop(BOND_BEGIN, &begin.to_le_bytes())
            .prop(BOND_END, &end.to_le_bytes())
            .prop(BOND_ORDER, &order.to_le_bytes())
            .close()
    }

    fn bytes(self) -> Vec<u8> {
        self.0
    }
}

fn fixed(v: f64) -> [u8; 4] {
    ((v * 65536.0).round() as i32).to_le_bytes()
}

/// CDX points store y before x.
fn point(x: f64, y: f64) -> Vec<u8> {
    let mut out = fixed(y).to_vec();
    out.extend_from_slice(&fixed(x));
    out
}

/// Formaldehyde: C=O.
fn formaldehyde() -> Vec<u8> {
    Cdx::new()
        .open(DOCUMENT, 1)
        .open(PAGE, 2)
        .open(FRAGMENT, 3)
        .node(4, 100.0, 50.5, 6)
        .node(5, 114.4, 50.5, 8)
        .bond(6, 4, 5, 0x0002)
        .close()
        .close()
        .close()
        .bytes()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn decodes_a_fragment() {
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdx(&formaldehyde()))
        .unwrap();
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    assert_eq!(out.structures.len(), 1);

    let mol = &out.structures[0].variants[0].molecule;
    assert_eq!(mol_formula(mol), "CO");
    let c = mol.atom_by_source(4).unwrap();
    let o = mol.atom_by_source(5).unwrap();
    let bond = mol.bond_between(c, o).unwrap();
    assert_eq!(mol.bond(bond).order, BondOrder::DOUBLE);
    // document y grows downwards; molecules are y-up
    assert_eq!(mol.atom(c).position_2d, Some([100.0, -50.5]));
}

#[test]
fn object_graph_links_are_resolved() {
    let doc = Document::from_cdx(&formaldehyde(), &DecodeOptions::strict()).unwrap();
    let bond = doc.find(6).unwrap();
    let data = doc.get(bond).as_bond().unwrap();
    assert_eq!(data.begin.target, doc.find(4));
    assert_eq!(data.end.target, doc.find(5));
    assert_eq!(doc.all_of_kind(ObjectType::Node).count(), 2);
}

#[test]
fn unknown_records_are_skipped() {
    let bytes = Cdx::new()
        .open(DOCUMENT, 1)
        .prop(0x7ABC, &[1, 2, 3, 4, 5])
        .open(PAGE, 2)
        .open(0x8FFE, 90)
        .prop(0x7ABD, &[9])
        .close()
        .open(FRAGMENT, 3)
        .node(4, 0.0, 0.0, 6)
        .node(5, 14.4, 0.0, 7)
        .bond(6, 4, 5, 0x0004)
        .close()
        .close()
        .close()
        .bytes();
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdx(&bytes))
        .unwrap();
    assert_eq!(out.structures.len(), 1);
    assert_eq!(mol_formula(&out.structures[0].variants[0].molecule), "CN");
}

#[test]
fn charges_survive_decoding() {
    let bytes = Cdx::new()
        .open(DOCUMENT, 1)
        .open(PAGE, 2)
        .open(FRAGMENT, 3)
        .open(NODE, 4)
        .prop(ELEMENT, &7i16.to_le_bytes())
        .prop(CHARGE, &[1])
        .close()
        .node(5, 14.4, 0.0, 6)
        .bond(6, 4, 5, 0x0001)
        .close()
        .close()
        .close()
        .bytes();
    let doc = Document::from_cdx(&bytes, &DecodeOptions::strict()).unwrap();
    let mol = cdxcrab::from_fragment(&doc, doc.find(3).unwrap()).molecule;
    let n = mol.atom_by_source(4).unwrap();
    assert_eq!(mol.atom(n).formal_charge, 1);
}

// ---------------------------------------------------------------------------
// Strict vs lenient
// ---------------------------------------------------------------------------

fn dangling_bond() -> Vec<u8> {
    Cdx::new()
        .open(DOCUMENT, 1)
        .open(PAGE, 2)
        .open(FRAGMENT, 3)
        .node(4, 0.0, 0.0, 6)
        .node(5, 14.4, 0.0, 6)
        .bond(6, 4, 99, 0x0001)
        .close()
        .close()
        .close()
        .bytes()
}

#[test]
fn dangling_reference_is_a_warning_when_lenient() {
    let doc = Document::from_cdx(&dangling_bond(), &DecodeOptions::lenient()).unwrap();
    assert!(doc
        .warnings()
        .iter()
        .any(|w| matches!(w, Warning::Reference(r) if r.target == 99)));
}

#[test]
fn dangling_reference_aborts_when_strict() {
    let err = Document::from_cdx(&dangling_bond(), &DecodeOptions::strict()).unwrap_err();
    assert!(matches!(err, Error::Reference(ref r) if r.target == 99), "{err}");
}

#[test]
fn truncated_stream_always_fails() {
    let bytes = formaldehyde();
    for options in [DecodeOptions::strict(), DecodeOptions::lenient()] {
        let err = Document::from_cdx(&bytes[..bytes.len() - 3], &options).unwrap_err();
        assert!(matches!(err, Error::Format(ref e) if e.is_truncation()), "{err}");
    }
}
