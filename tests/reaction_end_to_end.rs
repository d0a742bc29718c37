use cdxcrab::{Direction, Input, Participant, Pipeline, PipelineOptions};

const TWO_STEP: &str = include_str!("approval_data/two_step_reaction.cdxml");

fn names(participants: &[Participant]) -> Vec<&str> {
    participants.iter().filter_map(Participant::name).collect()
}

#[test]
fn two_steps_in_document_order() {
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdxml(TWO_STEP))
        .unwrap();
    assert_eq!(out.structures.len(), 3);
    assert_eq!(out.reactions.len(), 2);

    let ids: Vec<u32> = out
        .reactions
        .iter()
        .map(|r| out.document.get(r.step).id)
        .collect();
    assert_eq!(ids, vec![61, 62]);

    for r in &out.reactions {
        assert!(!r.reactants.is_empty());
        assert!(!r.products.is_empty());
    }
    assert!(out.unknown_agents.is_empty(), "{:?}", out.unknown_agents);
}

#[test]
fn directions_follow_the_arrowheads() {
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdxml(TWO_STEP))
        .unwrap();
    assert_eq!(out.reactions[0].direction, Direction::Forward);
    assert_eq!(out.reactions[1].direction, Direction::Bidirectional);
}

#[test]
fn agents_are_read_from_text() {
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdxml(TWO_STEP))
        .unwrap();
    assert_eq!(names(&out.reactions[0].agents), vec!["THF"]);
    assert_eq!(names(&out.reactions[1].agents), vec!["Pd/C", "H2", "MeOH"]);
}

#[test]
fn grouped_products_are_resolved() {
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdxml(TWO_STEP))
        .unwrap();
    let product = out.reactions[1].products[0].molecule().unwrap();
    let cl = product.atom_by_source(33).unwrap();
    assert_eq!(product.atom(cl).atomic_num, 17);
}

#[test]
fn atom_maps_stay_with_their_step() {
    let out = Pipeline::new(PipelineOptions::default())
        .run(Input::Cdxml(TWO_STEP))
        .unwrap();
    let map = |p: &Participant, id| {
        let m = p.molecule().unwrap();
        m.atom(m.atom_by_source(id).unwrap()).map_number
    };
    assert_eq!(map(&out.reactions[0].reactants[0], 11), 1);
    assert_eq!(map(&out.reactions[0].products[0], 21), 1);
    assert_eq!(map(&out.reactions[1].reactants[0], 21), 0);
}
