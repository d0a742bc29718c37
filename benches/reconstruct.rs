use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cdxcrab::{Input, Pipeline, PipelineOptions};

const MARKUSH: &str = include_str!("../tests/approval_data/markush_2x3.cdxml");
const POLYMER: &str = include_str!("../tests/approval_data/polymer_repeat.cdxml");
const WEDGE: &str = include_str!("../tests/approval_data/halomethane_wedge.cdxml");
const TWO_STEP: &str = include_str!("../tests/approval_data/two_step_reaction.cdxml");

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::new(PipelineOptions::default());

    let mut group = c.benchmark_group("pipeline");
    for (name, xml) in [
        ("stereo_wedge", WEDGE),
        ("bracket_repeat", POLYMER),
        ("markush_2x3", MARKUSH),
        ("reaction_two_step", TWO_STEP),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(pipeline.run(Input::Cdxml(black_box(xml))).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
