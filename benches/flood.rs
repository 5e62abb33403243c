#[macro_use]
extern crate criterion;
extern crate floodbrot;

use criterion::Criterion;
use floodbrot::{PixelState, Pixel, PreciseComplex, Precision, Render, RenderConfig, Strategy, View};

fn config() -> RenderConfig {
    RenderConfig::default()
        .with_size(64, 48)
        .with_max_iterations(300)
        .with_rounds_per_call(50)
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("iterate 1000 rounds at 60 digits", |b| {
        let origin = PreciseComplex::from_f64(-0.75, 0.05, Precision::digits(60));
        b.iter(|| PixelState::new(Pixel(0, 0), 0, origin.clone()).iterate(1000))
    });
}

fn bench_fill(c: &mut Criterion) {
    c.bench_function("fill home view, depth first", |b| {
        b.iter(|| {
            let render = Render::new(1, View::home(64, 48).unwrap(), &config()).unwrap();
            render.run(4).unwrap()
        })
    });
    c.bench_function("fill home view, breadth first", |b| {
        let config = config().with_strategy(Strategy::BreadthFirst);
        b.iter(|| {
            let render = Render::new(1, View::home(64, 48).unwrap(), &config).unwrap();
            render.run(4).unwrap()
        })
    });
}

criterion_group!(benches, bench_iterate, bench_fill);
criterion_main!(benches);
