extern crate crossbeam;
extern crate floodbrot;
extern crate rug;

use crossbeam::channel;
use floodbrot::{Exit, Outcome, Pixel, Render, RenderConfig, Selection, Strategy, View};
use rug::Float;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn config(width: usize, height: usize) -> RenderConfig {
    RenderConfig::default()
        .with_size(width, height)
        .with_max_iterations(250)
        .with_rounds_per_call(25)
        .with_seed_stride(5)
}

#[test]
fn worker_count_does_not_change_the_image() {
    let config = config(40, 30);
    let render = |workers: usize| {
        let render = Render::new(1, View::home(40, 30).unwrap(), &config).unwrap();
        render.run(workers).unwrap();
        render.snapshot().unwrap()
    };
    let one = render(1);
    let four = render(4);
    let sixteen = render(16);
    assert_eq!(one.outcomes, four.outcomes);
    assert_eq!(one.outcomes, sixteen.outcomes);
    assert_eq!(one.rgb, sixteen.rgb);
}

#[test]
fn every_pixel_is_claimed_and_resolved_once() {
    for strategy in &[Strategy::DepthFirst, Strategy::BreadthFirst] {
        let config = config(40, 30).with_strategy(*strategy);
        let render = Render::new(1, View::home(40, 30).unwrap(), &config).unwrap();
        let stats = render.run(8).unwrap();
        let snapshot = render.snapshot().unwrap();
        assert_eq!(stats.admitted, stats.discovered);
        assert_eq!(snapshot.resolved(), stats.discovered);
        assert_eq!(stats.escaped + stats.bounded, stats.discovered);
        assert!(stats.discovered <= 40 * 30);
    }
}

#[test]
fn fill_skips_most_of_the_interior() {
    // The main cardioid fills the middle of this window; the fill
    // comes in from the exterior corners and stops at its rim.
    let side = Float::with_val(64, 1.2);
    let view = View::new(
        &Float::with_val(64, -1.0),
        &Float::with_val(64, 0.6),
        &side,
        40,
        40,
    )
    .unwrap();
    let render = Render::new(1, view, &config(40, 40)).unwrap();
    let stats = render.run(4).unwrap();
    let snapshot = render.snapshot().unwrap();
    assert!(stats.discovered < 40 * 40);
    assert_eq!(snapshot.outcome(Pixel(20, 20)), Outcome::Unvisited);
}

#[test]
fn frontier_never_outgrows_the_image() {
    let render = Arc::new(Render::new(1, View::home(48, 36).unwrap(), &config(48, 36)).unwrap());
    let runner = {
        let render = render.clone();
        thread::spawn(move || render.run(4).unwrap())
    };
    loop {
        let stats = render.stats().unwrap();
        assert!(stats.queued + stats.in_flight <= stats.discovered);
        assert!(stats.discovered <= 48 * 36);
        if render.is_quiescent().unwrap() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    let stats = runner.join().unwrap();
    assert!(stats.high_water <= 48 * 36);
    assert_eq!(stats.queued, 0);
}

#[test]
fn cancelled_workers_all_leave() {
    let config = config(64, 48).with_max_iterations(1_000_000);
    let render = Arc::new(Render::new(1, View::home(64, 48).unwrap(), &config).unwrap());
    let (tx, rx) = channel::unbounded();
    for worker in 0..4 {
        let render = render.clone();
        let tx = tx.clone();
        thread::spawn(move || tx.send(render.supervise(worker)).unwrap());
    }
    thread::sleep(Duration::from_millis(100));
    render.cancel().unwrap();
    for _ in 0..4 {
        let exit = rx.recv_timeout(Duration::from_secs(30)).unwrap();
        assert_eq!(exit, Some(Exit::Cancelled));
    }
    assert!(render.stats().unwrap().cancelled);
}

#[test]
fn deeper_views_never_lose_precision() {
    let mut view = View::home(32, 32).unwrap();
    for _ in 0..60 {
        let next = view
            .zoom(&Selection::new(Pixel(10, 10), Pixel(26, 26)), 4)
            .unwrap();
        assert!(next.precision() >= view.precision());
        view = next;
    }
}

#[test]
fn deep_zoom_resolves_distinct_pixels() {
    // 2^-70 across 32 pixels is far below f64 resolution around -0.75.
    let view = View::centred("-0.7436438870371587", "0.1318259042053119", "8.4e-22", 32, 32).unwrap();
    let a = view.pixel_to_point(Pixel(10, 10));
    let b = view.pixel_to_point(Pixel(11, 10));
    assert_ne!(a, b);
    assert_eq!(a.re().to_f64(), b.re().to_f64());
}
