//! Quick benchmark for profiling the tick loop
//!
//! Run with: cargo run --release --example bench -p cellflow
//! Profile with: cargo flamegraph --example bench -p cellflow

use cellflow::{FastFixed, Fixed, NullSink, Number, SimConfig, SimInput, Simulator};
use std::time::Instant;

const WIDTH: usize = 84;
const HEIGHT: usize = 36;
const TICKS: usize = 500;

/// Tank with a heavy block on top of a lighter pool and a shelf in between.
fn tank() -> Vec<String> {
    (0..HEIGHT)
        .map(|r| {
            (0..WIDTH)
                .map(|c| {
                    let border = r == 0 || c == 0 || r == HEIGHT - 1 || c == WIDTH - 1;
                    if border || (r == HEIGHT / 2 && c > WIDTH / 3) {
                        '#'
                    } else if r < HEIGHT / 3 && c > WIDTH / 4 && c < WIDTH / 2 {
                        '.'
                    } else if r > 2 * HEIGHT / 3 {
                        'o'
                    } else {
                        ' '
                    }
                })
                .collect()
        })
        .collect()
}

fn bench<P: Number, V: Number, F: Number>(label: &str, input: &SimInput) {
    let config = SimConfig::default().with_ticks(TICKS);
    let mut sim: Simulator<P, V, F> = Simulator::new(input, &config).expect("bench grid is valid");

    let start = Instant::now();
    let summary = sim.run_configured(&config, &mut NullSink).expect("null sink never fails");
    let elapsed = start.elapsed();

    println!(
        "{label:<22} {:>8.2?} total  {:>7.3}ms/tick  {} moving ticks",
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / TICKS as f64,
        summary.snapshots
    );
}

fn main() {
    println!("Setting up {}x{} tank, {} ticks", WIDTH, HEIGHT, TICKS);
    let rows = tank();
    let input = SimInput::from_parts(&rows, 0.1, &[(b' ', 0.01), (b'.', 1000.0), (b'o', 2.0)])
        .expect("bench grid is valid");

    bench::<FastFixed<32, 16>, FastFixed<32, 16>, FastFixed<32, 16>>("FAST_FIXED(32,16)", &input);
    bench::<Fixed<32, 16>, Fixed<32, 16>, Fixed<32, 16>>("FIXED(32,16)", &input);
    bench::<Fixed<64, 32>, Fixed<64, 32>, Fixed<64, 32>>("FIXED(64,32)", &input);
    bench::<f64, f64, f64>("DOUBLE", &input);
    bench::<f32, f32, f32>("FLOAT", &input);
}
