use std::sync::atomic::AtomicBool;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use ising_anneal::config::*;
use ising_anneal::{Format, Quantity, Schedule, Simulation};

const L: usize = 64;
const N_STEPS: usize = 2_000_000;
const SAMPLE_EVERY: usize = 1_000;
const T0: f64 = 5.0;

fn main() {
    env_logger::init();

    let config = SimConfig {
        grid_size: L,
        temperature: T0,
        boundary: BoundaryConfig::new(BoundaryKind::Periodic),
        update_rule: UpdateRule::Metropolis,
        seed: 42,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    let schedule = Schedule::cauchy(T0);

    println!(
        "Lattice: {}x{}  |  Steps: {}  |  Sample every: {}  |  Cauchy from T0={}",
        L, L, N_STEPS, SAMPLE_EVERY, T0
    );
    println!("{}", "-".repeat(70));

    let pb = ProgressBar::new(N_STEPS as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}, {per_sec}]",
        )
        .unwrap()
        .progress_chars("=> "),
    );
    pb.set_message("steps");

    let interrupted = AtomicBool::new(false);
    let t0 = Instant::now();
    let summary = sim
        .run_with(
            N_STEPS,
            SAMPLE_EVERY,
            Some(&schedule),
            &interrupted,
            &|| pb.inc(1),
        )
        .unwrap();
    pb.finish();
    let elapsed = t0.elapsed().as_secs_f64();

    let n = (L * L) as f64;
    let metrics = sim.metrics();
    let last = |q: Quantity| metrics.series(q).and_then(|s| s.last().copied());
    println!(
        "T_final={:.4}  E/N={:.4}  |M|/N={:.4}  accepted={}  drift events={}",
        summary.final_temperature,
        sim.energy() / n,
        sim.magnetization().abs() as f64 / n,
        summary.accepted,
        summary.drift_events,
    );
    for q in Quantity::COMPUTED {
        if let Some(v) = last(q) {
            println!("  {:<24}{:.6}", q.as_str(), v);
        }
    }
    println!(
        "Total: {:.3} s  |  {:.1} ns/step",
        elapsed,
        elapsed / N_STEPS as f64 * 1e9
    );

    let path = std::env::temp_dir().join("ising-anneal-demo.json");
    sim.save_state(&path, Format::Json).unwrap();
    println!("State written to {}", path.display());
}
