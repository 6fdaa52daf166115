//! Headless run of every mode (or the one named on the command line).
//! Reports bond churn, collisions and molecule sizes per mode.

use glyph_core::{FrameStats, Mode, SimConfig, Viewport};
use glyph_sim::field::GlyphField;

const FRAMES: u32 = 3_600;
const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct Report {
    totals: FrameStats,
    peak_molecules: u32,
    largest_molecule: u32,
    mean_molecules: f64,
}

fn run(mode: Mode, seed: u64, viewport: Viewport) -> Report {
    let config = SimConfig { seed, ..SimConfig::preset(mode) };
    let mut field = GlyphField::new(config, viewport);
    let mut report = Report::default();
    let mut molecule_sum = 0u64;

    for _ in 0..FRAMES {
        let stats = field.step(DT);
        report.totals.accumulate(&stats);
        report.peak_molecules = report.peak_molecules.max(stats.molecules);
        report.largest_molecule = report.largest_molecule.max(stats.largest_molecule);
        molecule_sum += stats.molecules as u64;
    }
    report.mean_molecules = molecule_sum as f64 / FRAMES as f64;
    report
}

fn main() {
    let modes: Vec<Mode> = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<Mode>() {
            Ok(mode) => vec![mode],
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(2);
            }
        },
        None => Mode::ALL.to_vec(),
    };
    let seed = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    let viewport = Viewport::new(1280.0, 720.0, 1.0);

    eprintln!(
        "Simulating {} mode(s) for {} frames at {:.0}x{:.0} (seed {})...",
        modes.len(),
        FRAMES,
        viewport.width,
        viewport.height,
        seed
    );

    println!();
    println!(
        "{:10} {:>8} {:>8} {:>10} {:>9} {:>7} {:>7} {:>9} {:>8}",
        "MODE", "FORMED", "DECAYED", "COLLISIONS", "SHATTERED", "SPLIT", "WEAKEN", "MOLECULES", "LARGEST"
    );
    for mode in modes {
        let r = run(mode, seed, viewport);
        let t = &r.totals;
        println!(
            "{:10} {:>8} {:>8} {:>10} {:>9} {:>7} {:>7} {:>5.1}/{:<3} {:>8}",
            mode.name(),
            t.bonds_formed,
            t.bonds_decayed,
            t.collisions,
            t.full_breaks,
            t.partial_breaks,
            t.weakenings,
            r.mean_molecules,
            r.peak_molecules,
            r.largest_molecule,
        );
    }
    println!();
}
