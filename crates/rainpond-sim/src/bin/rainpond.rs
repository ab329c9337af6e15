//! Headless rain shower demo.
//!
//! Drives the simulator with randomly placed raindrops, logs surface
//! statistics as the shower progresses, and finishes with an ASCII
//! rendering of the height field and its caustics pattern.
//!
//! Run with: cargo run -p rainpond-sim --bin rainpond --release

use rand::Rng;
use rainpond::caustics::{CausticsEstimator, CausticsField};
use rainpond::{Backend, CausticsParams, HeightField, Impact, RippleSimulator, WaveParams};

const RESOLUTION: u32 = 96;
const STEPS: usize = 600;
const DROP_CHANCE: f64 = 0.35;
const REPORT_EVERY: usize = 100;

const RAMP: &[u8] = b" .:-=+*#%@";

#[tokio::main]
async fn main() -> rainpond::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rainpond=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Starting rainpond rain shower demo...");

    let params = WaveParams::new(0.35, 0.995)?.with_edge_fade(12, 0.6)?;
    let mut sim = RippleSimulator::builder()
        .resolution(RESOLUTION)
        .backend(Backend::Auto)
        .params(params)
        .build()
        .await?;
    tracing::info!(backend = ?sim.backend(), resolution = RESOLUTION, "Simulator ready");

    let mut caustics = CausticsEstimator::new(RESOLUTION, CausticsParams::default())?;
    let mut rng = rand::thread_rng();
    let mut drops = 0usize;

    for step in 1..=STEPS {
        if rng.gen_bool(DROP_CHANCE) {
            let strength: f32 = rng.gen_range(0.2..1.0);
            sim.add_impact(Impact::new(rng.gen::<f32>(), rng.gen::<f32>(), strength));
            drops += 1;
        }
        sim.step()?;

        if step % REPORT_EVERY == 0 {
            let surface = sim.read_surface()?;
            let energy = surface.total_energy();
            let peak = surface.max_height();
            tracing::info!("step {step:>3}: drops={drops} energy={energy:.4} peak={peak:.4}");
        }
    }

    let surface = sim.read_surface()?;
    caustics.refresh(surface)?;

    println!();
    println!("Surface after {STEPS} steps ({drops} raindrops):");
    render_heights(surface);
    println!();
    println!("Caustics on the pond floor:");
    render_caustics(caustics.field());
    println!();

    tracing::info!("Demo complete.");
    Ok(())
}

/// Prints a downsampled view of the height field, brightness keyed to |h|.
fn render_heights(surface: &HeightField) {
    let res = surface.resolution();
    let scale = surface.max_height().max(1e-6);
    for y in (0..res).step_by(4) {
        let mut row = String::with_capacity((res / 2) as usize);
        for x in (0..res).step_by(2) {
            let height = surface.sample(x, y).map(|s| s.height).unwrap_or(0.0);
            let idx = ((height.abs() / scale) * (RAMP.len() - 1) as f32).round() as usize;
            row.push(RAMP[idx.min(RAMP.len() - 1)] as char);
        }
        println!("{row}");
    }
}

/// Prints the caustics field, brightness keyed to the green channel.
fn render_caustics(field: &CausticsField) {
    let res = field.resolution();
    for y in (0..res).step_by(4) {
        let mut row = String::with_capacity((res / 2) as usize);
        for x in (0..res).step_by(2) {
            let intensity = field.pixel(x, y).map(|p| p.green).unwrap_or(0.0);
            let idx = ((intensity / 2.0) * (RAMP.len() - 1) as f32).round() as usize;
            row.push(RAMP[idx.min(RAMP.len() - 1)] as char);
        }
        println!("{row}");
    }
}
