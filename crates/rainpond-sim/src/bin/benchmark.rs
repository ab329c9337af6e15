//! Performance benchmark for the rainpond simulator.
//!
//! Run with: cargo run -p rainpond-sim --bin benchmark --release

use rainpond::caustics::CausticsEstimator;
use rainpond::{Backend, CausticsParams, Impact, RippleSimulator, WaveParams};
use std::time::Instant;

#[tokio::main]
async fn main() -> rainpond::Result<()> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║              Rainpond Simulation Performance Evaluation           ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // =========================================================================
    // Part 1: Initialization Cost
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════");
    println!("PART 1: Initialization Cost (CPU backend)");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    let sizes = [32u32, 64, 128, 256, 512, 1024];

    println!(
        "{:<12} {:>10} {:>12} {:>15}",
        "Resolution", "Cells", "Init (ms)", "10 steps (ms)"
    );
    println!("{}", "-".repeat(52));

    for &size in &sizes {
        let init_start = Instant::now();
        let result = RippleSimulator::builder()
            .resolution(size)
            .backend(Backend::Cpu)
            .build()
            .await;
        let init_time = init_start.elapsed();

        match result {
            Ok(mut sim) => {
                sim.add_impact(Impact::new(0.5, 0.5, 1.0));

                let step_start = Instant::now();
                for _ in 0..10 {
                    let _ = sim.step();
                }
                let step_time = step_start.elapsed();

                println!(
                    "{:<12} {:>10} {:>12.2} {:>15.2}",
                    format!("{}x{}", size, size),
                    size * size,
                    init_time.as_secs_f64() * 1000.0,
                    step_time.as_secs_f64() * 1000.0
                );
            }
            Err(e) => {
                println!(
                    "{:<12} {:>10} {:>12} {:>15}",
                    format!("{}x{}", size, size),
                    size * size,
                    "ERROR",
                    e
                );
            }
        }
    }
    println!();

    // =========================================================================
    // Part 2: Sustained Stepping Performance
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════");
    println!("PART 2: Simulation Performance (1000 steps, CPU backend)");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("Resolutions of 512 and above run the row-parallel integration path.");
    println!();

    let bench_sizes = [32u32, 64, 128, 256, 512];

    println!(
        "{:<12} {:>10} {:>12} {:>12} {:>15}",
        "Resolution", "Cells", "Total (ms)", "Steps/sec", "Cells*Steps/sec"
    );
    println!("{}", "-".repeat(65));

    for &size in &bench_sizes {
        let mut sim = RippleSimulator::builder()
            .resolution(size)
            .backend(Backend::Cpu)
            .build()
            .await?;
        sim.add_impact(Impact::new(0.5, 0.5, 1.0));

        let steps = 1000u32;
        let start = Instant::now();
        for _ in 0..steps {
            let _ = sim.step();
        }
        let elapsed = start.elapsed();

        let total_ms = elapsed.as_secs_f64() * 1000.0;
        let steps_per_sec = steps as f64 / elapsed.as_secs_f64();
        let cells_steps_per_sec = (size * size * steps) as f64 / elapsed.as_secs_f64();

        println!(
            "{:<12} {:>10} {:>12.1} {:>12.0} {:>15.0}",
            format!("{}x{}", size, size),
            size * size,
            total_ms,
            steps_per_sec,
            cells_steps_per_sec
        );
    }
    println!();

    // =========================================================================
    // Part 3: Caustics Refresh Cost
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════");
    println!("PART 3: Caustics Refresh Cost (100 refreshes)");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    let caustics_sizes = [64u32, 128, 256, 512];

    println!(
        "{:<12} {:>10} {:>14} {:>14} {:>15}",
        "Resolution", "Cells", "Refresh (ms)", "Refreshes/sec", "Cells/sec"
    );
    println!("{}", "-".repeat(69));

    for &size in &caustics_sizes {
        let mut sim = RippleSimulator::builder()
            .resolution(size)
            .backend(Backend::Cpu)
            .params(WaveParams::new(0.4, 1.0)?)
            .build()
            .await?;
        sim.add_impact(Impact::new(0.5, 0.5, 1.0));
        for _ in 0..30 {
            let _ = sim.step();
        }

        let mut estimator = CausticsEstimator::new(size, CausticsParams::default())?;
        let surface = sim.read_surface()?;

        let refreshes = 100u32;
        let start = Instant::now();
        for _ in 0..refreshes {
            estimator.refresh(surface)?;
        }
        let elapsed = start.elapsed();

        let refresh_ms = elapsed.as_secs_f64() * 1000.0 / refreshes as f64;
        let refreshes_per_sec = refreshes as f64 / elapsed.as_secs_f64();
        let cells_per_sec = (size * size * refreshes) as f64 / elapsed.as_secs_f64();

        println!(
            "{:<12} {:>10} {:>14.3} {:>14.0} {:>15.0}",
            format!("{}x{}", size, size),
            size * size,
            refresh_ms,
            refreshes_per_sec,
            cells_per_sec
        );
    }
    println!();

    // =========================================================================
    // Part 4: WebGPU Backend
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════");
    println!("PART 4: WebGPU Backend (100 steps)");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    if rainpond::availability::wgpu() {
        println!("Readback maps the surface buffer after every step; step-only");
        println!("leaves results on the device.");
        println!();

        let gpu_sizes = [64u32, 128, 256, 512];

        println!(
            "{:<12} {:>10} {:>14} {:>18}",
            "Resolution", "Cells", "Steps/sec", "w/ readback"
        );
        println!("{}", "-".repeat(57));

        for &size in &gpu_sizes {
            match RippleSimulator::builder()
                .resolution(size)
                .backend(Backend::Wgpu)
                .build()
                .await
            {
                Ok(mut sim) => {
                    sim.add_impact(Impact::new(0.5, 0.5, 1.0));

                    let steps = 100u32;
                    let start = Instant::now();
                    for _ in 0..steps {
                        let _ = sim.step();
                    }
                    let _ = sim.read_surface();
                    let step_only = steps as f64 / start.elapsed().as_secs_f64();

                    let start = Instant::now();
                    for _ in 0..steps {
                        let _ = sim.step();
                        let _ = sim.read_surface();
                    }
                    let with_readback = steps as f64 / start.elapsed().as_secs_f64();

                    println!(
                        "{:<12} {:>10} {:>14.0} {:>18.0}",
                        format!("{}x{}", size, size),
                        size * size,
                        step_only,
                        with_readback
                    );
                }
                Err(e) => {
                    println!("{:<12} - Error: {}", format!("{}x{}", size, size), e);
                }
            }
        }
    } else {
        println!("No WebGPU adapter found, skipping GPU benchmarks.");
    }
    println!();

    // =========================================================================
    // Part 5: Memory Footprint Estimate
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════");
    println!("PART 5: Memory Footprint Estimate");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("CPU backend: two height buffers plus the absorption table (12 B/cell),");
    println!("the surface adds four f32 channels (16 B/cell), caustics three (12 B/cell).");
    println!();

    let mem_sizes = [128u32, 256, 512, 1024, 2048];

    println!(
        "{:<12} {:>12} {:>10} {:>12} {:>13} {:>10}",
        "Resolution", "Cells", "Sim (MB)", "Surface (MB)", "Caustics (MB)", "Total"
    );
    println!("{}", "-".repeat(74));

    for &size in &mem_sizes {
        let cells = size as u64 * size as u64;
        let sim_mb = (cells * 12) as f64 / (1024.0 * 1024.0);
        let surface_mb = (cells * 16) as f64 / (1024.0 * 1024.0);
        let caustics_mb = (cells * 12) as f64 / (1024.0 * 1024.0);

        println!(
            "{:<12} {:>12} {:>10.2} {:>12.2} {:>13.2} {:>10.2}",
            format!("{}x{}", size, size),
            cells,
            sim_mb,
            surface_mb,
            caustics_mb,
            sim_mb + surface_mb + caustics_mb
        );
    }
    println!();

    println!("Benchmark complete.");
    Ok(())
}
