use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use env_logger::Env;

use lithos_runtime::{GenerateOptions, TerrainGenerator};
use lithos_world::worldgen::load_params_from_path;
use lithos_world::{CHUNK_SIZE, ChunkCoord, RegionNoiseMaps, World, WorldDims, WorldGenParams};

#[derive(Parser, Debug)]
#[command(name = "lithos", about = "Generate a patch of terrain chunks and report heights")]
struct Args {
    /// Worldgen TOML; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 1337)]
    seed: i32,
    /// Chunks per side of the generated patch.
    #[arg(long, default_value_t = 4)]
    chunks: usize,
    #[arg(long, default_value_t = 256)]
    height: usize,
    #[arg(long, default_value_t = 96)]
    sea_level: usize,
    /// Evaluate columns on the main thread.
    #[arg(long)]
    serial: bool,
    /// Skip border tapering towards generated neighbors.
    #[arg(long)]
    no_smoothing: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let chunks = args.chunks.max(1);
    let side = chunks * CHUNK_SIZE;
    let dims = WorldDims::new(side, args.height, side, args.sea_level);
    let params = match &args.config {
        Some(path) => {
            log::info!("loading worldgen config from {}", path.display());
            load_params_from_path(path, dims)?
        }
        None => WorldGenParams::default_for(dims)?,
    };
    let maps = RegionNoiseMaps::from_noise(args.seed, ChunkCoord::new(0, 0), chunks, &params)?;
    let world = Arc::new(World::new(args.seed, params)?);
    let generator = TerrainGenerator::new(Arc::clone(&world))?;
    let options = GenerateOptions {
        smoothing: !args.no_smoothing,
        serial: args.serial,
    };

    let start = Instant::now();
    let mut min_h = u16::MAX;
    let mut max_h = 0u16;
    let mut sum = 0u64;
    let mut samples = 0u64;
    let mut early_exits = 0u64;
    for cz in 0..chunks as i32 {
        for cx in 0..chunks as i32 {
            let chunk = generator.generate_chunk(ChunkCoord::new(cx, cz), &maps, options);
            for &h in &chunk.heights.terrain {
                min_h = min_h.min(h);
                max_h = max_h.max(h);
                sum += u64::from(h);
            }
            samples += u64::from(chunk.metrics.noise_samples);
            early_exits += u64::from(chunk.metrics.early_exits);
        }
    }
    let columns = (side * side) as u64;
    log::info!(
        "{} chunks in {:.1}ms: terrain height min {} max {} mean {:.1} (sea level {})",
        chunks * chunks,
        start.elapsed().as_secs_f64() * 1000.0,
        min_h,
        max_h,
        sum as f64 / columns as f64,
        world.sea_level()
    );
    log::info!(
        "{} noise samples ({:.1} per column), {} early exits",
        samples,
        samples as f64 / columns as f64,
        early_exits
    );
    Ok(())
}
