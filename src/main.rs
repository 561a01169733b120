use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use whitted::consts;
use whitted::scene::SceneJson;
use whitted::sampling::{ Sampling, GridShape };
use whitted::parallel::Parallelism;
use whitted::tracer::TraceConfig;

/// Recursive Whitted-style ray tracer.
#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Scene description file (JSON, including a camera block).
    scene: PathBuf,

    /// Output image (plain PPM).
    #[clap(short, long, default_value = "out.ppm")]
    output: PathBuf,

    /// Fixed-grid anti-aliasing samples per pixel dimension.
    #[clap(long)]
    samples: Option<usize>,

    /// Restrict grid samples to the inscribed circle.
    #[clap(long)]
    circular: bool,

    /// Adaptive supersampling recursion depth.
    #[clap(long)]
    adaptive_depth: Option<usize>,

    /// Color distance threshold for adaptive supersampling.
    #[clap(long, default_value_t = consts::ADAPTIVE_THRESHOLD)]
    adaptive_threshold: f64,

    /// Worker threads: a count (0 = sequential), "auto" or "rayon".
    #[clap(long, default_value = "0")]
    threads: String,

    /// Maximum recursion depth for reflection and refraction.
    #[clap(long, default_value_t = consts::MAX_CALC_COLOR_LEVEL)]
    max_level: usize,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(error) = run(&args) {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.samples.is_some() && args.adaptive_depth.is_some() {
        return Err("choose either --samples or --adaptive-depth".into());
    }

    let text = fs::read_to_string(&args.scene)?;
    let mut description: SceneJson = serde_json::from_str(&text)?;

    let camera_block = description.camera.take()
        .ok_or("scene description has no camera block")?;
    let scene = description.into_scene()?;

    let camera = camera_block.into_builder()?
        .sampling(sampling(args))
        .parallelism(parallelism(&args.threads)?)
        .trace_config(TraceConfig {
            max_level: args.max_level,
            ..Default::default()
        })
        .build()?;

    let canvas = camera.render(&scene);
    canvas.save(&args.output)?;

    log::info!("saved render to {}", args.output.display());
    Ok(())
}

fn sampling(args: &Args) -> Sampling {
    if let Some(samples_per_dim) = args.samples {
        let shape = if args.circular {
            GridShape::Circle
        } else {
            GridShape::Rectangle
        };
        return Sampling::Grid { samples_per_dim, shape };
    }

    if let Some(max_depth) = args.adaptive_depth {
        return Sampling::Adaptive {
            max_depth,
            threshold: args.adaptive_threshold,
        };
    }

    Sampling::Single
}

fn parallelism(threads: &str) -> Result<Parallelism, String> {
    match threads {
        "auto" => Ok(Parallelism::Auto),
        "rayon" => Ok(Parallelism::ParallelIter),
        count => match count.parse::<usize>() {
            Ok(0) => Ok(Parallelism::Sequential),
            Ok(count) => Ok(Parallelism::Workers(count)),
            Err(_) => Err(format!(
                "--threads expects a count, \"auto\" or \"rayon\", got {:?}",
                threads
            )),
        },
    }
}
