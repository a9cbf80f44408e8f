// Import the clap Parser derive macro for CLI argument parsing
use clap::{Parser, ValueEnum};

// Import our library types
use genetic_drawing::fitness::closeness_percent;
use genetic_drawing::{
    CrossoverStrategy, EvolutionParams, GenerationRatios, PointCount, Population,
    SelectionWeighting, ShapeConfig,
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use std::fs;
use std::path::Path;

/// Genetic Drawing - evolve translucent polygons into a target image
///
/// A population of drawings, each made of random polygons, is bred,
/// mutated and selected generation after generation. Drawings closer to
/// the target get more offspring, so over time the best drawing comes to
/// look like the target.
///
/// **Rust Concept: Derive macros for CLI parsing**
/// The `#[derive(Parser)]` macro generates the argument parsing code and
/// the doc comments become help text.
#[derive(Parser)]
#[command(name = "genetic-drawing")]
#[command(about = "Recreate an image with evolving polygons", long_about = None)]
#[command(version)]
struct Args {
    /// Path to target image (PNG or JPEG)
    #[arg(short, long)]
    input: String,

    /// Output directory for generated images and checkpoints
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// Number of drawings in every generation
    #[arg(short, long, default_value_t = 50)]
    population: usize,

    /// Number of shapes per drawing
    ///
    /// More shapes = more detail possible, but slower rendering
    #[arg(short = 'n', long, default_value_t = 150)]
    shapes: usize,

    /// Points per shape: a count ("3") or an inclusive range ("3-6")
    #[arg(long, default_value = "3")]
    points: PointCount,

    /// How far points may stray from a shape's origin, in pixels (0 = anywhere)
    #[arg(long, default_value_t = 30)]
    max_shape_size: u32,

    /// Number of generations to evolve
    #[arg(short, long, default_value_t = 5000)]
    generations: usize,

    /// Save the best drawing every N generations
    #[arg(long, default_value_t = 50)]
    save_interval: usize,

    /// Fraction of every generation made of mutants (0.0-1.0)
    #[arg(long, default_value_t = 0.02)]
    mutation_rate: f64,

    /// Fraction of a mutant's shapes that get changed (0.0-1.0)
    #[arg(long, default_value_t = 0.2)]
    mutation_amount: f64,

    /// How two parents are combined
    #[arg(long, value_enum, default_value_t = Crossover::SinglePoint)]
    crossover: Crossover,

    /// How fitness turns into reproduction chances
    ///
    /// - distance: the raw score (favors worse drawings)
    /// - inverse-distance: 1 / (1 + score)
    /// - worst-minus: worst score minus score
    #[arg(long, value_enum, default_value_t = Weighting::InverseDistance)]
    weighting: Weighting,

    /// Relative share of bred children
    #[arg(long, default_value_t = 0.6)]
    child_ratio: f64,

    /// Relative share of drawings carried over unchanged
    #[arg(long, default_value_t = 0.2)]
    carry_ratio: f64,

    /// Relative share of brand new random drawings
    #[arg(long, default_value_t = 0.2)]
    fresh_ratio: f64,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Number of threads for parallel fitness evaluation
    ///
    /// Limits Rayon's thread pool size. By default, uses all available CPU cores.
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Stop early once the best score is at or below this value
    #[arg(long)]
    target_fitness: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Crossover {
    Uniform,
    SinglePoint,
}

impl From<Crossover> for CrossoverStrategy {
    fn from(value: Crossover) -> Self {
        match value {
            Crossover::Uniform => CrossoverStrategy::Uniform,
            Crossover::SinglePoint => CrossoverStrategy::SinglePoint,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Weighting {
    Distance,
    InverseDistance,
    WorstMinus,
}

impl From<Weighting> for SelectionWeighting {
    fn from(value: Weighting) -> Self {
        match value {
            Weighting::Distance => SelectionWeighting::Distance,
            Weighting::InverseDistance => SelectionWeighting::InverseDistance,
            Weighting::WorstMinus => SelectionWeighting::WorstMinus,
        }
    }
}

impl Args {
    fn params(&self) -> EvolutionParams {
        EvolutionParams {
            population_size: self.population,
            shape_count: self.shapes,
            shape_config: ShapeConfig {
                point_count: self.points,
                max_shape_size: (self.max_shape_size > 0).then_some(self.max_shape_size),
            },
            mutation_rate: self.mutation_rate,
            mutation_amount: self.mutation_amount,
            ratios: GenerationRatios {
                child: self.child_ratio,
                carry_over: self.carry_ratio,
                fresh: self.fresh_ratio,
            },
            crossover: self.crossover.into(),
            weighting: self.weighting.into(),
            seed: self.seed,
            ..EvolutionParams::default()
        }
    }
}

fn main() {
    // RUST_LOG overrides the default level, e.g. RUST_LOG=genetic_drawing=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run the genetic algorithm with given arguments
///
/// **Rust Concept: Box<dyn Error>**
/// Loading the image, writing files and evolving all fail with different
/// error types; `Box<dyn Error>` lets `?` forward any of them.
fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(num_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        info!(threads = num_threads, "rayon thread pool configured");
    }

    fs::create_dir_all(&args.output)?;

    if !Path::new(&args.input).exists() {
        return Err(format!("Input file not found: {}", args.input).into());
    }
    let target = image::open(&args.input)?.to_rgba8();
    let (width, height) = target.dimensions();
    info!(input = %args.input, width, height, "target loaded");

    let params = args.params();
    info!(
        population = params.population_size,
        shapes = params.shape_count,
        points = %params.shape_config.point_count,
        mutation_rate = params.mutation_rate,
        weighting = ?params.weighting,
        crossover = ?params.crossover,
        "starting evolution"
    );
    let mut pop = Population::new(params, target)?;

    let pb = ProgressBar::new(args.generations as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} (ETA: {eta}) | {msg}")?
            .progress_chars("=>-"),
    );

    save_generation(&pop, &args.output)?;

    for _ in 0..args.generations {
        pop.evolve()?;

        let stats = pop.statistics();
        pb.set_message(format!(
            "Best: {:.0} ({:.2}%), Avg: {:.0}",
            stats.min,
            closeness_percent(stats.min, width, height),
            stats.avg
        ));
        pb.inc(1);

        let finished = args.target_fitness.is_some_and(|goal| stats.min <= goal);
        let on_interval = args.save_interval > 0 && pop.generation() % args.save_interval == 0;
        if on_interval || finished {
            save_generation(&pop, &args.output)?;
        }
        if finished {
            pb.finish_with_message(format!(
                "Reached target fitness after {} generations",
                pop.generation()
            ));
            break;
        }
    }
    if !pb.is_finished() {
        pb.finish_with_message("Evolution complete!");
    }

    save_generation(&pop, &args.output)?;

    let stats = pop.statistics();
    println!("\nResults:");
    println!("  Best fitness: {:.0}", stats.min);
    println!("  Closeness: {:.2}%", closeness_percent(stats.min, width, height));
    println!("  Total generations: {}", pop.generation());
    println!("\nCheck {}/latest.png for the final result!", args.output);

    Ok(())
}

/// Save the best drawing as a numbered PNG, `latest.png` and `best.json`
fn save_generation(pop: &Population, output_dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(best) = pop.best() else {
        warn!(generation = pop.generation(), "no evaluated drawing to save");
        return Ok(());
    };

    let img = best.render();
    img.save(format!("{}/generation_{:05}.png", output_dir, pop.generation()))?;
    img.save(format!("{}/latest.png", output_dir))?;

    // The checkpoint carries the drawing and the settings that produced it
    let checkpoint = serde_json::json!({
        "generation": pop.generation(),
        "params": pop.params(),
        "statistics": pop.statistics(),
        "drawing": best,
    });
    let json = serde_json::to_string_pretty(&checkpoint)?;
    fs::write(format!("{}/best.json", output_dir), json)?;

    Ok(())
}
