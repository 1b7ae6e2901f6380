//! simevo - CLI Entry Point
//!
//! Generational organism simulation runner.

use clap::{Parser, Subcommand};
use simevo::{benchmark, Config, Environment, IndexKind};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "simevo")]
#[command(version)]
#[command(about = "Discrete-time organism simulation with adaptive quadtree indexing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a generational simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Spatial index kind (flat or quadtree)
        #[arg(long)]
        index: Option<IndexKind>,

        /// Reaction worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Write the recorded statistics history as JSON
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Time both index kinds on the same scenario
    Benchmark {
        /// Number of iterations
        #[arg(short, long, default_value = "500")]
        iterations: u64,

        /// Initial organisms (and food items)
        #[arg(short, long, default_value = "500")]
        population: usize,

        /// Reaction worker threads
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            index,
            workers,
            stats,
            quiet,
        } => run_simulation(config, seed, index, workers, stats, quiet),

        Commands::Benchmark {
            iterations,
            population,
            workers,
        } => {
            init_logging("info");
            run_benchmark(iterations, population, workers)
        }

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run_simulation(
    config_path: PathBuf,
    seed: Option<u64>,
    index: Option<IndexKind>,
    workers: Option<usize>,
    stats_path: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };
    init_logging(&config.logging.log_level);

    if config_path.exists() {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Config {:?} not found, using defaults", config_path);
    }

    // Command-line overrides
    if let Some(s) = seed {
        config.world.seed = Some(s);
    }
    if let Some(kind) = index {
        config.world.index = kind;
    }
    if let Some(n) = workers {
        config.world.workers = n;
    }

    let run = config.run.clone();
    let stats_interval = config.logging.stats_interval.max(1);
    let mut env = Environment::from_config(config)?;
    env.populate(run.initial_organisms, run.initial_dna)?;

    println!("Starting simulation");
    println!("  World: {}x{} ({} index)", env.width(), env.height(), env.index_kind());
    println!("  Workers: {}", env.worker_count());
    println!("  Seed: {}", env.seed());
    println!("  Initial population: {}", env.population());
    println!(
        "  Generations: {} x {} iterations",
        run.generations, run.iterations_per_generation
    );
    println!();

    let start = Instant::now();

    for generation in 0..run.generations {
        env.scatter_food(run.food_per_generation)?;

        env.simulate_iteration_with(run.iterations_per_generation, |env| {
            if !quiet && env.iteration() % stats_interval == 0 {
                println!("{}", env.stats().summary());
            }
        })?;

        let offspring = env.reproduce_organisms()?;
        let leftover = env.remove_all_foods();

        if !quiet {
            println!(
                "Generation {:3}: population {}, offspring {}, leftover food {}, dead {}",
                generation,
                env.population(),
                offspring.len(),
                leftover,
                env.dead_organisms().len()
            );
        }

        if env.population() == 0 {
            println!("\nPopulation extinct after generation {}", generation);
            break;
        }
    }

    let elapsed = start.elapsed();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Iterations: {}", env.iteration());
    println!(
        "Speed: {:.1} iterations/s",
        env.iteration() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("Final population: {}", env.population());
    println!("Food consumed: {}", env.food_consumption());
    println!("Dead organisms: {}", env.dead_organisms().len());
    println!("Births: {}", env.births());
    println!("Max generation: {}", env.stats().generation_max);

    env.profiler().report();

    if let Some(path) = stats_path {
        env.stats_history().save(&path)?;
        println!("Stats history: {:?}", path);
    }

    Ok(())
}

fn run_benchmark(
    iterations: u64,
    population: usize,
    workers: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== simevo Benchmark ===");
    println!("Iterations: {}", iterations);
    println!("Population: {}", population);
    println!("Workers: {}", workers);
    println!();

    for kind in IndexKind::ALL {
        let result = benchmark(kind, iterations, population, workers)?;
        println!("{}", result);
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
