//! Lander Evo CLI - Train lander controllers from JSON configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use rand::SeedableRng;
use rand::rngs::StdRng;

use lander_evo::{
    ChampionExport, EvolutionEngine,
    compute::{
        LanderEnv, LogObserver,
        evolution::{load_champion, run_episode, save_champion},
    },
    schema::{EvaluationConfig, EvolutionConfig},
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--example") => print_example_config(),
        Some("--replay") => {
            let Some(path) = args.get(2) else {
                usage(&args[0]);
            };
            let seed = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);
            replay(Path::new(path), seed);
        }
        Some(config) if !config.starts_with('-') => {
            let config_path = PathBuf::from(config);
            let output = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| config_path.with_extension("champion.json"));
            train(&config_path, &output);
        }
        _ => usage(&args[0]),
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <config.json> [output.json]", program);
    eprintln!("       {} --replay <champion.json> [seed]", program);
    eprintln!("       {} --example", program);
    eprintln!();
    eprintln!("Evolve lander controllers from a JSON configuration.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json    Path to evolution configuration file");
    eprintln!("  output.json    Champion output path (default: <config>.champion.json)");
    eprintln!("  champion.json  Previously saved champion to replay");
    eprintln!("  seed           Pad placement seed for the replay (default: 0)");
    eprintln!();
    eprintln!("Set RUST_LOG=debug or RUST_LOG=trace for per-episode and per-step output.");
    process::exit(1);
}

fn train(config_path: &Path, output: &Path) {
    let config_str = fs::read_to_string(config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        process::exit(1);
    });

    let config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        process::exit(1);
    });

    println!("Lander Evolution");
    println!("================");
    println!(
        "World: {}x{}, pad width {}",
        config.environment.width, config.environment.height, config.environment.pad_width
    );
    println!(
        "Population: {} ({} elites), generations: {}",
        config.population.size,
        config.population.elite_count(),
        config.population.generations
    );
    println!(
        "Evaluation: {} episodes x {} steps",
        config.evaluation.episodes, config.evaluation.max_steps
    );
    println!();

    let environment = config.environment.clone();
    let mut engine = EvolutionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        process::exit(1);
    });

    let result = engine.run().unwrap_or_else(|e| {
        eprintln!("Evolution failed: {}", e);
        process::exit(1);
    });

    println!();
    println!("Champion #{}:", result.best.id);
    println!("  Fitness: {:.3}", result.best.fitness);
    println!("  Landing rate: {:.1}%", result.best.landing_rate * 100.0);
    println!("  Generation: {}", result.best.generation);
    println!(
        "Time: {:.2}s ({:.1} episodes/s)",
        result.stats.elapsed_seconds, result.stats.episodes_per_second
    );

    let export = ChampionExport::from_result(&result, &environment);
    if let Err(e) = save_champion(output, &export) {
        eprintln!("Error writing champion: {}", e);
        process::exit(1);
    }
    println!("Champion written to {}", output.display());
}

fn replay(path: &Path, seed: u64) {
    let export = load_champion(path).unwrap_or_else(|e| {
        eprintln!("Error loading champion: {}", e);
        process::exit(1);
    });
    let network = export.network().unwrap_or_else(|e| {
        eprintln!("Invalid champion network: {}", e);
        process::exit(1);
    });

    let mut env = LanderEnv::new(export.environment.clone()).unwrap_or_else(|e| {
        eprintln!("Invalid champion environment: {}", e);
        process::exit(1);
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let mut observer = LogObserver::new();
    let max_steps = EvaluationConfig::default().max_steps;

    let outcome = run_episode(&mut env, &network, max_steps, &mut rng, Some(&mut observer));

    let verdict = if outcome.landed {
        "landed"
    } else if outcome.crashed {
        "crashed"
    } else {
        "ran out of steps"
    };
    println!(
        "Champion #{} {} after {} steps (reward {:.1}, pad at x={:.1})",
        export.snapshot.id,
        verdict,
        outcome.steps,
        outcome.total_reward,
        env.pad().center_x
    );
}

fn print_example_config() {
    let config = EvolutionConfig {
        random_seed: Some(42),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example config: {}", e),
    }
}
