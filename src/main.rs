//! CLI entry point for the Randomancer build randomizer

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use randomancer_core::{
    catalog::{load_catalog, CatalogCache, CatalogPaths, FsSource},
    config::{CohesionMode, RandomizerConfig},
    logging::{init_tracing, LogLevel, TracingConfig},
    session::{RollResult, Session},
    sweep::{compare_scorers, seed_sweep, SweepConfig},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "randomancer")]
#[command(version)]
#[command(about = "Roll a random but legal build and recommend gems and uniques", long_about = None)]
struct Args {
    /// Directory holding the catalog documents
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// RNG seed; defaults to the current time
    #[arg(short, long)]
    seed: Option<u64>,

    /// Cohesion mode: strict, cohesive, chaotic or madness
    #[arg(short, long, default_value = "cohesive")]
    mode: CohesionMode,

    /// Number of rolls in one session
    #[arg(short, long, default_value = "1")]
    rolls: u32,

    /// Run a seed sweep over this many sessions instead of rolling
    #[arg(long)]
    sweep: Option<u64>,

    /// With --sweep, compare the baseline and enhanced scorers
    #[arg(long, default_value = "false")]
    compare: bool,

    /// JSON config file merged over the catalog's own config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the catalog self-test and exit
    #[arg(long, default_value = "false")]
    self_test: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn default_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn print_text(result: &RollResult) {
    let d = &result.display;
    println!("=== {} ===", d.build_name);
    println!("{}", d.flavor);
    println!();
    println!("Class:      {} ({})", d.class, d.ascendancy);
    println!("Weapons:    {}", d.weapons);
    println!("Defense:    {}", d.defense);
    println!("Strategy:   {}", d.defense_strategy);
    println!("Tactics:    {}", d.tactics);
    println!("Ailments:   {}", d.ailments);
    println!("Balance:    {}", d.balance);
    if !result.success {
        let messages: Vec<&str> = result.violations.iter().map(|v| v.message()).collect();
        println!("Illegal after {} attempts: {}", result.attempts, messages.join("; "));
    }
    println!();
    println!("--- Skills ---");
    for gem in &result.recommendations.gems {
        println!("{} ({}% synergy, {})", gem.name, gem.synergy_pct, gem.dominant.short());
        if !gem.requirement_text.is_empty() {
            println!("  {}", gem.requirement_text);
        }
        for support in &gem.supports {
            println!("  + {}", support.name);
        }
    }
    println!();
    println!("--- Uniques ---");
    for unique in &result.recommendations.uniques {
        println!("{} [{}] {:.1}", unique.name, unique.slot, unique.score);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&TracingConfig::with_level(LogLevel::from_verbosity(args.verbose)));

    if !args.data.is_dir() {
        bail!("data directory not found: {}", args.data.display());
    }
    let source = FsSource::new(&args.data);
    let mut cache = CatalogCache::new();
    let catalog = Arc::new(load_catalog(&source, &mut cache, &CatalogPaths::default()));

    if args.self_test {
        println!("{}", serde_json::to_string_pretty(&catalog.self_test())?);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => RandomizerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RandomizerConfig::resolve(catalog.core.config.as_ref()),
    };
    let seed = args.seed.unwrap_or_else(default_seed);

    if let Some(run_count) = args.sweep {
        let sweep = SweepConfig {
            run_count,
            base_seed: seed,
            rolls_per_run: args.rolls,
            mode: args.mode,
        };
        let output = if args.compare {
            serde_json::to_value(compare_scorers(&catalog, &config, &sweep)?)?
        } else {
            serde_json::to_value(seed_sweep(&catalog, &config, &sweep)?)?
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut session = Session::with_config(Arc::clone(&catalog), config, seed);
    session.set_mode(args.mode);
    let mut results = Vec::with_capacity(args.rolls as usize);
    for _ in 0..args.rolls {
        results.push(session.roll().context("rolling a build")?.clone());
    }

    match args.output {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "seed": seed,
                "mode": args.mode,
                "metrics": session.metrics(),
                "rolls": results,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for result in &results {
                print_text(result);
                println!();
            }
        }
    }
    Ok(())
}
