mod edge_list;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grid_layout::{GeneticSearch, ShuffleSearch};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Engine {
    /// Greedy hill climbing by shuffling crossing layers
    Shuffle,
    /// Generational genetic search on a worker pool
    Genetic,
}

/// Lay out a dependency graph on a grid and print it
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Edge list, one `predecessor successor` pair per line, stdin if omitted
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Engine::Genetic)]
    engine: Engine,

    /// Seed of the random generators
    #[arg(long, default_value_t = grid_layout::search::DEFAULT_SEED)]
    seed: u64,

    /// Number of generations of the genetic search
    #[arg(long, default_value_t = 1000)]
    generations: usize,

    /// Individuals per generation of the genetic search
    #[arg(long, default_value_t = 250)]
    population: usize,

    /// Stop the genetic search after this many seconds
    #[arg(long)]
    time_budget_secs: Option<u64>,

    /// Worker threads of the genetic search
    #[arg(long)]
    threads: Option<usize>,

    /// Move the final vertex to the top row before printing
    #[arg(long)]
    promote_sink: bool,
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let input = read_input(args.input.as_ref())?;
    let mut graph = edge_list::parse(&input)?
        .prepare()
        .context("Failed to prepare the grid")?;
    debug!("Prepared grid:\n{graph}");

    let fitness = match args.engine {
        Engine::Shuffle => graph.optimize(&ShuffleSearch::new(args.seed)),
        Engine::Genetic => graph.optimize(&GeneticSearch {
            generation_size: args.population,
            generation_count: args.generations,
            time_budget: args.time_budget_secs.map(Duration::from_secs),
            threads: args.threads,
            ..GeneticSearch::new(args.seed)
        }),
    };
    info!("Final layout: {fitness}");

    if args.promote_sink {
        graph
            .promote_sink_to_top()
            .context("Failed to move the sink to the top")?;
    }

    print!("{graph}");
    Ok(())
}
