//! Lucon command-line interface
//!
//! Loads a policy, then either verifies a route against it, runs an ad hoc
//! query, or dumps the loaded theory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use lucon::{PolicyEngine, SolverConfig};

#[derive(Parser)]
#[command(name = "lucon")]
#[command(version = "0.1.0")]
#[command(about = "Logic-based usage-control policy decision engine", long_about = None)]
struct Cli {
    /// Policy file to load
    #[arg(value_name = "POLICY")]
    policy: PathBuf,

    /// Route file to verify against the policy
    #[arg(short, long, value_name = "ROUTE")]
    route: Option<PathBuf>,

    /// Route identifier for the proof
    #[arg(long, default_value = "")]
    route_id: String,

    /// Ad hoc query to run against the policy
    #[arg(short, long, value_name = "QUERY")]
    query: Option<String>,

    /// Stop after the first solution instead of enumerating all
    #[arg(long)]
    first: bool,

    /// Dump the loaded theory and exit
    #[arg(long)]
    dump: bool,

    /// Maximum resolution steps (0 for unlimited)
    #[arg(long, default_value = "1000000")]
    max_steps: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "lucon=debug" } else { "lucon=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = PolicyEngine::with_config(SolverConfig {
        max_steps: cli.max_steps,
        deadline: None,
    });

    let policy = fs::read_to_string(&cli.policy)
        .with_context(|| format!("reading policy file {}", cli.policy.display()))?;
    engine
        .load_policy(&policy)
        .with_context(|| format!("loading policy from {}", cli.policy.display()))?;

    if cli.dump {
        match cli.format {
            OutputFormat::Text => print!("{}", engine.theory_text()),
            OutputFormat::Json => println!("{}", engine.theory_json()),
        }
        return Ok(());
    }

    if let Some(query) = &cli.query {
        let solutions = engine
            .query(query, !cli.first)
            .context("running query")?;
        if solutions.is_empty() {
            println!("no");
        }
        for solution in &solutions {
            match cli.format {
                OutputFormat::Text => println!("{}", solution),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(solution).context("serializing solution")?
                ),
            }
        }
        return Ok(());
    }

    if let Some(route_path) = &cli.route {
        let route = fs::read_to_string(route_path)
            .with_context(|| format!("reading route file {}", route_path.display()))?;
        let id = if cli.route_id.is_empty() {
            None
        } else {
            Some(cli.route_id.as_str())
        };
        let proof = engine
            .prove_invalid_route(id, Some(&route))
            .context("verifying route")?;
        match cli.format {
            OutputFormat::Text => {
                if proof.valid {
                    println!("route is valid");
                } else {
                    println!(
                        "route is INVALID: {} counterexample(s)",
                        proof.counter_examples.len()
                    );
                    for ce in &proof.counter_examples {
                        println!("  {}", ce);
                    }
                }
            }
            OutputFormat::Json => println!("{}", proof.to_json()),
        }
        if !proof.valid {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Nothing else requested; show the theory as confirmation
    print!("{}", engine.theory_text());
    Ok(())
}
