// ABOUTME: Command-line interface for the dicelab formula engine.
// ABOUTME: Provides roll and stats commands with optional JSON output.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dicelab")]
#[command(about = "A dice formula evaluator and statistics engine for TTRPGs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula once
    Roll {
        /// Dice formula (e.g. "3d10 + 2d8 - 1", "5d10>=8")
        formula: String,
    },
    /// Simulate a formula many times and report its distribution
    Stats {
        /// Dice formula (e.g. "3>4d6 + 2")
        formula: String,

        /// Number of iterations to run
        #[arg(short = 'n', long, default_value_t = dicelab::DEFAULT_ITERATIONS)]
        iterations: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Roll { formula } => match dicelab::evaluate(&formula) {
            Ok(result) => print_roll(&result),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Stats {
            formula,
            iterations,
            json,
        } => match dicelab::compute_distribution(&formula, iterations) {
            Ok(result) => {
                if json {
                    print_stats_json(&result);
                } else {
                    print_stats(&formula, &result);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn print_roll(result: &dicelab::RollResult) {
    for group in &result.groups {
        println!("{}  (expected {:.2})", group, group.expected_average);
    }
    let modifier = result.modifier();
    if modifier != 0 {
        println!("modifier: {:+}", modifier);
    }
    println!("total: {}", result.total);
}

fn print_stats(formula: &str, result: &dicelab::HistogramResult) {
    println!("{} (n={})", formula, result.total_rolls);
    println!();

    let max_count = result.frequencies.values().copied().max().unwrap_or(1);
    let max_bar_width = 40;

    for (value, count) in &result.frequencies {
        let pct = (*count as f64 / result.total_rolls as f64) * 100.0;
        let bar_width = (*count as f64 / max_count as f64 * max_bar_width as f64) as usize;
        let bar: String = "█".repeat(bar_width);

        println!("{:>4}: {:40} {:5.1}%", value, bar, pct);
    }

    println!();
    if let Some(stats) = &result.threshold_stats {
        println!("average successes: {:.2}", stats.average_successes);
        println!(
            "chance of at least one: {:.1}%",
            stats.probability_of_at_least_one * 100.0
        );
    } else {
        println!("mean: {:.2}, std: {:.2}", result.mean, result.std_dev);
        let p = &result.percentiles;
        println!(
            "p25: {}, p50: {}, p75: {}, p90: {}, p95: {}, p99: {}",
            p.p25, p.p50, p.p75, p.p90, p.p95, p.p99
        );
    }
}

fn print_stats_json(result: &dicelab::HistogramResult) {
    use serde_json::json;

    let mut output = json!({
        "total_rolls": result.total_rolls,
        "min": result.min,
        "max": result.max,
        "mean": result.mean,
        "std_dev": result.std_dev,
        "percentiles": {
            "p25": result.percentiles.p25,
            "p50": result.percentiles.p50,
            "p75": result.percentiles.p75,
            "p90": result.percentiles.p90,
            "p95": result.percentiles.p95,
            "p99": result.percentiles.p99,
        },
        "is_threshold_roll": result.is_threshold_roll,
        "frequencies": result.frequencies,
    });

    if let Some(stats) = &result.threshold_stats {
        output["threshold_stats"] = json!({
            "average_successes": stats.average_successes,
            "probability_of_at_least_one": stats.probability_of_at_least_one,
            "success_probabilities": stats.success_probabilities,
        });
    }

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
