//! analyze-window - aggregate failure trends over a window of CI builds.
//!
//! Usage:
//!   analyze-window <anchor-build-number> [--days N] [--topotest]
//!
//! Walks the plan history backward from the anchor build, collects every
//! report completed within the window, and prints success rate, most
//! frequent failures, job failure/hang counts, error categories, and
//! recurring failure patterns.

use std::env;
use std::process;

use chrono::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ci_build_analyzer::config::Config;
use ci_build_analyzer::error::AppResult;
use ci_build_analyzer::models::AggregateStats;
use ci_build_analyzer::services::{
    BuildWalker, HttpFetcher, PlanHistoryFeed, PlanKind, aggregate_walk,
};

fn print_usage() {
    eprintln!("Usage: analyze-window <anchor-build-number> [--days N] [--topotest] [--json]");
    eprintln!("Example: analyze-window 9082 --days 7");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let args: Vec<String> = env::args().collect();
    let mut anchor: Option<u64> = None;
    let mut days: Option<i64> = None;
    let mut as_json = false;
    let mut plan_kind = PlanKind::Compliance;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-d" => {
                i += 1;
                days = args.get(i).and_then(|v| v.parse().ok());
                if days.is_none() {
                    eprintln!("--days requires a positive number");
                    process::exit(1);
                }
            }
            "--topotest" | "-t" => plan_kind = PlanKind::Topotest,
            "--json" | "-j" => as_json = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other if anchor.is_none() => match other.parse() {
                Ok(number) => anchor = Some(number),
                Err(_) => {
                    eprintln!("Invalid build number: {}", other);
                    process::exit(1);
                }
            },
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(anchor) = anchor else {
        print_usage();
        process::exit(1);
    };

    if let Err(err) = run(anchor, days, as_json, plan_kind).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run(anchor: u64, days: Option<i64>, as_json: bool, plan_kind: PlanKind) -> AppResult<()> {
    let config = Config::from_env()?;
    let days = days.unwrap_or(config.window_days);

    let fetcher = HttpFetcher::new(&config)?;
    let feed = PlanHistoryFeed::new(&config);
    let walker = BuildWalker::new(&fetcher, &feed, &config, plan_kind);

    let outcome = walker.walk(anchor, Duration::days(days)).await?;
    let stats = aggregate_walk(&outcome);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_stats(&stats, &outcome.reports, anchor, days);
    Ok(())
}

fn print_stats(
    stats: &AggregateStats,
    reports: &[ci_build_analyzer::models::BuildReport],
    anchor: u64,
    days: i64,
) {
    let line = "=".repeat(80);
    println!("{}", line);
    println!("CI Trend Analysis - last {} day(s) before build #{}", days, anchor);
    println!("{}", line);

    let oldest = reports.iter().map(|r| r.build_id).min();
    let newest = reports.iter().map(|r| r.build_id).max();
    if let (Some(oldest), Some(newest)) = (oldest, newest) {
        println!("Builds analyzed: #{} .. #{}", oldest, newest);
    }
    println!("Total builds:    {}", stats.total);
    println!(
        "Successful:      {} ({}%)",
        stats.successful, stats.success_rate
    );
    println!("Failed:          {}", stats.failed);
    if stats.unknown > 0 {
        println!("Unknown:         {}", stats.unknown);
    }
    if stats.skipped > 0 {
        println!("Skipped (unreadable): {}", stats.skipped);
    }
    if stats.truncated {
        println!("NOTE: history feed stalled; results cover a partial window");
    }

    if !stats.failure_frequencies.is_empty() {
        println!("\nMOST FREQUENT FAILURES:");
        for entry in stats.failure_frequencies.iter().take(20) {
            println!(
                "  {:>3}x ({:>5.1}%)  {} ({})",
                entry.count, entry.percentage, entry.test_name, entry.job
            );
        }
    }

    if !stats.job_failures.is_empty() {
        println!("\nJOBS BY FAILED BUILDS:");
        for entry in &stats.job_failures {
            println!(
                "  {:>3}x ({:>5.1}%)  {}",
                entry.count, entry.percentage, entry.job
            );
        }
    }

    if !stats.hung_job_counts.is_empty() {
        println!("\nHUNG JOBS:");
        for entry in &stats.hung_job_counts {
            println!(
                "  {:>3}x ({:>5.1}%)  {}",
                entry.count, entry.percentage, entry.job
            );
        }
    }

    if !stats.error_categories.is_empty() {
        println!("\nERROR CATEGORIES:");
        for entry in &stats.error_categories {
            println!("  {:>4}  {}", entry.count, entry.category.as_str());
        }
    }

    if !stats.patterns.is_empty() {
        println!("\nRECURRING FAILURE PATTERNS:");
        for pattern in stats.patterns.iter().take(10) {
            println!(
                "  {} build(s): {}",
                pattern.count,
                pattern
                    .build_ids
                    .iter()
                    .map(|id| format!("#{}", id))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for key in pattern.signature.iter().take(8) {
                println!("      - {}", key);
            }
            if pattern.signature.len() > 8 {
                println!("      ... and {} more", pattern.signature.len() - 8);
            }
        }
    }
}
