//! check-build - report the status and failures of one CI build.
//!
//! Usage:
//!   check-build <build-number-or-url> [--previous] [--topotest] [--json]
//!
//! With `--previous`, the immediately preceding build is also fetched and
//! each failure is labeled New/Existing, with Fixed failures listed.

use std::env;
use std::process;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ci_build_analyzer::config::Config;
use ci_build_analyzer::error::AppResult;
use ci_build_analyzer::models::{BuildReport, BuildStatus, Classification};
use ci_build_analyzer::services::{Fetch, HttpFetcher, PlanKind, classify_failures, parse_report};

fn print_usage() {
    eprintln!("Usage: check-build <build-number-or-url> [--previous] [--topotest] [--json]");
    eprintln!("Example: check-build 9082");
    eprintln!("         check-build https://ci1.netdef.org/browse/FRR-FRR-9082 --previous");
}

/// Accept a bare build number or a full report URL.
fn parse_build_arg(arg: &str) -> Option<u64> {
    if let Ok(number) = arg.parse::<u64>() {
        return Some(number);
    }
    arg.rsplit('-').next()?.parse().ok()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let args: Vec<String> = env::args().collect();
    let mut build_arg: Option<String> = None;
    let mut with_previous = false;
    let mut as_json = false;
    let mut plan_kind = PlanKind::Compliance;

    for arg in &args[1..] {
        match arg.as_str() {
            "--previous" | "-p" => with_previous = true,
            "--topotest" | "-t" => plan_kind = PlanKind::Topotest,
            "--json" | "-j" => as_json = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other if build_arg.is_none() => build_arg = Some(other.to_string()),
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
    }

    let Some(build_id) = build_arg.as_deref().and_then(parse_build_arg) else {
        print_usage();
        process::exit(1);
    };

    if let Err(err) = run(build_id, with_previous, as_json, plan_kind).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run(
    build_id: u64,
    with_previous: bool,
    as_json: bool,
    plan_kind: PlanKind,
) -> AppResult<()> {
    let config = Config::from_env()?;
    let fetcher = HttpFetcher::new(&config)?;

    let url = config.build_url(build_id);
    if !as_json {
        println!("Downloading: {}", url);
    }
    let html = fetcher.fetch(&url).await?;
    let report = parse_report(&html, build_id, plan_kind)?;

    let previous = if with_previous && build_id > 1 {
        let prev_url = config.build_url(build_id - 1);
        if !as_json {
            println!("Downloading previous build: {}", prev_url);
        }
        let prev_html = fetcher.fetch(&prev_url).await?;
        Some(parse_report(&prev_html, build_id - 1, plan_kind)?)
    } else {
        None
    };

    if as_json {
        let diff = previous
            .as_ref()
            .map(|prev| ci_build_analyzer::services::classify(&report.signature(), &prev.signature()));
        let payload = match diff {
            Some(diff) => serde_json::json!({ "report": report, "diff": diff }),
            None => serde_json::json!({ "report": report }),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    print_report(&config, &report, previous.as_ref());
    Ok(())
}

fn print_report(config: &Config, report: &BuildReport, previous: Option<&BuildReport>) {
    let line = "=".repeat(80);
    println!("{}", line);
    println!("CI Build Analysis");
    println!("{}", line);
    println!("Build:        #{}", report.build_id);
    println!("Status:       {}", report.status);
    if let Some(completed) = report.completed_at {
        println!("Completed:    {}", completed.format("%d %b %Y, %H:%M:%S"));
    }
    if report.total_tests > 0 {
        println!("Total Tests:  {}", report.total_tests);
    }
    if report.quarantined_count > 0 {
        println!("Quarantined/Skipped: {}", report.quarantined_count);
    }
    println!("{}", line);

    if report.status == BuildStatus::Success {
        println!("\nBuild PASSED - no failures detected");
        if !report.fixed_tests.is_empty() {
            println!("\nFixed {} test(s):", report.fixed_tests.len());
            for test in &report.fixed_tests {
                println!("  - {}", test);
            }
        }
        return;
    }

    if !report.failed_jobs.is_empty() {
        println!("\nFAILED/HUNG JOBS:");
        for job in &report.failed_jobs {
            println!("  {} {}", if job.hung { "hung:" } else { "failed:" }, job.job);
            println!("     Reason: {}", job.reason);
            if let Some(key) = &job.key {
                println!("     Job URL: {}/browse/{}", config.base_url, key);
            }
            if let Some(asan) = &job.asan {
                println!("     Error Type: {}", asan.error_kind);
                if let Some(test) = &asan.test_name {
                    println!("     Test: {}", test);
                }
            }
        }
    }

    match previous {
        Some(previous) => {
            let prev_set = previous.signature();
            let classified = classify_failures(&report.failures, &prev_set);
            let diff = ci_build_analyzer::services::classify(&report.signature(), &prev_set);

            if !classified.is_empty() {
                println!("\nFAILING TESTS (vs build #{}):", previous.build_id);
                for entry in &classified {
                    let label = match entry.classification {
                        Classification::New => "NEW     ",
                        Classification::Existing => "EXISTING",
                    };
                    println!("  [{}] {} ({})", label, entry.failure.test_name, entry.failure.job);
                    if !entry.failure.error_text.is_empty() {
                        let first_line = entry.failure.error_text.lines().next().unwrap_or("");
                        println!("             {}", truncate(first_line, 100));
                    }
                }
            }
            if !diff.fixed.is_empty() {
                println!("\nFIXED ({}):", diff.fixed.len());
                for key in &diff.fixed {
                    println!("  - {}", key);
                }
            }
        }
        None => {
            if !report.failures.is_empty() {
                println!("\nFAILING TESTS ({}):", report.failures.len());
                for failure in &report.failures {
                    println!("  - {} ({})", failure.test_name, failure.job);
                    if !failure.error_text.is_empty() {
                        let first_line = failure.error_text.lines().next().unwrap_or("");
                        println!("      {}", truncate(first_line, 100));
                    }
                }
            }
        }
    }

    if !report.fixed_tests.is_empty() {
        println!("\nFIXED TESTS ({}):", report.fixed_tests.len());
        for test in &report.fixed_tests {
            println!("  - {}", test);
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}
