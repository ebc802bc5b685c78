//! Reduced-round hash analysis CLI.
//!
//! Runs the statistical batteries and differential analyzers against one
//! primitive at one round count and prints a summary.

use clap::{Parser, Subcommand};
use hashround::{
    metrics::MetricsRegistry,
    orchestrator::{run, AnalysisConfig, FamilyReport, RunParameters, RunReport},
    primitives::{Algorithm, RoundHasher},
    Verdict,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "hashround", version, about = "Statistical analysis of reduced-round hash functions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse one algorithm at one round count.
    Run {
        /// Keccak, Blake, Blake2s, Blake2b or Blake3.
        #[arg(short, long)]
        algorithm: Algorithm,
        /// Reduced round count.
        #[arg(short, long)]
        rounds: u32,
        /// Input length for the basic statistics.
        #[arg(long, default_value_t = 16)]
        input_size: usize,
        /// Random inputs for the basic statistics.
        #[arg(long, default_value_t = 1000)]
        tests_count: usize,
        /// Fixed seed; overrides the config file.
        #[arg(long)]
        seed: Option<u64>,
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print Prometheus metrics after the run.
        #[arg(long)]
        metrics: bool,
        /// Write the sanitized report to this TOML file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the digest of a UTF-8 string.
    Hash {
        #[arg(short, long)]
        algorithm: Algorithm,
        #[arg(short, long)]
        rounds: u32,
        #[arg(short, long, default_value = "")]
        input: String,
    },
    /// List the algorithms and their round bounds.
    List,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            algorithm,
            rounds,
            input_size,
            tests_count,
            seed,
            config,
            metrics,
            report: report_path,
        } => {
            let config = match config {
                Some(path) => match AnalysisConfig::from_file(&path) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("Failed to load {}: {}", path.display(), e);
                        return ExitCode::from(2);
                    }
                },
                None => AnalysisConfig::default(),
            };

            // The analyses cannot be cancelled part-way; leave immediately.
            if let Err(e) = ctrlc::set_handler(|| {
                warn!("Interrupted; abandoning run");
                std::process::exit(130);
            }) {
                warn!("Failed to install interrupt handler: {}", e);
            }

            info!("hashround v{}", hashround::VERSION);
            let params = RunParameters {
                algorithm,
                rounds,
                input_size_bytes: input_size,
                tests_count,
                seed,
            };
            let report = run(&params, &config);
            print_report(&report);

            if let Some(path) = report_path {
                let written = report
                    .to_toml()
                    .map_err(|e| e.to_string())
                    .and_then(|text| std::fs::write(&path, text).map_err(|e| e.to_string()));
                match written {
                    Ok(()) => info!("Report written to {}", path.display()),
                    Err(e) => warn!("Failed to write report to {}: {}", path.display(), e),
                }
            }

            if metrics {
                match MetricsRegistry::new().and_then(|registry| {
                    registry.record(&report);
                    registry.encode()
                }) {
                    Ok(text) => print!("{}", text),
                    Err(e) => warn!("Metrics unavailable: {}", e),
                }
            }

            if report.is_partial() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Hash {
            algorithm,
            rounds,
            input,
        } => match RoundHasher::new(algorithm, rounds) {
            Ok(hasher) => {
                println!("{}", hex(&hasher.hash(input.as_bytes())));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(2)
            }
        },
        Command::List => {
            for algorithm in Algorithm::ALL {
                let bounds = algorithm.round_bounds();
                println!(
                    "{:<8} rounds {}..={} (full {}), {}-byte digest",
                    algorithm.name(),
                    bounds.start(),
                    bounds.end(),
                    algorithm.full_rounds(),
                    algorithm.digest_len()
                );
            }
            ExitCode::SUCCESS
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn print_family(title: &str, family: &FamilyReport, alpha: f64) {
    let s = family.summary;
    println!(
        "\n{} ({} passed, {} failed, {} inapplicable)",
        title, s.passed, s.failed, s.inapplicable
    );
    let thresholds = hashround::SignificanceThresholds { alpha };
    for result in &family.results {
        let mark = match thresholds.verdict(result) {
            Verdict::Pass => "pass",
            Verdict::Fail => "FAIL",
            Verdict::Inapplicable => "n/a",
        };
        println!("  {:<28} {:>10.6}  {}", result.name, result.p_value, mark);
    }
}

fn print_report(report: &RunReport) {
    println!(
        "{} at {} rounds, started {}",
        report.algorithm,
        report.rounds,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if let Some(error) = &report.hashing_error {
        println!("Hashing error: {}", error);
        return;
    }

    if let Some(basic) = &report.basic {
        println!(
            "\nBasic: Hamming {:.2} ± {:.2} vs full rounds, flip χ² p = {:.6}, {} collisions",
            basic.mean_hamming, basic.std_hamming, basic.flip_p_value, basic.collisions
        );
    }

    for (title, family) in [
        ("NIST", &report.nist),
        ("Diehard", &report.diehard),
        ("TestU01", &report.testu01),
    ] {
        if let Some(family) = family {
            print_family(title, family, report.alpha);
        }
    }

    if let Some(sac) = &report.avalanche {
        println!(
            "\nAvalanche: mean flip rate {:.4}, std {:.4}, max |rate - 0.5| {:.4}, p in [{:.4}, {:.4}]",
            sac.mean_flip_rate,
            sac.std_dev_flip_rate,
            sac.max_deviation_from_half,
            sac.min_p_value,
            sac.max_p_value
        );
    }
    if let Some(bic) = &report.bic {
        println!(
            "BIC: mean {:.4}, std {:.4}, max |r| {:.4}, min {:.4}",
            bic.mean_correlation, bic.std_correlation, bic.max_correlation_abs, bic.min_correlation
        );
    }

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    println!("\nCompleted in {} ms", report.elapsed_ms);
}
