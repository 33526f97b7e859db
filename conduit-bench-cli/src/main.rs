// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! conduit-bench CLI
//!
//! Command-line interface for comparative framework benchmarks and
//! infrastructure cost projection.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod metrics;

/// cbench - Comparative benchmarking harness for HTTP frameworks
#[derive(Parser)]
#[command(name = "cbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "conduit-bench.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every workload against every framework and compare
    Run {
        /// Framework the others are compared against
        #[arg(short, long)]
        baseline: Option<String>,

        /// Only run these frameworks (repeatable)
        #[arg(short, long = "framework")]
        frameworks: Vec<String>,

        /// Only run these workloads (repeatable)
        #[arg(short, long = "workload")]
        workloads: Vec<String>,

        /// Keep raw samples in the saved report
        #[arg(long)]
        keep_samples: bool,

        /// Quick smoke run with few iterations
        #[arg(long)]
        quick: bool,

        /// Write Prometheus text metrics to this file
        #[arg(long)]
        metrics_out: Option<String>,
    },

    /// Project infrastructure cost of every profile at load points
    Cost {
        /// Load points in ops/sec (repeatable)
        #[arg(short, long = "load")]
        loads: Vec<f64>,
    },

    /// Monthly and annual cost delta between two profiles
    BreakEven {
        /// Profile paying the current bill
        #[arg(long, default_value = "python-fastapi")]
        baseline: String,

        /// Profile being considered
        #[arg(long, default_value = "conduit")]
        candidate: String,

        /// Load points in ops/sec (repeatable)
        #[arg(short, long = "load")]
        loads: Vec<f64>,
    },

    /// Recompute the comparison of a saved report
    Compare {
        /// Path to a benchmark_*.json report
        report: String,

        /// Framework the others are compared against
        #[arg(short, long)]
        baseline: Option<String>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },

    /// List framework resource profiles
    Profiles,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            baseline,
            frameworks,
            workloads,
            keep_samples,
            quick,
            metrics_out,
        } => {
            commands::run::execute(
                &cli.config,
                commands::run::RunArgs {
                    baseline,
                    frameworks,
                    workloads,
                    keep_samples,
                    quick,
                    metrics_out,
                },
            )
            .await
        }
        Commands::Cost { loads } => commands::cost::execute(&cli.config, &loads).await,
        Commands::BreakEven {
            baseline,
            candidate,
            loads,
        } => commands::break_even::execute(&cli.config, &baseline, &candidate, &loads).await,
        Commands::Compare { report, baseline } => {
            commands::compare::execute(&report, baseline.as_deref()).await
        }
        Commands::Validate { file } => commands::validate::execute(&file).await,
        Commands::Profiles => commands::profiles::execute(&cli.config).await,
    }
}
