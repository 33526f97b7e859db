// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cbench validate` command - Validate configuration file.

use conduit_bench_core::ConfigLoader;

pub async fn execute(file: &str) -> anyhow::Result<()> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Harness Settings:");
            println!(
                "  Health Poll:        every {}ms, up to {}ms",
                config.harness.poll_interval.as_millis(),
                config.harness.max_wait.as_millis()
            );
            println!(
                "  Request Timeout:    {}ms",
                config.harness.request_timeout.as_millis()
            );
            println!(
                "  Warm-up:            {} iterations",
                config.harness.warmup_iterations
            );
            println!(
                "  Output Directory:   {}",
                config.harness.output_dir.display()
            );
            if let Some(baseline) = &config.harness.baseline {
                println!("  Baseline:           {}", baseline);
            }
            println!();
            println!("Frameworks ({}):", config.frameworks.len());
            for framework in &config.frameworks {
                println!(
                    "  - {} (port: {}, command: {}, profile: {})",
                    framework.name,
                    framework.port,
                    framework.command,
                    framework
                        .profile
                        .as_ref()
                        .map(|p| p.as_str())
                        .unwrap_or("none")
                );
                if let Err(e) = framework.check_artifact() {
                    println!("    ! {}", e);
                }
            }
            println!();
            println!("Workloads ({}):", config.workloads.len());
            for workload in &config.workloads {
                println!(
                    "  - {} ({} {} {}, {})",
                    workload.name, workload.kind, workload.method, workload.path, workload.run_length
                );
            }
            println!();
            println!("Profiles: {}", config.profiles.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
