// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end integration tests for the harness core.
//!
//! These tests verify the flow from a configuration file to a live server
//! process that is profiled and stopped.

use std::time::Duration;

use conduit_bench_core::{
    ConfigLoader, CostModel, HarnessError, LifecycleManager, ResourceProfiler, StartOutcome,
    StopOutcome,
};
use tempfile::TempDir;

/// Minimal HTTP server answering 200 on every GET.
const HEALTH_SERVER: &str = r#"
import sys
from http.server import BaseHTTPRequestHandler, HTTPServer

class Handler(BaseHTTPRequestHandler):
    def do_GET(self):
        self.send_response(200)
        self.send_header("Content-Length", "2")
        self.end_headers()
        self.wfile.write(b"ok")

    def log_message(self, *args):
        pass

HTTPServer(("127.0.0.1", int(sys.argv[1])), Handler).serve_forever()
"#;

fn unused_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind probe socket")
        .local_addr()
        .expect("Failed to read probe address")
        .port()
}

fn write_config(dir: &TempDir, port: u16, script: &std::path::Path) -> std::path::PathBuf {
    let config_path = dir.path().join("bench.yaml");
    std::fs::write(
        &config_path,
        format!(
            r#"
harness:
  poll_interval_ms: 50
  max_wait_ms: 10000
  health_timeout_ms: 200
  stop_timeout_ms: 2000

frameworks:
  - name: py-health
    command: python3
    args: ["{script}", "{port}"]
    port: {port}
    artifact: "{script}"
    profile: python-fastapi

workloads:
  - name: ping
    kind: single
    method: GET
    path: /ping
    iterations: 10
"#,
            script = script.display(),
            port = port
        ),
    )
    .expect("Failed to write config");
    config_path
}

/// Test configuration loading from disk, with artifact check
#[test]
fn test_config_file_loading() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let script = temp_dir.path().join("server.py");
    std::fs::write(&script, HEALTH_SERVER).expect("Failed to write server script");
    let config_path = write_config(&temp_dir, 18080, &script);

    let config = ConfigLoader::load_file(&config_path).expect("Config should load");
    assert_eq!(config.frameworks.len(), 1);
    assert_eq!(config.harness.poll_interval, Duration::from_millis(50));
    config.check_artifacts().expect("Artifact exists");

    std::fs::remove_file(&script).expect("Failed to remove script");
    assert!(matches!(
        config.check_artifacts(),
        Err(HarnessError::ArtifactMissing { .. })
    ));
}

/// Test that a missing file is reported as such
#[test]
fn test_config_file_not_found() {
    let result = ConfigLoader::load_file("/nonexistent/bench.yaml");
    assert!(matches!(result, Err(HarnessError::ConfigNotFound { .. })));
}

/// Test the full lifecycle against a real server process
#[tokio::test]
async fn test_start_profile_stop_real_server() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let script = temp_dir.path().join("server.py");
    std::fs::write(&script, HEALTH_SERVER).expect("Failed to write server script");
    let port = unused_port();
    let config = ConfigLoader::load_file(write_config(&temp_dir, port, &script))
        .expect("Config should load");

    let framework = &config.frameworks[0];
    let manager = LifecycleManager::new(&config.harness).expect("Manager should build");

    let outcome = manager
        .start_and_wait(framework)
        .await
        .expect("Spawn should succeed");

    let (process, cold_start) = match outcome {
        StartOutcome::Ready {
            process,
            cold_start,
        } => (process, cold_start),
        StartOutcome::NotReady { waited, .. } => {
            panic!("Server not ready after {:?}", waited)
        }
    };

    assert!(cold_start > Duration::ZERO);
    assert!(cold_start < Duration::from_secs(10));
    assert!(manager.is_healthy(&framework.health_url()).await);

    let mut profiler = ResourceProfiler::new();
    assert!(profiler.memory_mb(process.pid()) > 0.0);

    assert_eq!(
        manager.stop(process).await.expect("Stop should succeed"),
        StopOutcome::Graceful
    );
    assert!(!manager.is_healthy(&framework.health_url()).await);

    // linked profile feeds the cost model
    let profile = config.profile_for(framework).expect("Profile linked");
    let analysis = CostModel::new(config.billing).project(profile, 1_000.0);
    assert_eq!(analysis.framework.as_str(), "python-fastapi");
}
