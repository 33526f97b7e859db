// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Workload driver.
//!
//! Issues one operation at a time against a running server, after a
//! discarded warm-up phase, and records a `Sample` per measured operation.
//! A failed operation is recorded and logged; it never ends the run.

use std::time::{Duration, Instant};

use conduit_bench_core::{HarnessConfig, HttpMethod, RunLength, WorkloadConfig, WorkloadKind};
use reqwest::{Client, Method, Response, StatusCode};
use thiserror::Error;

use crate::metrics::Sample;

/// Upper bound on the sample buffer reserved before a run starts.
const MAX_PREALLOCATED_SAMPLES: u64 = 65_536;

fn sample_capacity(run_length: &RunLength) -> usize {
    match run_length {
        RunLength::Iterations(n) => (*n).min(MAX_PREALLOCATED_SAMPLES) as usize,
        RunLength::Duration(_) => 0,
    }
}

/// Errors building the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Why a single operation failed.
#[derive(Debug, Error)]
enum IterationFailure {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(StatusCode),
}

/// Samples of one workload run plus the span of the measured phase.
#[derive(Debug, Clone)]
pub struct WorkloadRun {
    pub samples: Vec<Sample>,
    pub wall_clock: Duration,
}

/// Counts non-empty newline-delimited lines across arbitrary chunk
/// boundaries. A trailing line without a terminator counts on `finish`.
#[derive(Debug, Default, Clone)]
pub struct LineCounter {
    lines: u64,
    pending: bool,
}

impl LineCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            match byte {
                b'\n' => {
                    if self.pending {
                        self.lines += 1;
                    }
                    self.pending = false;
                }
                b'\r' => {}
                _ => self.pending = true,
            }
        }
    }

    pub fn finish(self) -> u64 {
        self.lines + u64::from(self.pending)
    }
}

/// Sequential HTTP workload driver.
pub struct WorkloadDriver {
    client: Client,
    warmup_iterations: u64,
}

impl WorkloadDriver {
    /// Create a driver with the harness request timeout and warm-up count.
    pub fn new(harness: &HarnessConfig) -> Result<Self, DriverError> {
        let client = Client::builder()
            .timeout(harness.request_timeout)
            .build()
            .map_err(DriverError::HttpClient)?;

        Ok(Self {
            client,
            warmup_iterations: harness.warmup_iterations,
        })
    }

    /// Override the number of discarded warm-up operations.
    pub fn warmup(mut self, iterations: u64) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    /// Run a workload against the server at `base_url`.
    pub async fn run(&self, base_url: &str, workload: &WorkloadConfig) -> WorkloadRun {
        let url = format!("{}{}", base_url, workload.path);

        tracing::debug!(
            workload = %workload.name,
            kind = %workload.kind,
            warmup = self.warmup_iterations,
            "Warming up"
        );
        for index in 0..self.warmup_iterations {
            if let Err(e) = self.execute(&url, workload).await {
                tracing::debug!(
                    workload = %workload.name,
                    iteration = index,
                    error = %e,
                    "Warm-up iteration failed"
                );
            }
        }

        let mut samples = Vec::with_capacity(sample_capacity(&workload.run_length));

        let started = Instant::now();
        let mut index: u64 = 0;
        loop {
            let more = match workload.run_length {
                RunLength::Iterations(n) => index < n,
                RunLength::Duration(d) => started.elapsed() < d,
            };
            if !more {
                break;
            }
            samples.push(self.measure(index, &url, workload).await);
            index += 1;
        }
        let wall_clock = started.elapsed();

        let failed = samples.iter().filter(|s| !s.succeeded).count();
        tracing::info!(
            workload = %workload.name,
            issued = samples.len(),
            failed,
            elapsed_ms = wall_clock.as_millis() as u64,
            "Workload finished"
        );

        WorkloadRun {
            samples,
            wall_clock,
        }
    }

    async fn measure(&self, index: u64, url: &str, workload: &WorkloadConfig) -> Sample {
        let start = Instant::now();
        match self.execute(url, workload).await {
            Ok(units) => Sample::success(start.elapsed(), units),
            Err(e) => {
                let elapsed = start.elapsed();
                tracing::warn!(
                    workload = %workload.name,
                    iteration = index,
                    error = %e,
                    "Iteration failed"
                );
                Sample::failure(elapsed)
            }
        }
    }

    /// Issue one operation and consume the full response.
    async fn execute(
        &self,
        url: &str,
        workload: &WorkloadConfig,
    ) -> Result<Option<u64>, IterationFailure> {
        let response = self.send(url, workload).await?;

        match workload.kind {
            WorkloadKind::Single => {
                response.bytes().await?;
                Ok(workload.units_per_request)
            }
            WorkloadKind::Pipeline => {
                response.bytes().await?;
                Ok(None)
            }
            WorkloadKind::Streaming => {
                let mut response = response;
                let mut counter = LineCounter::new();
                while let Some(chunk) = response.chunk().await? {
                    counter.feed(&chunk);
                }
                Ok(Some(counter.finish()))
            }
        }
    }

    async fn send(&self, url: &str, workload: &WorkloadConfig) -> Result<Response, IterationFailure> {
        let method = match workload.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        };

        let mut request = self.client.request(method, url);
        if let Some(payload) = &workload.payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(IterationFailure::Status(response.status()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_capacity_is_bounded() {
        assert_eq!(sample_capacity(&RunLength::Iterations(100)), 100);
        assert_eq!(
            sample_capacity(&RunLength::Iterations(u64::MAX)),
            MAX_PREALLOCATED_SAMPLES as usize
        );
        assert_eq!(
            sample_capacity(&RunLength::Duration(Duration::from_secs(1))),
            0
        );
    }

    #[test]
    fn test_line_counter_single_chunk() {
        let mut counter = LineCounter::new();
        counter.feed(b"data: a\ndata: b\n\ndata: c\n");
        assert_eq!(counter.finish(), 3);
    }

    #[test]
    fn test_line_counter_split_across_chunks() {
        let mut counter = LineCounter::new();
        counter.feed(b"tok");
        counter.feed(b"en1\ntoken");
        counter.feed(b"2\n");
        counter.feed(b"\n");
        assert_eq!(counter.finish(), 2);
    }

    #[test]
    fn test_line_counter_trailing_partial_line() {
        let mut counter = LineCounter::new();
        counter.feed(b"one\ntwo");
        assert_eq!(counter.finish(), 2);
    }

    #[test]
    fn test_line_counter_ignores_blank_crlf() {
        let mut counter = LineCounter::new();
        counter.feed(b"a\r\n\r\nb\r\n");
        assert_eq!(counter.finish(), 2);
        assert_eq!(LineCounter::new().finish(), 0);
    }
}
