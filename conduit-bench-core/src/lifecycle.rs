//! Server process lifecycle management.
//!
//! Spawns a framework's server process, polls its health endpoint until it
//! answers, and tears it down with SIGTERM followed by SIGKILL.

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::config::{FrameworkConfig, HarnessConfig};
use crate::error::LifecycleError;
use crate::types::{FrameworkName, ProcessId};

/// Interval between exit checks while waiting for a graceful stop.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A running server process.
///
/// The process is killed and reaped when the handle is dropped, so no exit
/// path leaves it running.
#[derive(Debug)]
pub struct ServerProcess {
    framework: FrameworkName,
    child: Child,
    pid: ProcessId,
    spawned_at: Instant,
}

impl ServerProcess {
    /// Get the process ID.
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Framework this process serves.
    pub fn framework(&self) -> &FrameworkName {
        &self.framework
    }

    /// Time since spawn.
    pub fn uptime(&self) -> Duration {
        self.spawned_at.elapsed()
    }

    /// Check if the process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::debug!(framework = %self.framework, pid = %self.pid, "Killing server on drop");
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// Result of starting a server and waiting for it to become healthy.
#[derive(Debug)]
pub enum StartOutcome {
    /// The health endpoint answered with a success status.
    Ready {
        process: ServerProcess,
        /// Time from spawn to the first healthy response.
        cold_start: Duration,
    },
    /// The server never became healthy. The process has been stopped.
    NotReady {
        waited: Duration,
        /// The process exited on its own while being polled.
        exited: bool,
    },
}

/// How a process ended when stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited after SIGTERM within the stop timeout.
    Graceful,
    /// Killed with SIGKILL after the stop timeout.
    Forced,
    /// Had already exited before the stop request.
    AlreadyExited,
}

enum Poll {
    Healthy,
    Exited,
    Exhausted,
}

/// Starts and stops server processes.
pub struct LifecycleManager {
    client: reqwest::Client,
    poll_interval: Duration,
    max_wait: Duration,
    stop_timeout: Duration,
}

impl LifecycleManager {
    /// Create a manager from harness timing.
    pub fn new(harness: &HarnessConfig) -> Result<Self, LifecycleError> {
        let client = reqwest::Client::builder()
            .timeout(harness.health_timeout)
            .build()
            .map_err(|e| LifecycleError::HttpClient {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            poll_interval: harness.poll_interval,
            max_wait: harness.max_wait,
            stop_timeout: harness.stop_timeout,
        })
    }

    /// Number of health polls that fit into the wait budget.
    pub fn max_attempts(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let attempts = self.max_wait.as_millis().div_ceil(interval);
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }

    /// Spawn the framework's server process.
    pub fn spawn(&self, framework: &FrameworkConfig) -> Result<ServerProcess, LifecycleError> {
        let child = Command::new(&framework.command)
            .args(&framework.args)
            .envs(&framework.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LifecycleError::SpawnFailed {
                reason: format!("Failed to spawn {}: {}", framework.command, e),
            })?;

        let pid = ProcessId::new(child.id()).map_err(|e| LifecycleError::SpawnFailed {
            reason: e.to_string(),
        })?;

        tracing::debug!(
            framework = %framework.name,
            pid = %pid,
            command = %framework.command,
            "Spawned server process"
        );

        Ok(ServerProcess {
            framework: framework.name.clone(),
            child,
            pid,
            spawned_at: Instant::now(),
        })
    }

    /// Spawn a server and poll its health endpoint until it is ready.
    ///
    /// Only a spawn failure is an error. A server that never answers, or
    /// exits while being polled, yields `StartOutcome::NotReady` and has
    /// already been stopped.
    pub async fn start_and_wait(
        &self,
        framework: &FrameworkConfig,
    ) -> Result<StartOutcome, LifecycleError> {
        let health_url = framework.health_url();
        let mut process = self.spawn(framework)?;

        match self.poll_health(&mut process, &health_url).await {
            Poll::Healthy => {
                let cold_start = process.uptime();
                tracing::info!(
                    framework = %framework.name,
                    pid = %process.pid(),
                    cold_start_ms = cold_start.as_millis() as u64,
                    "Server ready"
                );
                Ok(StartOutcome::Ready {
                    process,
                    cold_start,
                })
            }
            Poll::Exited => {
                let waited = process.uptime();
                tracing::warn!(
                    framework = %framework.name,
                    waited_ms = waited.as_millis() as u64,
                    "Server exited before becoming ready"
                );
                drop(process);
                Ok(StartOutcome::NotReady {
                    waited,
                    exited: true,
                })
            }
            Poll::Exhausted => {
                let waited = process.uptime();
                tracing::warn!(
                    framework = %framework.name,
                    attempts = self.max_attempts(),
                    waited_ms = waited.as_millis() as u64,
                    "Server did not become ready"
                );
                if let Err(e) = self.stop(process).await {
                    tracing::warn!(framework = %framework.name, error = %e, "Stop after not-ready failed");
                }
                Ok(StartOutcome::NotReady {
                    waited,
                    exited: false,
                })
            }
        }
    }

    async fn poll_health(&self, process: &mut ServerProcess, health_url: &str) -> Poll {
        for attempt in 0..self.max_attempts() {
            if !process.is_running() {
                return Poll::Exited;
            }

            if self.is_healthy(health_url).await {
                return Poll::Healthy;
            }

            tracing::trace!(attempt, url = health_url, "Health check pending");
            tokio::time::sleep(self.poll_interval).await;
        }
        Poll::Exhausted
    }

    /// Single health probe. Any success status counts as healthy.
    pub async fn is_healthy(&self, health_url: &str) -> bool {
        match self.client.get(health_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Stop a server: SIGTERM, wait up to the stop timeout, then SIGKILL.
    pub async fn stop(&self, mut process: ServerProcess) -> Result<StopOutcome, LifecycleError> {
        let pid = process.pid();

        if !process.is_running() {
            let _ = process.child.wait();
            return Ok(StopOutcome::AlreadyExited);
        }

        let raw_pid = i32::try_from(pid.value()).map_err(|e| LifecycleError::SignalFailed {
            pid: pid.value(),
            reason: e.to_string(),
        })?;

        match signal::kill(Pid::from_raw(raw_pid), Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(StopOutcome::AlreadyExited),
            Err(e) => {
                return Err(LifecycleError::SignalFailed {
                    pid: pid.value(),
                    reason: e.to_string(),
                })
            }
        }

        let deadline = Instant::now() + self.stop_timeout;
        while Instant::now() < deadline {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(framework = %process.framework, pid = %pid, %status, "Server stopped");
                    return Ok(StopOutcome::Graceful);
                }
                Ok(None) => tokio::time::sleep(EXIT_POLL_INTERVAL).await,
                Err(e) => {
                    return Err(LifecycleError::WaitFailed {
                        pid: pid.value(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        tracing::warn!(
            framework = %process.framework,
            pid = %pid,
            timeout_ms = self.stop_timeout.as_millis() as u64,
            "Server ignored SIGTERM, sending SIGKILL"
        );
        process
            .child
            .kill()
            .map_err(|e| LifecycleError::SignalFailed {
                pid: pid.value(),
                reason: e.to_string(),
            })?;
        process
            .child
            .wait()
            .map_err(|e| LifecycleError::WaitFailed {
                pid: pid.value(),
                reason: e.to_string(),
            })?;

        Ok(StopOutcome::Forced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::types::Port;

    fn harness(max_wait_ms: u64) -> HarnessConfig {
        HarnessConfig {
            poll_interval: Duration::from_millis(20),
            max_wait: Duration::from_millis(max_wait_ms),
            health_timeout: Duration::from_millis(50),
            stop_timeout: Duration::from_millis(300),
            ..HarnessConfig::default()
        }
    }

    fn framework(command: &str, args: &[&str], port: u16) -> FrameworkConfig {
        FrameworkConfig {
            name: FrameworkName::new("test-server").unwrap(),
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: HashMap::new(),
            port: Port::new(port).unwrap(),
            health_path: "/health".to_string(),
            artifact: None,
            profile: None,
        }
    }

    fn unused_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn test_max_attempts_rounds_up() {
        let mut config = harness(5000);
        config.poll_interval = Duration::from_millis(100);
        assert_eq!(LifecycleManager::new(&config).unwrap().max_attempts(), 50);

        config.max_wait = Duration::from_millis(250);
        assert_eq!(LifecycleManager::new(&config).unwrap().max_attempts(), 3);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_error() {
        let manager = LifecycleManager::new(&harness(100)).unwrap();
        let result = manager
            .start_and_wait(&framework("/nonexistent/server-binary", &[], 9))
            .await;
        assert!(matches!(result, Err(LifecycleError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn test_never_healthy_is_not_ready_within_budget() {
        let manager = LifecycleManager::new(&harness(200)).unwrap();
        let started = Instant::now();
        let outcome = manager
            .start_and_wait(&framework("sleep", &["30"], unused_port()))
            .await
            .unwrap();

        assert!(matches!(outcome, StartOutcome::NotReady { exited: false, .. }));
        // budget plus one probe timeout plus graceful stop, with headroom
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_exit_during_polling_is_not_ready() {
        let manager = LifecycleManager::new(&harness(2000)).unwrap();
        let started = Instant::now();
        let outcome = manager
            .start_and_wait(&framework("true", &[], unused_port()))
            .await
            .unwrap();

        assert!(matches!(outcome, StartOutcome::NotReady { exited: true, .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_stop_graceful() {
        let manager = LifecycleManager::new(&harness(100)).unwrap();
        let process = manager.spawn(&framework("sleep", &["30"], 9)).unwrap();
        assert_eq!(manager.stop(process).await.unwrap(), StopOutcome::Graceful);
    }

    #[tokio::test]
    async fn test_stop_escalates_to_kill() {
        let manager = LifecycleManager::new(&harness(100)).unwrap();
        let process = manager
            .spawn(&framework(
                "sh",
                &["-c", "trap '' TERM; while true; do sleep 0.05; done"],
                9,
            ))
            .unwrap();
        // let the shell install its trap
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(manager.stop(process).await.unwrap(), StopOutcome::Forced);
    }

    #[tokio::test]
    async fn test_stop_already_exited() {
        let manager = LifecycleManager::new(&harness(100)).unwrap();
        let process = manager.spawn(&framework("true", &[], 9)).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            manager.stop(process).await.unwrap(),
            StopOutcome::AlreadyExited
        );
    }

    #[test]
    fn test_drop_kills_process() {
        let manager = LifecycleManager::new(&harness(100)).unwrap();
        let process = manager.spawn(&framework("sleep", &["30"], 9)).unwrap();
        let pid = process.pid().value() as i32;
        drop(process);
        // reaped: signalling the pid no longer reaches our child
        assert!(signal::kill(Pid::from_raw(pid), None).is_err());
    }
}
