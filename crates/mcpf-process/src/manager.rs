// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subprocess lifecycle: spawn, supervise, and tear down MCP servers run
//! over the stdio transport.

use crate::config::ProcessConfig;
use crate::error::ProcessError;
use crate::handle::ProcessHandle;
use crate::watchdog::Watchdog;
use chrono::Utc;
use mcpf_core::ProcessStatus;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::AtomicI64;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Owns the set of currently-spawned child processes and their watchdog.
pub struct ProcessManager {
    watchdog: Watchdog,
    processes: Mutex<HashMap<u32, ProcessHandle>>,
}

/// Counts of tracked processes by status, as returned by [`ProcessManager::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Total processes currently tracked, live or terminal.
    pub total: usize,
    /// Still running.
    pub running: usize,
    /// Exited on their own.
    pub exited: usize,
    /// Terminated by the manager or watchdog.
    pub killed: usize,
    /// Failed to spawn or could not be waited on.
    pub failed: usize,
}

/// A signal `ProcessManager::signal` can send to a managed process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Graceful termination request.
    Term,
    /// Forced termination.
    Kill,
    /// Interrupt, as if from a controlling terminal.
    Interrupt,
}

impl ProcessManager {
    /// Build a manager with a running watchdog.
    pub fn new() -> Self {
        Self { watchdog: Watchdog::spawn(), processes: Mutex::new(HashMap::new()) }
    }

    /// Spawn a new managed process. On POSIX this starts a new process
    /// group so [`stop`](Self::stop) can signal the whole tree.
    pub async fn start(&self, config: ProcessConfig) -> Result<ProcessHandle, ProcessError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }
        if !config.inherit_env {
            cmd.env_clear();
        }
        for (k, v) in &config.env {
            cmd.env(k, v);
        }

        #[cfg(unix)]
        {
            // Detach into its own process group so `stop` can signal the
            // whole tree a misbehaving server might have spawned.
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: config.command.clone(),
            source,
        })?;
        let pid = child.id().ok_or(ProcessError::NotRunning { pid: 0 })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::Stdin(std::io::Error::other("stdin unavailable")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::Stdout(std::io::Error::other("stdout unavailable")))?;

        if let Some(stderr) = child.stderr.take() {
            let command = config.command.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr);
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            let trimmed = line.trim_end();
                            if !trimmed.is_empty() {
                                warn!(target: "mcpf.process.stderr", %command, "{trimmed}");
                            }
                        }
                    }
                }
            });
        }

        let handle = ProcessHandle {
            pid,
            started_at: Utc::now(),
            status: Arc::new(Mutex::new(ProcessStatus::Running)),
            last_activity_unix_ms: Arc::new(AtomicI64::new(Utc::now().timestamp_millis())),
            child: Arc::new(AsyncMutex::new(child)),
            stdin: Arc::new(AsyncMutex::new(stdin)),
            stdout: Arc::new(AsyncMutex::new(BufReader::new(stdout))),
        };

        self.processes.lock().expect("registry mutex poisoned").insert(pid, handle.clone());
        self.watchdog.register(handle.clone(), &config);
        Ok(handle)
    }

    /// Stop a process: TERM the process group, wait up to `grace_period`,
    /// then escalate to KILL. Idempotent — stopping an already-exited
    /// process returns success. Removes the process from [`list`](Self::list)
    /// once it reaches a terminal state.
    pub async fn stop(&self, handle: &ProcessHandle, grace_period: Duration) -> Result<(), ProcessError> {
        if handle.status().is_terminal() {
            self.forget(handle.pid());
            return Ok(());
        }

        send_signal(handle.pid(), SignalKind::Term);

        let child = handle.child();
        let waited = tokio::time::timeout(grace_period, async {
            let mut guard = child.lock().await;
            guard.wait().await
        })
        .await;

        let result = match waited {
            Ok(Ok(status)) => {
                handle.set_status(ProcessStatus::Exited { code: status.code() });
                Ok(())
            }
            Ok(Err(source)) => Err(ProcessError::Wait(source)),
            Err(_elapsed) => {
                send_signal(handle.pid(), SignalKind::Kill);
                let mut guard = child.lock().await;
                match guard.wait().await {
                    Ok(status) => {
                        handle.set_status(ProcessStatus::Killed);
                        let _ = status;
                        Ok(())
                    }
                    Err(_) => Err(ProcessError::StopTimedOut {
                        pid: handle.pid(),
                        grace_ms: grace_period.as_millis() as u64,
                    }),
                }
            }
        };

        self.forget(handle.pid());
        result
    }

    /// Send `kind` to the process group of a currently tracked process.
    /// Best-effort outside POSIX. Returns [`ProcessError::NotRunning`] if
    /// `pid` is not tracked.
    pub fn signal(&self, pid: u32, kind: SignalKind) -> Result<(), ProcessError> {
        if !self.processes.lock().expect("registry mutex poisoned").contains_key(&pid) {
            return Err(ProcessError::NotRunning { pid });
        }
        send_signal(pid, kind);
        Ok(())
    }

    /// Current status of a tracked process, if it is still tracked.
    pub fn status(&self, pid: u32) -> Option<ProcessStatus> {
        self.processes.lock().expect("registry mutex poisoned").get(&pid).map(ProcessHandle::status)
    }

    /// Every currently tracked process handle, live or terminal.
    pub fn list(&self) -> Vec<ProcessHandle> {
        self.processes.lock().expect("registry mutex poisoned").values().cloned().collect()
    }

    /// Counts of tracked processes by status.
    pub fn stats(&self) -> ProcessStats {
        let processes = self.processes.lock().expect("registry mutex poisoned");
        let mut stats = ProcessStats { total: processes.len(), ..ProcessStats::default() };
        for handle in processes.values() {
            match handle.status() {
                ProcessStatus::Running => stats.running += 1,
                ProcessStatus::Exited { .. } => stats.exited += 1,
                ProcessStatus::Killed => stats.killed += 1,
                ProcessStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Stop every tracked process with `grace_period`, then stop the
    /// watchdog. No process remains in [`list`](Self::list) after this
    /// returns.
    pub async fn shutdown(&self, grace_period: Duration) {
        for handle in self.list() {
            if let Err(err) = self.stop(&handle, grace_period).await {
                warn!(target: "mcpf.process.manager", pid = handle.pid(), %err, "process did not stop cleanly during shutdown");
            }
        }
        self.watchdog.shutdown().await;
        self.processes.lock().expect("registry mutex poisoned").clear();
    }

    fn forget(&self, pid: u32) {
        self.processes.lock().expect("registry mutex poisoned").remove(&pid);
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
pub(crate) fn send_signal(pid: u32, signal: SignalKind) {
    let sig = match signal {
        SignalKind::Term => libc::SIGTERM,
        SignalKind::Kill => libc::SIGKILL,
        SignalKind::Interrupt => libc::SIGINT,
    };
    // Negative pid targets the whole process group created by
    // `process_group(0)` at spawn time.
    let group = -(pid as i32);
    // SAFETY: `pid` was returned by a successful `Command::spawn` on this
    // manager and the group was created by that same spawn; signalling a
    // process group we own has no memory-safety implications.
    unsafe {
        libc::kill(group, sig);
    }
}

#[cfg(not(unix))]
pub(crate) fn send_signal(_pid: u32, _signal: SignalKind) {
    // No portable process-group signal outside POSIX; `stop` falls back to
    // the grace-period wait and then `Child::kill()` via the caller's retry.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_is_idempotent_on_an_already_exited_process() {
        let manager = ProcessManager::new();
        let handle = manager
            .start(ProcessConfig::new("true"))
            .await
            .expect("spawn `true`");
        tokio::time::sleep(Duration::from_millis(200)).await;
        manager.stop(&handle, Duration::from_secs(1)).await.expect("stop");
        manager.stop(&handle, Duration::from_secs(1)).await.expect("second stop is a no-op");
    }

    #[tokio::test]
    async fn stop_removes_the_process_from_list() {
        let manager = ProcessManager::new();
        let handle = manager.start(ProcessConfig::new("true")).await.expect("spawn `true`");
        assert_eq!(manager.list().len(), 1);

        manager.stop(&handle, Duration::from_secs(1)).await.expect("stop");

        assert!(manager.list().is_empty());
        assert!(manager.status(handle.pid()).is_none());
    }

    #[tokio::test]
    async fn stats_counts_tracked_processes_by_status() {
        let manager = ProcessManager::new();
        let handle = manager.start(ProcessConfig::new("sleep").with_args(["2"])).await.expect("spawn sleep");

        let stats = manager.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.running, 1);

        manager.stop(&handle, Duration::from_secs(1)).await.expect("stop");
        assert_eq!(manager.stats().total, 0);
    }

    #[tokio::test]
    async fn signal_on_an_untracked_pid_is_not_running() {
        let manager = ProcessManager::new();
        let err = manager.signal(999_999, SignalKind::Term).expect_err("pid was never started");
        assert!(matches!(err, ProcessError::NotRunning { pid } if pid == 999_999));
    }

    #[tokio::test]
    async fn shutdown_stops_every_tracked_process_and_empties_list() {
        let manager = ProcessManager::new();
        manager.start(ProcessConfig::new("sleep").with_args(["5"])).await.expect("spawn sleep");
        manager.start(ProcessConfig::new("sleep").with_args(["5"])).await.expect("spawn sleep");
        assert_eq!(manager.list().len(), 2);

        manager.shutdown(Duration::from_secs(1)).await;

        assert!(manager.list().is_empty());
    }
}
