// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background supervisor: reaps naturally-exited children, warns on and
//! escalates against hung ones, and kills ones that exceed their lifetime
//! cap.
//!
//! Holds only weak references to a process's shared state, so a caller that
//! drops every [`ProcessHandle`](crate::ProcessHandle) clone lets the
//! process (and the watchdog's own per-process task) unwind without the
//! watchdog pinning it alive.

use crate::config::ProcessConfig;
use crate::handle::ProcessHandle;
use crate::manager::{send_signal, SignalKind};
use chrono::{DateTime, Utc};
use mcpf_core::ProcessStatus;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Supervises registered processes for natural exit, lifetime overrun, and
/// idle hang, independent of the [`ProcessManager`](crate::ProcessManager)
/// API surface callers use to start/stop processes directly.
pub struct Watchdog {
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Watchdog {
    /// Start the watchdog with no processes registered yet.
    pub fn spawn() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { shutdown, tasks: Mutex::new(Vec::new()) }
    }

    /// Register a process for background supervision, polling on
    /// `config.check_interval`.
    ///
    /// Three idle thresholds escalate independently, each measured from
    /// `handle`'s last observed stdin write or stdout read:
    /// - past `process_timeout`: logs a warning once.
    /// - past `process_timeout + extra_buffer`, if `auto_kill`: sends TERM once.
    /// - past `max_hang_time`: sends KILL and marks the process `Killed`.
    pub fn register(&self, handle: ProcessHandle, config: &ProcessConfig) {
        let weak_child: Weak<AsyncMutex<Child>> = Arc::downgrade(&handle.child);
        let weak_status: Weak<Mutex<ProcessStatus>> = Arc::downgrade(&handle.status);
        let weak_activity: Weak<AtomicI64> = Arc::downgrade(&handle.last_activity_unix_ms);
        let pid = handle.pid();
        let started_at = handle.started_at();
        let max_lifetime = config.max_lifetime;
        let process_timeout = config.process_timeout;
        let term_at = config.process_timeout + config.extra_buffer;
        let auto_kill = config.auto_kill;
        let max_hang_time = config.max_hang_time;
        let check_interval = config.check_interval;
        let mut shutdown_rx = self.shutdown.subscribe();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            let mut warned = false;
            let mut term_sent = false;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            return;
                        }
                    }
                }

                let (Some(status_arc), Some(child_arc)) = (weak_status.upgrade(), weak_child.upgrade()) else {
                    debug!(target: "mcpf.process.watchdog", pid, "handle fully dropped, stopping watch");
                    return;
                };

                if status_arc.lock().expect("status mutex poisoned").is_terminal() {
                    return;
                }

                if let Ok(mut guard) = child_arc.try_lock() {
                    if let Ok(Some(exit_status)) = guard.try_wait() {
                        *status_arc.lock().expect("status mutex poisoned") =
                            ProcessStatus::Exited { code: exit_status.code() };
                        debug!(target: "mcpf.process.watchdog", pid, code = ?exit_status.code(), "process exited");
                        return;
                    }
                }

                if let Some(cap) = max_lifetime {
                    let elapsed = elapsed_since(started_at);
                    if elapsed > cap {
                        debug!(target: "mcpf.process.watchdog", pid, ?elapsed, "lifetime cap exceeded, killing");
                        kill_and_mark(&child_arc, &status_arc, pid).await;
                        return;
                    }
                }

                let Some(activity_arc) = weak_activity.upgrade() else {
                    continue;
                };
                let idle_ms = Utc::now().timestamp_millis() - activity_arc.load(Ordering::SeqCst);
                let idle = Duration::from_millis(idle_ms.max(0) as u64);

                if idle > max_hang_time {
                    debug!(target: "mcpf.process.watchdog", pid, ?idle, "max hang time exceeded, killing");
                    kill_and_mark(&child_arc, &status_arc, pid).await;
                    return;
                }

                if idle > term_at {
                    if auto_kill && !term_sent {
                        warn!(target: "mcpf.process.watchdog", pid, ?idle, "process hung past process_timeout+extra_buffer, sending TERM");
                        send_signal(pid, SignalKind::Term);
                        term_sent = true;
                    }
                } else if idle > process_timeout && !warned {
                    warn!(target: "mcpf.process.watchdog", pid, ?idle, "no activity past process_timeout, process may be hung");
                    warned = true;
                }
            }
        });

        self.tasks.lock().expect("tasks mutex poisoned").push(task);
    }

    /// Signal every registered task to stop and await them.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let tasks = std::mem::take(&mut *self.tasks.lock().expect("tasks mutex poisoned"));
        for task in tasks {
            let _ = task.await;
        }
    }
}

async fn kill_and_mark(child: &Arc<AsyncMutex<Child>>, status: &Arc<Mutex<ProcessStatus>>, pid: u32) {
    send_signal(pid, SignalKind::Kill);
    let mut guard = child.lock().await;
    let _ = guard.kill().await;
    *status.lock().expect("status mutex poisoned") = ProcessStatus::Killed;
}

fn elapsed_since(started_at: DateTime<Utc>) -> Duration {
    let ms = (Utc::now() - started_at).num_milliseconds().max(0);
    Duration::from_millis(ms as u64)
}
