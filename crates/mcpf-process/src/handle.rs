// SPDX-License-Identifier: MIT OR Apache-2.0
//! A live, supervised child process.

use chrono::{DateTime, Utc};
use mcpf_core::ProcessStatus;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex as AsyncMutex;

/// A spawned, supervised child process with captured stdio pipes.
///
/// Cheaply cloneable: the underlying process and its pipes are owned by the
/// `Arc`-shared inner state, so every clone observes the same process.
pub struct ProcessHandle {
    pub(crate) pid: u32,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) status: Arc<Mutex<ProcessStatus>>,
    pub(crate) last_activity_unix_ms: Arc<AtomicI64>,
    pub(crate) child: Arc<AsyncMutex<Child>>,
    pub(crate) stdin: Arc<AsyncMutex<ChildStdin>>,
    pub(crate) stdout: Arc<AsyncMutex<BufReader<ChildStdout>>>,
}

impl ProcessHandle {
    /// OS process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// When this process was spawned.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current supervised status.
    pub fn status(&self) -> ProcessStatus {
        self.status.lock().expect("status mutex poisoned").clone()
    }

    /// Milliseconds since the last observed stdin write or stdout read.
    pub fn idle_for_ms(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        now - self.last_activity_unix_ms.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.last_activity_unix_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    /// Write one newline-terminated line to the child's stdin.
    pub async fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            stdin.write_all(b"\n").await?;
        }
        stdin.flush().await?;
        drop(stdin);
        self.touch();
        Ok(())
    }

    /// Read one line from the child's stdout, or `None` on EOF.
    pub async fn read_line(&self) -> std::io::Result<Option<String>> {
        let mut stdout = self.stdout.lock().await;
        let mut buf = String::new();
        let n = stdout.read_line(&mut buf).await?;
        drop(stdout);
        if n == 0 {
            return Ok(None);
        }
        self.touch();
        Ok(Some(buf.trim_end().to_string()))
    }

    /// Access the child for wait/kill operations (used by the manager).
    pub(crate) fn child(&self) -> Arc<AsyncMutex<Child>> {
        Arc::clone(&self.child)
    }

    /// Mark this handle's status as terminal, for use by the manager/watchdog.
    pub(crate) fn set_status(&self, status: ProcessStatus) {
        *self.status.lock().expect("status mutex poisoned") = status;
    }
}

impl Clone for ProcessHandle {
    fn clone(&self) -> Self {
        Self {
            pid: self.pid,
            started_at: self.started_at,
            status: Arc::clone(&self.status),
            last_activity_unix_ms: Arc::clone(&self.last_activity_unix_ms),
            child: Arc::clone(&self.child),
            stdin: Arc::clone(&self.stdin),
            stdout: Arc::clone(&self.stdout),
        }
    }
}
