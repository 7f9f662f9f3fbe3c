//! Run state for one spec-file execution.
//!
//! The skip-after-failure policy ("a test already failed in this file, so
//! skip the rest") lives here as an explicit object owned by the test-run
//! controller, not as process-wide mutable state. The controller feeds
//! lifecycle events in via [`RunState::observe`]; the hook that decides
//! whether to start the next test asks [`RunState::should_skip`]. Starting
//! a new spec file resets the flag.
//!
//! The run state also keeps a bounded ring buffer of the helper
//! operations performed (see [`action`](crate::action)) and appends each
//! record to a JSON Lines file, one file per run, under `~/.retap/logs/`
//! by default.
//!
//! # Example
//!
//! ```no_run
//! use retap::run::{RunEvent, RunState};
//!
//! let state = RunState::new();
//! state.observe(RunEvent::SpecStarted { name: "billing.positive".into() });
//! state.observe(RunEvent::TestFailed { name: "shows summary".into() });
//! assert!(state.should_skip());
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::action::ActionRecord;

/// Maximum number of action records retained in memory.
const MAX_ACTION_LOG_SIZE: usize = 1000;

/// Returns the retap data directory (`~/.retap`).
///
/// Falls back to a relative `.retap` when no home directory is known.
pub fn retap_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".retap"))
        .unwrap_or_else(|| PathBuf::from(".retap"))
}

/// Test lifecycle events fed to the run state by the test-run controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A new spec file started; resets the failure flag.
    SpecStarted {
        /// Name of the spec file.
        name: String,
    },

    /// A test within the current spec file started.
    TestStarted {
        /// Name of the test.
        name: String,
    },

    /// A test passed.
    TestPassed {
        /// Name of the test.
        name: String,
    },

    /// A test failed; subsequent tests in this spec file should be skipped.
    TestFailed {
        /// Name of the test.
        name: String,
    },

    /// A setup/teardown hook failed; same consequence as a test failure.
    HookFailed {
        /// Name of the hook.
        name: String,
    },
}

#[derive(Debug)]
struct Inner {
    spec: Option<String>,
    failed: bool,
    actions: VecDeque<ActionRecord>,
    writer: Option<BufWriter<File>>,
}

/// Explicit state for one spec-file run.
///
/// Cheap to share behind an `Arc`; all mutation goes through short
/// critical sections.
#[derive(Debug)]
pub struct RunState {
    id: Uuid,
    started_at: DateTime<Utc>,
    log_dir: PathBuf,
    inner: Mutex<Inner>,
}

impl RunState {
    /// New run state logging under the default directory (`~/.retap/logs`).
    pub fn new() -> Self {
        Self::new_with_log_dir(retap_dir().join("logs"))
    }

    /// New run state logging under an explicit directory.
    ///
    /// Tests use this to avoid polluting `~/.retap/logs`.
    pub fn new_with_log_dir(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            log_dir: log_dir.into(),
            inner: Mutex::new(Inner {
                spec: None,
                failed: false,
                actions: VecDeque::new(),
                writer: None,
            }),
        }
    }

    /// Unique identifier for this run.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this run state was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The spec file currently executing, if any.
    pub fn current_spec(&self) -> Option<String> {
        self.inner.lock().unwrap().spec.clone()
    }

    /// Whether the remaining tests of the current spec file should be
    /// skipped because an earlier test or hook failed.
    pub fn should_skip(&self) -> bool {
        self.inner.lock().unwrap().failed
    }

    /// Feed a lifecycle event into the run state.
    pub fn observe(&self, event: RunEvent) {
        let mut inner = self.inner.lock().unwrap();
        match event {
            RunEvent::SpecStarted { name } => {
                debug!(spec = %name, "spec started, resetting failure flag");
                inner.spec = Some(name);
                inner.failed = false;
            }
            RunEvent::TestFailed { name } | RunEvent::HookFailed { name } => {
                debug!(test = %name, "failure observed, subsequent tests will skip");
                inner.failed = true;
            }
            RunEvent::TestStarted { .. } | RunEvent::TestPassed { .. } => {}
        }
    }

    /// Record a helper operation.
    ///
    /// The record joins the in-memory ring buffer (oldest entries drop
    /// once the buffer is full) and is appended to the JSON Lines run
    /// log. Log I/O failures are reported via tracing and otherwise
    /// ignored; losing a log line must not fail a test step.
    pub fn record_action(&self, record: ActionRecord) {
        let mut inner = self.inner.lock().unwrap();

        if inner.actions.len() >= MAX_ACTION_LOG_SIZE {
            inner.actions.pop_front();
        }
        inner.actions.push_back(record.clone());

        if inner.writer.is_none() {
            inner.writer = self.open_log();
        }
        if let Some(writer) = inner.writer.as_mut() {
            if let Err(err) = write_line(writer, &record) {
                warn!(error = %err, "failed to append action to run log");
                inner.writer = None;
            }
        }
    }

    /// Snapshot of the recorded actions, oldest first.
    pub fn actions(&self) -> Vec<ActionRecord> {
        self.inner.lock().unwrap().actions.iter().cloned().collect()
    }

    /// Path of this run's JSON Lines log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.jsonl", self.id))
    }

    fn open_log(&self) -> Option<BufWriter<File>> {
        if let Err(err) = std::fs::create_dir_all(&self.log_dir) {
            warn!(error = %err, dir = %self.log_dir.display(), "cannot create run log directory");
            return None;
        }
        match File::create(self.log_path()) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(err) => {
                warn!(error = %err, "cannot create run log file");
                None
            }
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

fn write_line(writer: &mut BufWriter<File>, record: &ActionRecord) -> std::io::Result<()> {
    let json = serde_json::to_string(record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")?;
    writer.flush()
}

/// Read back a JSON Lines run log.
///
/// Intended for tooling and tests inspecting a finished run.
pub fn read_log(path: &Path) -> std::io::Result<Vec<ActionRecord>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
        .collect()
}
