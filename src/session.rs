//! Per-session interpreter state.

use crate::command::LastStatus;
use crate::jobs::JobTable;
use anyhow::Result;
use nix::unistd::{Pid, getpid};
use std::io::Write;

/// Mutable state owned by one interactive session.
///
/// Passed explicitly between the dispatcher, the launcher and the job
/// tracker rather than living in globals; only the signal-pending flag is
/// process-wide (see [`crate::signal`]).
#[derive(Debug)]
pub struct Session {
    /// The interpreter's own pid, captured once at startup and reused for
    /// every `$$` expansion.
    pub pid: Pid,
    /// Exit-status record of the most recently completed command.
    pub status: LastStatus,
    /// When on, trailing `&` markers are stripped but ignored.
    pub foreground_only: bool,
    /// Registry of in-flight background children.
    pub jobs: JobTable,
    /// Set by the `exit` built-in (and end-of-input) to stop the loop.
    pub should_exit: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            pid: getpid(),
            status: LastStatus::default(),
            foreground_only: false,
            jobs: JobTable::new(),
            should_exit: false,
        }
    }

    /// Flip foreground-only mode and print the fixed notice for the new
    /// state. Called only after [`crate::signal::take_pending`] returned
    /// true at a consult point.
    pub fn toggle_foreground_only(&mut self, out: &mut dyn Write) -> Result<()> {
        self.foreground_only = !self.foreground_only;
        if self.foreground_only {
            writeln!(out, "\nForeground-only mode now on (& is now ignored)")?;
        } else {
            writeln!(out, "\nForeground-only mode now off")?;
        }
        out.flush()?;
        log::debug!("foreground-only mode: {}", self.foreground_only);
        Ok(())
    }

    /// One non-blocking reap pass over the background registry, run at the
    /// top of every prompt cycle.
    pub fn reap_jobs(&mut self, out: &mut dyn Write) -> Result<()> {
        let Session { jobs, status, .. } = self;
        jobs.reap_all(out, status)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
