//! Bounded registry of in-flight background process ids.
//!
//! The registry is a fixed-capacity ring: once 200 pids have been
//! registered the write cursor wraps to slot 0 and overwrites the oldest
//! entry whether or not it was reaped. An overwritten pid is simply never
//! reaped by this interpreter. The registry never grows past its fixed
//! footprint.

use crate::command::{LastStatus, translate_exit_code};
use anyhow::Result;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::io::Write;

/// Number of ring slots; registration wraps past this count.
pub const JOB_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy)]
struct Slot {
    pid: Pid,
    reaped: bool,
}

/// Fixed-capacity FIFO-overwrite table of background children.
///
/// Accessed only from the single interpreter thread: appended to on
/// launch, updated in place on reap.
#[derive(Debug, Default)]
pub struct JobTable {
    slots: Vec<Slot>,
    cursor: usize,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
        }
    }

    /// Record a freshly launched background pid at the write cursor,
    /// overwriting the oldest slot once the ring is full.
    pub fn register(&mut self, pid: Pid) {
        let slot = Slot { pid, reaped: false };
        if self.slots.len() < JOB_CAPACITY {
            self.slots.push(slot);
        } else {
            log::debug!("job ring full, overwriting slot {}", self.cursor);
            self.slots[self.cursor] = slot;
        }
        self.cursor = (self.cursor + 1) % JOB_CAPACITY;
    }

    /// Non-blocking completion check over every unreaped slot.
    ///
    /// Each completed child gets a one-line notice on `out` and updates
    /// the exit-status record; children still running are left registered
    /// for a later pass. A reaped pid never re-triggers a notice.
    pub fn reap_all(&mut self, out: &mut dyn Write, status: &mut LastStatus) -> Result<()> {
        let mut printed = false;
        for slot in self.slots.iter_mut().filter(|s| !s.reaped) {
            match waitpid(slot.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => {}
                Ok(WaitStatus::Exited(pid, code)) => {
                    writeln!(out, "Background pid {pid} is done: exit value {code}")?;
                    let (record, extra) = translate_exit_code(code);
                    if let Some(message) = extra {
                        writeln!(out, "{message}")?;
                    }
                    *status = record;
                    slot.reaped = true;
                    printed = true;
                }
                Ok(WaitStatus::Signaled(pid, signal, _)) => {
                    writeln!(
                        out,
                        "Background pid {pid} is done: terminated by signal {}",
                        signal as i32
                    )?;
                    *status = LastStatus::Signaled(signal as i32);
                    slot.reaped = true;
                    printed = true;
                }
                Ok(_) => {}
                Err(Errno::ECHILD) => {
                    // already collected elsewhere; retire the slot quietly
                    slot.reaped = true;
                }
                Err(err) => {
                    log::warn!("waitpid on background pid {} failed: {err}", slot.pid);
                    slot.reaped = true;
                }
            }
        }
        if printed {
            out.flush()?;
        }
        Ok(())
    }

    /// Best-effort SIGKILL sweep over every registered pid, reaped or not.
    /// Used only by the `exit` built-in; the kill is sent, not waited on.
    pub fn kill_all(&self) {
        for slot in &self.slots {
            if let Err(err) = kill(slot.pid, Signal::SIGKILL) {
                log::debug!("kill {} on exit: {err}", slot.pid);
            }
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Pid stored at a ring slot, if the slot is occupied.
    pub fn pid_at(&self, index: usize) -> Option<Pid> {
        self.slots.get(index).map(|slot| slot.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::thread;
    use std::time::Duration;

    fn fake_pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn test_register_fills_consecutive_slots() {
        let mut jobs = JobTable::new();
        for i in 0..5 {
            jobs.register(fake_pid(500_000 + i));
        }
        assert_eq!(jobs.len(), 5);
        for i in 0..5 {
            assert_eq!(jobs.pid_at(i as usize), Some(fake_pid(500_000 + i)));
        }
    }

    #[test]
    fn test_register_wraps_to_slot_zero_at_capacity() {
        let mut jobs = JobTable::new();
        for i in 0..JOB_CAPACITY as i32 {
            jobs.register(fake_pid(600_000 + i));
        }
        assert_eq!(jobs.len(), JOB_CAPACITY);
        assert_eq!(jobs.pid_at(0), Some(fake_pid(600_000)));

        // the 201st registration overwrites the first, not a new slot
        jobs.register(fake_pid(700_000));
        assert_eq!(jobs.len(), JOB_CAPACITY);
        assert_eq!(jobs.pid_at(0), Some(fake_pid(700_000)));
        assert_eq!(jobs.pid_at(1), Some(fake_pid(600_001)));
    }

    #[test]
    fn test_reap_reports_completed_child_once() {
        let child = Command::new("true").spawn().expect("spawn true");
        let pid = Pid::from_raw(child.id() as i32);

        let mut jobs = JobTable::new();
        jobs.register(pid);

        let mut status = LastStatus::Signaled(9);
        let mut out = Vec::new();
        // the child needs a moment to exit; poll like the prompt loop does
        for _ in 0..50 {
            jobs.reap_all(&mut out, &mut status).unwrap();
            if !out.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("Background pid {pid} is done: exit value 0\n"));
        assert_eq!(status, LastStatus::Exited(0));

        // a second pass must stay silent for the already-reaped pid
        let mut out = Vec::new();
        jobs.reap_all(&mut out, &mut status).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_reap_leaves_running_child_registered() {
        let mut child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let pid = Pid::from_raw(child.id() as i32);

        let mut jobs = JobTable::new();
        jobs.register(pid);

        let mut status = LastStatus::default();
        let mut out = Vec::new();
        jobs.reap_all(&mut out, &mut status).unwrap();
        assert!(out.is_empty());
        assert_eq!(status, LastStatus::default());

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_kill_all_terminates_registered_children() {
        let first = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let second = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let pids = [
            Pid::from_raw(first.id() as i32),
            Pid::from_raw(second.id() as i32),
        ];

        let mut jobs = JobTable::new();
        for pid in pids {
            jobs.register(pid);
        }
        jobs.kill_all();

        for pid in pids {
            match waitpid(pid, None).expect("waitpid after kill_all") {
                WaitStatus::Signaled(_, signal, _) => assert_eq!(signal, Signal::SIGKILL),
                other => panic!("expected SIGKILL termination, got {other:?}"),
            }
        }
    }
}
