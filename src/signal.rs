//! Signal plumbing for the foreground-only mode toggle.
//!
//! SIGTSTP can arrive at any point, including mid-output or while the
//! interpreter is blocked in a foreground wait, so the handler only
//! records a pending toggle in an atomic flag. The flag is consumed at
//! exactly two safe points: once per prompt cycle and immediately after a
//! foreground wait returns.

use anyhow::{Context, Result};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use std::sync::atomic::{AtomicBool, Ordering};

static MODE_TOGGLE_PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigtstp(_signo: libc::c_int) {
    // async-signal context: no output, no allocation, just the flag
    MODE_TOGGLE_PENDING.store(true, Ordering::SeqCst);
}

/// Install the interpreter's signal dispositions: SIGTSTP records the
/// pending toggle, SIGINT is ignored (foreground children restore the
/// default before exec). Failure here is a fatal startup error.
pub fn install() -> Result<()> {
    let toggle = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::empty(),
        SigSet::all(),
    );
    unsafe { sigaction(Signal::SIGTSTP, &toggle) }.context("installing SIGTSTP handler")?;

    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGINT, &ignore) }.context("ignoring SIGINT")?;
    Ok(())
}

/// Consume the pending toggle, returning whether one was recorded.
///
/// Edge-triggered: several deliveries between two consult points collapse
/// into a single toggle.
pub fn take_pending() -> bool {
    MODE_TOGGLE_PENDING.swap(false, Ordering::SeqCst)
}
