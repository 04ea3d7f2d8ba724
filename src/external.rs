//! Launches non-built-in commands via fork + execvp.
//!
//! The child applies the redirection plan and its signal dispositions,
//! then replaces itself with the target program; failures on the child
//! side never propagate as interpreter errors — they travel back as the
//! reserved exit codes and are decoded into the exit-status record here.

use crate::command::{
    CommandFactory, CommandSpec, EXEC_FAILED, ExecutableCommand, ExitCode, LastStatus,
    REDIRECT_FAILED, translate_exit_code,
};
use crate::interpreter::Factory;
use crate::session::Session;
use crate::signal;
use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{SigHandler, Signal, signal as set_signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, dup2, execvp, fork};
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::{IntoRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::process;

const STDIN_FD: RawFd = 0;
const STDOUT_FD: RawFd = 1;

/// Command that is not a builtin.
pub struct ExternalCommand {
    spec: CommandSpec,
}

impl ExternalCommand {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    /// The launcher accepts any command name: "command not found" is only
    /// detected after the exec attempt fails in the child.
    fn try_create(
        &self,
        _session: &Session,
        spec: &CommandSpec,
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(spec.clone())))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        log::debug!(
            "launching {:?} (background: {})",
            self.spec.argv[0],
            self.spec.background
        );
        match unsafe { fork() } {
            Ok(ForkResult::Child) => exec_child(&self.spec),
            Ok(ForkResult::Parent { child }) => {
                if self.spec.background {
                    launch_background(child, stdout, session)
                } else {
                    wait_foreground(child, stdout, session)
                }
            }
            Err(err) => {
                // no child exists to carry the error; this is fatal
                eprintln!("minish: fork failed: {err}");
                process::exit(1);
            }
        }
    }
}

/// Child side: wire redirections and signal dispositions, then replace the
/// program image. Never returns to the interpreter's control flow.
fn exec_child(spec: &CommandSpec) -> ! {
    // the child is not shielded from job suspension
    let _ = unsafe { set_signal(Signal::SIGTSTP, SigHandler::SigDfl) };

    match &spec.input {
        Some(path) => match File::open(path) {
            Ok(file) => wire_or_die(file.into_raw_fd(), STDIN_FD),
            Err(_) => process::exit(REDIRECT_FAILED),
        },
        None if spec.background => {
            // background children must not read the terminal
            if let Ok(file) = File::open("/dev/null") {
                let _ = dup2(file.into_raw_fd(), STDIN_FD);
            }
        }
        None => {}
    }

    match &spec.output {
        Some(path) => {
            let opened = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o640)
                .open(path);
            match opened {
                Ok(file) => wire_or_die(file.into_raw_fd(), STDOUT_FD),
                Err(_) => process::exit(REDIRECT_FAILED),
            }
        }
        None if spec.background => {
            if let Ok(file) = OpenOptions::new().write(true).open("/dev/null") {
                let _ = dup2(file.into_raw_fd(), STDOUT_FD);
            }
        }
        None => {}
    }

    // only a foreground child may be interrupted interactively
    if !spec.background {
        let _ = unsafe { set_signal(Signal::SIGINT, SigHandler::SigDfl) };
    }

    let argv: Vec<CString> = match spec
        .argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect()
    {
        Ok(argv) => argv,
        Err(_) => process::exit(EXEC_FAILED),
    };
    let _ = execvp(&argv[0], &argv);
    process::exit(EXEC_FAILED);
}

fn wire_or_die(from: RawFd, to: RawFd) {
    if dup2(from, to).is_err() {
        process::exit(REDIRECT_FAILED);
    }
}

/// Parent side of a background launch: register, announce, and perform one
/// non-blocking check without holding up the prompt loop.
fn launch_background(
    child: Pid,
    out: &mut dyn Write,
    session: &mut Session,
) -> Result<ExitCode> {
    session.jobs.register(child);
    writeln!(out, "Running child {child} in background")?;
    out.flush()?;
    let _ = waitpid(child, Some(WaitPidFlag::WNOHANG));
    Ok(0)
}

/// Parent side of a foreground launch: block until this child completes,
/// apply any mode toggle that arrived during the wait, then translate the
/// outcome into the exit-status record.
fn wait_foreground(child: Pid, out: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
    let status = loop {
        match waitpid(child, None) {
            Ok(status) => break status,
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err).with_context(|| format!("waiting for pid {child}")),
        }
    };

    if signal::take_pending() {
        session.toggle_foreground_only(out)?;
    }

    match status {
        WaitStatus::Exited(_, code) => {
            let (record, extra) = translate_exit_code(code);
            if let Some(message) = extra {
                writeln!(out, "{message}")?;
                out.flush()?;
            }
            session.status = record;
            Ok(code)
        }
        WaitStatus::Signaled(pid, sig, _) => {
            let signo = sig as i32;
            writeln!(out, "\nChild process {pid} terminated by signal {signo}")?;
            out.flush()?;
            session.status = LastStatus::Signaled(signo);
            Ok(128 + signo)
        }
        other => {
            log::warn!("unexpected wait status for pid {child}: {other:?}");
            Ok(0)
        }
    }
}
