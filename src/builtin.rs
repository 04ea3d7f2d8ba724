use crate::command::{CommandFactory, CommandSpec, ExecutableCommand, ExitCode};
use crate::interpreter::Factory;
use crate::session::Session;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without forking. They always run in the foreground:
/// a trailing `&` on a built-in line has already been stripped and is
/// ignored. Builtins never touch the exit-status record.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "status".
    fn name() -> &'static str;

    /// Executes the command against the session state.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero
    /// for error.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, session) {
            Ok(code) => Ok(code),
            Err(e) => {
                writeln!(stdout, "{e}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _session: &Session,
        spec: &CommandSpec,
    ) -> Option<Box<dyn ExecutableCommand>> {
        if spec.argv[0] == T::name() {
            let args: Vec<&str> = spec.argv[1..].iter().map(String::as_str).collect();
            Some(match T::from_args(&[T::name()], &args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// End the session. Every still-registered background child is sent
/// SIGKILL first; the kill is best-effort and not waited on.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; exit takes no meaningful arguments.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        session.jobs.kill_all();
        session.should_exit = true;
        stdout.flush()?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// With no target, changes to the directory named by the HOME variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current
    /// directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) => PathBuf::from(t),
            None => match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home),
                None => {
                    writeln!(stdout, "cd: HOME not set")?;
                    return Ok(1);
                }
            },
        };
        if let Err(err) = std::env::set_current_dir(&target) {
            // reported but never fatal to the session
            writeln!(stdout, "cd: {}: {}", target.display(), err)?;
            return Ok(1);
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the exit status of the most recently completed command.
pub struct Status {
    #[argh(positional, greedy)]
    /// ignored; status takes no arguments.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        writeln!(stdout, "{}", session.status)?;
        stdout.flush()?;
        Ok(0)
    }
}
