use crate::session::Session;
use anyhow::Result;
use std::fmt;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit code a child reserves for "the program could not be exec'd".
pub const EXEC_FAILED: ExitCode = 2;

/// Exit code a child reserves for "a redirection target could not be opened".
pub const REDIRECT_FAILED: ExitCode = 3;

/// A fully planned command line: the cleaned argument vector, the resolved
/// redirection targets and whether the command should run in the background.
///
/// Produced by [`crate::parser::plan_command`] from the token sequence and
/// consumed by the dispatcher and the process launcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name followed by its arguments, redirection tokens removed.
    pub argv: Vec<String>,
    /// Input redirection path, if a `<` operator was consumed.
    pub input: Option<String>,
    /// Output redirection path, if a `>` operator was consumed.
    pub output: Option<String>,
    /// True when the line ended in a standalone `&` and foreground-only
    /// mode was off at the time the line was read.
    pub background: bool,
}

/// The mutable exit-status record kept across commands.
///
/// Updated after every foreground completion and after every background
/// completion observed during reaping; printed verbatim by the `status`
/// built-in. Background launches never touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastStatus {
    /// The child exited normally with the given (already translated) code.
    Exited(i32),
    /// The child was terminated by the given signal number.
    Signaled(i32),
}

impl Default for LastStatus {
    fn default() -> Self {
        LastStatus::Exited(0)
    }
}

impl fmt::Display for LastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastStatus::Exited(code) => write!(f, "exit value {code}"),
            LastStatus::Signaled(signo) => write!(f, "Terminated by signal {signo}"),
        }
    }
}

/// Translate a child's normal exit code into the record value plus the
/// extra diagnostic line the interpreter owes the user, decoding the
/// reserved child-to-parent exit codes on the way.
///
/// Codes other than 1, [`EXEC_FAILED`] and [`REDIRECT_FAILED`] collapse to
/// `exit value 0`.
pub fn translate_exit_code(code: i32) -> (LastStatus, Option<&'static str>) {
    match code {
        1 => (LastStatus::Exited(1), None),
        EXEC_FAILED => (LastStatus::Exited(1), Some("Command not recognized.")),
        REDIRECT_FAILED => (LastStatus::Exited(1), Some("File not found.")),
        _ => (LastStatus::Exited(0), None),
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by the external
/// process launcher.
pub trait ExecutableCommand {
    /// Executes the command. Interpreter-visible output (notices,
    /// diagnostics, built-in output) goes through `stdout`; a launched
    /// child writes to the real file descriptors it inherits.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a planned command line.
///
/// Returns `None` when the factory doesn't recognize `spec.argv[0]`; the
/// external launcher factory recognizes everything, so it goes last.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided spec.
    fn try_create(
        &self,
        session: &Session,
        spec: &CommandSpec,
    ) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_record_rendering() {
        assert_eq!(LastStatus::default().to_string(), "exit value 0");
        assert_eq!(LastStatus::Exited(1).to_string(), "exit value 1");
        assert_eq!(LastStatus::Signaled(15).to_string(), "Terminated by signal 15");
    }

    #[test]
    fn test_translate_plain_codes() {
        assert_eq!(translate_exit_code(0), (LastStatus::Exited(0), None));
        assert_eq!(translate_exit_code(1), (LastStatus::Exited(1), None));
        // codes outside the reserved protocol collapse to success
        assert_eq!(translate_exit_code(7), (LastStatus::Exited(0), None));
        assert_eq!(translate_exit_code(255), (LastStatus::Exited(0), None));
    }

    #[test]
    fn test_translate_reserved_codes() {
        let (record, extra) = translate_exit_code(EXEC_FAILED);
        assert_eq!(record, LastStatus::Exited(1));
        assert_eq!(extra, Some("Command not recognized."));

        let (record, extra) = translate_exit_code(REDIRECT_FAILED);
        assert_eq!(record, LastStatus::Exited(1));
        assert_eq!(extra, Some("File not found."));
    }
}
