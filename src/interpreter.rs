use crate::builtin::{Cd, Exit, Status};
use crate::command::{CommandFactory, CommandSpec, ExitCode};
use crate::external::ExternalCommand;
use crate::lexer::{self, MAX_LINE, ParsedLine};
use crate::parser;
use crate::session::Session;
use crate::signal;
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only support commands defined in this crate — BuiltinCommand and
/// ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive command interpreter: a synchronous read-eval loop over
/// standard input.
///
/// The interpreter owns a [`Session`] and a list of [`CommandFactory`]
/// objects queried in order to route each planned command. See [`Default`]
/// for the factories included out of the box; the external launcher goes
/// last because it accepts every name.
pub struct Interpreter {
    session: Session,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            session: Session::new(),
            commands,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Classify, plan and dispatch one input line. Blank lines, comment
    /// lines and lines that plan down to an empty argument vector are
    /// no-ops.
    pub fn eval_line(&mut self, line: &str, out: &mut dyn Write) -> Result<()> {
        let parsed = lexer::split_line(
            line,
            self.session.pid.as_raw(),
            self.session.foreground_only,
        );
        let ParsedLine::Command { tokens, background } = parsed else {
            return Ok(());
        };
        let spec = parser::plan_command(tokens, background);
        if spec.argv.is_empty() {
            return Ok(());
        }
        self.dispatch(&spec, out).map(|_| ())
    }

    fn dispatch(&mut self, spec: &CommandSpec, out: &mut dyn Write) -> Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.session, spec) {
                return cmd.execute(out, &mut self.session);
            }
        }
        Ok(0)
    }

    /// The prompt loop. Per iteration: reap completed background children,
    /// prompt with `: `, read one line, apply a pending mode toggle, then
    /// evaluate the line. Ends on `exit` or end-of-input (which also kills
    /// registered background children).
    pub fn repl(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut out = io::stdout();
        let mut buf = String::new();

        while !self.session.should_exit {
            self.session.reap_jobs(&mut out)?;

            write!(out, ": ")?;
            out.flush()?;

            buf.clear();
            if stdin.lock().read_line(&mut buf)? == 0 {
                self.session.jobs.kill_all();
                break;
            }

            if signal::take_pending() {
                self.session.toggle_foreground_only(&mut out)?;
            }

            self.eval_line(clip_line(&buf), &mut out)?;
        }

        out.flush()?;
        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// built-ins `exit`, `cd` and `status`, then the external launcher.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Status>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

/// Cap a line at [`MAX_LINE`] bytes without splitting a character.
fn clip_line(line: &str) -> &str {
    if line.len() <= MAX_LINE {
        return line;
    }
    let mut end = MAX_LINE;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LastStatus;
    use std::fs;
    use std::thread;
    use std::time::Duration;

    fn eval(interp: &mut Interpreter, line: &str) -> String {
        let mut out = Vec::new();
        interp.eval_line(line, &mut out).expect("eval");
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_redirection_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("out.txt");
        let second = dir.path().join("copy.txt");

        let mut interp = Interpreter::default();
        eval(&mut interp, &format!("echo hi > {}\n", first.display()));
        eval(
            &mut interp,
            &format!("cat < {} > {}\n", first.display(), second.display()),
        );

        assert_eq!(fs::read_to_string(&second).unwrap(), "hi\n");
        assert_eq!(interp.session().status, LastStatus::Exited(0));
    }

    #[test]
    fn test_placeholder_expands_to_interpreter_pid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pid.txt");

        let mut interp = Interpreter::default();
        let pid = interp.session().pid;
        eval(&mut interp, &format!("echo $$ > {}\n", file.display()));

        assert_eq!(fs::read_to_string(&file).unwrap(), format!("{pid}\n"));
    }

    #[test]
    fn test_unknown_command_then_status_reports_exit_value_one() {
        let mut interp = Interpreter::default();
        let out = eval(&mut interp, "no-such-command-for-sure-xyz\n");
        assert_eq!(out, "Command not recognized.\n");

        let out = eval(&mut interp, "status\n");
        assert_eq!(out, "exit value 1\n");
    }

    #[test]
    fn test_blank_and_comment_lines_touch_nothing() {
        let mut interp = Interpreter::default();
        interp.session_mut().status = LastStatus::Signaled(2);

        assert_eq!(eval(&mut interp, "\n"), "");
        assert_eq!(eval(&mut interp, "# echo this is a comment\n"), "");
        assert_eq!(interp.session().status, LastStatus::Signaled(2));
        assert!(interp.session().jobs.is_empty());
    }

    #[test]
    fn test_background_command_is_announced_and_reaped() {
        let mut interp = Interpreter::default();
        let out = eval(&mut interp, "sleep 0.1 &\n");
        assert!(out.starts_with("Running child "), "got: {out:?}");
        assert!(out.ends_with(" in background\n"));
        assert_eq!(interp.session().jobs.len(), 1);
        // the launch alone never updates the record
        assert_eq!(interp.session().status, LastStatus::Exited(0));

        let mut notice = Vec::new();
        for _ in 0..100 {
            interp.session_mut().reap_jobs(&mut notice).unwrap();
            if !notice.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let notice = String::from_utf8(notice).unwrap();
        assert!(notice.contains("is done: exit value 0"), "got: {notice:?}");
    }

    #[test]
    fn test_foreground_only_mode_forces_foreground() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("fg.txt");

        let mut interp = Interpreter::default();
        interp.session_mut().foreground_only = true;

        let out = eval(&mut interp, &format!("echo hi > {} &\n", file.display()));
        assert!(!out.contains("Running child"), "got: {out:?}");
        assert!(interp.session().jobs.is_empty());
        // the command ran (to completion, in the foreground)
        assert_eq!(fs::read_to_string(&file).unwrap(), "hi\n");
    }

    #[test]
    fn test_exit_flags_the_session() {
        let mut interp = Interpreter::default();
        eval(&mut interp, "exit\n");
        assert!(interp.session().should_exit);
    }

    #[test]
    fn test_clip_line_respects_char_boundaries() {
        let long = "a".repeat(MAX_LINE + 10);
        assert_eq!(clip_line(&long).len(), MAX_LINE);

        let mut multibyte = "a".repeat(MAX_LINE - 1);
        multibyte.push_str("日本語");
        let clipped = clip_line(&multibyte);
        assert!(clipped.len() <= MAX_LINE);
        assert!(multibyte.starts_with(clipped));
    }
}
