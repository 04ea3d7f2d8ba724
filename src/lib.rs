//! A small interactive command interpreter with job control.
//!
//! The interpreter reads one command per line behind a `: ` prompt,
//! expands `$$` to its own pid, routes `exit`, `cd` and `status` to
//! in-process built-ins and launches everything else via fork + execvp,
//! with `<` / `>` redirection and background execution on a trailing `&`.
//! Background children are tracked in a bounded registry and reaped
//! non-blockingly once per prompt cycle; SIGTSTP toggles a foreground-only
//! mode through a pending flag consulted only at safe points.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! building blocks: [`lexer`] and [`parser`] turn a raw line into a
//! [`command::CommandSpec`], [`jobs`] tracks background pids, [`signal`]
//! carries the mode toggle, and [`session`] holds the per-session state.

mod builtin;
pub mod command;
mod external;
mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod session;
pub mod signal;

/// Just a convenient re-export of the interactive command runner.
pub use interpreter::Interpreter;
