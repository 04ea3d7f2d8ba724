//! Splits one raw input line into the token sequence for a command.
//!
//! The pipeline per line: strip the trailing newline, classify blank and
//! comment lines as no-ops, detect and strip a trailing `" &"` background
//! marker, expand every `$$` to the interpreter's pid, then split on runs
//! of spaces.

/// Longest prefix of an input line the interpreter looks at, in bytes.
pub const MAX_LINE: usize = 2048;

/// Outcome of classifying and tokenizing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Blank line, comment line, or a line that produced no tokens.
    /// Nothing is dispatched and no interpreter state changes.
    NoOp,
    /// A command line to hand to the redirection planner.
    Command {
        /// Whitespace-delimited words, placeholder-expanded, in shell
        /// argument order.
        tokens: Vec<String>,
        /// True when the line ended in `" &"` and foreground-only mode
        /// was off. The marker is stripped either way.
        background: bool,
    },
}

/// Replace every occurrence of the doubled sigil `$$` with the decimal pid.
///
/// A single left-to-right scan over a fresh output string; a lone `$` is
/// left verbatim, and consumed pairs do not re-match (`$$$` becomes the pid
/// followed by one `$`).
pub fn expand_pid(line: &str, pid: i32) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'$') {
            chars.next();
            out.push_str(&pid.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Classify and tokenize one raw input line.
///
/// `foreground_only` is the mode at the moment the line was read: when it
/// is on, a trailing `" &"` is still stripped but the background flag is
/// forced off.
pub fn split_line(line: &str, pid: i32, foreground_only: bool) -> ParsedLine {
    let mut line = line.strip_suffix('\n').unwrap_or(line);

    if line.is_empty() || line.starts_with('#') {
        return ParsedLine::NoOp;
    }

    let mut background = false;
    if let Some(stripped) = line.strip_suffix(" &") {
        line = stripped;
        background = !foreground_only;
    }

    let expanded = expand_pid(line, pid);
    let tokens: Vec<String> = expanded
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();

    if tokens.is_empty() {
        return ParsedLine::NoOp;
    }

    ParsedLine::Command { tokens, background }
}
