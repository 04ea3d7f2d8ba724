//! Consumes the token sequence in one left-to-right pass, building the
//! argument vector and the redirection plan for a command.

use crate::command::CommandSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanState {
    Normal,
    AwaitInput,
    AwaitOutput,
}

/// Build a [`CommandSpec`] from the token sequence.
///
/// The first `<` and the first `>` each consume the following token as a
/// path; later occurrences are plain argument tokens. An operator with no
/// following token is dropped and no path is recorded.
pub fn plan_command(tokens: Vec<String>, background: bool) -> CommandSpec {
    let mut spec = CommandSpec {
        background,
        ..CommandSpec::default()
    };
    let mut state = PlanState::Normal;

    for token in tokens {
        match state {
            PlanState::AwaitInput => {
                spec.input = Some(token);
                state = PlanState::Normal;
            }
            PlanState::AwaitOutput => {
                spec.output = Some(token);
                state = PlanState::Normal;
            }
            PlanState::Normal if token == "<" && spec.input.is_none() => {
                state = PlanState::AwaitInput;
            }
            PlanState::Normal if token == ">" && spec.output.is_none() => {
                state = PlanState::AwaitOutput;
            }
            PlanState::Normal => spec.argv.push(token),
        }
    }

    spec
}
