use anyhow::Result;
use minish::{Interpreter, logging, signal};

fn main() -> Result<()> {
    logging::init();
    signal::install()?;
    Interpreter::default().repl()
}
