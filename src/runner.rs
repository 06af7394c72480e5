use crate::environment::{Env, Environment};
use crate::error::MonkeyError;
use crate::evaluator::Evaluator;
use crate::object::Object;
use crate::parser;
use std::io::{self, Write};

/// How a script run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success(Object),
    ParseErrors(usize),
    RuntimeError,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }
}

/// Run a script in a fresh global scope, printing its final value to stdout.
pub fn run(source: &str, filename: Option<&str>) -> io::Result<RunOutcome> {
    let env = Environment::new_shared();
    let stdout = io::stdout();
    run_in(source, filename, &env, &mut stdout.lock())
}

/// Run a script in `env`. Diagnostics are rendered on stderr; the final
/// value, unless it is `null`, goes to `out`.
pub fn run_in<W: Write>(
    source: &str,
    filename: Option<&str>,
    env: &Env,
    out: &mut W,
) -> io::Result<RunOutcome> {
    let (program, errors) = parser::parse(source);
    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), "not evaluating, parse failed");
        for error in &errors {
            error.report(source, filename);
        }
        return Ok(RunOutcome::ParseErrors(errors.len()));
    }

    tracing::debug!(statements = program.statements.len(), "evaluating");
    match Evaluator::new().eval_program(&program, env) {
        Ok(value) => {
            if value != Object::Null {
                writeln!(out, "{}", value.inspect())?;
            }
            Ok(RunOutcome::Success(value))
        }
        Err(error) => {
            MonkeyError::from(error).report(source, filename);
            Ok(RunOutcome::RuntimeError)
        }
    }
}
