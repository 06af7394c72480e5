use crate::ast::Statement;
use crate::environment::{Env, Environment};
use crate::error::MonkeyError;
use crate::evaluator::Evaluator;
use crate::parser;
use std::io::{self, BufRead, Write};

pub const PROMPT: &str = ">> ";

/// Interactive session on stdin/stdout with a fresh global scope.
pub fn start() {
    start_with(Environment::new_shared());
}

/// Interactive session continuing in an existing scope.
pub fn start_with(env: Env) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(error) = run(stdin.lock(), stdout.lock(), &env) {
        eprintln!("Error reading input: {}", error);
    }
}

/// The read-eval-print loop over any reader and writer. Bindings made on
/// one line stay visible on the next.
pub fn run<R: BufRead, W: Write>(mut input: R, mut output: W, env: &Env) -> io::Result<()> {
    writeln!(output, "Monkey Interpreter v{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(output, "Type 'exit' or press Ctrl+D to quit")?;
    writeln!(output)?;

    let mut evaluator = Evaluator::new();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut buffer = Vec::new();
        if input.read_until(b'\n', &mut buffer)? == 0 {
            // EOF (Ctrl+D or piped input ended)
            writeln!(output)?;
            break;
        }

        // Invalid UTF-8 becomes U+FFFD and is reported by the parser
        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            writeln!(output, "Goodbye!")?;
            break;
        }

        run_line(line, env, &mut evaluator, &mut output)?;
    }

    Ok(())
}

/// Parse and evaluate one line, writing its result (or its errors) to `output`.
pub fn run_line<W: Write>(
    line: &str,
    env: &Env,
    evaluator: &mut Evaluator,
    output: &mut W,
) -> io::Result<()> {
    let (program, errors) = parser::parse(line);
    if !errors.is_empty() {
        return print_parse_errors(output, &errors);
    }

    match evaluator.eval_program(&program, env) {
        // A trailing `let` has nothing worth echoing
        Ok(_) if matches!(program.statements.last(), None | Some(Statement::Let(_))) => Ok(()),
        Ok(value) => writeln!(output, "{}", value.inspect()),
        Err(error) => {
            tracing::debug!(%error, "line failed");
            writeln!(output, "{}", error.inspect())
        }
    }
}

fn print_parse_errors<W: Write>(output: &mut W, errors: &[MonkeyError]) -> io::Result<()> {
    writeln!(output, "parser errors:")?;
    for error in errors {
        writeln!(output, "\t{}", error.message)?;
    }
    Ok(())
}
