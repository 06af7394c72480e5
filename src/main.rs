use clap::Parser;
use monkey::{Env, Environment};
use monkey::{logging, repl, runner};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "monkey", version, about = "A tree-walking interpreter for the Monkey language")]
struct Cli {
    /// The script file to execute
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Start in interactive REPL mode (after running FILE, if given)
    #[arg(short, long)]
    interactive: bool,

    /// Log interpreter internals to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let env = Environment::new_shared();

    if let Some(path) = &cli.file {
        let succeeded = run_file(path, &env);
        if !cli.interactive {
            process::exit(if succeeded { 0 } else { 1 });
        }
    }

    repl::start_with(env);
}

fn run_file(path: &Path, env: &Env) -> bool {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return false;
        }
    };

    let filename = path.display().to_string();
    let stdout = std::io::stdout();
    match runner::run_in(&source, Some(&filename), env, &mut stdout.lock()) {
        Ok(outcome) => outcome.is_success(),
        Err(e) => {
            eprintln!("Error writing output: {}", e);
            false
        }
    }
}
