//! MyPL Interpreter CLI

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mypl::ast::Program;
use mypl::error::{report_error, report_runtime_error};
use mypl::interp::{DEFAULT_MAX_DEPTH, Interpreter, exit_code};
use mypl::types::TypeChecker;
use mypl::CompileError;

#[derive(Parser)]
#[command(name = "mypl", version, about = "MyPL - a small language with records and matrices")]
struct Cli {
    /// Log interpreter activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a MyPL program
    Run {
        /// Source file to run
        file: PathBuf,
        /// Skip static type checking
        #[arg(long)]
        no_check: bool,
        /// Maximum function call depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Type check a MyPL source file
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Parse and dump AST (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Command::Run {
            file,
            no_check,
            max_depth,
        } => run_file(&file, !no_check, max_depth),
        Command::Check { file } => check_file(&file),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
    };
    std::process::exit(code);
}

/// Log to stderr when `RUST_LOG` is set or `--verbose` is given
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("mypl=debug")
    } else {
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn read_source(path: &Path) -> Option<(String, String)> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some((path.display().to_string(), source)),
        Err(e) => {
            eprintln!("Error: cannot read {}: {e}", path.display());
            None
        }
    }
}

fn front_end(filename: &str, source: &str, check: bool) -> mypl::Result<Program> {
    let tokens = mypl::lexer::tokenize(source)?;
    let program = mypl::parser::parse(filename, source, tokens)?;
    if check {
        TypeChecker::new().check_program(&program)?;
    }
    Ok(program)
}

fn report_compile_error(filename: &str, source: &str, error: &CompileError) -> i32 {
    if report_error(filename, source, error).is_err() {
        eprintln!("Error: {error}");
    }
    1
}

fn run_file(path: &Path, check: bool, max_depth: usize) -> i32 {
    let Some((filename, source)) = read_source(path) else {
        return 1;
    };

    let program = match front_end(&filename, &source, check) {
        Ok(program) => program,
        Err(e) => return report_compile_error(&filename, &source, &e),
    };

    let mut interp = Interpreter::new().with_max_depth(max_depth);
    match interp.run(&program) {
        Ok(result) => exit_code(&result),
        Err(e) => {
            if report_runtime_error(&filename, &source, &e).is_err() {
                eprintln!("Error: {e}");
            }
            1
        }
    }
}

fn check_file(path: &Path) -> i32 {
    let Some((filename, source)) = read_source(path) else {
        return 1;
    };

    match front_end(&filename, &source, true) {
        Ok(_) => {
            println!("✓ {filename} type checks successfully");
            0
        }
        Err(e) => report_compile_error(&filename, &source, &e),
    }
}

fn parse_file(path: &Path) -> i32 {
    let Some((filename, source)) = read_source(path) else {
        return 1;
    };

    let program = match front_end(&filename, &source, false) {
        Ok(program) => program,
        Err(e) => return report_compile_error(&filename, &source, &e),
    };
    match serde_json::to_string_pretty(&program) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn tokenize_file(path: &Path) -> i32 {
    let Some((filename, source)) = read_source(path) else {
        return 1;
    };

    match mypl::lexer::tokenize(&source) {
        Ok(tokens) => {
            for (tok, span) in &tokens {
                println!("{:?} @ {}..{}", tok, span.start, span.end);
            }
            0
        }
        Err(e) => report_compile_error(&filename, &source, &e),
    }
}
