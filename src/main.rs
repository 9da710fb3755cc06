use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::info;

use rlox::ast::Stmt;
use rlox::ast_printer::AstPrinter;
use rlox::error::LoxError;
use rlox::interpreter::Interpreter;
use rlox::parser::Parser;
use rlox::scanner::Scanner;
use rlox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scans a file and prints each token
    Tokenize { filename: PathBuf },

    /// Parses a file and prints its statements in prefix form
    Parse {
        filename: PathBuf,

        /// Dump the program as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Runs a Lox program, or starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

/// Keeps score for the harness: static errors (lex, parse) drive exit
/// code 65, runtime errors 70, and the REPL resets it per line.
/// Printing to stderr happens here so the language modules never touch
/// the terminal themselves.
#[derive(Debug, Default)]
struct ErrorReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter {
    fn report(&mut self, error: &LoxError) {
        match error {
            LoxError::Runtime { .. } => self.had_runtime_error = true,
            _ => self.had_error = true,
        }

        eprintln!("{error}");
    }

    fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

/// Reads the contents of a source file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file: File = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader: BufReader<File> = BufReader::new(file);
    let mut source: String = String::new();

    let bytes: usize = reader
        .read_to_string(&mut source)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file: File = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rlox::' from the module path
            let module: &str = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rlox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

/// Scans and parses `source`, reporting every static error found in
/// the pass. The returned program is only meaningful when the reporter
/// recorded no error.
fn scan_and_parse(source: &str, reporter: &mut ErrorReporter) -> Vec<Stmt> {
    let mut tokens: Vec<Token> = Vec::new();

    for token in Scanner::new(source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => reporter.report(&e),
        }
    }

    let mut parser = Parser::new(&tokens);

    match parser.parse() {
        Ok(statements) => statements,

        Err(errors) => {
            for e in &errors {
                reporter.report(e);
            }

            Vec::new()
        }
    }
}

/// Full pipeline over one source buffer. Evaluation only happens when
/// the static passes were clean; a runtime error abandons the rest of
/// this program but is the reporter's problem, not a process abort.
fn run_program(source: &str, reporter: &mut ErrorReporter) {
    let statements: Vec<Stmt> = scan_and_parse(source, reporter);

    if reporter.had_error {
        return;
    }

    let mut stdout: io::Stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);

    if let Err(e) = interpreter.interpret(&statements) {
        reporter.report(&e);
    }
}

/// Interactive prompt against one persistent interpreter, so
/// definitions accumulate across lines. Errors are reported and the
/// session keeps going.
fn run_prompt() -> Result<()> {
    info!("Starting interactive session");

    let stdin: io::Stdin = io::stdin();
    let mut out: io::Stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut out);
    let mut reporter: ErrorReporter = ErrorReporter::default();

    let mut line: String = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();

        if stdin.read_line(&mut line)? == 0 {
            // EOF: finish the prompt's line before leaving
            println!();

            return Ok(());
        }

        reporter.reset();

        let statements: Vec<Stmt> = scan_and_parse(&line, &mut reporter);

        if reporter.had_error {
            continue;
        }

        if let Err(e) = interpreter.interpret(&statements) {
            reporter.report(&e);
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize the file logger only if --log was given
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.command {
        Commands::Tokenize { filename } => {
            let source: String = read_file(&filename)?;
            let mut reporter: ErrorReporter = ErrorReporter::default();

            for token in Scanner::new(&source) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => reporter.report(&e),
                }
            }

            if reporter.had_error {
                std::process::exit(65);
            }
        }

        Commands::Parse { filename, json } => {
            let source: String = read_file(&filename)?;
            let mut reporter: ErrorReporter = ErrorReporter::default();

            let statements: Vec<Stmt> = scan_and_parse(&source, &mut reporter);

            if reporter.had_error {
                std::process::exit(65);
            }

            if json {
                let dump: String = serde_json::to_string_pretty(&statements)
                    .context("Failed to serialize program")?;

                println!("{dump}");
            } else if !statements.is_empty() {
                println!("{}", AstPrinter::print_program(&statements));
            }
        }

        Commands::Run { filename } => match filename {
            Some(filename) => {
                let source: String = read_file(&filename)?;
                let mut reporter: ErrorReporter = ErrorReporter::default();

                run_program(&source, &mut reporter);

                if reporter.had_error {
                    std::process::exit(65);
                }

                if reporter.had_runtime_error {
                    std::process::exit(70);
                }
            }

            None => run_prompt()?,
        },
    }

    Ok(())
}
