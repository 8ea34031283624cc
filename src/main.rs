use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{RunStatus, Session, EXIT_RUNTIME_ERROR, EXIT_STATIC_ERROR};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum call nesting before a program fails with "Stack overflow."
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print one JSON object per token instead of the plain form
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session, one line at a time
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
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
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn no_input() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        std::process::exit(EXIT_STATIC_ERROR);
    }

    Ok(())
}

fn parse(source: &str) {
    let (tokens, lex_errors) = Scanner::scan_all(source);

    for e in &lex_errors {
        eprintln!("{}", e);
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => println!("{}", AstPrinter::print(&expr)),

        Ok(_) => std::process::exit(EXIT_STATIC_ERROR),

        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
            std::process::exit(EXIT_STATIC_ERROR);
        }
    }
}

fn evaluate(source: &str, max_call_depth: usize) {
    let (tokens, lex_errors) = Scanner::scan_all(source);

    for e in &lex_errors {
        eprintln!("{}", e);
    }

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => expr,

        Ok(_) => std::process::exit(EXIT_STATIC_ERROR),

        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
            std::process::exit(EXIT_STATIC_ERROR);
        }
    };

    let mut interpreter = Interpreter::new().with_max_call_depth(max_call_depth);

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }

        Err(e) => {
            debug!("Evaluation debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(EXIT_RUNTIME_ERROR);
        }
    }
}

fn repl(max_call_depth: usize) -> Result<()> {
    let interpreter = Interpreter::new().with_max_call_depth(max_call_depth);
    let mut session = Session::with_interpreter(interpreter, Box::new(io::stderr()));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line: String = line.context("Failed to read from stdin")?;

        if line.trim() == "exit" {
            break;
        }

        let status: RunStatus = session.run(&line);
        debug!("REPL line finished with {:?}", status);

        session.reset_errors();
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let source = read_file(filename.unwrap_or_else(|| no_input()))?;
            tokenize(&source, json)?;
        }

        Commands::Parse { filename } => {
            let source = read_file(filename.unwrap_or_else(|| no_input()))?;
            parse(&source);
        }

        Commands::Evaluate { filename } => {
            let source = read_file(filename.unwrap_or_else(|| no_input()))?;
            evaluate(&source, args.max_call_depth);
        }

        Commands::Run { filename } => {
            let source = read_file(filename.unwrap_or_else(|| no_input()))?;
            debug!("Provided input:\n {}", source);

            let interpreter = Interpreter::new().with_max_call_depth(args.max_call_depth);
            let mut session = Session::with_interpreter(interpreter, Box::new(io::stderr()));

            let status: RunStatus = session.run(&source);
            info!("Run finished with {:?}", status);

            if status != RunStatus::Ok {
                std::process::exit(status.exit_code());
            }
        }

        Commands::Repl => repl(args.max_call_depth)?,
    }

    Ok(())
}
