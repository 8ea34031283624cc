//! One interpretation session: the scan → parse → resolve → interpret
//! pipeline plus the error flags that decide what the front end does next.
//!
//! A file run uses one `Session` for the whole file; a REPL uses one for the
//! whole sitting, calling [`Session::reset_errors`] between lines so a bad
//! line never poisons the next.  Globals persist across runs.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit code for a lex, parse or resolve error.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code for an uncaught runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// What happened to one unit of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// Static errors were reported; nothing was executed.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Ok => 0,
            RunStatus::StaticError => EXIT_STATIC_ERROR,
            RunStatus::RuntimeError => EXIT_RUNTIME_ERROR,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
    diagnostics: Box<dyn Write>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Program output to stdout, diagnostics to stderr.
    pub fn new() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(output: Box<dyn Write>, diagnostics: Box<dyn Write>) -> Self {
        Self::with_interpreter(Interpreter::with_output(output), diagnostics)
    }

    pub fn with_interpreter(interpreter: Interpreter, diagnostics: Box<dyn Write>) -> Self {
        info!("Session created");

        Self {
            interpreter,
            diagnostics,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clear both flags; used between REPL lines.
    pub fn reset_errors(&mut self) {
        debug!("Resetting session error flags");

        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Run one unit of source.  Every static error is reported before the
    /// program is refused; runtime errors abort only this unit.
    pub fn run(&mut self, source: &str) -> RunStatus {
        let (tokens, lex_errors) = Scanner::scan_all(source);
        self.report_all(&lex_errors);

        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(&errors);
                return RunStatus::StaticError;
            }
        };

        if !lex_errors.is_empty() {
            return RunStatus::StaticError;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.report_all(&errors);
            return RunStatus::StaticError;
        }

        info!("Executing {} statement(s)", statements.len());

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                self.report(&e);
                RunStatus::RuntimeError
            }
        }
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.report(error);
        }
    }

    fn report(&mut self, error: &LoxError) {
        debug!("Reporting diagnostic: {}", error);

        if error.is_static() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        // Nowhere left to report a failing diagnostics channel.
        let _ = writeln!(self.diagnostics, "{}", error);
    }
}
