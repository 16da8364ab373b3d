//! Tagged diagnostics. Fatal errors propagate as `Err(Diagnostic)` up to
//! the driver; warnings and notices are printed where they occur via
//! [`report`](fn.report.html) and execution continues.

use std::error::Error as StdError;
use std::fmt;

/// Where a token or op came from in the source text. Line and column are
/// zero-based internally and one-based in display.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Loc {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Loc {
        Loc {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line + 1, self.column + 1)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    CMD,
    ENUM,
    PARSE,
    TOKENIZE,
    COMPILE,
    SIMULATE,
    TEST,
    SELF,
}

/// FAIL aborts, WARNING goes to stderr and continues, INFO and GOOD go to
/// stdout and continue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    FAIL,
    WARNING,
    INFO,
    GOOD,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    pub expected: Option<(String, String)>,
    pub loc: Option<Loc>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, severity: Severity, message: impl Into<String>) -> Diagnostic {
        let message = message.into();
        if message.is_empty() {
            // misuse of the diagnostic subsystem itself
            return Diagnostic {
                kind: ErrorKind::SELF,
                severity: Severity::FAIL,
                message: "empty message passed to Diagnostic::new".to_owned(),
                expected: None,
                loc: None,
            };
        }
        Diagnostic {
            kind,
            severity,
            message,
            expected: None,
            loc: None,
        }
    }

    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(kind, Severity::FAIL, message)
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(kind, Severity::WARNING, message)
    }

    pub fn with_expected(mut self, expected: impl fmt::Display, found: impl fmt::Display) -> Diagnostic {
        self.expected = Some((expected.to_string(), found.to_string()));
        self
    }

    pub fn at(mut self, loc: Loc) -> Diagnostic {
        self.loc = Some(loc);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::FAIL
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error.{:?} {}", self.kind, self.message)?;
        if let Some((expected, found)) = &self.expected {
            write!(f, " >>> Expected `{}` found `{}`", expected, found)?;
        }
        if let Some(loc) = &self.loc {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

impl StdError for Diagnostic {}

/// Prints a diagnostic to the stream its severity calls for. Fatal
/// diagnostics are normally returned through `Result` instead; this is for
/// the warning/info/good paths that continue.
pub fn report(diag: &Diagnostic) {
    match diag.severity {
        Severity::FAIL | Severity::WARNING => eprintln!("{}", diag),
        Severity::INFO | Severity::GOOD => println!("{}", diag),
    }
}
