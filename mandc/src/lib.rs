//! Driver for the Mandarine toolchain: file I/O around
//! [`mandasm::parse`](../mandasm/fn.parse.html)/[`mandasm::compile`](../mandasm/fn.compile.html),
//! the simulator entry point, and the golden-output test harness.

use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use mandarine::diag::{report, Diagnostic, ErrorKind, Severity};
use mandarine::Simulator;
use util::EnumFromStr;
use util_derive::EnumFromStr;

#[derive(Debug)]
pub enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
pub enum Error {
    Diag(Diagnostic),
    Io(io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Diag(diag) => write!(f, "{}", diag),
        }
    }
}

impl From<Diagnostic> for Error {
    fn from(diag: Diagnostic) -> Error {
        Error::Diag(diag)
    }
}

/// Golden-test harness mode, parsed from the `-t` option.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum TestMode {
    RECORD,
    COMPARE,
}

fn read_input(path: &Path) -> Result<String, Error> {
    let file = File::open(path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    let mut reader = BufReader::new(file);
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    Ok(input)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let file = File::create(path)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, path.to_owned()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, path.to_owned()))?;
    Ok(())
}

/// Compiles `input` to a MASM listing. Without an explicit output path the
/// listing lands next to the input with the extension replaced by `.asm`.
pub fn compile_file(input: &str, output: Option<&str>) -> Result<(), Error> {
    let input_path = Path::new(input);
    let source = read_input(input_path)?;
    let program = mandasm::parse(&source, input)?;
    let listing = mandasm::compile(&program)?;

    let output_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("asm"));
    write_output(&output_path, listing.as_bytes())
}

/// Runs `input` in the simulator against the process stdin/stdout.
pub fn simulate_file(input: &str) -> Result<(), Error> {
    let source = read_input(Path::new(input))?;
    let mut program = mandasm::parse(&source, input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stdin = io::stdin();
    let mut lines = stdin.lock();
    Simulator::new().run(&mut program, &mut out, &mut lines)?;
    Ok(())
}

fn run_case(path: &Path) -> Result<Vec<u8>, Error> {
    let source = read_input(path)?;
    let mut program = mandasm::parse(&source, &path.to_string_lossy())?;
    let mut out = Vec::new();
    let mut input = io::empty();
    Simulator::new().run(&mut program, &mut out, &mut input)?;
    Ok(out)
}

fn record_case(path: &Path) -> Result<(), Error> {
    let out = run_case(path)?;
    write_output(&path.with_extension("txt"), &out)
}

fn compare_case(path: &Path) -> Result<(), Error> {
    let out = run_case(path)?;
    let expected_path = path.with_extension("txt");
    let expected = read_input(&expected_path)?;
    if out == expected.as_bytes() {
        report(&Diagnostic::new(
            ErrorKind::TEST,
            Severity::GOOD,
            format!("{} Passed", path.display()),
        ));
    } else {
        report(&Diagnostic::new(
            ErrorKind::TEST,
            Severity::WARNING,
            format!("{} Test Failed", path.display()),
        ));
    }
    Ok(())
}

/// Runs every `./tests/*.mand` program through the simulator, recording or
/// comparing its output against the sibling `.txt` file.
pub fn run_tests(mode: TestMode) -> Result<(), Error> {
    let paths = glob::glob("./tests/*.mand").map_err(|err| {
        Error::Diag(Diagnostic::fail(
            ErrorKind::TEST,
            format!("bad test pattern: {}", err),
        ))
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            Error::Diag(Diagnostic::fail(
                ErrorKind::TEST,
                format!("unreadable test path: {}", err),
            ))
        })?;
        match mode {
            TestMode::RECORD => record_case(&path)?,
            TestMode::COMPARE => compare_case(&path)?,
        }
    }
    Ok(())
}
