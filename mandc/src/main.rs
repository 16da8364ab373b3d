#[macro_use]
extern crate clap;

use clap::{Arg, ArgGroup};
use mandc::{compile_file, run_tests, simulate_file, TestMode};

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("compile")
                .short("c")
                .long("compile")
                .takes_value(true)
                .value_name("INPUT")
                .help("Compiles the input file to a MASM listing"),
        )
        .arg(
            Arg::with_name("simulate")
                .short("s")
                .long("simulate")
                .takes_value(true)
                .value_name("INPUT")
                .help("Runs the input file in the simulator"),
        )
        .arg(
            Arg::with_name("test")
                .short("t")
                .long("test")
                .takes_value(true)
                .min_values(0)
                .max_values(1)
                .value_name("KIND")
                .possible_values(&["record", "compare"])
                .help("Runs the golden tests; records or compares (the default)"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the output file for compilation"),
        )
        .group(
            ArgGroup::with_name("mode")
                .args(&["compile", "simulate", "test"])
                .required(true),
        )
        .get_matches();

    let result = if let Some(input) = matches.value_of("compile") {
        compile_file(input, matches.value_of("output"))
    } else if let Some(input) = matches.value_of("simulate") {
        simulate_file(input)
    } else {
        let kind = matches.value_of("test").unwrap_or("compare");
        match kind.to_uppercase().parse::<TestMode>() {
            Ok(mode) => run_tests(mode),
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
