// ABOUTME: Command-line driver: run an RPAL source file or dump its trees

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use rpal::{ast_dump, config, interpret, st_dump};

#[derive(Parser, Debug)]
#[command(name = "rpal")]
#[command(version = config::VERSION)]
#[command(about = config::ABOUT)]
#[command(long_about = config::LONG_ABOUT)]
struct CliArgs {
    /// Path to the RPAL source file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print the abstract syntax tree and exit
    #[arg(long)]
    ast: bool,

    /// Print the standardized tree and exit
    #[arg(long)]
    st: bool,

    /// Trace the pipeline stages
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // The published flags are the single-dash `-ast` and `-st`; rewrite
    // them to long-flag form before clap sees the argv
    let argv = std::env::args().map(|arg| match arg.as_str() {
        "-ast" => "--ast".to_string(),
        "-st" => "--st".to_string(),
        _ => arg,
    });
    let args = CliArgs::parse_from(argv);

    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Warn
    };
    let _ = simple_logger::init_with_level(level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read '{}': {}", args.file.display(), e))?;
    debug!("read {} bytes from {}", source.len(), args.file.display());

    if args.ast {
        for line in ast_dump(&source).map_err(|e| e.to_string())? {
            println!("{}", line);
        }
        return Ok(());
    }

    if args.st {
        for line in st_dump(&source).map_err(|e| e.to_string())? {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut out = std::io::stdout();
    let result = interpret(&source, &mut out).map_err(|e| e.to_string())?;
    println!("{}", result);
    Ok(())
}
