use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use clap_stdin::FileOrStdin;
use log::LevelFilter;

use jackc::config::{Options, SegmentNames};
use jackc::driver;
use jackc::lexer::Lexer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    Vm,
    Tokens,
    Ast,
}

/// Compile Jack classes to VM code.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// `.jack` files or directories of them. Each class is written to
    /// `<name>.vm` next to its source.
    #[arg(required_unless_present = "print")]
    paths: Vec<PathBuf>,

    /// Compile one class read from FILE (or `-` for stdin) and print it.
    #[arg(long, value_name = "FILE", conflicts_with = "paths")]
    print: Option<FileOrStdin>,

    /// What `--print` writes.
    #[arg(long, value_enum, default_value_t = Emit::Vm)]
    emit: Emit,

    #[arg(long, value_enum, default_value_t = SegmentNames::Standard)]
    segment_names: SegmentNames,

    /// Number of classes compiled in parallel.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// -v info, -vv debug, -vvv trace. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_one(input: FileOrStdin, emit: Emit, options: &Options) -> Result<()> {
    let source = input.contents().context("failed to read input")?;
    let out: String = match emit {
        Emit::Tokens => Lexer::tokenize(&source)?
            .iter()
            .map(|t| format!("{}\t{}\n", t.loc, t.kind))
            .collect(),
        Emit::Ast => format!("{:#?}\n", jackc::parse(&source)?),
        Emit::Vm => jackc::compile_with(&source, options)?,
    };
    io::stdout().write_all(out.as_bytes())?;
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    let options = Options::default().with_segment_names(cli.segment_names);

    if let Some(input) = cli.print {
        print_one(input, cli.emit, &options)?;
        return Ok(true);
    }
    if cli.emit != Emit::Vm {
        bail!("--emit tokens/ast can only be used with --print");
    }

    let files = driver::collect_sources(&cli.paths)?;
    let jobs = cli.jobs.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    });

    let mut ok = true;
    for result in driver::compile_all(&files, &options, jobs) {
        if let Err(e) = result {
            eprintln!("error: {:#}", e);
            ok = false;
        }
    }
    Ok(ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
