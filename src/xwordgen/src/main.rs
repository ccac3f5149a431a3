use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{info, LevelFilter};

use xwordgen::{render_grid, Crossword, Error, SolveFailure, Solver, SolverConfig};

/// Fill a crossword grid from a word list.
#[derive(Parser, Debug)]
#[command(name = "xwordgen", version)]
struct Args {
    /// Grid structure: `_` marks a fillable cell, anything else is a block.
    structure: PathBuf,

    /// Word list, one word per line.
    words: PathBuf,

    /// Also write the filled grid to this file.
    output: Option<PathBuf>,

    /// Give up after trying this many tentative assignments.
    #[arg(long)]
    max_states: Option<u64>,

    /// Give up after this many seconds.
    #[arg(long)]
    time_limit: Option<u64>,

    /// Log more (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logger(verbosity: u8) -> Result<(), fern::InitError> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}][{}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    let crossword = Crossword::from_files(&args.structure, &args.words)?;
    info!("Loaded {:?}", crossword);

    let config = SolverConfig {
        max_states: args.max_states,
        time_limit: args.time_limit.map(Duration::from_secs),
    };

    match Solver::with_config(&crossword, config).run() {
        Ok(solution) => {
            info!("{:?}", solution.statistics);
            let display_grid = render_grid(&crossword, &solution.assignment);
            println!("{}", display_grid);

            if let Some(output) = &args.output {
                fs::write(output, display_grid + "\n")
                    .map_err(|source| Error::Io { path: output.clone(), source })?;
                info!("Wrote {}", output.display());
            }
        }
        Err(SolveFailure::Unsatisfiable) => println!("No solution."),
        Err(SolveFailure::BudgetExhausted) => println!("No solution found within the search limits."),
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = setup_logger(args.verbose) {
        eprintln!("Failed to set up logging: {}", err);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
