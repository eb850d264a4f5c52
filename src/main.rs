//! Gridlock - A multi-user token-formula spreadsheet.

mod config;
mod logging;
mod serve;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use gridlock_core::DocumentStore;
use gridlock_engine::engine::{
    CalculationManager, CellRef, Formula, FormulaEvaluator, Sheet, format_number,
};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "gridlock", version, about = "Multi-user token-formula spreadsheet")]
struct Cli {
    /// Config file (default: <config dir>/gridlock/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, ...)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Sheet columns (1-26), overrides the config file
    #[arg(long, global = true)]
    columns: Option<usize>,

    /// Sheet rows, overrides the config file
    #[arg(long, global = true)]
    rows: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer JSON requests read line by line from stdin
    Serve,
    /// Evaluate one formula against an empty sheet
    Eval {
        /// Formula tokens, e.g. `1 + 2 '*' 3` or "1 + 2 * 3"
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
    /// Recompute a JSON snapshot ({"A1": ["1"], ...}) and print the grid
    Show {
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, warnings) = config::load_config(cli.config.as_deref());
    logging::init(config.log_level, cli.verbose);
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(columns) = cli.columns {
        config.columns = columns;
    }
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> anyhow::Result<ExitCode> {
    match command {
        Command::Serve => {
            let store = DocumentStore::new();
            let stdin = std::io::stdin();
            serve::serve(&store, stdin.lock(), std::io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Eval { tokens } => eval(&tokens, config),
        Command::Show { file } => show(&file, config),
    }
}

fn eval(args: &[String], config: &Config) -> anyhow::Result<ExitCode> {
    let formula: Formula = args
        .iter()
        .flat_map(|a| a.split_whitespace())
        .map(str::to_string)
        .collect();

    let sheet = Sheet::new(config.columns, config.rows)?;
    let mut random = rand::thread_rng();
    let result = FormulaEvaluator::new(&sheet, &mut random).evaluate(&formula);

    match result.error {
        None => {
            println!("{}", format_number(result.value));
            Ok(ExitCode::SUCCESS)
        }
        Some(err) => {
            println!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn show(path: &Path, config: &Config) -> anyhow::Result<ExitCode> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot: BTreeMap<CellRef, Formula> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut sheet = Sheet::new(config.columns, config.rows)?;
    sheet.load_formulas(&snapshot, None);
    CalculationManager::new().evaluate_sheet(&mut sheet);

    for row in sheet.display_strings() {
        println!("{}", row.join("\t"));
    }
    Ok(ExitCode::SUCCESS)
}
