mod error;
mod script;
mod signup;

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use crate::error::DemoError;
use crate::script::Script;
use crate::signup::Signup;

#[derive(Debug, Parser)]
#[command(name = "fieldsync-demo", version, about = "Replay UI events against a sign-up form")]
struct Cli {
    /// JSON event script; runs the built-in session when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write the log to this file instead of stderr
    #[arg(long)]
    log: Option<PathBuf>,

    /// Include debug output from the library
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(path: Option<&Path>, verbose: bool) -> Result<(), DemoError> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| DemoError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            WriteLogger::init(level, Config::default(), file)?;
        }
        None => TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), DemoError> {
    init_logging(cli.log.as_deref(), cli.verbose)?;

    let script = match &cli.script {
        Some(path) => Script::load(path)?,
        None => Script::builtin(),
    };

    let outcome = Signup::new()?.run(&script.steps)?;
    println!(
        "{} submissions, {} accepted",
        outcome.submissions, outcome.accepted
    );
    println!("{}", serde_json::to_string_pretty(&outcome.data)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
