// laudit - config-driven field audit of tabular ledgers

mod audit;
mod exit_codes;
mod export;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "laudit")]
#[command(about = "Audit ledger partitions against reference tables")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an audit from a TOML config file
    #[command(after_help = "\
Examples:
  laudit run audit.toml
  laudit run audit.toml --json
  laudit run audit.toml --output report.json --annotate-dir annotated/
  laudit run audit.toml --missing-out missing.csv -v

Exit codes:
  0  clean
  1  discrepancies or missing records
  3  invalid config
  4  runtime error
  5  some partitions could not be audited")]
    Run(audit::RunArgs),

    /// Validate an audit config without running
    #[command(after_help = "\
Examples:
  laudit validate audit.toml")]
    Validate {
        /// Path to the audit TOML config
        config: PathBuf,
    },

    /// Print the normalized form of identifiers, as used for joins
    #[command(after_help = "\
Examples:
  laudit key ' c-001.0 ' 'C－001'")]
    Key {
        /// Raw identifier values
        #[arg(required = true)]
        values: Vec<String>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            eprintln!("Usage: laudit <command> [options]");
            eprintln!("       laudit --help for more information");
            Err(CliError { code: EXIT_USAGE, message: String::new(), hint: None })
        }
        Some(Commands::Run(args)) => audit::cmd_run(args),
        Some(Commands::Validate { config }) => audit::cmd_validate(config),
        Some(Commands::Key { values }) => cmd_key(values),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn cmd_key(values: Vec<String>) -> Result<(), CliError> {
    for raw in values {
        println!("{}\t{}", raw, ledger_audit::key::record_key(&raw));
    }
    Ok(())
}
