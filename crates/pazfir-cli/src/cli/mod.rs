mod commands;
mod helpers;

use clap::Parser;
use pazfir_core::domain::PazfirError;

pub fn run_from_env() -> i32 {
    let remaining: Vec<String> = std::env::args().skip(1).collect();

    match run(remaining) {
        Ok(code) => code,
        Err(error) => {
            let fatal = error.as_pazfir_error();
            eprintln!("{}", fatal.diagnostic_line());
            eprintln!("{}", fatal.fatal_exit_line());
            fatal.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("pazfir".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "pazfir",
    version,
    about = "Read and write pazfir instrument-response files"
)]
struct Cli {
    /// Log debug detail to stderr; RUST_LOG overrides
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Parse one response file and print its stages and sensitivity
    Read(commands::ReadArgs),
    /// Parse every matching response file in a directory
    Scan(commands::ScanArgs),
    /// Convert a station-metadata JSON document into response files
    Write(commands::WriteArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Read(args) => commands::run_read_command(args),
        CliCommand::Scan(args) => commands::run_scan_command(args),
        CliCommand::Write(args) => commands::run_write_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(PazfirError),
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_pazfir_error(&self) -> PazfirError {
        match self {
            Self::Usage(message) => {
                PazfirError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Pattern(error) => {
                PazfirError::input_validation("INPUT.CLI_PATTERN", error.to_string())
            }
            Self::Internal(error) => PazfirError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<PazfirError> for CliError {
    fn from(error: PazfirError) -> Self {
        Self::Compute(error)
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use pazfir_core::domain::PazfirErrorCategory;

    #[test]
    fn help_exits_successfully() {
        assert_eq!(run(["--help"]).expect("help should render"), 0);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let error = run(["frobnicate"]).expect_err("unknown command should fail");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(
            error.as_pazfir_error().category(),
            PazfirErrorCategory::InputValidationError
        );
    }

    #[test]
    fn bad_glob_maps_to_input_error() {
        let error = CliError::from(
            globset::Glob::new("[unterminated").expect_err("pattern should be invalid"),
        );
        assert_eq!(error.as_pazfir_error().placeholder(), "INPUT.CLI_PATTERN");
    }
}
