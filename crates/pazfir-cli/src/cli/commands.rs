use super::CliError;
use super::helpers::*;
use pazfir_core::common::units::InputUnits;
use pazfir_core::domain::PazfirError;
use pazfir_core::modules::{
    ConvertOptions, convert_document, load_station_document, read_response_file,
};
use std::path::PathBuf;

#[derive(Clone, Copy, clap::ValueEnum)]
pub(super) enum UnitsArg {
    /// Displacement in nanometers
    Nm,
    /// Displacement in meters
    M,
    /// Pressure in pascals
    Pa,
}

impl From<UnitsArg> for InputUnits {
    fn from(units: UnitsArg) -> Self {
        match units {
            UnitsArg::Nm => InputUnits::Nanometers,
            UnitsArg::M => InputUnits::Meters,
            UnitsArg::Pa => InputUnits::Pascals,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct ReadFlags {
    /// Final instrument sample rate in Hz
    #[arg(long)]
    pub(super) sample_rate: f64,

    /// Nominal calibration in nm/count
    #[arg(long)]
    pub(super) calib: Option<f64>,

    /// Calibration period in seconds
    #[arg(long)]
    pub(super) calper: Option<f64>,

    /// Calibration ratio applied on top of calib
    #[arg(long)]
    pub(super) calratio: Option<f64>,

    /// Ground units at the front of the cascade
    #[arg(long, value_enum, default_value = "nm")]
    pub(super) units: UnitsArg,

    /// Normalization frequency used when no calibration period is given
    #[arg(long, default_value_t = 1.0)]
    pub(super) a0_frequency: f64,
}

#[derive(clap::Args)]
pub(super) struct ReadArgs {
    /// Response file to parse
    file: PathBuf,

    #[command(flatten)]
    flags: ReadFlags,

    /// Print the parsed response as JSON
    #[arg(long)]
    json: bool,
}

/// Every extension the writer produces: `paz`, `fir`, `iir`, `fap` and
/// their concatenations.
pub(super) const DEFAULT_SCAN_PATTERN: &str = "*.{paz,fir,iir,fap}*";

#[derive(clap::Args)]
pub(super) struct ScanArgs {
    /// Directory holding response files
    dir: PathBuf,

    /// File-name glob selecting response files
    #[arg(long, default_value = DEFAULT_SCAN_PATTERN)]
    pattern: String,

    #[command(flatten)]
    flags: ReadFlags,
}

#[derive(clap::Args)]
pub(super) struct WriteArgs {
    /// Station-metadata JSON document
    document: PathBuf,

    /// Output directory for response files and tables
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Also write sensor and instrument tables
    #[arg(long)]
    tables: bool,

    /// File-name prefix for the metadata tables
    #[arg(long, default_value = "pazfir")]
    prefix: String,
}

pub(super) fn run_read_command(args: ReadArgs) -> Result<i32, CliError> {
    let options = read_options(&args.flags);
    let parsed = read_response_file(&args.file, &options)?;
    if args.json {
        println!("{}", render_json_report(&args.file, &parsed)?);
    } else {
        print!("{}", render_summary(&args.file, &parsed));
    }
    Ok(0)
}

pub(super) fn run_scan_command(args: ScanArgs) -> Result<i32, CliError> {
    let options = read_options(&args.flags);
    let files = matching_files(&args.dir, &args.pattern)?;
    if files.is_empty() {
        println!(
            "no files matching '{}' in {}",
            args.pattern,
            args.dir.display()
        );
        return Ok(0);
    }

    tracing::info!(
        files = files.len(),
        dir = %args.dir.display(),
        pattern = %args.pattern,
        "scanning response files"
    );

    let mut failed = 0usize;
    for file in &files {
        match read_response_file(file, &options) {
            Ok(parsed) => {
                tracing::debug!(
                    path = %file.display(),
                    stages = parsed.response.stage_count(),
                    diagnostics = parsed.diagnostics.len(),
                    "parsed response file"
                );
                println!("{}", render_scan_line(file, &parsed));
            }
            Err(error) => {
                failed += 1;
                tracing::warn!(
                    path = %file.display(),
                    placeholder = error.placeholder(),
                    "failed to parse response file"
                );
                println!("FAILED {}: {}", file.display(), error.diagnostic_line());
            }
        }
    }

    println!(
        "scanned {} file(s): {} parsed, {} failed",
        files.len(),
        files.len() - failed,
        failed
    );
    if failed == 0 { Ok(0) } else { Ok(1) }
}

pub(super) fn run_write_command(args: WriteArgs) -> Result<i32, CliError> {
    let document = load_station_document(&args.document).map_err(PazfirError::from)?;
    let options = ConvertOptions {
        table_prefix: args.prefix,
        ..ConvertOptions::default()
    };
    let conversion = convert_document(&document, &args.out_dir, args.tables, &options)?;

    for written in &conversion.written {
        println!(
            "wrote {} (sensitivity {:e} at {} Hz)",
            written.path.display(),
            written.sensitivity,
            written.frequency
        );
        for diagnostic in written.diagnostics.iter() {
            println!("  {diagnostic}");
        }
    }
    if let Some((sensor, instrument)) = &conversion.tables {
        println!("wrote {}", sensor.display());
        println!("wrote {}", instrument.display());
    }
    Ok(0)
}
