use super::CliError;
use super::commands::ReadFlags;
use anyhow::Context;
use pazfir_core::domain::{Diagnostic, Response, ResponseStage};
use pazfir_core::modules::{ParsedResponse, ReadOptions};
use pazfir_core::numerics::CalibrationInput;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber; `RUST_LOG` wins over `--verbose`.
pub(super) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn read_options(flags: &ReadFlags) -> ReadOptions {
    let calibration = CalibrationInput {
        calib: flags.calib,
        calper: flags.calper,
        calratio: flags.calratio,
    };

    ReadOptions::new(flags.sample_rate)
        .with_calibration(calibration)
        .with_input_units(flags.units.into())
        .with_a0_frequency(flags.a0_frequency)
}

/// Regular files directly under `dir` whose names match `pattern`, sorted.
pub(super) fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let matcher = globset::Glob::new(pattern)?.compile_matcher();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list directory '{}'", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in '{}'", dir.display()))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .is_some_and(|name| matcher.is_match(Path::new(name)));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn stage_line(stage: &ResponseStage) -> String {
    let common = stage.common();
    format!(
        "  stage {:>2}  {:<5} {:>14.6e}  {} -> {}\n",
        common.stage_number,
        stage.kind_label(),
        common.gain,
        common.input_units,
        common.output_units
    )
}

pub(super) fn render_summary(path: &Path, parsed: &ParsedResponse) -> String {
    let response = &parsed.response;
    let sensitivity = response.sensitivity();

    let mut content = String::new();
    content.push_str(&format!("{}\n", path.display()));
    content.push_str(&format!("stages: {}\n", response.stage_count()));
    for stage in response.stages() {
        content.push_str(&stage_line(stage));
    }
    content.push_str(&format!(
        "sensitivity: {:.6e} {} -> {} at {} Hz\n",
        sensitivity.value, sensitivity.input_units, sensitivity.output_units, sensitivity.frequency
    ));
    if !parsed.diagnostics.is_empty() {
        content.push_str("diagnostics:\n");
        for diagnostic in parsed.diagnostics.iter() {
            content.push_str(&format!("  {diagnostic}\n"));
        }
    }
    content
}

pub(super) fn render_scan_line(path: &Path, parsed: &ParsedResponse) -> String {
    let kinds = parsed
        .response
        .stages()
        .iter()
        .map(ResponseStage::kind_label)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "ok {}: {} stage(s) [{}] sensitivity {:.6e}, {} diagnostic(s)",
        path.display(),
        parsed.response.stage_count(),
        kinds,
        parsed.response.sensitivity().value,
        parsed.diagnostics.len()
    )
}

#[derive(Serialize)]
struct ReadReport<'a> {
    path: String,
    response: &'a Response,
    diagnostics: Vec<&'a Diagnostic>,
}

pub(super) fn render_json_report(path: &Path, parsed: &ParsedResponse) -> Result<String, CliError> {
    let report = ReadReport {
        path: path.display().to_string(),
        response: &parsed.response,
        diagnostics: parsed.diagnostics.iter().collect(),
    };
    let rendered = serde_json::to_string_pretty(&report)
        .with_context(|| format!("failed to serialize report for '{}'", path.display()))?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::matching_files;
    use crate::cli::commands::DEFAULT_SCAN_PATTERN;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn matching_files_filters_by_name_and_sorts() {
        let temp = TempDir::new().expect("tempdir should be created");
        let fixtures = [
            "b.pazfir",
            "a.pazfap",
            "c.fap",
            "d.firiir",
            "notes.txt",
            "pazfir.sensor",
        ];
        for name in fixtures {
            fs::write(temp.path().join(name), "").expect("fixture should be written");
        }
        fs::create_dir(temp.path().join("nested.paz")).expect("dir should be created");

        let files =
            matching_files(temp.path(), DEFAULT_SCAN_PATTERN).expect("scan should succeed");
        let names = files
            .iter()
            .filter_map(|path| path.file_name()?.to_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.pazfap", "b.pazfir", "c.fap", "d.firiir"]);
    }

    #[test]
    fn missing_directory_is_an_internal_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = matching_files(&temp.path().join("absent"), "*")
            .expect_err("missing directory should fail");
        assert!(error.to_string().contains("failed to list directory"));
    }
}
