//! Write path: a structured [`Response`] back into response-stage text.

mod classify;
mod naming;
mod render;

use crate::domain::{
    ChannelFields, Diagnostic, DiagnosticCode, Diagnostics, PazfirError, Response, WriterResult,
};
use crate::modules::serialization::write_text_artifact;
use std::fs;
use std::path::{Path, PathBuf};

use classify::classify_stage;
use naming::{file_extension, response_file_name};
use render::{header_block, render_stage};

/// Fully rendered response file, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    pub text: String,
    pub filename: String,
    pub extension: String,
    pub sensitivity: f64,
    pub frequency: f64,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenResponse {
    pub sensitivity: f64,
    pub frequency: f64,
    pub filename: String,
    pub path: PathBuf,
    pub extension: String,
    pub diagnostics: Diagnostics,
}

pub fn render_response(
    response: &Response,
    fields: &ChannelFields,
) -> WriterResult<RenderedResponse> {
    let units = response
        .stages()
        .iter()
        .map(classify_stage)
        .collect::<WriterResult<Vec<_>>>()?;

    let mut diagnostics = Diagnostics::new();
    let mut body = String::new();
    let mut extensions = Vec::new();
    let mut skipped = Vec::new();

    for (index, (stage, stage_units)) in response.stages().iter().zip(&units).enumerate() {
        match render_stage(&mut body, stage, stage_units, index == 0, fields)? {
            Some(extension) => extensions.push(extension),
            None => {
                diagnostics.push(Diagnostic::for_stage(
                    DiagnosticCode::GenericStageSkipped,
                    i64::from(stage.stage_number()),
                    "generic response stage has no text encoding; listed in header only",
                ));
                skipped.push(stage);
            }
        }
    }

    let extension = file_extension(extensions);
    if extension.is_empty() {
        return Err(PazfirError::input_validation(
            "INPUT.PAZFIR_NO_STAGES",
            format!(
                "response for {}.{}.{}.{} has no stages with a text encoding",
                fields.network, fields.station, fields.location, fields.channel
            ),
        ));
    }

    let mut text = header_block(response, fields, &skipped);
    text.push_str(&body);

    Ok(RenderedResponse {
        filename: response_file_name(fields, &extension),
        text,
        extension,
        sensitivity: response.sensitivity().value,
        frequency: response.sensitivity().frequency,
        diagnostics,
    })
}

pub fn write_response_file(
    response: &Response,
    fields: &ChannelFields,
    out_dir: &Path,
) -> WriterResult<WrittenResponse> {
    let rendered = render_response(response, fields)?;

    fs::create_dir_all(out_dir).map_err(|source| {
        PazfirError::io_system(
            "IO.PAZFIR_OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                out_dir.display(),
                source
            ),
        )
    })?;
    let path = out_dir.join(&rendered.filename);
    write_text_artifact(&path, &rendered.text).map_err(|source| {
        PazfirError::io_system(
            "IO.PAZFIR_WRITE",
            format!("failed to write response file '{}': {}", path.display(), source),
        )
    })?;
    tracing::info!(path = %path.display(), extension = %rendered.extension, "wrote response file");

    Ok(WrittenResponse {
        sensitivity: rendered.sensitivity,
        frequency: rendered.frequency,
        filename: rendered.filename,
        path,
        extension: rendered.extension,
        diagnostics: rendered.diagnostics,
    })
}
