pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use common::units::{InputUnits, SourceRole, Unit};
pub use domain::{
    ChannelFields, Diagnostic, DiagnosticCode, Diagnostics, PazfirError, PazfirErrorCategory,
    PazfirResult, Response, ResponseStage, Sensitivity,
};
pub use modules::{
    ConvertOptions, DocumentConversion, ParsedResponse, ReadOptions, RenderedResponse,
    StationDocument, WrittenResponse, convert_document, load_station_document, parse_response,
    read_response_file, render_response, write_metadata_tables, write_response_file,
};
pub use numerics::{CalibrationInput, a0_from_pz};
