pub mod document;
pub mod reader;
pub mod serialization;
pub mod tables;
pub mod writer;

pub use document::{
    ConvertOptions, DocumentConversion, DocumentError, StationDocument, convert_document,
    load_station_document, write_metadata_tables,
};
pub use reader::{ParsedResponse, ReadOptions, parse_response, read_response_file};
pub use tables::{InstrumentRow, SensorRow};
pub use writer::{RenderedResponse, WrittenResponse, render_response, write_response_file};
