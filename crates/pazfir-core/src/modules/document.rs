//! Station-metadata document boundary and batch conversion of every channel
//! response into response-stage files plus sensor/instrument rows.

use crate::common::constants::NM_PER_M;
use crate::common::time::julian_day;
use crate::common::units::is_meter_based;
use crate::domain::{ChannelFields, PazfirError, PazfirResult, Response};
use crate::modules::serialization::write_text_artifact;
use crate::modules::tables::{
    DEFAULT_END_TIME, InstrumentRow, NA_NCALIB, NA_PERIOD, SensorRow, render_table,
};
use crate::modules::writer::{WrittenResponse, write_response_file};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDocument {
    #[serde(default)]
    pub networks: Vec<NetworkEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub code: String,
    #[serde(default)]
    pub stations: Vec<StationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationEntry {
    pub code: String,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub code: String,
    #[serde(default)]
    pub location: String,
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    pub sample_rate: f64,
    #[serde(default)]
    pub sensor_description: Option<String>,
    #[serde(default)]
    pub digitizer_description: Option<String>,
    #[serde(default)]
    pub preamplifier_description: Option<String>,
    pub response: Response,
}

impl StationDocument {
    /// Every channel with the identifying fields the writer consumes.
    pub fn channels(&self) -> impl Iterator<Item = (ChannelFields, &Response)> + '_ {
        self.networks.iter().flat_map(|network| {
            network.stations.iter().flat_map(move |station| {
                station.channels.iter().map(move |channel| {
                    (
                        ChannelFields {
                            network: network.code.clone(),
                            station: station.code.clone(),
                            location: channel.location.clone(),
                            channel: channel.code.clone(),
                            start_time: channel.start_time,
                            end_time: channel.end_time,
                            sample_rate: channel.sample_rate,
                            sensor_description: channel.sensor_description.clone(),
                            digitizer_description: channel.digitizer_description.clone(),
                            preamplifier_description: channel.preamplifier_description.clone(),
                        },
                        &channel.response,
                    )
                })
            })
        })
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read station document '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse station document '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<DocumentError> for PazfirError {
    fn from(error: DocumentError) -> Self {
        match &error {
            DocumentError::Read { .. } => {
                PazfirError::io_system("IO.PAZFIR_DOCUMENT_READ", error.to_string())
            }
            DocumentError::Parse { .. } => {
                PazfirError::input_validation("INPUT.PAZFIR_DOCUMENT", error.to_string())
            }
        }
    }
}

pub fn load_station_document(path: &Path) -> Result<StationDocument, DocumentError> {
    let source = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Stamped into every `lddate` column.
    pub load_date: DateTime<Utc>,
    pub table_prefix: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            load_date: Utc::now(),
            table_prefix: "pazfir".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConversion {
    pub sensor_rows: Vec<SensorRow>,
    pub instrument_rows: Vec<InstrumentRow>,
    pub written: Vec<WrittenResponse>,
    /// `(sensor, instrument)` table paths when tables were requested.
    pub tables: Option<(PathBuf, PathBuf)>,
}

fn period(frequency: f64) -> f64 {
    if frequency > 0.0 && frequency.is_finite() {
        1.0 / frequency
    } else {
        NA_PERIOD
    }
}

/// Nominal calibration in ground units per count, nanometer-based when the
/// first stage takes a meter-based input, matching the written scale lines.
fn nominal_calib(response: &Response, sensitivity: f64) -> f64 {
    if sensitivity == 0.0 || !sensitivity.is_finite() {
        return NA_NCALIB;
    }
    let per_nanometer = response
        .stages()
        .first()
        .is_some_and(|stage| is_meter_based(&stage.common().input_units));
    if per_nanometer {
        NM_PER_M / sensitivity
    } else {
        1.0 / sensitivity
    }
}

/// Writes one response file per channel, in document order. `inid` and
/// `chanid` count from 1 within this call.
pub fn convert_document(
    document: &StationDocument,
    out_dir: &Path,
    write_metadata_tables: bool,
    options: &ConvertOptions,
) -> PazfirResult<DocumentConversion> {
    let mut conversion = DocumentConversion {
        sensor_rows: Vec::new(),
        instrument_rows: Vec::new(),
        written: Vec::new(),
        tables: None,
    };

    for (index, (fields, response)) in document.channels().enumerate() {
        let id = index as i64 + 1;
        let written = write_response_file(response, &fields, out_dir)?;
        let calper = period(written.frequency);

        conversion.sensor_rows.push(SensorRow {
            sta: fields.station.clone(),
            chan: fields.channel.clone(),
            time: fields.start_time,
            endtime: fields.end_time.unwrap_or(DEFAULT_END_TIME),
            inid: id,
            chanid: id,
            jdate: julian_day(fields.start_time),
            calratio: 1.0,
            calper,
            tshift: 0.0,
            instant: "y".to_string(),
            lddate: options.load_date,
        });
        conversion.instrument_rows.push(InstrumentRow {
            inid: id,
            insname: fields
                .sensor_description
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            instype: "-".to_string(),
            band: fields
                .channel
                .chars()
                .next()
                .map(|band| band.to_ascii_lowercase().to_string())
                .unwrap_or_else(|| "-".to_string()),
            digital: "d".to_string(),
            samprate: fields.sample_rate,
            ncalib: nominal_calib(response, written.sensitivity),
            ncalper: calper,
            dir: out_dir.display().to_string(),
            dfile: written.filename.clone(),
            rsptype: written.extension.clone(),
            lddate: options.load_date,
        });
        conversion.written.push(written);
    }

    tracing::info!(
        channels = conversion.written.len(),
        out_dir = %out_dir.display(),
        "converted station document"
    );

    if write_metadata_tables {
        conversion.tables = Some(self::write_metadata_tables(
            out_dir,
            &options.table_prefix,
            &conversion,
        )?);
    }
    Ok(conversion)
}

/// Writes `{prefix}.sensor` and `{prefix}.instrument` into `dir`.
pub fn write_metadata_tables(
    dir: &Path,
    prefix: &str,
    conversion: &DocumentConversion,
) -> PazfirResult<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).map_err(|source| {
        PazfirError::io_system(
            "IO.PAZFIR_OUTPUT_DIRECTORY",
            format!("failed to create table directory '{}': {}", dir.display(), source),
        )
    })?;

    let sensor_path = dir.join(format!("{prefix}.sensor"));
    let instrument_path = dir.join(format!("{prefix}.instrument"));
    let tables = [
        (
            &sensor_path,
            render_table(&conversion.sensor_rows, SensorRow::to_fixed_width),
        ),
        (
            &instrument_path,
            render_table(&conversion.instrument_rows, InstrumentRow::to_fixed_width),
        ),
    ];
    for (path, contents) in tables {
        write_text_artifact(path, &contents).map_err(|source| {
            PazfirError::io_system(
                "IO.PAZFIR_WRITE",
                format!("failed to write table '{}': {}", path.display(), source),
            )
        })?;
    }

    Ok((sensor_path, instrument_path))
}

#[cfg(test)]
mod tests {
    use super::{ConvertOptions, StationDocument, convert_document, load_station_document, period};
    use crate::domain::PazfirErrorCategory;
    use crate::modules::tables::{INSTRUMENT_COLUMNS, NA_PERIOD};
    use crate::numerics::CalibrationInput;
    use chrono::{DateTime, Utc};
    use std::fs;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"{
        "networks": [{
            "code": "IU",
            "stations": [{
                "code": "ANMO",
                "channels": [
                    {
                        "code": "BHZ",
                        "location": "00",
                        "start_time": 0.0,
                        "sample_rate": 40.0,
                        "sensor_description": "STS-2",
                        "response": {
                            "sensitivity_frequency": 1.0,
                            "stages": [
                                {
                                    "kind": "poles_zeros",
                                    "stage_number": 1,
                                    "gain": 1500.0,
                                    "gain_frequency": 1.0,
                                    "input_units": "M/S",
                                    "output_units": "V",
                                    "normalization_factor": 1.0,
                                    "normalization_frequency": 1.0,
                                    "poles": [{"value": [-0.037, 0.037]}, {"value": [-0.037, -0.037]}],
                                    "zeros": [{"value": [0.0, 0.0]}, {"value": [0.0, 0.0]}]
                                },
                                {
                                    "kind": "coefficients",
                                    "stage_number": 2,
                                    "gain": 400000.0,
                                    "gain_frequency": 1.0,
                                    "input_units": "V",
                                    "output_units": "COUNTS",
                                    "numerator": [{"value": 1.0}],
                                    "decimation": {"input_sample_rate": 40.0, "factor": 1}
                                }
                            ]
                        }
                    },
                    {
                        "code": "LHZ",
                        "start_time": 86400.0,
                        "end_time": 172800.0,
                        "sample_rate": 1.0,
                        "response": {
                            "stages": [{
                                "kind": "response_list",
                                "stage_number": 1,
                                "gain": 2.0,
                                "gain_frequency": 1.0,
                                "input_units": "M/S",
                                "output_units": "COUNTS",
                                "entries": [{"frequency": 1.0, "amplitude": 1.0, "phase_degrees": 0.0}]
                            }]
                        }
                    }
                ]
            }]
        }]
    }"#;

    fn options() -> ConvertOptions {
        ConvertOptions {
            load_date: DateTime::<Utc>::default(),
            table_prefix: "station".to_string(),
        }
    }

    #[test]
    fn converts_every_channel_with_batch_local_ids() {
        let temp = TempDir::new().expect("tempdir should be created");
        let document: StationDocument =
            serde_json::from_str(DOCUMENT).expect("document should parse");
        let conversion = convert_document(&document, temp.path(), true, &options())
            .expect("document should convert");

        assert_eq!(conversion.written.len(), 2);
        assert_eq!(conversion.written[0].filename, "IU.ANMO.BHZ.00.1970001.pazfir");
        assert_eq!(conversion.written[1].filename, "IU.ANMO.LHZ..1970002.fap");
        assert_eq!(
            conversion
                .sensor_rows
                .iter()
                .map(|row| row.inid)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(conversion.instrument_rows[0].band, "b");
        assert_eq!(conversion.instrument_rows[0].ncalib, 1.0e9 / 6.0e8);
        assert_eq!(conversion.instrument_rows[1].rsptype, "fap");
        assert_eq!(conversion.sensor_rows[1].endtime, 172_800.0);

        let (sensor, instrument) = conversion.tables.expect("tables should be written");
        let sensor_table = fs::read_to_string(sensor).expect("sensor table should be readable");
        assert_eq!(sensor_table.lines().count(), 2);
        assert!(instrument.ends_with("station.instrument"));
    }

    fn column_value(line: &str, name: &str) -> f64 {
        let mut start = 0;
        for column in &INSTRUMENT_COLUMNS {
            if column.name == name {
                return line[start..start + column.width]
                    .trim()
                    .parse()
                    .expect("column should hold a number");
            }
            start += column.width + 1;
        }
        panic!("no column named {name}");
    }

    #[test]
    fn instrument_row_calibration_reads_back_as_sensitivity() {
        let temp = TempDir::new().expect("tempdir should be created");
        let document: StationDocument =
            serde_json::from_str(DOCUMENT).expect("document should parse");
        let conversion = convert_document(&document, temp.path(), true, &options())
            .expect("document should convert");
        let (_, instrument) = conversion.tables.expect("tables should be written");
        let table = fs::read_to_string(instrument).expect("instrument table should be readable");
        let line = table.lines().next().expect("table should have a row");

        let ncalib = column_value(line, "ncalib");
        let ncalper = column_value(line, "ncalper");
        let calibration = CalibrationInput::new(ncalib, ncalper)
            .resolve()
            .expect("table calibration should be complete");

        let per_nanometer = conversion.written[0].sensitivity / 1.0e9;
        assert!((calibration.gain - per_nanometer).abs() <= 1.0e-5 * per_nanometer);
        assert_eq!(calibration.reference_frequency, conversion.written[0].frequency);
    }

    #[test]
    fn unusable_frequency_leaves_period_null() {
        assert_eq!(period(0.0), NA_PERIOD);
        assert_eq!(period(f64::NAN), NA_PERIOD);
        assert_eq!(period(4.0), 0.25);
    }

    #[test]
    fn repeated_conversions_restart_ids() {
        let temp = TempDir::new().expect("tempdir should be created");
        let document: StationDocument =
            serde_json::from_str(DOCUMENT).expect("document should parse");
        convert_document(&document, temp.path(), false, &options()).expect("first conversion");
        let second = convert_document(&document, temp.path(), false, &options())
            .expect("second conversion");

        assert_eq!(second.instrument_rows[0].inid, 1);
        assert!(second.tables.is_none());
    }

    #[test]
    fn malformed_document_is_an_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("station.json");
        fs::write(&path, "{ not json").expect("fixture should be written");

        let error = crate::domain::PazfirError::from(
            load_station_document(&path).expect_err("parse should fail"),
        );
        assert_eq!(error.category(), PazfirErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.PAZFIR_DOCUMENT");
    }
}
