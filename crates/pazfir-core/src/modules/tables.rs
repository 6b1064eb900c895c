//! Fixed-width `sensor` and `instrument` rows in the CSS3.0 column layout.

use crate::common::time::load_date;
use crate::modules::serialization::{format_fixed_f64, format_fixed_i64, format_fixed_str};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Column-info contract of the relational schema: name, width and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub width: usize,
    pub format: ColumnFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Text,
    Integer,
    Fixed { precision: usize },
    LoadDate,
}

const fn column(name: &'static str, width: usize, format: ColumnFormat) -> ColumnInfo {
    ColumnInfo {
        name,
        width,
        format,
    }
}

pub const DEFAULT_END_TIME: f64 = 9_999_999_999.999;

/// Null value of the `calper` and `ncalper` columns.
pub const NA_PERIOD: f64 = -1.0;

/// Null value of the `ncalib` column.
pub const NA_NCALIB: f64 = 1.0;

pub const SENSOR_COLUMNS: [ColumnInfo; 12] = [
    column("sta", 6, ColumnFormat::Text),
    column("chan", 8, ColumnFormat::Text),
    column("time", 17, ColumnFormat::Fixed { precision: 5 }),
    column("endtime", 17, ColumnFormat::Fixed { precision: 5 }),
    column("inid", 8, ColumnFormat::Integer),
    column("chanid", 8, ColumnFormat::Integer),
    column("jdate", 8, ColumnFormat::Integer),
    column("calratio", 16, ColumnFormat::Fixed { precision: 6 }),
    column("calper", 16, ColumnFormat::Fixed { precision: 6 }),
    column("tshift", 6, ColumnFormat::Fixed { precision: 2 }),
    column("instant", 1, ColumnFormat::Text),
    column("lddate", 17, ColumnFormat::LoadDate),
];

pub const INSTRUMENT_COLUMNS: [ColumnInfo; 12] = [
    column("inid", 8, ColumnFormat::Integer),
    column("insname", 50, ColumnFormat::Text),
    column("instype", 6, ColumnFormat::Text),
    column("band", 1, ColumnFormat::Text),
    column("digital", 1, ColumnFormat::Text),
    column("samprate", 11, ColumnFormat::Fixed { precision: 7 }),
    column("ncalib", 16, ColumnFormat::Fixed { precision: 6 }),
    column("ncalper", 16, ColumnFormat::Fixed { precision: 6 }),
    column("dir", 64, ColumnFormat::Text),
    column("dfile", 32, ColumnFormat::Text),
    column("rsptype", 6, ColumnFormat::Text),
    column("lddate", 17, ColumnFormat::LoadDate),
];

/// Total characters of a rendered row: column widths plus one separator each.
pub fn row_width(columns: &[ColumnInfo]) -> usize {
    columns.iter().map(|column| column.width).sum::<usize>() + columns.len().saturating_sub(1)
}

enum Cell<'a> {
    Text(&'a str),
    Integer(i64),
    Float(f64),
    Date(&'a DateTime<Utc>),
}

fn render_row(columns: &[ColumnInfo], cells: &[Cell<'_>]) -> String {
    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| match (column.format, cell) {
            (ColumnFormat::Fixed { precision }, Cell::Float(value)) => {
                format_fixed_f64(*value, column.width, precision)
            }
            (_, Cell::Date(time)) => format_fixed_str(&load_date(time), column.width),
            (_, Cell::Integer(value)) => format_fixed_i64(*value, column.width),
            (_, Cell::Text(value)) => format_fixed_str(value, column.width),
            (_, Cell::Float(value)) => format_fixed_str(&value.to_string(), column.width),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRow {
    pub sta: String,
    pub chan: String,
    pub time: f64,
    pub endtime: f64,
    pub inid: i64,
    pub chanid: i64,
    pub jdate: i64,
    pub calratio: f64,
    pub calper: f64,
    pub tshift: f64,
    pub instant: String,
    /// Rendered as `%y-%m-%d %H:%M:%S`.
    pub lddate: DateTime<Utc>,
}

impl SensorRow {
    pub fn to_fixed_width(&self) -> String {
        render_row(
            &SENSOR_COLUMNS,
            &[
                Cell::Text(&self.sta),
                Cell::Text(&self.chan),
                Cell::Float(self.time),
                Cell::Float(self.endtime),
                Cell::Integer(self.inid),
                Cell::Integer(self.chanid),
                Cell::Integer(self.jdate),
                Cell::Float(self.calratio),
                Cell::Float(self.calper),
                Cell::Float(self.tshift),
                Cell::Text(&self.instant),
                Cell::Date(&self.lddate),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentRow {
    pub inid: i64,
    pub insname: String,
    pub instype: String,
    pub band: String,
    pub digital: String,
    pub samprate: f64,
    pub ncalib: f64,
    pub ncalper: f64,
    pub dir: String,
    pub dfile: String,
    pub rsptype: String,
    pub lddate: DateTime<Utc>,
}

impl InstrumentRow {
    pub fn to_fixed_width(&self) -> String {
        render_row(
            &INSTRUMENT_COLUMNS,
            &[
                Cell::Integer(self.inid),
                Cell::Text(&self.insname),
                Cell::Text(&self.instype),
                Cell::Text(&self.band),
                Cell::Text(&self.digital),
                Cell::Float(self.samprate),
                Cell::Float(self.ncalib),
                Cell::Float(self.ncalper),
                Cell::Text(&self.dir),
                Cell::Text(&self.dfile),
                Cell::Text(&self.rsptype),
                Cell::Date(&self.lddate),
            ],
        )
    }
}

pub fn render_table<T>(rows: &[T], render: impl Fn(&T) -> String) -> String {
    rows.iter().map(|row| render(row) + "\n").collect()
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_END_TIME, INSTRUMENT_COLUMNS, InstrumentRow, SENSOR_COLUMNS, SensorRow,
        render_table, row_width,
    };
    use chrono::{DateTime, Utc};

    fn sensor() -> SensorRow {
        SensorRow {
            sta: "ANMOLONG".to_string(),
            chan: "BHZ".to_string(),
            time: 0.0,
            endtime: DEFAULT_END_TIME,
            inid: 1,
            chanid: 1,
            jdate: 1_970_001,
            calratio: 1.0,
            calper: 1.0,
            tshift: 0.0,
            instant: "y".to_string(),
            lddate: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn sensor_row_matches_column_widths() {
        let line = sensor().to_fixed_width();
        assert_eq!(line.len(), row_width(&SENSOR_COLUMNS));
        assert_eq!(line.len(), 139);
        assert!(line.starts_with("ANMOLO BHZ      "));
        assert!(line.contains(" 9999999999.99900 "));
        assert!(line.ends_with(" y 70-01-01 00:00:00"));
    }

    #[test]
    fn instrument_row_matches_column_widths() {
        let row = InstrumentRow {
            inid: 12,
            insname: "STS-2 / Q330".to_string(),
            instype: "-".to_string(),
            band: "b".to_string(),
            digital: "d".to_string(),
            samprate: 40.0,
            ncalib: 1.25,
            ncalper: 1.0,
            dir: "/data/responses".to_string(),
            dfile: "IU.ANMO.BHZ.00.1970001.pazfirfap".to_string(),
            rsptype: "pazfirfap".to_string(),
            lddate: DateTime::<Utc>::default(),
        };
        let line = row.to_fixed_width();

        assert_eq!(line.len(), row_width(&INSTRUMENT_COLUMNS));
        assert_eq!(line.len(), 239);
        assert!(line.starts_with("      12 STS-2 / Q330"));
        assert!(line.contains(" 40.0000000 "));
        assert!(line.contains(" pazfir "));
    }

    #[test]
    fn table_has_one_line_per_row() {
        let table = render_table(&[sensor(), sensor()], SensorRow::to_fixed_width);
        assert_eq!(table.lines().count(), 2);
        assert!(table.ends_with('\n'));
    }
}
