use std::fs;
use std::path::Path;

/// Right-aligned fixed-point column.
pub fn format_fixed_f64(value: f64, width: usize, precision: usize) -> String {
    format!("{value:>width$.precision$}")
}

/// `d.ddde±XX` with at least two exponent digits.
pub fn format_scientific(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let raw = format!("{value:.precision$e}", precision = precision);
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let exponent = exponent.parse::<i32>().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

/// Left-aligned string column truncated to `width` characters.
pub fn format_fixed_str(value: &str, width: usize) -> String {
    let truncated = value.chars().take(width).collect::<String>();
    format!("{truncated:<width$}", width = width)
}

pub fn format_fixed_i64(value: i64, width: usize) -> String {
    format!("{value:>width$}", width = width)
}

/// Float token that also accepts Fortran `D` exponents.
pub fn parse_numeric_token(token: &str) -> Option<f64> {
    token.replace(['D', 'd'], "e").parse::<f64>().ok()
}

/// Unix line endings with a trailing newline; empty text stays empty.
pub fn normalize_text_artifact(content: &str) -> String {
    let unix = content.replace("\r\n", "\n").replace('\r', "\n");
    if unix.is_empty() || unix.ends_with('\n') {
        unix
    } else {
        unix + "\n"
    }
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    let text = normalize_text_artifact(content);
    fs::write(path, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{
        format_fixed_f64, format_fixed_i64, format_fixed_str, format_scientific,
        normalize_text_artifact, parse_numeric_token, write_text_artifact,
    };
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn time_columns_keep_five_decimals() {
        assert_eq!(format_fixed_f64(1_577_836_800.0, 17, 5), " 1577836800.00000");
        assert_eq!(format_fixed_f64(-0.5, 6, 2), " -0.50");
    }

    #[test]
    fn scientific_notation_pads_exponent() {
        assert_eq!(format_scientific(1500.0, 3), "1.500e+03");
        assert_eq!(format_scientific(-0.00025, 2), "-2.50e-04");
        assert_eq!(format_scientific(0.0, 1), "0.0e+00");
        assert_eq!(format_scientific(6.02e123, 2), "6.02e+123");
    }

    #[test]
    fn string_and_integer_columns_respect_width() {
        assert_eq!(format_fixed_str("ANMO", 6), "ANMO  ");
        assert_eq!(format_fixed_str("TOOLONGNAME", 6), "TOOLON");
        assert_eq!(format_fixed_i64(42, 8), "      42");
    }

    #[test]
    fn numeric_tokens_accept_fortran_exponents() {
        assert_eq!(parse_numeric_token("1.5D+02"), Some(150.0));
        assert_eq!(parse_numeric_token("-2.0d-1"), Some(-0.2));
        assert_eq!(parse_numeric_token("3.25E0"), Some(3.25));
        assert_eq!(parse_numeric_token("paz"), None);
    }

    #[test]
    fn response_text_gets_unix_line_endings_and_final_newline() {
        let text = normalize_text_artifact("theoretical 1 instrument paz -\r\n1.0\r0");
        assert_eq!(text, "theoretical 1 instrument paz -\n1.0\n0\n");
        assert_eq!(normalize_text_artifact(""), "");
    }

    #[test]
    fn rewriting_a_response_file_is_byte_stable() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("IU.ANMO.BHZ.00.1970001.pazfir");
        let text = "# network: IU\r\ntheoretical 1 instrument paz -";

        write_text_artifact(&path, text).expect("first write should succeed");
        let before = fs::read_to_string(&path).expect("response file should be readable");
        write_text_artifact(&path, text).expect("second write should succeed");
        let after = fs::read_to_string(&path).expect("response file should be readable");

        assert_eq!(before, after);
        assert_eq!(after, "# network: IU\ntheoretical 1 instrument paz -\n");
    }
}
