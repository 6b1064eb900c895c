use crate::common::time::julian_day_stamp;
use crate::domain::ChannelFields;

const EXTENSION_ORDER: [&str; 4] = ["paz", "fir", "iir", "fap"];

/// Concatenation of the distinct stage extensions, in `paz, fir, iir, fap` order.
pub(super) fn file_extension<'a>(kinds: impl IntoIterator<Item = &'a str>) -> String {
    let present = kinds.into_iter().collect::<Vec<_>>();
    EXTENSION_ORDER
        .iter()
        .filter(|extension| present.contains(*extension))
        .copied()
        .collect()
}

pub(super) fn response_file_name(fields: &ChannelFields, extension: &str) -> String {
    format!(
        "{}.{}.{}.{}.{}.{}",
        fields.network,
        fields.station,
        fields.channel,
        fields.location,
        julian_day_stamp(fields.start_time),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::{file_extension, response_file_name};
    use crate::domain::ChannelFields;

    #[test]
    fn extension_follows_priority_order() {
        assert_eq!(file_extension(["fap", "fir", "paz", "fir"]), "pazfirfap");
        assert_eq!(file_extension(["iir", "fir"]), "firiir");
        assert_eq!(file_extension(["fap"]), "fap");
        assert_eq!(file_extension(["generic"]), "");
    }

    #[test]
    fn file_name_uses_julian_day_of_start() {
        let fields = ChannelFields {
            network: "IU".to_string(),
            station: "ANMO".to_string(),
            location: String::new(),
            channel: "BHZ".to_string(),
            // 2021-03-01T00:00:00Z
            start_time: 1_614_556_800.0,
            end_time: None,
            sample_rate: 40.0,
            sensor_description: None,
            digitizer_description: None,
            preamplifier_description: None,
        };
        assert_eq!(
            response_file_name(&fields, "pazfir"),
            "IU.ANMO.BHZ..2021060.pazfir"
        );
    }
}
