use std::collections::HashMap;

/// One upload request, decoded and coerced into the rows it will produce.
/// All rows of a batch share the same profile, sensor, and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingBatch {
    pub profile_id: i64,
    pub sensor_id: i64,
    /// Rendered once per request as `YYYY-MM-DD HH:MM:SS` in the configured
    /// zone and reused verbatim for every row.
    pub recorded_at: String,
    pub temperature: Option<f64>,
    pub pulse_oximetry: Option<PulseOximetry>,
    pub ecg: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PulseOximetry {
    pub heart_rate: Option<i64>,
    pub spo2: Option<i64>,
}

impl ReadingBatch {
    /// Build a batch from decoded form fields. `P` and `S` must already have
    /// been checked for presence; here they coerce like every other field.
    pub fn from_params(params: &HashMap<String, String>, recorded_at: String) -> Self {
        let heart_rate = params.get("H").map(|raw| coerce_i64(raw));
        let spo2 = params.get("O").map(|raw| coerce_i64(raw));
        let pulse_oximetry = if heart_rate.is_some() || spo2.is_some() {
            Some(PulseOximetry { heart_rate, spo2 })
        } else {
            None
        };

        Self {
            profile_id: params.get("P").map(|raw| coerce_i64(raw)).unwrap_or(0),
            sensor_id: params.get("S").map(|raw| coerce_i64(raw)).unwrap_or(0),
            recorded_at,
            temperature: params.get("T").map(|raw| coerce_f64(raw)),
            pulse_oximetry,
            ecg: params.get("E").map(|raw| coerce_i64(raw)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.pulse_oximetry.is_none() && self.ecg.is_none()
    }
}

/// Decode a URL-encoded request body into a flat key/value map. Malformed
/// or empty bodies produce an empty map; duplicate keys keep the last value.
pub fn decode_form(body: &[u8]) -> HashMap<String, String> {
    form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Best-effort integer coercion: the longest leading numeric prefix of the
/// trimmed input, or 0 when there is none. Never fails.
pub fn coerce_i64(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let end = numeric_prefix_len(trimmed, false);
    trimmed[..end].parse().unwrap_or(0)
}

/// Best-effort float coercion with the same prefix rule, defaulting to 0.0.
pub fn coerce_f64(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let end = numeric_prefix_len(trimmed, true);
    trimmed[..end].parse().unwrap_or(0.0)
}

fn numeric_prefix_len(input: &str, allow_fraction: bool) -> usize {
    let bytes = input.as_bytes();
    let mut idx = 0;
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        idx = 1;
    }
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
        end = idx;
    }

    if allow_fraction {
        if idx < bytes.len() && bytes[idx] == b'.' {
            idx += 1;
            while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                idx += 1;
                end = idx;
            }
        }
        // An exponent only counts when at least one digit follows it.
        if end > 0 && idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
            let mut exp = idx + 1;
            if matches!(bytes.get(exp), Some(b'+') | Some(b'-')) {
                exp += 1;
            }
            let digits_start = exp;
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            if exp > digits_start {
                end = exp;
            }
        }
    }

    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn coerces_plain_integers() {
        assert_eq!(coerce_i64("42"), 42);
        assert_eq!(coerce_i64("-7"), -7);
        assert_eq!(coerce_i64("+13"), 13);
        assert_eq!(coerce_i64("  98"), 98);
    }

    #[test]
    fn integer_coercion_takes_numeric_prefix() {
        assert_eq!(coerce_i64("12abc"), 12);
        assert_eq!(coerce_i64("12.9"), 12);
        assert_eq!(coerce_i64("3e2"), 3);
    }

    #[test]
    fn integer_coercion_defaults_to_zero() {
        assert_eq!(coerce_i64(""), 0);
        assert_eq!(coerce_i64("abc"), 0);
        assert_eq!(coerce_i64("-"), 0);
        assert_eq!(coerce_i64("99999999999999999999999999"), 0);
    }

    #[test]
    fn coerces_floats() {
        assert_eq!(coerce_f64("36.6"), 36.6);
        assert_eq!(coerce_f64("-0.5"), -0.5);
        assert_eq!(coerce_f64(".5"), 0.5);
        assert_eq!(coerce_f64("1e3"), 1000.0);
        assert_eq!(coerce_f64("2.5e-1"), 0.25);
    }

    #[test]
    fn float_coercion_takes_numeric_prefix() {
        assert_eq!(coerce_f64("36.6C"), 36.6);
        assert_eq!(coerce_f64("12e"), 12.0);
        assert_eq!(coerce_f64("7.e2"), 700.0);
        assert_eq!(coerce_f64("7.5kg"), 7.5);
    }

    #[test]
    fn float_coercion_defaults_to_zero() {
        assert_eq!(coerce_f64(""), 0.0);
        assert_eq!(coerce_f64("hot"), 0.0);
        assert_eq!(coerce_f64("."), 0.0);
    }

    #[test]
    fn decodes_form_pairs() {
        let params = decode_form(b"P=1&S=2&T=36.6");
        assert_eq!(params.get("P").map(String::as_str), Some("1"));
        assert_eq!(params.get("S").map(String::as_str), Some("2"));
        assert_eq!(params.get("T").map(String::as_str), Some("36.6"));
    }

    #[test]
    fn decodes_percent_and_plus() {
        let params = decode_form(b"P=%31&S=2+");
        assert_eq!(params.get("P").map(String::as_str), Some("1"));
        assert_eq!(params.get("S").map(String::as_str), Some("2 "));
    }

    #[test]
    fn empty_body_decodes_to_empty_map() {
        assert!(decode_form(b"").is_empty());
    }

    #[test]
    fn bare_key_decodes_to_empty_value() {
        let params = decode_form(b"P=1&S=2&E");
        assert_eq!(params.get("E").map(String::as_str), Some(""));
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let params = decode_form(b"P=1&P=9");
        assert_eq!(params.get("P").map(String::as_str), Some("9"));
    }

    #[test]
    fn batch_with_only_identifiers_is_empty() {
        let batch = ReadingBatch::from_params(&params(&[("P", "1"), ("S", "2")]), "ts".into());
        assert!(batch.is_empty());
        assert_eq!(batch.profile_id, 1);
        assert_eq!(batch.sensor_id, 2);
    }

    #[test]
    fn temperature_key_produces_one_reading() {
        let batch = ReadingBatch::from_params(
            &params(&[("P", "1"), ("S", "2"), ("T", "36.6")]),
            "2024-05-01 10:00:00".into(),
        );
        assert_eq!(batch.temperature, Some(36.6));
        assert!(batch.pulse_oximetry.is_none());
        assert!(batch.ecg.is_none());
    }

    #[test]
    fn heart_rate_without_spo2_leaves_spo2_null() {
        let batch =
            ReadingBatch::from_params(&params(&[("P", "1"), ("S", "2"), ("H", "72")]), "ts".into());
        assert_eq!(
            batch.pulse_oximetry,
            Some(PulseOximetry {
                heart_rate: Some(72),
                spo2: None,
            })
        );
    }

    #[test]
    fn heart_rate_and_spo2_both_populate() {
        let batch = ReadingBatch::from_params(
            &params(&[("P", "1"), ("S", "2"), ("H", "72"), ("O", "97")]),
            "ts".into(),
        );
        assert_eq!(
            batch.pulse_oximetry,
            Some(PulseOximetry {
                heart_rate: Some(72),
                spo2: Some(97),
            })
        );
    }

    #[test]
    fn all_categories_share_identifiers_and_timestamp() {
        let batch = ReadingBatch::from_params(
            &params(&[("P", "5"), ("S", "6"), ("T", "37"), ("H", "80"), ("E", "512")]),
            "2024-05-01 10:00:00".into(),
        );
        assert_eq!(batch.profile_id, 5);
        assert_eq!(batch.sensor_id, 6);
        assert_eq!(batch.temperature, Some(37.0));
        assert_eq!(batch.ecg, Some(512));
        assert_eq!(batch.recorded_at, "2024-05-01 10:00:00");
    }

    #[test]
    fn non_numeric_identifiers_coerce_to_zero() {
        let batch = ReadingBatch::from_params(
            &params(&[("P", "patient"), ("S", "sensor"), ("E", "wave")]),
            "ts".into(),
        );
        assert_eq!(batch.profile_id, 0);
        assert_eq!(batch.sensor_id, 0);
        assert_eq!(batch.ecg, Some(0));
    }
}
