//! Source-agnostic value cleaning.
//!
//! Scraped values embed display units and locale punctuation that the
//! certification table must not carry:
//!
//! - mass (`kg`) and volume (`cm³`) figures use `.`/`,` as thousands
//!   separators and keep the unit token (`"1.234 kg"`),
//! - registry lengths are centimetres while the document wants whole
//!   millimetres (`"320 cm"` → `"3200"`).
//!
//! Cleaning runs over the whole value column *after* structural
//! derivation, so composite values like `"154 cm/154 cm"` are normalized
//! token-by-token.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CleanError, CleanResult};

/// Unit tokens whose figures use grouping punctuation, in match priority
/// order. Only the first token found triggers the separator strip.
const GROUPED_UNITS: [&str; 2] = ["kg", "cm³"];

static KG_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*kg").expect("static pattern"));
static CM3_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*cm³").expect("static pattern"));
static CM_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*cm").expect("static pattern"));

/// Clean a single attribute value.
///
/// `None` passes through unchanged; values without recognized units come
/// back untouched. See the module docs for the applied rules.
pub fn clean_value(value: Option<&str>) -> CleanResult<Option<String>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let mut v = raw.to_string();

    if GROUPED_UNITS.iter().any(|unit| v.contains(unit)) {
        // First matching unit wins the separator strip, then break.
        for unit in GROUPED_UNITS {
            if v.contains(unit) {
                v = v.replace(['.', ','], "");
                break;
            }
        }
        v = KG_TOKEN.replace_all(&v, "").into_owned();
        v = CM3_TOKEN.replace_all(&v, "").into_owned();
        v = v.trim().to_string();
    }

    if v.contains("cm") {
        v = convert_centimetres(&v)?;
    }

    Ok(Some(v))
}

/// Replace every `<number> cm` run with its whole-millimetre equivalent.
fn convert_centimetres(value: &str) -> CleanResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for caps in CM_FIGURE.captures_iter(value) {
        let matched = caps.get(0).expect("whole match");
        let number = &caps[1];
        let bad = || CleanError::BadCentimetreFigure {
            raw: value.to_string(),
            number: number.to_string(),
        };
        let figure: f64 = number.parse().map_err(|_| bad())?;
        let mm = (figure * 10.0).round();
        if !mm.is_finite() || mm < i64::MIN as f64 || mm > i64::MAX as f64 {
            return Err(bad());
        }
        out.push_str(&value[last..matched.start()]);
        out.push_str(&(mm as i64).to_string());
        last = matched.end();
    }
    out.push_str(&value[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(v: &str) -> String {
        clean_value(Some(v)).unwrap().unwrap()
    }

    #[test]
    fn test_none_passes_through() {
        assert_eq!(clean_value(None).unwrap(), None);
    }

    #[test]
    fn test_kg_figure_loses_separator_and_unit() {
        assert_eq!(clean("1.234 kg"), "1234");
        assert_eq!(clean("680 kg"), "680");
    }

    #[test]
    fn test_volume_figure() {
        assert_eq!(clean("1.998 cm³"), "1998");
    }

    #[test]
    fn test_cm_converts_to_whole_millimetres() {
        assert_eq!(clean("320 cm"), "3200");
        assert_eq!(clean("261cm"), "2610");
    }

    #[test]
    fn test_fractional_centimetres_round() {
        assert_eq!(clean("32.5 cm"), "325");
    }

    #[test]
    fn test_composite_values_clean_token_by_token() {
        assert_eq!(clean("154 cm/154 cm"), "1540/1540");
        assert_eq!(clean("930 kg/980 kg"), "930/980");
    }

    #[test]
    fn test_unitless_value_is_untouched() {
        assert_eq!(clean("Benzine"), "Benzine");
        assert_eq!(clean("110 kW"), "110 kW");
        assert_eq!(clean("869 - 869"), "869 - 869");
    }

    #[test]
    fn test_oversized_centimetre_figure_is_an_error() {
        let raw = format!("{} cm", "9".repeat(400));
        let err = clean_value(Some(&raw)).unwrap_err();
        assert!(matches!(err, CleanError::BadCentimetreFigure { .. }));
        assert!(err.to_string().contains("millimetres"));
    }
}
