//! Formatting helpers shared by all dialects.
//!
//! All helpers are pure. Absent input never fails; it renders as an empty string or a
//! documented default.

use crate::segment::component;
use chrono::{NaiveDate, NaiveDateTime};
use lab_model::{LabTest, BLOCKED};

/// `yyyyMMddHHmmss`
pub const DATE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// `yyyyMMddHHmm`
pub const SHORT_DATE_TIME_FORMAT: &str = "%Y%m%d%H%M";

/// `yyyyMMdd`
pub const DATE_FORMAT: &str = "%Y%m%d";

/// `yyyy`
pub const YEAR_FORMAT: &str = "%Y";

/// Returns the value, or `""` when absent.
pub fn safe(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

/// Returns the value when present and non-empty, otherwise `default`.
pub fn safe_with_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Upper-cases the value, or returns `""` when absent.
pub fn safe_upper(value: Option<&str>) -> String {
    value.map(str::to_uppercase).unwrap_or_default()
}

/// Upper-cases the value, or returns `default` when absent.
///
/// A present but empty value stays empty.
pub fn safe_upper_or(value: Option<&str>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), str::to_uppercase)
}

pub fn format_date_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn format_short_date_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format(SHORT_DATE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn format_date(value: Option<NaiveDate>) -> String {
    value
        .map(|v| v.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn format_year(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format(YEAR_FORMAT).to_string())
        .unwrap_or_default()
}

/// Given and family name split out of a free-text name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameComponents {
    pub given: String,
    pub family: String,
}

/// Removes a leading `Dr` or `Dr.` title (any case) and the whitespace after it.
///
/// Only a whole token is removed: `"Drake"` is left alone.
pub fn strip_doctor_title(name: &str) -> &str {
    let trimmed = name.trim_start();
    let Some(prefix) = trimmed.get(..2) else {
        return trimmed;
    };
    if !prefix.eq_ignore_ascii_case("dr") {
        return trimmed;
    }

    let rest = &trimmed[2..];
    if let Some(after_dot) = rest.strip_prefix('.') {
        return after_dot.trim_start();
    }
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        return rest.trim_start();
    }
    trimmed
}

/// Splits a free-text name into upper-cased given (first token) and family (last token).
///
/// A leading `Dr` title is dropped. A single token becomes the given name.
pub fn parse_name(full_name: Option<&str>) -> NameComponents {
    let Some(full_name) = full_name else {
        return NameComponents::default();
    };

    let tokens: Vec<&str> = strip_doctor_title(full_name).split_whitespace().collect();
    match tokens.as_slice() {
        [] => NameComponents::default(),
        [only] => NameComponents {
            given: only.to_uppercase(),
            family: String::new(),
        },
        [first, .., last] => NameComponents {
            given: first.to_uppercase(),
            family: last.to_uppercase(),
        },
    }
}

/// How a low/high pair is rendered when no explicit range text exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeStyle {
    /// `low - high`
    Spaced,
    /// `low-high`
    Compact,
    /// `low-high^low - high`: machine-readable component then display component.
    Paired,
}

/// Builds the reference range of a test.
///
/// Explicit `ref_range_text` always wins and is used verbatim. Otherwise both bounds must
/// be present and non-empty. Otherwise the range is empty.
pub fn reference_range(test: &LabTest, style: RangeStyle) -> String {
    if let Some(text) = test.ref_range_text.as_deref().filter(|t| !t.is_empty()) {
        return text.to_string();
    }

    let low = test.ref_range_low.as_deref().filter(|v| !v.is_empty());
    let high = test.ref_range_high.as_deref().filter(|v| !v.is_empty());
    let (Some(low), Some(high)) = (low, high) else {
        return String::new();
    };

    match style {
        RangeStyle::Spaced => format!("{low} - {high}"),
        RangeStyle::Compact => format!("{low}-{high}"),
        RangeStyle::Paired => component(&[format!("{low}-{high}"), format!("{low} - {high}")]),
    }
}

/// Returns `"BLOCKED"` for blocked tests, `""` otherwise.
pub fn blocked_status(test: &LabTest) -> &'static str {
    if test.is_blocked() {
        BLOCKED
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranged(text: Option<&str>, low: Option<&str>, high: Option<&str>) -> LabTest {
        LabTest {
            ref_range_text: text.map(Into::into),
            ref_range_low: low.map(Into::into),
            ref_range_high: high.map(Into::into),
            ..LabTest::default()
        }
    }

    #[test]
    fn safe_helpers_substitute_defaults() {
        assert_eq!(safe(None), "");
        assert_eq!(safe(Some("x")), "x");
        assert_eq!(safe_with_default(None, "FT"), "FT");
        assert_eq!(safe_with_default(Some(""), "FT"), "FT");
        assert_eq!(safe_with_default(Some("NM"), "FT"), "NM");
        assert_eq!(safe_upper(Some("Smith")), "SMITH");
        assert_eq!(safe_upper(None), "");
        assert_eq!(safe_upper_or(None, "TEST"), "TEST");
        assert_eq!(safe_upper_or(Some(""), "TEST"), "");
        assert_eq!(safe_upper_or(Some("glucose"), "TEST"), "GLUCOSE");
    }

    #[test]
    fn date_formatters_cover_four_granularities() {
        let dt = NaiveDate::from_ymd_opt(2023, 6, 9)
            .and_then(|d| d.and_hms_opt(23, 12, 52))
            .expect("valid timestamp");

        assert_eq!(format_date_time(Some(dt)), "20230609231252");
        assert_eq!(format_short_date_time(Some(dt)), "202306092312");
        assert_eq!(format_date(Some(dt.date())), "20230609");
        assert_eq!(format_year(Some(dt)), "2023");

        assert_eq!(format_date_time(None), "");
        assert_eq!(format_short_date_time(None), "");
        assert_eq!(format_date(None), "");
        assert_eq!(format_year(None), "");
    }

    #[test]
    fn parse_name_strips_title_and_splits() {
        let name = parse_name(Some("Dr. John Q Smith"));
        assert_eq!(name.given, "JOHN");
        assert_eq!(name.family, "SMITH");

        let name = parse_name(Some("dr Adward"));
        assert_eq!(name.given, "ADWARD");
        assert_eq!(name.family, "");

        assert_eq!(parse_name(Some("   ")), NameComponents::default());
        assert_eq!(parse_name(Some("Dr")), NameComponents::default());
        assert_eq!(parse_name(None), NameComponents::default());
    }

    #[test]
    fn doctor_title_must_be_a_whole_token() {
        assert_eq!(strip_doctor_title("Drake Smith"), "Drake Smith");
        assert_eq!(strip_doctor_title("DR.Smith"), "Smith");
        assert_eq!(strip_doctor_title("  Dr   Who"), "Who");
        assert_eq!(strip_doctor_title("D"), "D");
    }

    #[test]
    fn range_text_takes_precedence_in_every_style() {
        let test = ranged(Some("NEGATIVE"), Some("1"), Some("2"));
        for style in [RangeStyle::Spaced, RangeStyle::Compact, RangeStyle::Paired] {
            assert_eq!(reference_range(&test, style), "NEGATIVE");
        }
    }

    #[test]
    fn range_bounds_follow_style() {
        let test = ranged(None, Some("1.005"), Some("1.030"));
        assert_eq!(reference_range(&test, RangeStyle::Spaced), "1.005 - 1.030");
        assert_eq!(reference_range(&test, RangeStyle::Compact), "1.005-1.030");
        assert_eq!(
            reference_range(&test, RangeStyle::Paired),
            "1.005-1.030^1.005 - 1.030"
        );
    }

    #[test]
    fn range_needs_both_bounds() {
        let low_only = ranged(None, Some("1"), None);
        assert_eq!(reference_range(&low_only, RangeStyle::Spaced), "");

        let empty_high = ranged(None, Some("3"), Some(""));
        assert_eq!(reference_range(&empty_high, RangeStyle::Spaced), "");
        assert_eq!(reference_range(&empty_high, RangeStyle::Paired), "");

        let blank = ranged(Some(""), Some(""), Some("2"));
        assert_eq!(reference_range(&blank, RangeStyle::Paired), "");
        assert_eq!(reference_range(&LabTest::default(), RangeStyle::Compact), "");
    }

    #[test]
    fn blocked_status_is_literal_match() {
        let mut test = LabTest::default();
        assert_eq!(blocked_status(&test), "");
        test.blocked = Some("Y".into());
        assert_eq!(blocked_status(&test), "");
        test.blocked = Some("BLOCKED".into());
        assert_eq!(blocked_status(&test), "BLOCKED");
    }
}
