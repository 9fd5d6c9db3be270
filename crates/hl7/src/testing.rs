//! Fixtures shared by the encoder tests.

use crate::clock::{Clock, FixedClock};
use chrono::{NaiveDate, NaiveDateTime};
use lab_model::{Lab, LabTest};
use std::sync::Arc;

pub(crate) fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .expect("valid timestamp")
}

/// 2023-06-09 23:12:52 UTC, epoch millis 1686352372000.
pub(crate) fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::at(at(2023, 6, 9, 23, 12, 52)))
}

pub(crate) const FIXED_MILLIS: i64 = 1_686_352_372_000;

/// A two-test lab: a glucose result with notes and a blocked protein result.
pub(crate) fn sample_lab() -> Lab {
    Lab {
        lab_name: None,
        accession: Some("AC-46222032".into()),
        hin: Some("9876543225".into()),
        billing_no: Some("045717".into()),
        first_name: Some("Patient".into()),
        last_name: Some("Test".into()),
        dob: NaiveDate::from_ymd_opt(1995, 12, 11),
        sex: Some("F".into()),
        phone: None,
        provider_first_name: Some("Azizi".into()),
        provider_last_name: Some("Namini".into()),
        cc: Some("12345,Smith,John;Dr Adward".into()),
        lab_req_date: Some(at(2023, 6, 9, 9, 49, 0)),
        tests: vec![
            LabTest {
                code: Some("253".into()),
                name: Some("Glucose".into()),
                description: Some("Urine glucose".into()),
                code_type: Some("FT".into()),
                code_value: Some("NEG".into()),
                code_unit: Some("mmol/L".into()),
                ref_range_low: Some("3.6".into()),
                ref_range_high: Some("6.1".into()),
                flag: Some("N".into()),
                notes: Some("Fasting sample".into()),
                date: Some(at(2023, 6, 9, 9, 49, 0)),
                ..LabTest::default()
            },
            LabTest {
                code: Some("254".into()),
                name: Some("Total Protein".into()),
                code_type: Some("NM".into()),
                code_value: Some("0.3".into()),
                code_unit: Some("g/L".into()),
                ref_range_text: Some("<0.15".into()),
                flag: Some("H".into()),
                stat: Some("P".into()),
                blocked: Some("BLOCKED".into()),
                date: Some(at(2023, 6, 9, 10, 15, 30)),
                ..LabTest::default()
            },
        ],
    }
}

/// Lines of a rendered message with the final terminator removed.
pub(crate) fn lines(message: &str) -> Vec<&str> {
    assert!(message.ends_with('\n'), "message must end with a terminator");
    message.lines().collect()
}

/// Segment IDs of a rendered message, in order.
pub(crate) fn segment_ids(message: &str) -> Vec<&str> {
    lines(message)
        .into_iter()
        .map(|line| line.split('|').next().unwrap_or(""))
        .collect()
}
