//! YAML document format for submitted laboratory results.
//!
//! Responsibilities:
//! - Define a strict wire model for serialisation/deserialisation
//! - Translate between the wire model and the [`Lab`] aggregate
//! - Parse dates using the formats of the lab submission form
//!
//! Notes:
//! - Every key is optional except `tests`
//! - Blank strings are read as absent values
//! - Whether `tests` is non-empty is checked by the encoders, not here

use crate::{Lab, LabTest, ModelError, ModelResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format of `lab_req_date` and test `date` values (`2024-03-01 09:30`).
pub const DATE_TIME_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format of `dob` values (`1995-12-11`).
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Lab document operations.
///
/// This is a zero-sized type used for namespacing document-related operations.
/// All methods are associated functions.
pub struct LabDocument;

impl LabDocument {
    /// Parse a lab document from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `tests[0].code`) to the
    /// failing field when the YAML does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if:
    /// - the text is not well-formed YAML ([`ModelError::InvalidYaml`]),
    /// - the YAML does not represent a lab document,
    /// - any field has an unexpected type,
    /// - any unknown keys are present (due to `#[serde(deny_unknown_fields)]`),
    /// - a date does not match the submission form format.
    pub fn parse(yaml_text: &str) -> ModelResult<Lab> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml_text)?;

        let wire = match serde_path_to_error::deserialize::<_, LabWire>(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(ModelError::Translation(format!(
                    "Lab document schema mismatch at {path}: {source}"
                )));
            }
        };

        wire_to_domain(wire)
    }

    /// Render a lab as YAML text. Absent values are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if serialisation fails.
    pub fn render(lab: &Lab) -> ModelResult<String> {
        let wire = domain_to_wire(lab);
        serde_yaml::to_string(&wire)
            .map_err(|e| ModelError::Translation(format!("Failed to serialise lab: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct LabWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lab_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accession: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lab_req_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    hin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    billing_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cc: Option<String>,

    tests: Vec<LabTestWire>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct LabTestWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ref_range_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ref_range_low: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ref_range_high: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blocked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Drops blank values so that `key: ""` and a missing key read the same way.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date_time(field: &str, value: Option<String>) -> ModelResult<Option<NaiveDateTime>> {
    present(value)
        .map(|v| {
            NaiveDateTime::parse_from_str(v.trim(), DATE_TIME_INPUT_FORMAT).map_err(|_| {
                ModelError::InvalidDate {
                    field: field.to_string(),
                    value: v,
                }
            })
        })
        .transpose()
}

fn parse_date(field: &str, value: Option<String>) -> ModelResult<Option<NaiveDate>> {
    present(value)
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), DATE_INPUT_FORMAT).map_err(|_| {
                ModelError::InvalidDate {
                    field: field.to_string(),
                    value: v,
                }
            })
        })
        .transpose()
}

/// Convert the wire document to the domain aggregate.
fn wire_to_domain(wire: LabWire) -> ModelResult<Lab> {
    let lab_req_date = parse_date_time("lab_req_date", wire.lab_req_date)?;
    let dob = parse_date("dob", wire.dob)?;

    let mut tests = Vec::with_capacity(wire.tests.len());
    for (idx, t) in wire.tests.into_iter().enumerate() {
        let date = parse_date_time(&format!("tests[{idx}].date"), t.date)?;
        tests.push(LabTest {
            code: present(t.code),
            name: present(t.name),
            description: present(t.description),
            code_type: present(t.code_type),
            code_value: present(t.code_value),
            code_unit: present(t.code_unit),
            ref_range_text: present(t.ref_range_text),
            ref_range_low: present(t.ref_range_low),
            ref_range_high: present(t.ref_range_high),
            flag: present(t.flag),
            stat: present(t.stat),
            blocked: present(t.blocked),
            notes: present(t.notes),
            date,
        });
    }

    Ok(Lab {
        lab_name: present(wire.lab_name),
        accession: present(wire.accession),
        hin: present(wire.hin),
        billing_no: present(wire.billing_no),
        first_name: present(wire.first_name),
        last_name: present(wire.last_name),
        dob,
        sex: present(wire.sex),
        phone: present(wire.phone),
        provider_first_name: present(wire.provider_first_name),
        provider_last_name: present(wire.provider_last_name),
        cc: present(wire.cc),
        lab_req_date,
        tests,
    })
}

/// Convert the domain aggregate to the wire document.
fn domain_to_wire(lab: &Lab) -> LabWire {
    LabWire {
        lab_name: lab.lab_name.clone(),
        accession: lab.accession.clone(),
        lab_req_date: lab
            .lab_req_date
            .map(|d| d.format(DATE_TIME_INPUT_FORMAT).to_string()),
        hin: lab.hin.clone(),
        first_name: lab.first_name.clone(),
        last_name: lab.last_name.clone(),
        dob: lab.dob.map(|d| d.format(DATE_INPUT_FORMAT).to_string()),
        sex: lab.sex.clone(),
        phone: lab.phone.clone(),
        billing_no: lab.billing_no.clone(),
        provider_first_name: lab.provider_first_name.clone(),
        provider_last_name: lab.provider_last_name.clone(),
        cc: lab.cc.clone(),
        tests: lab
            .tests
            .iter()
            .map(|t| LabTestWire {
                date: t.date.map(|d| d.format(DATE_TIME_INPUT_FORMAT).to_string()),
                code: t.code.clone(),
                name: t.name.clone(),
                description: t.description.clone(),
                code_type: t.code_type.clone(),
                code_value: t.code_value.clone(),
                code_unit: t.code_unit.clone(),
                ref_range_text: t.ref_range_text.clone(),
                ref_range_low: t.ref_range_low.clone(),
                ref_range_high: t.ref_range_high.clone(),
                flag: t.flag.clone(),
                stat: t.stat.clone(),
                blocked: t.blocked.clone(),
                notes: t.notes.clone(),
            })
            .collect(),
    }
}
