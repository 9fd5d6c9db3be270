//! Domain-level laboratory result types.
//!
//! Every descriptive field is optional. Producers of a [`Lab`] are not required to fill
//! anything beyond the tests themselves; the encoders substitute their own defaults.

use chrono::{NaiveDate, NaiveDateTime};

/// Marker value of [`LabTest::blocked`] that flags a result as blocked from patient view.
pub const BLOCKED: &str = "BLOCKED";

/// A submitted laboratory result for one patient.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lab {
    /// Name of the receiving laboratory (for example `"MDS"`); selects the message dialect.
    pub lab_name: Option<String>,

    /// Accession number assigned to the order/specimen.
    pub accession: Option<String>,

    /// Health insurance number from the patient's health card.
    pub hin: Option<String>,

    /// Billing number of the ordering provider.
    pub billing_no: Option<String>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,

    pub provider_first_name: Option<String>,
    pub provider_last_name: Option<String>,

    /// Semicolon-separated copy-to doctors.
    ///
    /// Each entry is either `billing,last,first` or a free-text name such as `Dr Adward`.
    pub cc: Option<String>,

    /// When the tests were requested.
    pub lab_req_date: Option<NaiveDateTime>,

    /// Ordered result lines. The first test supplies scheduling timestamps.
    pub tests: Vec<LabTest>,
}

impl Lab {
    /// Returns the first test, if any.
    pub fn first_test(&self) -> Option<&LabTest> {
        self.tests.first()
    }

    /// Returns `true` if at least one test carries the [`BLOCKED`] marker.
    pub fn has_blocked_test(&self) -> bool {
        self.tests.iter().any(LabTest::is_blocked)
    }
}

/// One discrete result line of a [`Lab`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabTest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,

    /// HL7 value type of the result (for example `FT`, `ST`, `NM`).
    pub code_type: Option<String>,
    pub code_value: Option<String>,
    pub code_unit: Option<String>,

    pub ref_range_text: Option<String>,
    pub ref_range_low: Option<String>,
    pub ref_range_high: Option<String>,

    /// Abnormal flag (for example `H`, `L`, `N`).
    pub flag: Option<String>,

    /// Result status (for example `F` for final).
    pub stat: Option<String>,

    /// `"BLOCKED"` when the result is withheld; any other value means not blocked.
    pub blocked: Option<String>,

    pub notes: Option<String>,

    /// When the result was produced.
    pub date: Option<NaiveDateTime>,
}

impl LabTest {
    /// Returns `true` if this test carries the [`BLOCKED`] marker.
    pub fn is_blocked(&self) -> bool {
        self.blocked.as_deref() == Some(BLOCKED)
    }
}
