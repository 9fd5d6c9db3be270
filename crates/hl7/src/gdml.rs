//! GDML receiver.
//!
//! Message shape: `MSH PID ZDR* OBR (OBX NTE?)+`.
//!
//! The receiver's parser has several fixed expectations:
//! - PID-2 is the health number (`hin^FW^ON`) and PID-3 the accession.
//! - Names are upper-cased; the address block is a fixed literal.
//! - CC doctors are only listed when ZDR-4 carries a given name.
//! - `FT` results are dropped on display, so they are sent as `ST`.
//! - Reference ranges are two components: `low-high^low - high`.

use crate::cc::{parse_cc_doctors, CcDoctor, DEFAULT_BILLING};
use crate::clock::Clock;
use crate::dialect::{first_test, Dialect, LabMessageDialect};
use crate::format::{
    blocked_status, format_date, format_date_time, format_short_date_time, reference_range,
    safe, safe_upper, safe_with_default, RangeStyle,
};
use crate::segment::{component, subcomponent, Message, Segment, ENCODING_CHARACTERS};
use crate::Hl7Result;
use lab_model::{Lab, LabTest};
use std::sync::Arc;

const APPLICATION: &str = "GDML";
const PATIENT_ADDRESS: &str = "123 MAIN RD^NORTH YORK^ONTARIO^ON^M6B3Y5";
const DEFAULT_TEST_CODE: &str = "253";
const DEFAULT_TEST_NAME: &str = "LABORATORY";

pub struct Gdml {
    clock: Arc<dyn Clock>,
}

impl Gdml {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn msh(now: &str, millis: i64) -> Segment {
        Segment::new("MSH")
            .set(1, ENCODING_CHARACTERS)
            .set(2, APPLICATION)
            .set(3, APPLICATION)
            .set(6, now)
            .set(8, "ORU^R01")
            .set(9, format!("MAGENTA .{millis}"))
            .set(10, "P")
            .set(11, "2.3")
    }

    fn pid(lab: &Lab, millis: i64) -> Segment {
        let fallback = format!("LAB{millis}");
        Segment::new("PID")
            .set(1, "1")
            .set(2, component(&[safe(lab.hin.as_deref()), "FW", "ON"]))
            .set(3, safe_with_default(lab.accession.as_deref(), &fallback))
            .set(
                5,
                component(&[
                    safe_upper(lab.last_name.as_deref()),
                    safe_upper(lab.first_name.as_deref()),
                    String::new(),
                ]),
            )
            .set(7, format_date(lab.dob))
            .set(8, safe(lab.sex.as_deref()))
            .set(11, PATIENT_ADDRESS)
            .set(13, safe(lab.phone.as_deref()))
    }

    fn zdr(doctor: &CcDoctor) -> Segment {
        let name = doctor.name_components();
        Segment::new("ZDR")
            .set(3, doctor.billing())
            .set(4, component(&[name.given, name.family, String::new()]))
    }

    fn obr(lab: &Lab, first: &LabTest, now: &str) -> Segment {
        let observed = format_short_date_time(first.date);
        let code = safe_with_default(first.code.as_deref(), DEFAULT_TEST_CODE);
        let name = safe_with_default(first.name.as_deref(), DEFAULT_TEST_NAME).to_uppercase();
        let local_code = format!("L{code}A");
        let provider = component(&[
            safe_with_default(lab.billing_no.as_deref(), DEFAULT_BILLING).to_string(),
            safe_upper(lab.provider_last_name.as_deref()),
            safe_upper(lab.provider_first_name.as_deref()),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ]);

        Segment::new("OBR")
            .set(1, "1")
            .set(
                4,
                component(&[code, name.as_str(), local_code.as_str(), name.as_str()]),
            )
            .set(5, "R")
            .set(6, observed.clone())
            .set(7, observed)
            .set(9, "0000")
            .set(11, "N")
            .set(16, provider)
            .set(22, now)
            .with_len(27)
    }

    fn obx(set_id: usize, test: &LabTest, default_code: &str) -> Segment {
        let value_type = match test.code_type.as_deref() {
            Some("FT") => "ST",
            other => safe_with_default(other, "ST"),
        };
        let code = safe_with_default(test.code.as_deref(), default_code);
        let identifier = component(&[
            subcomponent(&[code.to_string(), (20 + set_id).to_string()]),
            safe_upper(test.name.as_deref()),
        ]);

        Segment::new("OBX")
            .set(1, set_id.to_string())
            .set(2, value_type)
            .set(3, identifier)
            .set(4, "1")
            .set(5, safe(test.code_value.as_deref()))
            .set(6, safe(test.code_unit.as_deref()))
            .set(7, reference_range(test, RangeStyle::Paired))
            .set(8, safe_with_default(test.flag.as_deref(), "N"))
            .set(11, safe_with_default(test.stat.as_deref(), "F"))
            .set(13, blocked_status(test))
            .with_len(17)
    }
}

impl LabMessageDialect for Gdml {
    fn dialect(&self) -> Dialect {
        Dialect::Gdml
    }

    fn compose(&self, lab: &Lab) -> Hl7Result<String> {
        let first = first_test(lab, Dialect::Gdml)?;
        let instant = self.clock.now();
        let now = format_date_time(Some(instant.naive_local()));
        let millis = instant.timestamp_millis();

        let mut message = Message::new();
        message.push(Self::msh(&now, millis));
        message.push(Self::pid(lab, millis));
        for doctor in parse_cc_doctors(lab.cc.as_deref()) {
            message.push(Self::zdr(&doctor));
        }
        message.push(Self::obr(lab, first, &now));

        let default_code = safe_with_default(first.code.as_deref(), DEFAULT_TEST_CODE);
        for (idx, test) in lab.tests.iter().enumerate() {
            message.push(Self::obx(idx + 1, test, default_code));
            if let Some(notes) = test.notes.as_deref().filter(|n| !n.is_empty()) {
                message.push(Segment::new("NTE").set(3, notes));
            }
        }

        tracing::debug!(
            "composed GDML message: {} segments, {} tests",
            message.len(),
            lab.tests.len()
        );
        Ok(message.to_wire())
    }
}
