//! CML receiver.
//!
//! Message shape: `MSH PID ORC OBR (OBX NTE?)+`. The header segments are built from the lab
//! and its first test; each test then contributes one OBX, followed by a `NOTE:` comment
//! when it carries notes. CC doctors repeat in OBR-28.

use crate::cc::parse_cc_doctors;
use crate::clock::Clock;
use crate::dialect::{first_test, Dialect, LabMessageDialect};
use crate::format::{
    blocked_status, format_date, format_date_time, reference_range, safe, safe_with_default,
    RangeStyle,
};
use crate::segment::{component, repetition, Message, Segment, ENCODING_CHARACTERS};
use crate::Hl7Result;
use lab_model::{Lab, LabTest};
use std::sync::Arc;

const APPLICATION: &str = "CML";
const RECEIVER: &str = "OSCAR";
const UNIVERSAL_SERVICE: &str = "UR^General Lab^L1^GENERAL LAB";

pub struct Cml {
    clock: Arc<dyn Clock>,
}

impl Cml {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn msh(&self) -> Segment {
        let now = format_date_time(Some(self.clock.now().naive_local()));
        let control_id = format!("BAR{}", now.get(2..).unwrap_or(""));

        Segment::new("MSH")
            .set(1, ENCODING_CHARACTERS)
            .set(2, APPLICATION)
            .set(3, APPLICATION)
            .set(4, RECEIVER)
            .set(5, RECEIVER)
            .set(6, now)
            .set(8, "ORU^R01")
            .set(9, control_id)
            .set(10, "P")
            .set(11, "2.3")
            .set(14, "ER")
            .set(15, "AL")
    }

    fn pid(lab: &Lab) -> Segment {
        let hin = safe(lab.hin.as_deref());
        Segment::new("PID")
            .set(4, hin)
            .set(
                5,
                component(&[
                    safe(lab.last_name.as_deref()),
                    safe(lab.first_name.as_deref()),
                ]),
            )
            .set(7, format_date(lab.dob))
            .set(8, safe(lab.sex.as_deref()))
            .set(13, safe(lab.phone.as_deref()))
            .set(19, format!("X{hin}"))
    }

    fn provider(lab: &Lab) -> String {
        component(&[
            safe(lab.billing_no.as_deref()),
            safe(lab.provider_last_name.as_deref()),
            safe(lab.provider_first_name.as_deref()),
        ])
    }

    fn orc(lab: &Lab, first: &LabTest) -> Segment {
        Segment::new("ORC")
            .set(1, "RE")
            .set(2, safe(lab.accession.as_deref()))
            .set(5, "F")
            .set(12, Self::provider(lab))
            .set(15, format_date_time(first.date))
    }

    fn obr(lab: &Lab, first: &LabTest) -> Segment {
        let requested = format_date_time(lab.lab_req_date);
        let observed = format_date_time(first.date);
        let copies: Vec<String> = parse_cc_doctors(lab.cc.as_deref())
            .iter()
            .map(|doctor| doctor.cml_component())
            .collect();

        Segment::new("OBR")
            .set(1, "1")
            .set(4, UNIVERSAL_SERVICE)
            .set(6, requested.clone())
            .set(7, observed.clone())
            .set(14, requested)
            .set(16, Self::provider(lab))
            .set(22, observed)
            .set(24, "LAB")
            .set(25, "F")
            .set(28, repetition(&copies))
    }

    fn obx(set_id: usize, test: &LabTest) -> Segment {
        Segment::new("OBX")
            .set(1, set_id.to_string())
            .set(2, safe_with_default(test.code_type.as_deref(), "FT"))
            .set(
                3,
                component(&[
                    safe(test.code.as_deref()),
                    safe(test.name.as_deref()),
                    safe(test.description.as_deref()),
                ]),
            )
            .set(4, "GENERAL")
            .set(5, safe(test.code_value.as_deref()))
            .set(6, safe(test.code_unit.as_deref()))
            .set(7, reference_range(test, RangeStyle::Spaced))
            .set(8, safe(test.flag.as_deref()))
            .set(11, safe_with_default(test.stat.as_deref(), "F"))
            .set(13, blocked_status(test))
            .set(14, format_date_time(test.date))
    }

    fn nte(notes: &str) -> Segment {
        Segment::new("NTE")
            .set(1, "1")
            .set(2, "L")
            .set(3, format!("NOTE: {notes}"))
    }
}

impl LabMessageDialect for Cml {
    fn dialect(&self) -> Dialect {
        Dialect::Cml
    }

    fn compose(&self, lab: &Lab) -> Hl7Result<String> {
        let first = first_test(lab, Dialect::Cml)?;

        let mut message = Message::new();
        message.push(self.msh());
        message.push(Self::pid(lab));
        message.push(Self::orc(lab, first));
        message.push(Self::obr(lab, first));

        for (idx, test) in lab.tests.iter().enumerate() {
            message.push(Self::obx(idx + 1, test));
            if let Some(notes) = test.notes.as_deref().filter(|n| !n.is_empty()) {
                message.push(Self::nte(notes));
            }
        }

        tracing::debug!(
            "composed CML message: {} segments, {} tests",
            message.len(),
            lab.tests.len()
        );
        Ok(message.to_wire())
    }
}
