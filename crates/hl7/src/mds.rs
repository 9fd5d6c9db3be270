//! MDS receiver.
//!
//! MDS is the most demanding receiver. Before any result it expects the facility (ZLB),
//! test group (ZRG) and menu (ZMN, one per test) to be pre-registered, followed by the
//! client list (ZCL) for the ordering provider and every CC doctor. Results then come as
//! `OBR OBX NTE? ZCT` brackets, one per test, after a leading ZCT. A single ZPD closes the
//! message when any result is blocked.
//!
//! The accession is repeated in MSH-10, PID-3 and every ZCT. MSH-10 is split on `-` by the
//! receiver, so the accession is normalized once and reused everywhere.

use crate::cc::{parse_cc_doctors, DEFAULT_BILLING};
use crate::clock::Clock;
use crate::dialect::{first_test, Dialect, LabMessageDialect};
use crate::format::{
    blocked_status, format_date, format_date_time, format_year, reference_range, safe,
    safe_upper, safe_upper_or, safe_with_default, RangeStyle,
};
use crate::segment::{component, Message, Segment, ENCODING_CHARACTERS};
use crate::Hl7Result;
use lab_model::{Lab, LabTest};
use std::sync::Arc;

const APPLICATION: &str = "MDS";
const FACILITY_ADDRESS: &str = "55 QUEEN ST TORONTO M5C 1R6 1(877)849-3637";
const PERFORMING_LAB: &str = "10^100 INTERNATIONAL BLVD TORONTO M9W 6J6 1(877)849-3637^L";
const TEST_GROUP: &str = "1000";
const DEFAULT_TEST_NAME: &str = "TEST";

/// Strips a leading `yyyy-` prefix and every remaining dash.
///
/// An absent accession is replaced by `LAB<millis>`.
pub fn normalize_accession(accession: Option<&str>, millis: i64) -> String {
    let fallback = format!("LAB{millis}");
    let raw = safe_with_default(accession, &fallback);

    let bytes = raw.as_bytes();
    let has_year_prefix =
        bytes.len() >= 5 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-';
    let rest = if has_year_prefix { &raw[5..] } else { raw };

    rest.replace('-', "")
}

/// Per-message values shared by several segments.
struct Context {
    accession: String,
    billing: String,
    provider_name: String,
}

impl Context {
    fn new(lab: &Lab, millis: i64) -> Self {
        let provider_name = format!(
            "{} {}",
            safe_upper(lab.provider_last_name.as_deref()),
            safe_upper(lab.provider_first_name.as_deref())
        )
        .trim()
        .to_string();

        Self {
            accession: normalize_accession(lab.accession.as_deref(), millis),
            billing: safe_with_default(lab.billing_no.as_deref(), DEFAULT_BILLING).to_string(),
            provider_name,
        }
    }
}

/// `-billing^name^^^^DR.`, optionally followed by six empty components and a role tag.
fn doctor(billing: &str, name: &str, tag: Option<&str>) -> String {
    let mut parts = vec![billing, name, "", "", "", "DR."];
    if let Some(tag) = tag {
        parts.extend(["", "", "", "", "", "", tag]);
    }
    format!("-{}", component(&parts))
}

pub struct Mds {
    clock: Arc<dyn Clock>,
}

impl Mds {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn msh(ctx: &Context, now: &str) -> Segment {
        Segment::new("MSH")
            .set(1, ENCODING_CHARACTERS)
            .set(2, APPLICATION)
            .set(6, now)
            .set(8, "ORU")
            .set(9, format!("{}-{}-1", ctx.billing, ctx.accession))
            .set(10, "P^")
            .set(11, "2.3.0")
            .set(14, "NE")
            .set(15, "ER")
    }

    fn zlb(ctx: &Context) -> Segment {
        let lab_code = if ctx.accession.chars().count() > 2 {
            ctx.accession.chars().take(2).collect()
        } else {
            String::from("LA")
        };

        Segment::new("ZLB")
            .set(2, lab_code)
            .set(4, FACILITY_ADDRESS)
            .set(5, "30")
            .set(7, APPLICATION)
            .set(8, APPLICATION)
    }

    fn zrg() -> Segment {
        Segment::new("ZRG")
            .set(1, "1.1")
            .set(2, TEST_GROUP)
            .set(5, "GENERAL LABORATORY")
            .set(6, "1")
            .with_len(7)
    }

    fn zmn(index: usize, test: &LabTest) -> Segment {
        let name = safe_with_default(test.name.as_deref(), DEFAULT_TEST_NAME);
        let short_name: String = name
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        Segment::new("ZMN")
            .set(2, short_name)
            .set(4, name)
            .set(5, safe(test.code_unit.as_deref()))
            .set(6, safe(test.code_value.as_deref()))
            .set(7, reference_range(test, RangeStyle::Compact))
            .set(8, test_code(test, index))
            .set(9, safe(test.flag.as_deref()))
            .set(10, TEST_GROUP)
    }

    fn zcl(billing: &str, name: &str, copy: bool) -> Segment {
        Segment::new("ZCL")
            .set(2, doctor(billing, name, Some("LP")))
            .set(6, "01")
            .set(7, "2")
            .set(8, "LP")
            .set(12, if copy { "1" } else { "0" })
    }

    fn pid(lab: &Lab, ctx: &Context, year: &str) -> Segment {
        Segment::new("PID")
            .set(3, format!("{year}-{}", ctx.accession))
            .set(4, "-")
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
            .set(13, safe(lab.phone.as_deref()))
            .set(19, format!("X{}", safe(lab.hin.as_deref())))
    }

    fn pv1(lab: &Lab, ctx: &Context) -> Segment {
        let copy_to = parse_cc_doctors(lab.cc.as_deref())
            .first()
            .map(|cc| doctor(cc.billing(), &cc.display_name(), Some("-1")))
            .unwrap_or_default();

        Segment::new("PV1")
            .set(2, "R")
            .set(3, "^^^^^^^^")
            .set(8, doctor(&ctx.billing, &ctx.provider_name, None))
            .set(9, copy_to)
            .set(17, doctor(&ctx.billing, &ctx.provider_name, Some("-0")))
            .set(41, "1")
            .set(44, format_date(lab.lab_req_date.map(|d| d.date())))
    }

    fn zfr() -> Segment {
        Segment::new("ZFR")
            .set(2, "1")
            .set(3, "1")
            .set(6, "0")
            .set(7, "1")
    }

    fn zct(ctx: &Context) -> Segment {
        Segment::new("ZCT")
            .set(2, ctx.accession.as_str())
            .set(4, ctx.accession.as_str())
            .with_len(7)
    }

    fn obr(index: usize, code: &str, test: &LabTest) -> Segment {
        let observed = format_date_time(test.date);
        Segment::new("OBR")
            .set(2, (100 + index).to_string())
            .set(4, code)
            .set(7, observed.clone())
            .set(14, observed)
            .set(20, "MDS^MDS")
            .set(27, "R")
    }

    fn obx(code: &str, test: &LabTest) -> Segment {
        let identifier = component(&[
            code.to_string(),
            safe_upper_or(test.name.as_deref(), DEFAULT_TEST_NAME),
            String::from("L"),
        ]);

        Segment::new("OBX")
            .set(1, "1")
            .set(2, safe_with_default(test.code_type.as_deref(), "ST"))
            .set(3, format!("-{identifier}"))
            .set(4, format!("{code}-1-{code}"))
            .set(5, safe(test.code_value.as_deref()))
            .set(6, safe(test.code_unit.as_deref()))
            .set(7, reference_range(test, RangeStyle::Compact))
            .set(8, safe(test.flag.as_deref()))
            .set(11, safe_with_default(test.stat.as_deref(), "F"))
            .set(13, blocked_status(test))
            .set(16, PERFORMING_LAB)
    }
}

/// Test code, defaulting to `index * 100`.
fn test_code(test: &LabTest, index: usize) -> String {
    match test.code.as_deref() {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => (index * 100).to_string(),
    }
}

impl LabMessageDialect for Mds {
    fn dialect(&self) -> Dialect {
        Dialect::Mds
    }

    fn compose(&self, lab: &Lab) -> Hl7Result<String> {
        first_test(lab, Dialect::Mds)?;

        let instant = self.clock.now();
        let now = format_date_time(Some(instant.naive_local()));
        let year = format_year(Some(instant.naive_local()));
        let ctx = Context::new(lab, instant.timestamp_millis());
        let doctors = parse_cc_doctors(lab.cc.as_deref());

        let mut message = Message::new();
        message.push(Self::msh(&ctx, &now));
        message.push(Self::zlb(&ctx));
        message.push(Self::zrg());
        for (idx, test) in lab.tests.iter().enumerate() {
            message.push(Self::zmn(idx + 1, test));
        }

        message.push(Self::zcl(&ctx.billing, &ctx.provider_name, false));
        for cc in &doctors {
            message.push(Self::zcl(cc.billing(), &cc.display_name(), true));
        }

        message.push(Self::pid(lab, &ctx, &year));
        message.push(Self::pv1(lab, &ctx));
        message.push(Self::zfr());
        message.push(Self::zct(&ctx));

        // Neighbouring tests share one ZCT: the trailing ZCT of a test also opens the next.
        for (idx, test) in lab.tests.iter().enumerate() {
            let code = test_code(test, idx + 1);
            message.push(Self::obr(idx + 1, &code, test));
            message.push(Self::obx(&code, test));
            if let Some(notes) = test.notes.as_deref().filter(|n| !n.is_empty()) {
                message.push(Segment::new("NTE").set(2, "L").set(3, format!("^{notes}")));
            }
            message.push(Self::zct(&ctx));
        }

        if lab.has_blocked_test() {
            message.push(Segment::new("ZPD").set(3, "Y").with_len(4));
        }

        tracing::debug!(
            "composed MDS message for accession {}: {} segments, {} tests, {} cc doctors",
            ctx.accession,
            message.len(),
            lab.tests.len(),
            doctors.len()
        );
        Ok(message.to_wire())
    }
}
