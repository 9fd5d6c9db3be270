//! The dialect capability and receiver selection.

use crate::clock::Clock;
use crate::{Cml, Gdml, Hl7Error, Hl7Result, Mds};
use lab_model::{Lab, LabTest};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Something that turns a [`Lab`] into the message text of one receiver.
pub trait LabMessageDialect: Send + Sync {
    /// The receiver this encoder targets.
    fn dialect(&self) -> Dialect;

    /// Builds the full message.
    ///
    /// # Errors
    ///
    /// Returns [`Hl7Error::EmptyTestSet`] if the lab has no tests. Missing descriptive
    /// data never fails.
    fn compose(&self, lab: &Lab) -> Hl7Result<String>;
}

/// Supported receivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Cml,
    Gdml,
    Mds,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Cml, Dialect::Gdml, Dialect::Mds];

    /// Parses a dialect name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Hl7Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "CML" => Ok(Self::Cml),
            "GDML" => Ok(Self::Gdml),
            "MDS" => Ok(Self::Mds),
            _ => Err(Hl7Error::UnknownDialect(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cml => "CML",
            Self::Gdml => "GDML",
            Self::Mds => "MDS",
        }
    }

    /// Picks the dialect for a receiving lab name, falling back to CML.
    pub fn for_lab_name(lab_name: Option<&str>) -> Self {
        let name = lab_name.unwrap_or("");
        match Self::parse(name) {
            Ok(dialect) => dialect,
            Err(_) => {
                tracing::warn!(
                    "unsupported lab type [{}]; defaulting to {}",
                    name.trim(),
                    Self::Cml
                );
                Self::Cml
            }
        }
    }

    /// Builds the encoder for this dialect.
    pub fn encoder(self, clock: Arc<dyn Clock>) -> Box<dyn LabMessageDialect> {
        match self {
            Self::Cml => Box::new(Cml::new(clock)),
            Self::Gdml => Box::new(Gdml::new(clock)),
            Self::Mds => Box::new(Mds::new(clock)),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encodes a lab for the receiver named by its `lab_name`.
pub fn generate(lab: &Lab, clock: Arc<dyn Clock>) -> Hl7Result<String> {
    Dialect::for_lab_name(lab.lab_name.as_deref())
        .encoder(clock)
        .compose(lab)
}

/// Entry guard shared by the encoders: every dialect schedules from the first test.
pub(crate) fn first_test(lab: &Lab, dialect: Dialect) -> Hl7Result<&LabTest> {
    lab.first_test().ok_or(Hl7Error::EmptyTestSet { dialect })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_clock, sample_lab};

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Dialect::parse("mds").expect("mds"), Dialect::Mds);
        assert_eq!(Dialect::parse(" GDML ").expect("gdml"), Dialect::Gdml);
        assert_eq!("Cml".parse::<Dialect>().expect("cml"), Dialect::Cml);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = Dialect::parse("hl7").expect_err("should reject unknown dialect");
        match err {
            Hl7Error::UnknownDialect(name) => assert_eq!(name, "hl7"),
            other => panic!("expected UnknownDialect error, got {other:?}"),
        }
    }

    #[test]
    fn lab_name_selection_falls_back_to_cml() {
        assert_eq!(Dialect::for_lab_name(Some("mds")), Dialect::Mds);
        assert_eq!(Dialect::for_lab_name(Some(" GDML ")), Dialect::Gdml);
        assert_eq!(Dialect::for_lab_name(Some("LifeLabs")), Dialect::Cml);
        assert_eq!(Dialect::for_lab_name(None), Dialect::Cml);
    }

    #[test]
    fn encoders_report_their_dialect() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.encoder(fixed_clock()).dialect(), dialect);
        }
    }

    #[test]
    fn generate_uses_lab_name() {
        let mut lab = sample_lab();
        lab.lab_name = Some("MDS".into());
        let message = generate(&lab, fixed_clock()).expect("generate");
        assert!(message.starts_with("MSH|^~\\&|MDS|"));

        lab.lab_name = None;
        let message = generate(&lab, fixed_clock()).expect("generate");
        assert!(message.starts_with("MSH|^~\\&|CML|"));
    }

    #[test]
    fn every_dialect_rejects_an_empty_test_set() {
        let mut lab = sample_lab();
        lab.tests.clear();

        for dialect in Dialect::ALL {
            let err = dialect
                .encoder(fixed_clock())
                .compose(&lab)
                .expect_err("should reject empty test set");
            match err {
                Hl7Error::EmptyTestSet { dialect: reported } => assert_eq!(reported, dialect),
                other => panic!("expected EmptyTestSet error, got {other:?}"),
            }
        }
    }

    #[test]
    fn output_is_identical_across_calls_with_a_fixed_clock() {
        let lab = sample_lab();
        for dialect in Dialect::ALL {
            let encoder = dialect.encoder(fixed_clock());
            let first = encoder.compose(&lab).expect("compose");
            let second = encoder.compose(&lab).expect("compose");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn range_text_wins_over_bounds_in_every_dialect() {
        let mut lab = sample_lab();
        lab.tests[0].ref_range_text = Some("NEGATIVE".into());
        lab.tests[0].ref_range_low = Some("1".into());
        lab.tests[0].ref_range_high = Some("2".into());

        for dialect in Dialect::ALL {
            let message = dialect
                .encoder(fixed_clock())
                .compose(&lab)
                .expect("compose");
            let obx = message
                .lines()
                .find(|line| line.starts_with("OBX|"))
                .expect("OBX segment");
            assert_eq!(obx.split('|').nth(7), Some("NEGATIVE"), "{dialect}");
        }
    }

    #[test]
    fn blocked_tests_carry_the_blocked_token_in_every_dialect() {
        let lab = sample_lab();
        for dialect in Dialect::ALL {
            let message = dialect
                .encoder(fixed_clock())
                .compose(&lab)
                .expect("compose");
            let obx: Vec<&str> = message.lines().filter(|l| l.starts_with("OBX|")).collect();
            assert_eq!(obx[0].split('|').nth(13), Some(""), "{dialect}");
            assert_eq!(obx[1].split('|').nth(13), Some("BLOCKED"), "{dialect}");
        }
    }
}
