//! Copy-to (CC) doctor list tokenizer.
//!
//! The `cc` field of a lab is a small grammar:
//!
//! ```text
//! cc     := entry (";" entry)*
//! entry  := billing "," primary ["," secondary] | name
//! ```
//!
//! Entries are trimmed and blank entries are skipped, so `"a;;b;"` yields two doctors.
//! Components past the third are ignored.
//!
//! Each dialect projects a [`CcDoctor`] differently: CML copies the raw components, while
//! GDML and MDS re-derive names and substitute [`DEFAULT_BILLING`] for free-text entries.

use crate::format::{parse_name, strip_doctor_title, NameComponents};
use crate::segment::component;

/// Billing number used for doctors supplied as a bare name.
pub const DEFAULT_BILLING: &str = "00000";

/// One entry of a CC doctor list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CcDoctor {
    /// `billing,primary[,secondary]`, usually `billing,last,first`.
    Explicit {
        billing: String,
        primary: String,
        secondary: String,
    },
    /// A free-text name such as `Dr Adward` or `John Smith`.
    Named(String),
}

/// Tokenizes a semicolon-separated CC doctor list.
pub fn parse_cc_doctors(cc: Option<&str>) -> Vec<CcDoctor> {
    let Some(cc) = cc else {
        return Vec::new();
    };

    cc.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(CcDoctor::parse_entry)
        .collect()
}

impl CcDoctor {
    fn parse_entry(entry: &str) -> Self {
        if !entry.contains(',') {
            return Self::Named(entry.to_string());
        }

        let mut parts = entry.split(',').map(str::trim);
        let mut next = || parts.next().unwrap_or("").to_string();
        Self::Explicit {
            billing: next(),
            primary: next(),
            secondary: next(),
        }
    }

    /// Billing number, or [`DEFAULT_BILLING`] for free-text entries.
    pub fn billing(&self) -> &str {
        match self {
            Self::Explicit { billing, .. } => billing,
            Self::Named(_) => DEFAULT_BILLING,
        }
    }

    /// Raw `billing^primary^secondary` group used by CML.
    ///
    /// Free-text entries occupy the first component: `Dr Adward^^`.
    pub fn cml_component(&self) -> String {
        match self {
            Self::Explicit {
                billing,
                primary,
                secondary,
            } => component(&[billing, primary, secondary]),
            Self::Named(name) => component(&[name.as_str(), "", ""]),
        }
    }

    /// Upper-cased given/family split used by GDML.
    ///
    /// Explicit entries are `billing,last,first`; when only one name component is present
    /// it is split like a free-text name.
    pub fn name_components(&self) -> NameComponents {
        match self {
            Self::Explicit {
                primary, secondary, ..
            } if !secondary.is_empty() => NameComponents {
                given: secondary.to_uppercase(),
                family: primary.to_uppercase(),
            },
            Self::Explicit { primary, .. } => parse_name(Some(primary)),
            Self::Named(name) => parse_name(Some(name)),
        }
    }

    /// Upper-cased display name used by MDS (`SMITH JOHN`, `ADWARD`).
    pub fn display_name(&self) -> String {
        match self {
            Self::Explicit {
                primary, secondary, ..
            } => [primary.as_str(), secondary.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .map(|part| part.to_uppercase())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Named(name) => strip_doctor_title(name).trim().to_uppercase(),
        }
    }
}
