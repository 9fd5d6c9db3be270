//! HL7 v2.3 `ORU^R01` encoders for laboratory results.
//!
//! This crate projects a [`Lab`] aggregate into the plain-text, pipe-delimited message
//! expected by one of three downstream laboratory information systems:
//! - [`Cml`]: flat PID/ORC/OBR header with one OBX per test
//! - [`Gdml`]: positional PID identifiers, per-CC ZDR segments, two-component ranges
//! - [`Mds`]: facility/menu pre-registration segments and per-test ZCT brackets
//!
//! Each receiver parses positionally and has its own quirks. The encoders reproduce those
//! layouts exactly; field placement is a compatibility contract with the receiver, not a
//! free choice.
//!
//! Encoding is a pure function of the lab and the injected [`Clock`]. Framing and
//! transport (MLLP, file drops) belong to the caller.

pub mod cc;
pub mod clock;
pub mod cml;
pub mod dialect;
pub mod format;
pub mod gdml;
pub mod mds;
pub mod segment;

#[cfg(test)]
mod testing;

pub use cc::{parse_cc_doctors, CcDoctor};
pub use clock::{Clock, FixedClock, SystemClock};
pub use cml::Cml;
pub use dialect::{generate, Dialect, LabMessageDialect};
pub use gdml::Gdml;
pub use mds::Mds;

pub use lab_model::{Lab, LabTest};

/// Errors returned by the `lab-hl7` encoders.
#[derive(Debug, thiserror::Error)]
pub enum Hl7Error {
    /// The lab has no tests; every dialect reads scheduling fields from the first test.
    #[error("cannot encode {dialect} message: lab has no tests")]
    EmptyTestSet { dialect: Dialect },

    #[error("unknown dialect: {0}")]
    UnknownDialect(String),
}

/// Type alias for Results that can fail with an [`Hl7Error`].
pub type Hl7Result<T> = Result<T, Hl7Error>;
