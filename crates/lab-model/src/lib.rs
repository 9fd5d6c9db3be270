//! Laboratory result aggregate and its on-disk document format.
//!
//! This crate owns the normalized in-memory shape of a submitted laboratory result:
//! - [`Lab`]: patient, ordering provider, copy-to doctors and request metadata
//! - [`LabTest`]: one discrete result line
//!
//! It also provides a strict YAML document format ([`LabDocument`]) used by operators and
//! integration pipelines to hand a result to the HL7 encoders.
//!
//! The aggregate is read-only to the encoders in `lab-hl7`; nothing in this crate performs
//! HL7 formatting.

pub mod document;
pub mod lab;

pub use document::LabDocument;
pub use lab::{Lab, LabTest, BLOCKED};

/// Errors returned by the `lab-model` crate.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid date in {field}: {value:?}")]
    InvalidDate { field: String, value: String },
}

/// Type alias for Results that can fail with a [`ModelError`].
pub type ModelResult<T> = Result<T, ModelError>;
