//! # Validation Errors
//!
//! Construction failures for identifiers and closed vocabularies. Built with
//! `thiserror`; every variant carries the rejected input.

use thiserror::Error;

/// A value failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Establishment identifier is not 14 ASCII digits.
    #[error("invalid siret {0:?}: expected 14 digits")]
    InvalidSiret(String),

    /// Enterprise identifier is not 9 ASCII digits.
    #[error("invalid siren {0:?}: expected 9 digits")]
    InvalidSiren(String),

    /// Not a known department code.
    #[error("invalid department code {0:?}")]
    InvalidDepartment(String),

    /// Tag does not name a sensitive data category.
    #[error("unknown data category {0:?}")]
    UnknownCategory(String),

    /// Administrative state must be `A` (active) or `F` (closed).
    #[error("invalid administrative state {0:?}: expected \"A\" or \"F\"")]
    InvalidAdministrativeState(String),

    #[error("unknown procedure state {0:?}")]
    UnknownProcedureState(String),

    #[error("unknown alert level {0:?}")]
    UnknownAlertLevel(String),
}
