//! # Identifier Newtypes
//!
//! Registry identifiers for establishments ([`Siret`]) and enterprises
//! ([`Siren`]), administrative [`DepartmentCode`]s, and the enterprise
//! [`Footprint`]. Each identifier validates its format at construction time
//! and again on deserialization, so a malformed id never reaches a query.
//!
//! - SIRET: 14 digits; the first 9 are the owning enterprise's SIREN.
//! - SIREN: 9 digits.
//! - Department: `01`..`95` (except `20`), `2A`, `2B`, `971`..`976`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Routes deserialization through `new()` so invalid values are rejected
/// at the boundary.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

macro_rules! impl_str_newtype {
    ($ty:ident) => {
        impl $ty {
            /// Access the validated string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

fn all_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Establishment identifier (14 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[schema(value_type = String, example = "12345678900012")]
pub struct Siret(String);

impl_validating_deserialize!(Siret);
impl_str_newtype!(Siret);

impl Siret {
    /// Validate and wrap a SIRET.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSiret`] unless the trimmed input is
    /// exactly 14 ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if !all_digits(trimmed, 14) {
            return Err(ValidationError::InvalidSiret(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The owning enterprise.
    pub fn siren(&self) -> Siren {
        Siren(self.0[..9].to_string())
    }
}

/// Enterprise identifier (9 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[schema(value_type = String, example = "123456789")]
pub struct Siren(String);

impl_validating_deserialize!(Siren);
impl_str_newtype!(Siren);

impl Siren {
    /// Validate and wrap a SIREN.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSiren`] unless the trimmed input is
    /// exactly 9 ASCII digits.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if !all_digits(trimmed, 9) {
            return Err(ValidationError::InvalidSiren(raw));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Administrative department code.
///
/// Stored upper-cased so `2a` and `2A` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[schema(value_type = String, example = "75")]
pub struct DepartmentCode(String);

impl_validating_deserialize!(DepartmentCode);
impl_str_newtype!(DepartmentCode);

impl DepartmentCode {
    /// Validate and wrap a department code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDepartment`] for anything outside
    /// metropolitan `01`..`95`, Corsica `2A`/`2B`, and overseas `971`..`976`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let code = raw.trim().to_ascii_uppercase();
        let valid = match code.as_str() {
            "2A" | "2B" => true,
            c if all_digits(c, 2) => matches!(c.parse::<u8>(), Ok(n) if (1..=95).contains(&n) && n != 20),
            c if all_digits(c, 3) => matches!(c.parse::<u16>(), Ok(n) if (971..=976).contains(&n)),
            _ => false,
        };
        if !valid {
            return Err(ValidationError::InvalidDepartment(raw));
        }
        Ok(Self(code))
    }
}

/// The set of departments in which an enterprise has establishments.
///
/// Jurisdiction over an enterprise is decided against this set, not against
/// the department of any single establishment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint(BTreeSet<DepartmentCode>);

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of raw department codes as stored upstream.
    ///
    /// # Errors
    ///
    /// Fails on the first code that is not a valid department.
    pub fn try_from_codes<I, S>(codes: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        codes
            .into_iter()
            .map(DepartmentCode::new)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn insert(&mut self, code: DepartmentCode) -> bool {
        self.0.insert(code)
    }

    pub fn contains(&self, code: &DepartmentCode) -> bool {
        self.0.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepartmentCode> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<DepartmentCode> for Footprint {
    fn from_iter<T: IntoIterator<Item = DepartmentCode>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
