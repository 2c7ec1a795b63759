//! Sensitive data categories.
//!
//! Each category names one legally-restricted dataset and one functional
//! mandate. Role tags predate the English names, so the parser accepts both
//! the canonical tag and the historical agency tag (`urssaf`, `dgefp`, `bdf`,
//! `pge`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Detection-list scores and alert levels.
    Score,
    /// Social-contribution debt series and payment plans.
    TaxDebt,
    /// Short-time work (furlough) requests and consumptions.
    Furlough,
    /// Financial statements and supplier payment behaviour.
    Financial,
    /// State-guaranteed loan status.
    LoanGuarantee,
}

impl Category {
    /// Every category, in evaluation order.
    pub const ALL: [Category; 5] = [
        Category::Score,
        Category::TaxDebt,
        Category::Furlough,
        Category::Financial,
        Category::LoanGuarantee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::TaxDebt => "tax_debt",
            Self::Furlough => "furlough",
            Self::Financial => "financial",
            Self::LoanGuarantee => "loan_guarantee",
        }
    }

    /// Resolve a role tag to a category, accepting historical agency tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "score" => Some(Self::Score),
            "tax_debt" | "urssaf" => Some(Self::TaxDebt),
            "furlough" | "dgefp" => Some(Self::Furlough),
            "financial" | "bdf" => Some(Self::Financial),
            "loan_guarantee" | "pge" => Some(Self::LoanGuarantee),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}
