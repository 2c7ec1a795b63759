//! Listing rows for search, watchlists, follow lists, and exports.
//!
//! A [`Summary`] carries the non-sensitive identity of one establishment and
//! one indicator group per category. Groups are scalar, so withholding one
//! sets it to `None`; the row's permission set distinguishes "withheld" from
//! "never had".

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::identity::{DepartmentCode, Footprint, Siren, Siret};
use crate::model::{AdministrativeState, AlertLevel, ProcedureState};
use crate::policy::PermissionSet;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScoreIndicators {
    pub list_id: String,
    pub score: f64,
    pub diff: Option<f64>,
    pub alert: AlertLevel,
    /// First appearance on any detection list.
    pub first_alert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TaxDebtIndicators {
    pub debt_increase: Option<bool>,
    pub debt_amount: Option<f64>,
    pub has_payment_plan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FurloughIndicators {
    pub active: bool,
    pub avg_hours_12m: Option<f64>,
    pub avg_amount_12m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FinancialIndicators {
    pub revenue: Option<f64>,
    pub revenue_variation: Option<f64>,
    pub operating_result: Option<f64>,
    pub ebitda: Option<f64>,
    pub fiscal_year: Option<i32>,
    pub closing_date: Option<NaiveDate>,
}

/// One listing row.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Summary {
    pub siret: Siret,
    pub siren: Siren,
    pub name: Option<String>,
    pub commune: Option<String>,
    pub department: Option<DepartmentCode>,
    pub department_label: Option<String>,
    pub activity_code: Option<String>,
    pub activity_label: Option<String>,
    pub sector_code: Option<String>,
    pub sector_label: Option<String>,
    pub headcount: Option<f64>,
    pub enterprise_headcount: Option<f64>,
    pub administrative_state: Option<AdministrativeState>,
    pub head_office: bool,
    pub procedure: ProcedureState,
    pub followed: bool,
    pub followed_enterprise: bool,

    pub score: Option<ScoreIndicators>,
    pub tax_debt: Option<TaxDebtIndicators>,
    pub furlough: Option<FurloughIndicators>,
    pub financial: Option<FinancialIndicators>,
    pub loan_guarantee: Option<bool>,

    #[serde(skip)]
    pub footprint: Footprint,
    #[serde(skip)]
    pub alert: Option<bool>,
    pub permissions: PermissionSet,
}

impl Summary {
    /// Alert level for tier counting, only when the score is disclosed.
    pub fn disclosed_alert(&self) -> Option<AlertLevel> {
        if !self.permissions.categories.score {
            return None;
        }
        self.score.as_ref().map(|s| s.alert)
    }

    /// Sort key used by watchlists: score descending, unscored last.
    pub fn raw_score(&self) -> f64 {
        self.score.as_ref().map_or(f64::NEG_INFINITY, |s| s.score)
    }
}
