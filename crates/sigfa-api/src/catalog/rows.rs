//! Raw catalog rows.
//!
//! One struct per source relation, decoded straight from Postgres with
//! `sqlx::FromRow` or seeded into the in-memory catalog. Identifiers are
//! plain strings here; the assembler validates them and fails the whole
//! request on a malformed row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sigfa_core::Siret;
use utoipa::ToSchema;

/// Identity and location of one establishment, with the facts the policy
/// needs about it and its enterprise.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct IdentityRow {
    pub siret: String,
    pub siren: String,
    pub name: Option<String>,
    pub legal_category: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub commune: Option<String>,
    pub department: Option<String>,
    pub department_label: Option<String>,
    pub region: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub enterprise_creation_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub activity_code: Option<String>,
    pub activity_label: Option<String>,
    pub sector_code: Option<String>,
    pub sector_label: Option<String>,
    pub nomenclature: Option<String>,
    pub administrative_state: Option<String>,
    pub enterprise_administrative_state: Option<String>,
    pub head_office: bool,
    pub head_office_siret: Option<String>,
    pub head_office_department: Option<String>,
    pub last_headcount: Option<f64>,
    /// Departments of every establishment of the enterprise.
    pub footprint: Vec<String>,
    pub establishment_alert: Option<bool>,
    pub enterprise_alert: Option<bool>,
    pub followed: bool,
    pub followed_enterprise: bool,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct FinancialStatementRow {
    pub siren: String,
    pub fiscal_year: i32,
    pub closing_date: Option<NaiveDate>,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_profit: Option<f64>,
    pub operating_result: Option<f64>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct PaymentBehaviourRow {
    pub siren: String,
    pub value_date: NaiveDate,
    pub paydex: Option<f64>,
    pub days_late: Option<f64>,
    pub suppliers: Option<i32>,
    pub outstanding: Option<f64>,
    pub experiences: Option<i32>,
    pub fpi_30: Option<f64>,
    pub fpi_90: Option<f64>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct ScoreRow {
    pub siret: String,
    pub list_id: String,
    pub batch: String,
    pub algorithm: String,
    pub period: Option<NaiveDate>,
    pub score: f64,
    pub diff: Option<f64>,
    pub alert: String,
    /// JSON object of macro-level contributions.
    pub macro_explanations: Option<serde_json::Value>,
    pub adjustments: Vec<String>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct FurloughRequestRow {
    pub siret: String,
    pub id: String,
    pub headcount: Option<i64>,
    pub authorised_headcount: Option<i64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub authorised_hours: Option<f64>,
    pub authorised_amount: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct FurloughConsumptionRow {
    pub siret: String,
    pub id: String,
    pub period: NaiveDate,
    pub hours: Option<f64>,
    pub amount: Option<f64>,
    pub headcount: Option<i64>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct TaxDebtPeriodRow {
    pub siret: String,
    pub period: NaiveDate,
    pub contribution: Option<f64>,
    pub employer_share: Option<f64>,
    pub employee_share: Option<f64>,
    pub surcharge: Option<f64>,
    pub headcount: Option<i64>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct PaymentDelayRow {
    pub siret: String,
    pub action: Option<String>,
    pub created: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub duration_months: Option<i32>,
    pub amount: Option<f64>,
    pub stage: Option<String>,
}

/// Payment plans at this stage are not shown.
pub const EXCLUDED_DELAY_STAGE: &str = "PRO PR";

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct ProcedureRow {
    pub siren: String,
    pub effective_date: NaiveDate,
    pub action: String,
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct LoanGuaranteeRow {
    pub siret: String,
    pub siren: String,
    pub active: bool,
}

/// One listing row: identity, indicators, and disclosure facts.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct SummaryRow {
    pub siret: String,
    pub siren: String,
    pub name: Option<String>,
    pub commune: Option<String>,
    pub department: Option<String>,
    pub department_label: Option<String>,
    pub activity_code: Option<String>,
    pub activity_label: Option<String>,
    pub sector_code: Option<String>,
    pub sector_label: Option<String>,
    pub headcount: Option<f64>,
    pub enterprise_headcount: Option<f64>,
    pub administrative_state: Option<String>,
    pub head_office: bool,
    pub procedure: Option<String>,
    pub footprint: Vec<String>,
    pub alert_history: Option<bool>,
    pub followed: bool,
    pub followed_enterprise: bool,

    pub list_id: Option<String>,
    pub score: Option<f64>,
    pub score_diff: Option<f64>,
    pub score_alert: Option<String>,
    pub first_alert: Option<bool>,

    pub debt_increase: Option<bool>,
    pub debt_amount: Option<f64>,
    pub has_payment_plan: Option<bool>,

    pub furlough_active: Option<bool>,
    pub furlough_avg_hours: Option<f64>,
    pub furlough_avg_amount: Option<f64>,

    pub revenue: Option<f64>,
    pub revenue_variation: Option<f64>,
    pub operating_result: Option<f64>,
    pub ebitda: Option<f64>,
    pub fiscal_year: Option<i32>,
    pub closing_date: Option<NaiveDate>,

    pub loan_guarantee: Option<bool>,
}

/// A detection list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct WatchlistRow {
    pub id: String,
    pub batch: String,
    pub algorithm: String,
    pub description: Option<String>,
}

/// An active follow relation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FollowRecord {
    pub siret: Siret,
    pub username: String,
    pub category: String,
    pub comment: Option<String>,
    pub since: DateTime<Utc>,
}
