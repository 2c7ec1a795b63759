//! # Record Model
//!
//! Establishment and enterprise records as assembled for one request.
//! Records are built from catalog rows, evaluated, redacted, and dropped at
//! the end of the request; nothing here is persisted.
//!
//! Sensitive data is grouped per [`Category`](crate::Category). Each group is
//! an `Option`: `None` means the source never had data for the entity, an
//! empty group means the data was withheld (the record's permission set says
//! which). Numeric fields inside a group stay `None` when the source row had
//! no value, never zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::identity::{DepartmentCode, Footprint, Siren, Siret};
use crate::policy::PermissionSet;

// ── Vocabularies ────────────────────────────────────────────────────

/// Registry administrative state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AdministrativeState {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "F")]
    Closed,
}

impl std::str::FromStr for AdministrativeState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::Active),
            "F" => Ok(Self::Closed),
            other => Err(ValidationError::InvalidAdministrativeState(other.to_string())),
        }
    }
}

/// Alert level attached to a detection-list score. `Tier1` is the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AlertLevel {
    #[serde(rename = "Alerte seuil F1")]
    Tier1,
    #[serde(rename = "Alerte seuil F2")]
    Tier2,
    #[serde(rename = "Pas d'alerte")]
    Clear,
}

impl AlertLevel {
    /// Whether the level puts the entity on a watchlist.
    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::Clear)
    }
}

impl std::str::FromStr for AlertLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Alerte seuil F1" => Ok(Self::Tier1),
            "Alerte seuil F2" => Ok(Self::Tier2),
            "Pas d'alerte" => Ok(Self::Clear),
            other => Err(ValidationError::UnknownAlertLevel(other.to_string())),
        }
    }
}

/// Collective-proceeding state of an enterprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureState {
    InBonis,
    Sauvegarde,
    PlanSauvegarde,
    Redressement,
    PlanContinuation,
    Liquidation,
}

impl ProcedureState {
    /// Classify a court action and its stage the way the registry groups them.
    ///
    /// Returns `None` for actions that are not collective proceedings.
    pub fn classify(action: &str, stage: Option<&str>) -> Option<Self> {
        let continuation = stage == Some("plan_continuation");
        match action {
            "liquidation" => Some(Self::Liquidation),
            "redressement" if continuation => Some(Self::PlanContinuation),
            "redressement" => Some(Self::Redressement),
            "sauvegarde" if continuation => Some(Self::PlanSauvegarde),
            "sauvegarde" => Some(Self::Sauvegarde),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InBonis => "in_bonis",
            Self::Sauvegarde => "sauvegarde",
            Self::PlanSauvegarde => "plan_sauvegarde",
            Self::Redressement => "redressement",
            Self::PlanContinuation => "plan_continuation",
            Self::Liquidation => "liquidation",
        }
    }
}

impl std::str::FromStr for ProcedureState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_bonis" => Ok(Self::InBonis),
            "sauvegarde" => Ok(Self::Sauvegarde),
            "plan_sauvegarde" => Ok(Self::PlanSauvegarde),
            "redressement" => Ok(Self::Redressement),
            "plan_continuation" => Ok(Self::PlanContinuation),
            "liquidation" => Ok(Self::Liquidation),
            other => Err(ValidationError::UnknownProcedureState(other.to_string())),
        }
    }
}

/// NAF activity classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub code: Option<String>,
    pub label: Option<String>,
    pub sector_code: Option<String>,
    pub sector_label: Option<String>,
    pub nomenclature: Option<String>,
}

/// One dated step of a collective proceeding. Public information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Procedure {
    pub date: NaiveDate,
    pub state: ProcedureState,
}

// ── Score category ──────────────────────────────────────────────────

/// Marker that replaces adjustments which may not be shown.
pub const CONFIDENTIAL_ADJUSTMENT: &str = "confidentiel";

const ADJUSTMENTS_WITHOUT_RECENT_STATEMENT: [&str; 3] =
    ["solvabilité_faible", "k_propres_négatifs", "rentabilité_faible"];
const ADJUSTMENTS_WITH_RECENT_STATEMENT: [&str; 1] = ["rentabilité_faible"];

/// A detection-list score for one establishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Score {
    pub list_id: String,
    pub batch: String,
    pub algorithm: String,
    pub period: Option<NaiveDate>,
    pub score: f64,
    pub diff: Option<f64>,
    pub alert: AlertLevel,
    /// Macro-level contributions, present only for the current list.
    pub macro_explanations: BTreeMap<String, f64>,
    /// Expert adjustments applied after the model.
    pub adjustments: Vec<String>,
}

impl Score {
    /// Collapse confidential adjustments into a single marker.
    ///
    /// Without a financial statement for a fiscal year after 2020, solvency,
    /// equity and profitability adjustments would reveal private accounts;
    /// with one, only profitability stays confidential. Order of the remaining
    /// adjustments is kept and the marker is appended once.
    pub fn mask_confidential_adjustments(&mut self, has_recent_statement: bool) {
        let confidential: &[&str] = if has_recent_statement {
            &ADJUSTMENTS_WITH_RECENT_STATEMENT
        } else {
            &ADJUSTMENTS_WITHOUT_RECENT_STATEMENT
        };
        let before = self.adjustments.len();
        self.adjustments
            .retain(|a| !confidential.contains(&a.as_str()));
        if self.adjustments.len() != before {
            self.adjustments.push(CONFIDENTIAL_ADJUSTMENT.to_string());
        }
    }
}

// ── Tax-debt category ───────────────────────────────────────────────

/// One period of the social-contribution series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaxDebtPeriod {
    pub period: NaiveDate,
    pub contribution: Option<f64>,
    pub employer_share: Option<f64>,
    pub employee_share: Option<f64>,
    pub surcharge: Option<f64>,
    pub headcount: Option<i64>,
}

impl TaxDebtPeriod {
    /// A period with no amounts and no headcount carries no information.
    pub fn is_blank(&self) -> bool {
        let total: f64 = [
            self.contribution,
            self.employer_share,
            self.employee_share,
            self.surcharge,
        ]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum();
        total == 0.0 && self.headcount.is_none()
    }
}

/// Index-aligned columns of the contribution series.
///
/// Columns are private and only grow together through [`push`](Self::push),
/// so they always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct TaxDebtSeries {
    periods: Vec<NaiveDate>,
    contributions: Vec<Option<f64>>,
    employer_shares: Vec<Option<f64>>,
    employee_shares: Vec<Option<f64>>,
    surcharges: Vec<Option<f64>>,
    headcounts: Vec<Option<i64>>,
}

impl TaxDebtSeries {
    pub fn push(&mut self, point: TaxDebtPeriod) {
        self.periods.push(point.period);
        self.contributions.push(point.contribution);
        self.employer_shares.push(point.employer_share);
        self.employee_shares.push(point.employee_share);
        self.surcharges.push(point.surcharge);
        self.headcounts.push(point.headcount);
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn clear(&mut self) {
        self.periods.clear();
        self.contributions.clear();
        self.employer_shares.clear();
        self.employee_shares.clear();
        self.surcharges.clear();
        self.headcounts.clear();
    }

    /// Length of every column, in declaration order.
    pub fn column_lengths(&self) -> [usize; 6] {
        [
            self.periods.len(),
            self.contributions.len(),
            self.employer_shares.len(),
            self.employee_shares.len(),
            self.surcharges.len(),
            self.headcounts.len(),
        ]
    }

    pub fn iter(&self) -> impl Iterator<Item = TaxDebtPeriod> + '_ {
        (0..self.len()).map(move |i| TaxDebtPeriod {
            period: self.periods[i],
            contribution: self.contributions[i],
            employer_share: self.employer_shares[i],
            employee_share: self.employee_shares[i],
            surcharge: self.surcharges[i],
            headcount: self.headcounts[i],
        })
    }
}

/// A payment plan granted on contribution debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentDelay {
    pub action: Option<String>,
    pub created: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub duration_months: Option<i32>,
    pub amount: Option<f64>,
    pub stage: Option<String>,
}

/// Everything in the tax-debt category for one establishment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct TaxDebtHistory {
    pub series: TaxDebtSeries,
    pub payment_delays: Vec<PaymentDelay>,
}

impl TaxDebtHistory {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.payment_delays.is_empty()
    }
}

// ── Furlough category ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FurloughRequest {
    pub id: String,
    pub headcount: Option<i64>,
    pub authorised_headcount: Option<i64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub authorised_hours: Option<f64>,
    pub authorised_amount: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FurloughConsumption {
    pub id: String,
    pub period: NaiveDate,
    pub hours: Option<f64>,
    pub amount: Option<f64>,
    pub headcount: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FurloughHistory {
    pub requests: Vec<FurloughRequest>,
    pub consumptions: Vec<FurloughConsumption>,
}

impl FurloughHistory {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.consumptions.is_empty()
    }
}

// ── Financial category ──────────────────────────────────────────────

/// Yearly financial statement of an enterprise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinancialStatement {
    pub fiscal_year: i32,
    pub closing_date: Option<NaiveDate>,
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_profit: Option<f64>,
    pub operating_result: Option<f64>,
}

/// Monthly supplier payment behaviour of an enterprise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentBehaviour {
    pub value_date: NaiveDate,
    pub paydex: Option<f64>,
    pub days_late: Option<f64>,
    pub suppliers: Option<i32>,
    pub outstanding: Option<f64>,
    pub experiences: Option<i32>,
    pub fpi_30: Option<f64>,
    pub fpi_90: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FinancialHistory {
    pub statements: Vec<FinancialStatement>,
    pub payment_behaviour: Vec<PaymentBehaviour>,
}

impl FinancialHistory {
    /// Whether a statement exists for a fiscal year after 2020.
    pub fn has_recent_statement(&self) -> bool {
        self.statements.iter().any(|s| s.fiscal_year > 2020)
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// One establishment (site) as assembled for a request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Establishment {
    pub siret: Siret,
    /// Owning enterprise; resolved by lookup, never owned.
    pub siren: Siren,
    pub name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub commune: Option<String>,
    pub department: Option<DepartmentCode>,
    pub department_label: Option<String>,
    pub region: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub activity: Activity,
    pub administrative_state: Option<AdministrativeState>,
    pub head_office: bool,
    pub last_headcount: Option<f64>,
    pub procedures: Vec<Procedure>,

    pub scores: Option<Vec<Score>>,
    pub tax_debt: Option<TaxDebtHistory>,
    pub furlough: Option<FurloughHistory>,

    pub followed: bool,
    pub followed_enterprise: bool,
    #[serde(skip)]
    pub footprint: Footprint,
    #[serde(skip)]
    pub alert: Option<bool>,
    pub permissions: PermissionSet,
}

impl Establishment {
    /// A bare record with identity only and no sensitive groups.
    pub fn new(siret: Siret) -> Self {
        let siren = siret.siren();
        Self {
            siret,
            siren,
            name: None,
            address: None,
            postal_code: None,
            commune: None,
            department: None,
            department_label: None,
            region: None,
            creation_date: None,
            latitude: None,
            longitude: None,
            activity: Activity::default(),
            administrative_state: None,
            head_office: false,
            last_headcount: None,
            procedures: Vec::new(),
            scores: None,
            tax_debt: None,
            furlough: None,
            followed: false,
            followed_enterprise: false,
            footprint: Footprint::new(),
            alert: None,
            permissions: PermissionSet::DENIED,
        }
    }

    /// Current procedure state: the latest dated step, or in bonis.
    pub fn procedure_state(&self) -> ProcedureState {
        self.procedures
            .iter()
            .max_by_key(|p| p.date)
            .map_or(ProcedureState::InBonis, |p| p.state)
    }
}

/// One enterprise as assembled for a request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Enterprise {
    pub siren: Siren,
    pub name: Option<String>,
    pub legal_category: Option<String>,
    pub creation_date: Option<NaiveDate>,
    pub administrative_state: Option<AdministrativeState>,
    pub head_office: Option<Siret>,
    #[serde(skip)]
    pub head_office_department: Option<DepartmentCode>,
    /// Sites of this enterprise present in the request.
    pub establishments: Vec<Siret>,

    pub financials: Option<FinancialHistory>,
    pub loan_guarantee: Option<bool>,

    /// The principal follows at least one site of the enterprise, loaded or not.
    pub followed: bool,
    #[serde(skip)]
    pub footprint: Footprint,
    #[serde(skip)]
    pub alert: Option<bool>,
    pub permissions: PermissionSet,
}

impl Enterprise {
    pub fn new(siren: Siren) -> Self {
        Self {
            siren,
            name: None,
            legal_category: None,
            creation_date: None,
            administrative_state: None,
            head_office: None,
            head_office_department: None,
            establishments: Vec::new(),
            financials: None,
            loan_guarantee: None,
            followed: false,
            footprint: Footprint::new(),
            alert: None,
            permissions: PermissionSet::DENIED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn score_with(adjustments: &[&str]) -> Score {
        Score {
            list_id: "2024-03".into(),
            batch: "2403".into(),
            algorithm: "default".into(),
            period: Some(date(2024, 3)),
            score: 0.8,
            diff: None,
            alert: AlertLevel::Tier1,
            macro_explanations: BTreeMap::new(),
            adjustments: adjustments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn adjustments_without_confidential_are_untouched() {
        let mut s = score_with(&["a", "b", "c"]);
        s.mask_confidential_adjustments(false);
        assert_eq!(s.adjustments, vec!["a", "b", "c"]);
    }

    #[test]
    fn confidential_adjustments_collapse_to_one_marker() {
        let mut s = score_with(&["solvabilité_faible", "b", "rentabilité_faible"]);
        s.mask_confidential_adjustments(false);
        assert_eq!(s.adjustments, vec!["b", CONFIDENTIAL_ADJUSTMENT]);
    }

    #[test]
    fn recent_statement_narrows_confidential_set() {
        let mut s = score_with(&["solvabilité_faible", "rentabilité_faible"]);
        s.mask_confidential_adjustments(true);
        assert_eq!(s.adjustments, vec!["solvabilité_faible", CONFIDENTIAL_ADJUSTMENT]);
    }

    #[test]
    fn blank_tax_period() {
        let blank = TaxDebtPeriod {
            period: date(2024, 1),
            contribution: Some(0.0),
            employer_share: None,
            employee_share: Some(0.0),
            surcharge: None,
            headcount: None,
        };
        assert!(blank.is_blank());
        let staffed = TaxDebtPeriod {
            headcount: Some(4),
            ..blank.clone()
        };
        assert!(!staffed.is_blank());
        let owed = TaxDebtPeriod {
            employer_share: Some(120.0),
            ..blank
        };
        assert!(!owed.is_blank());
    }

    #[test]
    fn series_columns_grow_together() {
        let mut series = TaxDebtSeries::default();
        for m in 1..=3 {
            series.push(TaxDebtPeriod {
                period: date(2024, m),
                contribution: Some(10.0),
                employer_share: None,
                employee_share: None,
                surcharge: None,
                headcount: Some(2),
            });
        }
        assert_eq!(series.column_lengths(), [3; 6]);
        assert_eq!(series.iter().count(), 3);
        series.clear();
        assert_eq!(series.column_lengths(), [0; 6]);
    }

    #[test]
    fn procedure_classification() {
        assert_eq!(
            ProcedureState::classify("redressement", Some("plan_continuation")),
            Some(ProcedureState::PlanContinuation)
        );
        assert_eq!(
            ProcedureState::classify("sauvegarde", Some("plan_continuation")),
            Some(ProcedureState::PlanSauvegarde)
        );
        assert_eq!(
            ProcedureState::classify("liquidation", None),
            Some(ProcedureState::Liquidation)
        );
        assert_eq!(ProcedureState::classify("other", None), None);
    }

    #[test]
    fn latest_procedure_wins() {
        let mut etab = Establishment::new(Siret::new("12345678900012").unwrap());
        assert_eq!(etab.procedure_state(), ProcedureState::InBonis);
        etab.procedures.push(Procedure {
            date: date(2023, 5),
            state: ProcedureState::Liquidation,
        });
        etab.procedures.push(Procedure {
            date: date(2021, 1),
            state: ProcedureState::Redressement,
        });
        assert_eq!(etab.procedure_state(), ProcedureState::Liquidation);
    }

    #[test]
    fn alert_level_wire_names() {
        assert_eq!(
            serde_json::to_string(&AlertLevel::Tier1).unwrap(),
            "\"Alerte seuil F1\""
        );
        assert_eq!("Pas d'alerte".parse::<AlertLevel>().unwrap(), AlertLevel::Clear);
        assert!(AlertLevel::Tier2.is_alert());
        assert!(!AlertLevel::Clear.is_alert());
    }

    #[test]
    fn administrative_state_parse() {
        assert_eq!("A".parse::<AdministrativeState>().unwrap(), AdministrativeState::Active);
        assert!("X".parse::<AdministrativeState>().is_err());
    }

    #[test]
    fn footprint_and_alert_are_not_serialized() {
        let etab = Establishment::new(Siret::new("12345678900012").unwrap());
        let json = serde_json::to_value(&etab).unwrap();
        assert!(json.get("footprint").is_none());
        assert!(json.get("alert").is_none());
        assert!(json.get("permissions").is_some());
    }
}
