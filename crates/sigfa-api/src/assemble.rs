//! # Record Assembler
//!
//! Folds a [`RawBatch`] into establishment and enterprise records keyed by
//! id. Result sets are consumed in [`BatchQuery`] order: identity first,
//! since every later row attaches to a record it created, and financial
//! statements before scores, since masking score adjustments depends on
//! them.
//!
//! Rows that reference an id the identity set did not admit are dropped.
//! Malformed identifiers or vocabularies fail the whole batch.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use sigfa_core::{
    Activity, AdministrativeState, AlertLevel, DepartmentCode, Enterprise, Establishment, FinancialHistory,
    FinancialIndicators, FinancialStatement, Footprint, FurloughConsumption, FurloughHistory,
    FurloughIndicators, FurloughRequest, PaymentBehaviour, PaymentDelay, PermissionSet, Procedure,
    ProcedureState, Score, ScoreIndicators, Siren, Siret, Summary, TaxDebtHistory,
    TaxDebtIndicators, TaxDebtPeriod, ValidationError,
};

use crate::catalog::{BatchQuery, CatalogError, IdentityRow, RawBatch, ScoreRow, SummaryRow};

/// Months of payment behaviour kept per enterprise.
const PAYMENT_BEHAVIOUR_MONTHS: usize = 24;

/// Unredacted records of one batch.
#[derive(Debug, Default)]
pub struct Assembled {
    pub establishments: BTreeMap<Siret, Establishment>,
    pub enterprises: BTreeMap<Siren, Enterprise>,
}

impl Assembled {
    /// Establishments of one enterprise, head office first.
    pub fn establishments_of(&self, siren: &Siren) -> Vec<&Establishment> {
        let mut sites: Vec<&Establishment> = self
            .establishments
            .values()
            .filter(|e| &e.siren == siren)
            .collect();
        sites.sort_by(|a, b| b.head_office.cmp(&a.head_office).then(a.siret.cmp(&b.siret)));
        sites
    }
}

fn parse<T>(query: BatchQuery, raw: &str) -> Result<T, CatalogError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.parse().map_err(|e| CatalogError::decode(query.name(), e))
}

fn parse_opt<T>(query: BatchQuery, raw: Option<&str>) -> Result<Option<T>, CatalogError>
where
    T: FromStr<Err = ValidationError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse(query, value).map(Some),
    }
}

fn footprint(query: BatchQuery, codes: &[String]) -> Result<Footprint, CatalogError> {
    Footprint::try_from_codes(codes.iter().map(String::as_str))
        .map_err(|e| CatalogError::decode(query.name(), e))
}

/// Build the records of one batch.
pub fn assemble(batch: RawBatch) -> Result<Assembled, CatalogError> {
    let mut out = Assembled::default();

    for row in batch.identities {
        add_identity(&mut out, row)?;
    }

    for row in batch.financial_statements {
        let siren: Siren = parse(BatchQuery::FinancialStatements, &row.siren)?;
        let Some(enterprise) = out.enterprises.get_mut(&siren) else {
            tracing::debug!(siren = %siren, "dropping orphan financial statement");
            continue;
        };
        enterprise
            .financials
            .get_or_insert_with(FinancialHistory::default)
            .statements
            .push(FinancialStatement {
                fiscal_year: row.fiscal_year,
                closing_date: row.closing_date,
                revenue: row.revenue,
                ebitda: row.ebitda,
                net_profit: row.net_profit,
                operating_result: row.operating_result,
            });
    }

    for row in batch.payment_behaviour {
        let siren: Siren = parse(BatchQuery::PaymentBehaviour, &row.siren)?;
        let Some(enterprise) = out.enterprises.get_mut(&siren) else {
            tracing::debug!(siren = %siren, "dropping orphan payment behaviour");
            continue;
        };
        enterprise
            .financials
            .get_or_insert_with(FinancialHistory::default)
            .payment_behaviour
            .push(PaymentBehaviour {
                value_date: row.value_date,
                paydex: row.paydex,
                days_late: row.days_late,
                suppliers: row.suppliers,
                outstanding: row.outstanding,
                experiences: row.experiences,
                fpi_30: row.fpi_30,
                fpi_90: row.fpi_90,
            });
    }
    for enterprise in out.enterprises.values_mut() {
        if let Some(financials) = enterprise.financials.as_mut() {
            keep_monthly_tail(&mut financials.payment_behaviour, PAYMENT_BEHAVIOUR_MONTHS);
        }
    }

    for row in batch.scores {
        let siret: Siret = parse(BatchQuery::Scores, &row.siret)?;
        let has_recent_statement = out
            .enterprises
            .get(&siret.siren())
            .and_then(|e| e.financials.as_ref())
            .is_some_and(FinancialHistory::has_recent_statement);
        let Some(establishment) = out.establishments.get_mut(&siret) else {
            tracing::debug!(siret = %siret, "dropping orphan score");
            continue;
        };
        let mut score = build_score(row)?;
        score.mask_confidential_adjustments(has_recent_statement);
        establishment.scores.get_or_insert_with(Vec::new).push(score);
    }

    for row in batch.furlough_requests {
        let siret: Siret = parse(BatchQuery::FurloughRequests, &row.siret)?;
        let Some(establishment) = out.establishments.get_mut(&siret) else {
            continue;
        };
        establishment
            .furlough
            .get_or_insert_with(FurloughHistory::default)
            .requests
            .push(FurloughRequest {
                id: row.id,
                headcount: row.headcount,
                authorised_headcount: row.authorised_headcount,
                period_start: row.period_start,
                period_end: row.period_end,
                authorised_hours: row.authorised_hours,
                authorised_amount: row.authorised_amount,
                reason: row.reason,
            });
    }

    for row in batch.furlough_consumptions {
        let siret: Siret = parse(BatchQuery::FurloughConsumptions, &row.siret)?;
        let Some(establishment) = out.establishments.get_mut(&siret) else {
            continue;
        };
        establishment
            .furlough
            .get_or_insert_with(FurloughHistory::default)
            .consumptions
            .push(FurloughConsumption {
                id: row.id,
                period: row.period,
                hours: row.hours,
                amount: row.amount,
                headcount: row.headcount,
            });
    }

    for row in batch.tax_debt_periods {
        let siret: Siret = parse(BatchQuery::TaxDebtPeriods, &row.siret)?;
        let point = TaxDebtPeriod {
            period: row.period,
            contribution: row.contribution,
            employer_share: row.employer_share,
            employee_share: row.employee_share,
            surcharge: row.surcharge,
            headcount: row.headcount,
        };
        if point.is_blank() {
            continue;
        }
        let Some(establishment) = out.establishments.get_mut(&siret) else {
            continue;
        };
        establishment
            .tax_debt
            .get_or_insert_with(TaxDebtHistory::default)
            .series
            .push(point);
    }

    for row in batch.payment_delays {
        let siret: Siret = parse(BatchQuery::PaymentDelays, &row.siret)?;
        let Some(establishment) = out.establishments.get_mut(&siret) else {
            continue;
        };
        establishment
            .tax_debt
            .get_or_insert_with(TaxDebtHistory::default)
            .payment_delays
            .push(PaymentDelay {
                action: row.action,
                created: row.created,
                due_date: row.due_date,
                duration_months: row.duration_months,
                amount: row.amount,
                stage: row.stage,
            });
    }

    // Earliest date per state, per enterprise.
    let mut procedures: HashMap<Siren, HashMap<ProcedureState, NaiveDate>> = HashMap::new();
    for row in batch.procedures {
        let siren: Siren = parse(BatchQuery::Procedures, &row.siren)?;
        let Some(state) = ProcedureState::classify(&row.action, row.stage.as_deref()) else {
            continue;
        };
        procedures
            .entry(siren)
            .or_default()
            .entry(state)
            .and_modify(|date| *date = (*date).min(row.effective_date))
            .or_insert(row.effective_date);
    }
    for establishment in out.establishments.values_mut() {
        if let Some(states) = procedures.get(&establishment.siren) {
            let mut steps: Vec<Procedure> = states
                .iter()
                .map(|(state, date)| Procedure {
                    date: *date,
                    state: *state,
                })
                .collect();
            steps.sort_by_key(|p| p.date);
            establishment.procedures = steps;
        }
    }

    for row in batch.loan_guarantees {
        let siren: Siren = parse(BatchQuery::LoanGuarantees, &row.siren)?;
        let Some(enterprise) = out.enterprises.get_mut(&siren) else {
            continue;
        };
        enterprise.loan_guarantee = Some(enterprise.loan_guarantee.unwrap_or(false) || row.active);
    }

    Ok(out)
}

fn add_identity(out: &mut Assembled, row: IdentityRow) -> Result<(), CatalogError> {
    const Q: BatchQuery = BatchQuery::Identity;
    let siret: Siret = parse(Q, &row.siret)?;
    let siren: Siren = parse(Q, &row.siren)?;
    if siret.siren() != siren {
        return Err(CatalogError::decode(
            Q.name(),
            format!("siret {siret} does not belong to siren {siren}"),
        ));
    }
    let department: Option<DepartmentCode> = parse_opt(Q, row.department.as_deref())?;
    let footprint = footprint(Q, &row.footprint)?;

    let enterprise = out
        .enterprises
        .entry(siren.clone())
        .or_insert_with(|| Enterprise::new(siren.clone()));
    if enterprise.name.is_none() || row.head_office {
        enterprise.name = row.name.clone();
    }
    enterprise.legal_category = row.legal_category.clone();
    enterprise.creation_date = row.enterprise_creation_date;
    enterprise.administrative_state =
        parse_opt(Q, row.enterprise_administrative_state.as_deref())?;
    enterprise.head_office = parse_opt(Q, row.head_office_siret.as_deref())?;
    enterprise.head_office_department = parse_opt(Q, row.head_office_department.as_deref())?;
    enterprise.footprint = footprint.clone();
    enterprise.alert = row.enterprise_alert;
    enterprise.followed |= row.followed_enterprise;
    enterprise.establishments.push(siret.clone());

    let mut establishment = Establishment::new(siret.clone());
    establishment.name = row.name;
    establishment.address = row.address;
    establishment.postal_code = row.postal_code;
    establishment.commune = row.commune;
    establishment.department = department;
    establishment.department_label = row.department_label;
    establishment.region = row.region;
    establishment.creation_date = row.creation_date;
    establishment.latitude = row.latitude;
    establishment.longitude = row.longitude;
    establishment.activity = Activity {
        code: row.activity_code,
        label: row.activity_label,
        sector_code: row.sector_code,
        sector_label: row.sector_label,
        nomenclature: row.nomenclature,
    };
    establishment.administrative_state = parse_opt(Q, row.administrative_state.as_deref())?;
    establishment.head_office = row.head_office;
    establishment.last_headcount = row.last_headcount;
    establishment.followed = row.followed;
    establishment.followed_enterprise = row.followed_enterprise;
    establishment.footprint = footprint;
    establishment.alert = row.establishment_alert;

    out.establishments.insert(siret, establishment);
    Ok(())
}

fn build_score(row: ScoreRow) -> Result<Score, CatalogError> {
    const Q: BatchQuery = BatchQuery::Scores;
    let alert: AlertLevel = parse(Q, &row.alert)?;
    let macro_explanations = match row.macro_explanations {
        None | Some(serde_json::Value::Null) => BTreeMap::new(),
        Some(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(key, value)| value.as_f64().map(|v| (key, v)))
            .collect(),
        Some(other) => {
            return Err(CatalogError::decode(
                Q.name(),
                format!("macro explanations must be an object, got {other}"),
            ))
        }
    };
    Ok(Score {
        list_id: row.list_id,
        batch: row.batch,
        algorithm: row.algorithm,
        period: row.period,
        score: row.score,
        diff: row.diff,
        alert,
        macro_explanations,
        adjustments: row.adjustments,
    })
}

/// Keep one point per calendar month, the latest, and only the last `months`.
/// Expects points sorted by date.
fn keep_monthly_tail(points: &mut Vec<PaymentBehaviour>, months: usize) {
    let mut monthly: Vec<PaymentBehaviour> = Vec::with_capacity(points.len());
    for point in points.drain(..) {
        let month = (point.value_date.year(), point.value_date.month());
        match monthly.last_mut() {
            Some(last) if (last.value_date.year(), last.value_date.month()) == month => {
                *last = point;
            }
            _ => monthly.push(point),
        }
    }
    let excess = monthly.len().saturating_sub(months);
    monthly.drain(..excess);
    *points = monthly;
}

/// Build one listing row. Groups with no value at all stay absent.
pub fn summary(row: SummaryRow) -> Result<Summary, CatalogError> {
    const Q: &str = "summary";
    let decode = |e: ValidationError| CatalogError::decode(Q, e);

    let siret: Siret = row.siret.parse().map_err(decode)?;
    let siren: Siren = row.siren.parse().map_err(decode)?;
    let department = match row.department.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(code.parse::<DepartmentCode>().map_err(decode)?),
    };
    let administrative_state = match row.administrative_state.as_deref() {
        None | Some("") => None,
        Some(state) => Some(state.parse::<AdministrativeState>().map_err(decode)?),
    };
    let procedure = match row.procedure.as_deref() {
        None | Some("") => ProcedureState::InBonis,
        Some(state) => state.parse::<ProcedureState>().map_err(decode)?,
    };
    let footprint = Footprint::try_from_codes(row.footprint.iter().map(String::as_str))
        .map_err(decode)?;

    let score = match (row.list_id, row.score, row.score_alert) {
        (Some(list_id), Some(score), Some(alert)) => Some(ScoreIndicators {
            list_id,
            score,
            diff: row.score_diff,
            alert: alert.parse::<AlertLevel>().map_err(decode)?,
            first_alert: row.first_alert.unwrap_or(false),
        }),
        _ => None,
    };

    let tax_debt = (row.debt_increase.is_some()
        || row.debt_amount.is_some()
        || row.has_payment_plan.is_some())
    .then(|| TaxDebtIndicators {
        debt_increase: row.debt_increase,
        debt_amount: row.debt_amount,
        has_payment_plan: row.has_payment_plan.unwrap_or(false),
    });

    let furlough = (row.furlough_active.is_some()
        || row.furlough_avg_hours.is_some()
        || row.furlough_avg_amount.is_some())
    .then(|| FurloughIndicators {
        active: row.furlough_active.unwrap_or(false),
        avg_hours_12m: row.furlough_avg_hours,
        avg_amount_12m: row.furlough_avg_amount,
    });

    let financial = (row.revenue.is_some()
        || row.revenue_variation.is_some()
        || row.operating_result.is_some()
        || row.ebitda.is_some()
        || row.fiscal_year.is_some())
    .then(|| FinancialIndicators {
        revenue: row.revenue,
        revenue_variation: row.revenue_variation,
        operating_result: row.operating_result,
        ebitda: row.ebitda,
        fiscal_year: row.fiscal_year,
        closing_date: row.closing_date,
    });

    Ok(Summary {
        siret,
        siren,
        name: row.name,
        commune: row.commune,
        department,
        department_label: row.department_label,
        activity_code: row.activity_code,
        activity_label: row.activity_label,
        sector_code: row.sector_code,
        sector_label: row.sector_label,
        headcount: row.headcount,
        enterprise_headcount: row.enterprise_headcount,
        administrative_state,
        head_office: row.head_office,
        procedure,
        followed: row.followed,
        followed_enterprise: row.followed_enterprise,
        score,
        tax_debt,
        furlough,
        financial,
        loan_guarantee: row.loan_guarantee,
        footprint,
        alert: row.alert_history,
        permissions: PermissionSet::DENIED,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        FinancialStatementRow, LoanGuaranteeRow, PaymentBehaviourRow, ProcedureRow,
        TaxDebtPeriodRow,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn identity(siret: &str, dept: &str, head_office: bool) -> IdentityRow {
        IdentityRow {
            siret: siret.into(),
            siren: siret[..9].into(),
            name: Some(format!("site {siret}")),
            department: Some(dept.into()),
            head_office,
            footprint: vec!["01".into(), "02".into()],
            establishment_alert: Some(true),
            ..IdentityRow::default()
        }
    }

    fn score_row(siret: &str, adjustments: &[&str]) -> ScoreRow {
        ScoreRow {
            siret: siret.into(),
            list_id: "L1".into(),
            batch: "2409".into(),
            algorithm: "algo".into(),
            score: 0.8,
            alert: "Alerte seuil F1".into(),
            macro_explanations: Some(serde_json::json!({"dette": 0.4, "note": "x"})),
            adjustments: adjustments.iter().map(|s| s.to_string()).collect(),
            ..ScoreRow::default()
        }
    }

    #[test]
    fn identities_build_both_maps() {
        let batch = RawBatch {
            identities: vec![
                identity("11111111100011", "01", true),
                identity("11111111100029", "02", false),
            ],
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        assert_eq!(out.establishments.len(), 2);
        assert_eq!(out.enterprises.len(), 1);
        let siren = Siren::new("111111111").unwrap();
        let enterprise = &out.enterprises[&siren];
        assert_eq!(enterprise.establishments.len(), 2);
        assert_eq!(enterprise.name.as_deref(), Some("site 11111111100011"));
        let sites = out.establishments_of(&siren);
        assert!(sites[0].head_office);
    }

    #[test]
    fn absent_series_stay_absent() {
        let batch = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        let site = out.establishments.values().next().unwrap();
        assert!(site.scores.is_none());
        assert!(site.tax_debt.is_none());
        assert!(site.furlough.is_none());
        assert!(out.enterprises.values().next().unwrap().financials.is_none());
    }

    #[test]
    fn adjustments_masked_by_statement_recency() {
        let adjustments = ["solvabilité_faible", "rentabilité_faible", "dette_urssaf"];
        let old = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            scores: vec![score_row("11111111100011", &adjustments)],
            ..RawBatch::default()
        };
        let out = assemble(old).unwrap();
        let score = &out.establishments.values().next().unwrap().scores.as_ref().unwrap()[0];
        assert_eq!(score.adjustments, vec!["dette_urssaf", "confidentiel"]);
        assert_eq!(score.macro_explanations.len(), 1);

        let recent = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            financial_statements: vec![FinancialStatementRow {
                siren: "111111111".into(),
                fiscal_year: 2022,
                ..FinancialStatementRow::default()
            }],
            scores: vec![score_row("11111111100011", &adjustments)],
            ..RawBatch::default()
        };
        let out = assemble(recent).unwrap();
        let score = &out.establishments.values().next().unwrap().scores.as_ref().unwrap()[0];
        assert_eq!(
            score.adjustments,
            vec!["solvabilité_faible", "dette_urssaf", "confidentiel"]
        );
    }

    #[test]
    fn blank_tax_periods_skipped() {
        let batch = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            tax_debt_periods: vec![
                TaxDebtPeriodRow {
                    siret: "11111111100011".into(),
                    period: date(2024, 1, 1),
                    contribution: Some(0.0),
                    ..TaxDebtPeriodRow::default()
                },
                TaxDebtPeriodRow {
                    siret: "11111111100011".into(),
                    period: date(2024, 2, 1),
                    employer_share: Some(120.0),
                    ..TaxDebtPeriodRow::default()
                },
            ],
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        let site = out.establishments.values().next().unwrap();
        let series = &site.tax_debt.as_ref().unwrap().series;
        assert_eq!(series.len(), 1);
        assert!(series.column_lengths().iter().all(|&n| n == 1));
    }

    #[test]
    fn procedures_keep_earliest_date_per_state() {
        let batch = RawBatch {
            identities: vec![
                identity("11111111100011", "01", true),
                identity("11111111100029", "02", false),
            ],
            procedures: vec![
                ProcedureRow {
                    siren: "111111111".into(),
                    effective_date: date(2021, 3, 1),
                    action: "redressement".into(),
                    stage: None,
                },
                ProcedureRow {
                    siren: "111111111".into(),
                    effective_date: date(2021, 6, 1),
                    action: "redressement".into(),
                    stage: None,
                },
                ProcedureRow {
                    siren: "111111111".into(),
                    effective_date: date(2022, 1, 1),
                    action: "liquidation".into(),
                    stage: None,
                },
                ProcedureRow {
                    siren: "111111111".into(),
                    effective_date: date(2020, 1, 1),
                    action: "conciliation".into(),
                    stage: None,
                },
            ],
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        for site in out.establishments.values() {
            assert_eq!(site.procedures.len(), 2);
            assert_eq!(site.procedures[0].date, date(2021, 3, 1));
            assert_eq!(site.procedure_state(), ProcedureState::Liquidation);
        }
    }

    #[test]
    fn loan_guarantee_or_merged() {
        let batch = RawBatch {
            identities: vec![
                identity("11111111100011", "01", true),
                identity("11111111100029", "02", false),
            ],
            loan_guarantees: vec![
                LoanGuaranteeRow {
                    siret: "11111111100011".into(),
                    siren: "111111111".into(),
                    active: false,
                },
                LoanGuaranteeRow {
                    siret: "11111111100029".into(),
                    siren: "111111111".into(),
                    active: true,
                },
            ],
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        assert_eq!(out.enterprises.values().next().unwrap().loan_guarantee, Some(true));
    }

    #[test]
    fn payment_behaviour_one_point_per_month() {
        let mut rows = Vec::new();
        for month in 1..=12 {
            for year in [2022, 2023, 2024] {
                rows.push(PaymentBehaviourRow {
                    siren: "111111111".into(),
                    value_date: date(year, month, 1),
                    paydex: Some(f64::from(month)),
                    ..PaymentBehaviourRow::default()
                });
            }
        }
        rows.push(PaymentBehaviourRow {
            siren: "111111111".into(),
            value_date: date(2024, 12, 20),
            paydex: Some(99.0),
            ..PaymentBehaviourRow::default()
        });
        rows.sort_by_key(|r| r.value_date);
        let batch = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            payment_behaviour: rows,
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        let points = &out.enterprises.values().next().unwrap().financials.as_ref().unwrap()
            .payment_behaviour;
        assert_eq!(points.len(), PAYMENT_BEHAVIOUR_MONTHS);
        assert_eq!(points[0].value_date, date(2023, 1, 1));
        assert_eq!(points.last().unwrap().paydex, Some(99.0));
    }

    #[test]
    fn malformed_identity_fails_batch() {
        let batch = RawBatch {
            identities: vec![IdentityRow {
                siret: "123".into(),
                siren: "123".into(),
                ..IdentityRow::default()
            }],
            ..RawBatch::default()
        };
        assert!(matches!(
            assemble(batch),
            Err(CatalogError::Decode { query: "identity", .. })
        ));
    }

    #[test]
    fn unknown_alert_level_fails_batch() {
        let mut row = score_row("11111111100011", &[]);
        row.alert = "rouge".into();
        let batch = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            scores: vec![row],
            ..RawBatch::default()
        };
        assert!(assemble(batch).is_err());
    }

    #[test]
    fn orphan_rows_dropped() {
        let batch = RawBatch {
            identities: vec![identity("11111111100011", "01", true)],
            scores: vec![score_row("22222222200022", &[])],
            ..RawBatch::default()
        };
        let out = assemble(batch).unwrap();
        assert_eq!(out.establishments.len(), 1);
        assert!(out.establishments.values().all(|e| e.scores.is_none()));
    }

    #[test]
    fn summary_groups_absent_without_values() {
        let row = SummaryRow {
            siret: "11111111100011".into(),
            siren: "111111111".into(),
            department: Some("01".into()),
            footprint: vec!["01".into()],
            list_id: Some("L1".into()),
            score: Some(0.5),
            score_alert: Some("Alerte seuil F2".into()),
            debt_amount: Some(1000.0),
            ..SummaryRow::default()
        };
        let summary = summary(row).unwrap();
        assert!(summary.score.is_some());
        assert!(summary.tax_debt.is_some());
        assert!(summary.furlough.is_none());
        assert!(summary.financial.is_none());
        assert_eq!(summary.procedure, ProcedureState::InBonis);
        assert_eq!(summary.permissions, PermissionSet::DENIED);
    }
}
