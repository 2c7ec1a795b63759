//! Batch fetch: the ten entity queries in one read-only snapshot.
//!
//! The transaction runs at `REPEATABLE READ`, so a score inserted between two
//! queries is never half-joined. It is rolled back once every result set is
//! read. Dropping the future mid-batch drops the transaction, which sqlx
//! rolls back when the connection returns to the pool.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool};

use super::{classify, geo_binding};
use crate::catalog::{BatchQuery, BatchRequest, CatalogError, RawBatch};

/// Prefix a query with the `admitted` set: requested ids that pass the
/// scope predicate. Parameters: `$1` departments or NULL, `$2` username,
/// `$3` sirets, `$4` sirens.
macro_rules! scoped {
    ($body:literal) => {
        concat!(
            "WITH admitted AS (
                SELECT s.siret, s.siren
                FROM establishment_scope s
                WHERE (s.siret = ANY($3) OR s.siren = ANY($4))
                  AND ($1::text[] IS NULL
                       OR s.footprint && $1::text[]
                       OR EXISTS (SELECT 1 FROM establishment_follow f
                                  WHERE f.siren = s.siren AND f.username = $2 AND f.active)))
            ",
            $body
        )
    };
}

const IDENTITY: &str = scoped!(
    "SELECT i.siret, i.siren, i.name, i.legal_category, i.address, i.postal_code,
            i.commune, i.department, i.department_label, i.region, i.creation_date,
            i.enterprise_creation_date, i.latitude, i.longitude, i.activity_code,
            i.activity_label, i.sector_code, i.sector_label, i.nomenclature,
            i.administrative_state, i.enterprise_administrative_state, i.head_office,
            i.head_office_siret, i.head_office_department, i.last_headcount, i.footprint,
            i.establishment_alert, i.enterprise_alert,
            EXISTS (SELECT 1 FROM establishment_follow f
                    WHERE f.siret = i.siret AND f.username = $2 AND f.active) AS followed,
            EXISTS (SELECT 1 FROM establishment_follow f
                    WHERE f.siren = i.siren AND f.username = $2 AND f.active) AS followed_enterprise
     FROM establishment_identity i
     JOIN admitted a ON a.siret = i.siret
     ORDER BY i.siret"
);

const FINANCIAL_STATEMENTS: &str = scoped!(
    "SELECT b.siren, b.fiscal_year, b.closing_date, b.revenue, b.ebitda, b.net_profit,
            b.operating_result
     FROM enterprise_financial_statement b
     WHERE b.siren IN (SELECT siren FROM admitted)
     ORDER BY b.siren, b.fiscal_year"
);

const PAYMENT_BEHAVIOUR: &str = scoped!(
    "SELECT p.siren, p.value_date, p.paydex, p.days_late, p.suppliers, p.outstanding,
            p.experiences, p.fpi_30, p.fpi_90
     FROM enterprise_payment_behaviour p
     WHERE p.siren IN (SELECT siren FROM admitted)
     ORDER BY p.siren, p.value_date"
);

const SCORES: &str = scoped!(
    "SELECT s.siret, s.list_id, s.batch, s.algorithm, s.period, s.score, s.diff, s.alert,
            s.macro_explanations, s.adjustments
     FROM establishment_score s
     WHERE s.siret IN (SELECT siret FROM admitted)
     ORDER BY s.siret, s.batch DESC, s.score DESC"
);

const FURLOUGH_REQUESTS: &str = scoped!(
    "SELECT d.siret, d.id, d.headcount, d.authorised_headcount, d.period_start,
            d.period_end, d.authorised_hours, d.authorised_amount, d.reason
     FROM establishment_furlough_request d
     WHERE d.siret IN (SELECT siret FROM admitted)
     ORDER BY d.siret, d.period_start"
);

const FURLOUGH_CONSUMPTIONS: &str = scoped!(
    "SELECT c.siret, c.id, c.period, c.hours, c.amount, c.headcount
     FROM establishment_furlough_consumption c
     WHERE c.siret IN (SELECT siret FROM admitted)
     ORDER BY c.siret, c.period"
);

const TAX_DEBT_PERIODS: &str = scoped!(
    "SELECT t.siret, t.period, t.contribution, t.employer_share, t.employee_share,
            t.surcharge, t.headcount
     FROM establishment_tax_debt t
     WHERE t.siret IN (SELECT siret FROM admitted)
     ORDER BY t.siret, t.period"
);

const PAYMENT_DELAYS: &str = scoped!(
    "SELECT d.siret, d.action, d.created, d.due_date, d.duration_months, d.amount, d.stage
     FROM establishment_payment_delay d
     WHERE d.siret IN (SELECT siret FROM admitted)
       AND d.stage IS DISTINCT FROM 'PRO PR'
     ORDER BY d.siret, d.created"
);

const PROCEDURES: &str = scoped!(
    "SELECT p.siren, p.effective_date, p.action, p.stage
     FROM enterprise_procedure p
     WHERE p.siren IN (SELECT siren FROM admitted)
     ORDER BY p.siren, p.effective_date"
);

const LOAN_GUARANTEES: &str = scoped!(
    "SELECT g.siret, g.siren, g.active
     FROM establishment_loan_guarantee g
     WHERE g.siret IN (SELECT siret FROM admitted)"
);

fn sql(query: BatchQuery) -> &'static str {
    match query {
        BatchQuery::Identity => IDENTITY,
        BatchQuery::FinancialStatements => FINANCIAL_STATEMENTS,
        BatchQuery::PaymentBehaviour => PAYMENT_BEHAVIOUR,
        BatchQuery::Scores => SCORES,
        BatchQuery::FurloughRequests => FURLOUGH_REQUESTS,
        BatchQuery::FurloughConsumptions => FURLOUGH_CONSUMPTIONS,
        BatchQuery::TaxDebtPeriods => TAX_DEBT_PERIODS,
        BatchQuery::PaymentDelays => PAYMENT_DELAYS,
        BatchQuery::Procedures => PROCEDURES,
        BatchQuery::LoanGuarantees => LOAN_GUARANTEES,
    }
}

/// Bound parameters shared by every query of the batch.
struct Params {
    geo: Option<Vec<String>>,
    username: String,
    sirets: Vec<String>,
    sirens: Vec<String>,
}

async fn run<R>(
    conn: &mut PgConnection,
    query: BatchQuery,
    params: &Params,
) -> Result<Vec<R>, CatalogError>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, R>(sql(query))
        .bind(&params.geo)
        .bind(&params.username)
        .bind(&params.sirets)
        .bind(&params.sirens)
        .fetch_all(conn)
        .await
        .map_err(classify(query.name()))
}

pub(super) async fn fetch(
    pool: &PgPool,
    request: &BatchRequest<'_>,
) -> Result<RawBatch, CatalogError> {
    let params = Params {
        geo: geo_binding(request.scope),
        username: request.username.to_string(),
        sirets: request.sirets.iter().map(|s| s.as_str().to_string()).collect(),
        sirens: request.sirens.iter().map(|s| s.as_str().to_string()).collect(),
    };

    let mut tx = pool.begin().await.map_err(classify("begin"))?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(classify("begin"))?;

    let batch = RawBatch {
        identities: run(&mut tx, BatchQuery::Identity, &params).await?,
        financial_statements: run(&mut tx, BatchQuery::FinancialStatements, &params).await?,
        payment_behaviour: run(&mut tx, BatchQuery::PaymentBehaviour, &params).await?,
        scores: run(&mut tx, BatchQuery::Scores, &params).await?,
        furlough_requests: run(&mut tx, BatchQuery::FurloughRequests, &params).await?,
        furlough_consumptions: run(&mut tx, BatchQuery::FurloughConsumptions, &params).await?,
        tax_debt_periods: run(&mut tx, BatchQuery::TaxDebtPeriods, &params).await?,
        payment_delays: run(&mut tx, BatchQuery::PaymentDelays, &params).await?,
        procedures: run(&mut tx, BatchQuery::Procedures, &params).await?,
        loan_guarantees: run(&mut tx, BatchQuery::LoanGuarantees, &params).await?,
    };

    tx.rollback().await.map_err(classify("rollback"))?;

    tracing::debug!(
        identities = batch.identities.len(),
        scores = batch.scores.len(),
        "batch fetched"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_query_is_scoped() {
        for query in BatchQuery::ALL {
            let text = sql(query);
            assert!(text.starts_with("WITH admitted AS"), "{}", query.name());
            assert!(text.contains("admitted"), "{}", query.name());
        }
    }

    #[test]
    fn excluded_payment_plans_filtered_at_source() {
        assert!(PAYMENT_DELAYS.contains(crate::catalog::rows::EXCLUDED_DELAY_STAGE));
    }
}
