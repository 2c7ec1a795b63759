//! Follow export merged with externally owned cases.
//!
//! The case-management system may own cases the principal never followed
//! here. Those widen what gets exported, never what gets disclosed: they
//! are evaluated on the principal's own follows and must be visible to be
//! included.

use std::collections::BTreeSet;

use sigfa_core::{Redact, Siret, Summary};

use super::{evaluate_summary, summaries};
use crate::auth::Principal;
use crate::catalog::EntityCatalog;
use crate::error::AppError;

pub async fn follows<C: EntityCatalog>(
    catalog: &C,
    principal: &Principal,
    external_owned: &[Siret],
) -> Result<Vec<Summary>, AppError> {
    let scope = &principal.scope;

    let mut rows: Vec<Summary> = summaries(catalog.followed(&principal.username).await?)?
        .into_iter()
        .map(|mut row| {
            evaluate_summary(&mut row, scope, scope);
            row
        })
        .collect();

    let followed: BTreeSet<&Siret> = rows.iter().map(|r| &r.siret).collect();
    let external_only: Vec<Siret> = external_owned
        .iter()
        .filter(|s| !followed.contains(s))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if !external_only.is_empty() {
        let external = summaries(
            catalog
                .summaries(&external_only, scope, &principal.username)
                .await?,
        )?;
        let before = rows.len();
        rows.extend(
            external
                .into_iter()
                .map(|mut row| {
                    evaluate_summary(&mut row, scope, scope);
                    row
                })
                .filter(|row| row.permissions.visible),
        );
        tracing::debug!(
            requested = external_only.len(),
            included = rows.len() - before,
            "external cases merged into export"
        );
    }

    rows.sort_by(|a, b| (&a.name, &a.siret).cmp(&(&b.name, &b.siret)));
    Ok(rows.into_iter().map(Redact::redacted).collect())
}
