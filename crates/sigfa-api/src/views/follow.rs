//! Follow list and follow toggling.
//!
//! The follow list is not gated on visibility: following unlocks the
//! principal's mandated categories wherever the entity is. Starting a follow
//! does require the target to be visible, so nobody can discover an entity
//! outside their jurisdiction by trying to follow it.

use sigfa_core::{Redact, Siret, Summary};

use super::entity::{evaluate_establishment, fetch};
use super::{evaluate_summary, summaries};
use crate::auth::Principal;
use crate::catalog::{EndFollow, EntityCatalog, FollowOutcome, FollowStore, NewFollow};
use crate::error::AppError;

/// Every establishment the principal follows, redacted.
pub async fn list<C: EntityCatalog>(
    catalog: &C,
    principal: &Principal,
) -> Result<Vec<Summary>, AppError> {
    let rows = catalog.followed(&principal.username).await?;
    Ok(summaries(rows)?
        .into_iter()
        .map(|mut row| {
            evaluate_summary(&mut row, &principal.scope, &principal.scope);
            row.redacted()
        })
        .collect())
}

pub async fn follow<C: EntityCatalog + FollowStore>(
    catalog: &C,
    principal: &Principal,
    siret: &Siret,
    request: &NewFollow,
) -> Result<FollowOutcome, AppError> {
    let mut assembled = fetch(catalog, principal, std::slice::from_ref(siret), &[]).await?;
    let visible = assembled
        .establishments
        .get_mut(siret)
        .map(|establishment| {
            evaluate_establishment(&principal.scope, establishment);
            establishment.permissions.visible
        })
        .unwrap_or(false);
    if !visible {
        return Err(AppError::entity_not_found(siret));
    }

    let outcome = catalog.follow(&principal.username, siret, request).await?;
    if let FollowOutcome::Created(_) = &outcome {
        tracing::info!(
            principal = %principal.username,
            siret = %siret,
            category = %request.category,
            "follow started"
        );
    }
    Ok(outcome)
}

pub async fn unfollow<C: FollowStore>(
    catalog: &C,
    principal: &Principal,
    siret: &Siret,
    request: &EndFollow,
) -> Result<(), AppError> {
    if catalog.unfollow(&principal.username, siret, request).await? {
        tracing::info!(principal = %principal.username, siret = %siret, "follow ended");
        Ok(())
    } else {
        Err(AppError::NotFound(format!("follow of {siret}")))
    }
}
