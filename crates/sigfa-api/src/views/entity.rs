//! Single-entity fetch.
//!
//! Unknown ids and entities the principal may not see both come back as the
//! same not-found error.

use serde::Serialize;
use sigfa_core::{
    evaluate, DisclosureSubject, Enterprise, Establishment, Redact, Scope, Siren, Siret,
};
use utoipa::ToSchema;

use crate::assemble::{assemble, Assembled};
use crate::auth::Principal;
use crate::catalog::{BatchRequest, EntityCatalog};
use crate::error::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct EstablishmentView {
    pub establishment: Establishment,
    /// The owning enterprise, evaluated on its own.
    pub enterprise: Option<Enterprise>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnterpriseView {
    pub enterprise: Enterprise,
    /// Head office first.
    pub establishments: Vec<Establishment>,
}

pub(crate) fn evaluate_establishment(scope: &Scope, establishment: &mut Establishment) {
    establishment.permissions = evaluate(
        scope,
        &DisclosureSubject {
            footprint: &establishment.footprint,
            department: establishment.department.as_ref(),
            alert: establishment.alert,
            followed: establishment.followed_enterprise,
        },
    );
}

/// An enterprise is framed by its head office department.
pub(crate) fn evaluate_enterprise(scope: &Scope, enterprise: &mut Enterprise) {
    enterprise.permissions = evaluate(
        scope,
        &DisclosureSubject {
            footprint: &enterprise.footprint,
            department: enterprise.head_office_department.as_ref(),
            alert: enterprise.alert,
            followed: enterprise.followed,
        },
    );
}

pub(crate) async fn fetch<C: EntityCatalog>(
    catalog: &C,
    principal: &Principal,
    sirets: &[Siret],
    sirens: &[Siren],
) -> Result<Assembled, AppError> {
    let batch = catalog
        .fetch_batch(&BatchRequest {
            sirets,
            sirens,
            scope: &principal.scope,
            username: &principal.username,
        })
        .await?;
    Ok(assemble(batch)?)
}

pub async fn establishment<C: EntityCatalog>(
    catalog: &C,
    principal: &Principal,
    siret: &Siret,
) -> Result<EstablishmentView, AppError> {
    let mut assembled = fetch(catalog, principal, std::slice::from_ref(siret), &[]).await?;
    let mut establishment = assembled
        .establishments
        .remove(siret)
        .ok_or_else(|| AppError::entity_not_found(siret))?;

    evaluate_establishment(&principal.scope, &mut establishment);
    if !establishment.permissions.visible {
        tracing::debug!(siret = %siret, "establishment not visible to principal");
        return Err(AppError::entity_not_found(siret));
    }

    let enterprise = assembled
        .enterprises
        .remove(&establishment.siren)
        .map(|mut enterprise| {
            evaluate_enterprise(&principal.scope, &mut enterprise);
            enterprise.redacted()
        });

    Ok(EstablishmentView {
        establishment: establishment.redacted(),
        enterprise,
    })
}

pub async fn enterprise<C: EntityCatalog>(
    catalog: &C,
    principal: &Principal,
    siren: &Siren,
) -> Result<EnterpriseView, AppError> {
    let mut assembled = fetch(catalog, principal, &[], std::slice::from_ref(siren)).await?;
    let mut enterprise = assembled
        .enterprises
        .remove(siren)
        .ok_or_else(|| AppError::entity_not_found(siren))?;

    evaluate_enterprise(&principal.scope, &mut enterprise);
    if !enterprise.permissions.visible {
        tracing::debug!(siren = %siren, "enterprise not visible to principal");
        return Err(AppError::entity_not_found(siren));
    }

    let sites: Vec<Siret> = assembled
        .establishments_of(siren)
        .into_iter()
        .map(|e| e.siret.clone())
        .collect();
    let establishments = sites
        .iter()
        .filter_map(|siret| assembled.establishments.remove(siret))
        .map(|mut establishment| {
            evaluate_establishment(&principal.scope, &mut establishment);
            establishment
        })
        .filter(|e| e.permissions.visible)
        .map(Redact::redacted)
        .collect();

    Ok(EnterpriseView {
        enterprise: enterprise.redacted(),
        establishments,
    })
}
