//! Follow relation writes on `establishment_follow`.
//!
//! At most one active row per (siret, username), enforced by a partial
//! unique index. Ending a follow keeps the row for history.

use chrono::{DateTime, Utc};
use sigfa_core::Siret;
use sqlx::PgPool;

use super::classify;
use crate::catalog::{CatalogError, EndFollow, FollowOutcome, FollowRecord, NewFollow};

pub(super) async fn insert(
    pool: &PgPool,
    username: &str,
    siret: &Siret,
    request: &NewFollow,
) -> Result<FollowOutcome, CatalogError> {
    let since: Option<DateTime<Utc>> = sqlx::query_scalar(
        "INSERT INTO establishment_follow (siret, siren, username, active, since, comment, category)
         VALUES ($1, $2, $3, true, now(), $4, $5)
         ON CONFLICT (siret, username) WHERE active DO NOTHING
         RETURNING since",
    )
    .bind(siret.as_str())
    .bind(siret.siren().as_str())
    .bind(username)
    .bind(&request.comment)
    .bind(&request.category)
    .fetch_optional(pool)
    .await
    .map_err(classify("follow"))?;

    Ok(match since {
        Some(since) => FollowOutcome::Created(FollowRecord {
            siret: siret.clone(),
            username: username.to_string(),
            category: request.category.clone(),
            comment: request.comment.clone(),
            since,
        }),
        None => FollowOutcome::AlreadyFollowed,
    })
}

pub(super) async fn end(
    pool: &PgPool,
    username: &str,
    siret: &Siret,
    request: &EndFollow,
) -> Result<bool, CatalogError> {
    let result = sqlx::query(
        "UPDATE establishment_follow
         SET active = false, until = now(), unfollow_comment = $3, unfollow_category = $4
         WHERE siret = $1 AND username = $2 AND active",
    )
    .bind(siret.as_str())
    .bind(username)
    .bind(&request.comment)
    .bind(&request.category)
    .execute(pool)
    .await
    .map_err(classify("unfollow"))?;

    Ok(result.rows_affected() > 0)
}
