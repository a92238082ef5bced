use adpulse_core::AdvertiserConfig;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Upsert advertisers from config into the database.
///
/// Returns the number of advertisers processed (inserted or updated).
/// Advertisers present in the database but absent from the config are
/// deactivated, not deleted, so their stored ads and history remain.
/// All statements run inside a single transaction; if any operation
/// fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_advertisers(
    pool: &PgPool,
    advertisers: &[AdvertiserConfig],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;
    let mut slugs = Vec::with_capacity(advertisers.len());

    for advertiser in advertisers {
        let slug = advertiser.slug();

        sqlx::query(
            "INSERT INTO advertisers (public_id, name, slug, page_id, notes, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 page_id = EXCLUDED.page_id, \
                 notes = EXCLUDED.notes, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(&advertiser.name)
        .bind(&slug)
        .bind(&advertiser.page_id)
        .bind(&advertiser.notes)
        .bind(advertiser.active)
        .execute(&mut *tx)
        .await?;

        slugs.push(slug);
        count += 1;
    }

    // Anything no longer in the config stops being scraped.
    sqlx::query(
        "UPDATE advertisers \
         SET is_active = false, updated_at = NOW() \
         WHERE is_active = true AND slug != ALL($1::TEXT[])",
    )
    .bind(&slugs)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(count)
}
