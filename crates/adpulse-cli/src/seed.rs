//! `seed` command: sync the advertiser registry file into the database.
//!
//! Upserts every advertiser in the file and deactivates any database row
//! whose slug no longer appears there. Deactivated advertisers keep their
//! stored ads and history; they just stop being swept.

/// # Errors
///
/// Returns an error if the registry file cannot be read or the upsert
/// transaction fails.
pub(crate) async fn run_seed(
    pool: &sqlx::PgPool,
    config: &adpulse_core::AppConfig,
) -> anyhow::Result<()> {
    let file = adpulse_core::load_advertisers(&config.advertisers_path)?;
    if file.advertisers.is_empty() {
        println!(
            "no advertisers defined in {}; nothing to seed",
            config.advertisers_path.display()
        );
        return Ok(());
    }

    let count = adpulse_db::seed_advertisers(pool, &file.advertisers).await?;
    println!(
        "seeded {count} advertisers from {}",
        config.advertisers_path.display()
    );
    Ok(())
}
