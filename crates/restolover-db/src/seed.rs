use restolover_core::KeywordTables;
use sqlx::PgPool;

use crate::DbError;

/// Insert every canonical speciality name from `tables` that is not stored yet.
///
/// Returns the number of specialities inserted. All inserts run inside a
/// single transaction; if any fails the batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_specialities(pool: &PgPool, tables: &KeywordTables) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for name in tables.canonical_specialities() {
        let result = sqlx::query(
            "INSERT INTO specialities (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(inserted, "specialities seeded");
    Ok(inserted)
}
