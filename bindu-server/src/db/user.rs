//! Postgres-backed user store
//!
//! The capture bridge reads users by id and writes a single column. The rest of
//! the user table is owned by Bindu's account management.

use async_trait::async_trait;
use bindu_core::{StoreError, UserRecord, UserStore};
use sqlx::{FromRow, PgPool};

/// Row shape of the columns the bridge touches
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    fingerprint_image: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            fingerprint_image: row.fingerprint_image,
        }
    }
}

/// Repository for user database operations
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// SQL for recording a captured fingerprint on a user
    const SET_FINGERPRINT_SQL: &str = r#"
        UPDATE users
        SET fingerprint_image = $2, updated_at = NOW()
        WHERE id = $1
    "#;

    /// Create a new user store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run pending migrations from `./migrations`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, fingerprint_image
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(UserRecord::from))
        .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set_fingerprint_image(
        &self,
        id: &str,
        public_path: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(Self::SET_FINGERPRINT_SQL)
            .bind(id)
            .bind(public_path)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for PgUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgUserStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_from_row() {
        let row = UserRow {
            id: "65f1c0ffee".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            fingerprint_image: Some("/uploads/fingerprints/a.bmp".to_string()),
        };

        let record = UserRecord::from(row);
        assert_eq!(record.id, "65f1c0ffee");
        assert_eq!(
            record.fingerprint_image.as_deref(),
            Some("/uploads/fingerprints/a.bmp")
        );
    }

    #[test]
    fn test_set_fingerprint_sql_touches_single_field() {
        let sql = PgUserStore::SET_FINGERPRINT_SQL;
        assert!(sql.contains("fingerprint_image = $2"));
        assert!(sql.contains("WHERE id = $1"));
        assert!(!sql.contains("name ="));
        assert!(!sql.contains("email ="));
    }
}
