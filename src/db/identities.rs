//! Identity repository.
//!
//! Stores player identities: the credential hash, the demographic choices
//! made at creation and the room the player was last seen in.

use super::DbError;
use sqlx::SqlitePool;

/// A persisted player identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
    pub race_id: i64,
    pub class_id: i64,
    pub level: i64,
    pub room_id: i64,
    pub created_at: i64,
    pub last_login_at: Option<i64>,
}

/// Fields supplied when an identity is first created.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub password_hash: String,
    pub race_id: i64,
    pub class_id: i64,
    pub room_id: i64,
}

type IdentityRow = (i64, String, String, i64, i64, i64, i64, i64, Option<i64>);

fn from_row(row: IdentityRow) -> IdentityRecord {
    let (id, name, password_hash, race_id, class_id, level, room_id, created_at, last_login_at) =
        row;
    IdentityRecord {
        id,
        name,
        password_hash,
        race_id,
        class_id,
        level,
        room_id,
        created_at,
        last_login_at,
    }
}

/// Repository for identity operations.
pub struct IdentityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IdentityRepository<'a> {
    /// Create a new identity repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find an identity by name (case-insensitive).
    pub async fn find_by_name(&self, name: &str) -> Result<Option<IdentityRecord>, DbError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, name, password_hash, race_id, class_id, level, room_id,
                   created_at, last_login_at
            FROM identities
            WHERE name = ? COLLATE NOCASE
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Create a new identity.
    ///
    /// The name column is unique without regard to case, so a lost race
    /// between two creators surfaces as [`DbError::IdentityExists`].
    pub async fn create(&self, new: &NewIdentity) -> Result<IdentityRecord, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO identities (name, password_hash, race_id, class_id, room_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(new.race_id)
        .bind(new.class_id)
        .bind(new.room_id)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::IdentityExists(new.name.clone());
            }
            DbError::from(e)
        })?;

        Ok(IdentityRecord {
            id: result.last_insert_rowid(),
            name: new.name.clone(),
            password_hash: new.password_hash.clone(),
            race_id: new.race_id,
            class_id: new.class_id,
            level: 1,
            room_id: new.room_id,
            created_at: now,
            last_login_at: None,
        })
    }

    /// Room the identity was last saved in.
    pub async fn last_location(&self, id: i64) -> Result<i64, DbError> {
        sqlx::query_scalar::<_, i64>("SELECT room_id FROM identities WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(DbError::IdentityNotFound(id))
    }

    /// Persist the identity's current room.
    pub async fn save_location(&self, id: i64, room_id: i64) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE identities SET room_id = ? WHERE id = ?")
            .bind(room_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::IdentityNotFound(id));
        }
        Ok(())
    }

    /// Record a successful login.
    pub async fn touch_login(&self, id: i64) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE identities SET last_login_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
