//! World table repository: rooms and the race/class choice tables.

use super::DbError;
use sqlx::SqlitePool;

/// A room row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A row from the `races` or `classes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRecord {
    pub id: i64,
    pub name: String,
    pub playable: bool,
}

/// Repository for the static world tables.
pub struct WorldRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> WorldRepository<'a> {
    /// Create a new world repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load every room, ordered by id.
    pub async fn load_rooms(&self) -> Result<Vec<RoomRecord>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, name, description FROM rooms ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, description)| RoomRecord {
                id,
                name,
                description,
            })
            .collect())
    }

    /// Load the race table, ordered by id.
    pub async fn load_races(&self) -> Result<Vec<ChoiceRecord>, DbError> {
        self.load_choices("SELECT id, name, playable FROM races ORDER BY id")
            .await
    }

    /// Load the class table, ordered by id.
    pub async fn load_classes(&self) -> Result<Vec<ChoiceRecord>, DbError> {
        self.load_choices("SELECT id, name, playable FROM classes ORDER BY id")
            .await
    }

    async fn load_choices(&self, query: &'static str) -> Result<Vec<ChoiceRecord>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, bool)>(query)
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, playable)| ChoiceRecord { id, name, playable })
            .collect())
    }
}
