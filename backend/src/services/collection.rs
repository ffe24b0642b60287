//! "My Bar" service: the bottles a user owns

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::bottle::{SpiritRow, SPIRIT_COLUMNS};
use shared::{Bottle, CollectionEdit, CollectionItem};

/// Collection service
#[derive(Clone)]
pub struct CollectionService {
    db: PgPool,
}

/// A collection item together with its bottle
#[derive(Debug, Clone, Serialize)]
pub struct CollectionEntry {
    #[serde(flatten)]
    pub item: CollectionItem,
    pub bottle: Bottle,
    pub emoji: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CollectionRow {
    id: Uuid,
    user_id: Uuid,
    bottle_id: Uuid,
    fill_percentage: i16,
    count_owned: i16,
    notes: String,
    added_at: DateTime<Utc>,
}

impl From<CollectionRow> for CollectionItem {
    fn from(row: CollectionRow) -> Self {
        CollectionItem {
            id: row.id,
            user_id: row.user_id,
            bottle_id: row.bottle_id,
            fill_percentage: shared::clamp_fill_percentage(i32::from(row.fill_percentage)),
            count_owned: shared::clamp_count_owned(i32::from(row.count_owned)),
            notes: row.notes,
            added_at: row.added_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    item_id: Uuid,
    user_id: Uuid,
    fill_percentage: i16,
    count_owned: i16,
    notes: String,
    added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    spirit: SpiritRow,
}

impl From<EntryRow> for CollectionEntry {
    fn from(row: EntryRow) -> Self {
        let item = CollectionRow {
            id: row.item_id,
            user_id: row.user_id,
            bottle_id: row.spirit.id,
            fill_percentage: row.fill_percentage,
            count_owned: row.count_owned,
            notes: row.notes,
            added_at: row.added_at,
        }
        .into();
        let bottle = Bottle::from(row.spirit);

        CollectionEntry {
            item,
            emoji: bottle.emoji().to_string(),
            bottle,
        }
    }
}

const ITEM_COLUMNS: &str = "id, user_id, bottle_id, fill_percentage, count_owned, notes, added_at";

fn entry_select() -> String {
    format!(
        r#"
        SELECT c.id AS item_id, c.user_id, c.fill_percentage, c.count_owned, c.notes, c.added_at,
               {SPIRIT_COLUMNS}
        FROM collection_items c
        JOIN spirits s ON s.id = c.bottle_id
        "#
    )
}

impl CollectionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Everything in the user's bar, most recently added first
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<CollectionEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "{} WHERE c.user_id = $1 ORDER BY c.added_at DESC",
            entry_select()
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CollectionEntry::from).collect())
    }

    /// Case-insensitive match on name, distillery, or type within the user's bar
    pub async fn search(&self, user_id: Uuid, query: &str) -> AppResult<Vec<CollectionEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"{}
            WHERE c.user_id = $1
              AND (s.name ILIKE $2 OR s.distillery ILIKE $2 OR s.type ILIKE $2)
            ORDER BY s.name ASC
            "#,
            entry_select()
        ))
        .bind(user_id)
        .bind(format!("%{}%", query))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(CollectionEntry::from).collect())
    }

    /// Add a bottle to the bar with default fill, count, and notes
    pub async fn add(&self, user_id: Uuid, bottle_id: Uuid) -> AppResult<CollectionItem> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM spirits WHERE id = $1)",
        )
        .bind(bottle_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Bottle".to_string()));
        }

        let item = CollectionItem::new(user_id, bottle_id);
        let inserted = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            INSERT INTO collection_items ({ITEM_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, bottle_id) DO NOTHING
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.id)
        .bind(item.user_id)
        .bind(item.bottle_id)
        .bind(i16::from(item.fill_percentage))
        .bind(item.count_owned as i16)
        .bind(&item.notes)
        .bind(item.added_at)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::DuplicateEntry("Bottle in collection".to_string()))?;

        tracing::debug!(user_id = %user_id, bottle_id = %bottle_id, "Bottle added to collection");
        Ok(inserted.into())
    }

    /// Edit fill level, count, or notes. Numbers are clamped; long notes are rejected.
    pub async fn update(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        edit: &CollectionEdit,
    ) -> AppResult<CollectionItem> {
        let mut item = self.get_item(user_id, item_id).await?;
        item.apply(edit).map_err(|m| AppError::field("notes", m))?;

        sqlx::query(
            r#"
            UPDATE collection_items
            SET fill_percentage = $3, count_owned = $4, notes = $5
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(item.id)
        .bind(user_id)
        .bind(i16::from(item.fill_percentage))
        .bind(item.count_owned as i16)
        .bind(&item.notes)
        .execute(&self.db)
        .await?;

        Ok(item)
    }

    pub async fn remove(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM collection_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Collection item".to_string()));
        }
        Ok(())
    }

    /// Bottles the user owns, in name order
    pub async fn owned_bottles(&self, user_id: Uuid) -> AppResult<Vec<Bottle>> {
        let rows = sqlx::query_as::<_, SpiritRow>(&format!(
            r#"
            SELECT {SPIRIT_COLUMNS}
            FROM collection_items c
            JOIN spirits s ON s.id = c.bottle_id
            WHERE c.user_id = $1
            ORDER BY s.name ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Bottle::from).collect())
    }

    /// A bottle from the user's bar; only owned bottles can be tasted
    pub async fn owned_bottle(&self, user_id: Uuid, bottle_id: Uuid) -> AppResult<Bottle> {
        sqlx::query_as::<_, SpiritRow>(&format!(
            r#"
            SELECT {SPIRIT_COLUMNS}
            FROM collection_items c
            JOIN spirits s ON s.id = c.bottle_id
            WHERE c.user_id = $1 AND c.bottle_id = $2
            "#
        ))
        .bind(user_id)
        .bind(bottle_id)
        .fetch_optional(&self.db)
        .await?
        .map(Bottle::from)
        .ok_or_else(|| AppError::NotFound("Bottle in collection".to_string()))
    }

    pub async fn count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM collection_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn get_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<CollectionItem> {
        sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM collection_items WHERE id = $1 AND user_id = $2"
        ))
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .map(CollectionItem::from)
        .ok_or_else(|| AppError::NotFound("Collection item".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_columns_are_clamped_on_read() {
        let row = CollectionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            bottle_id: Uuid::new_v4(),
            fill_percentage: 140,
            count_owned: -3,
            notes: String::new(),
            added_at: Utc::now(),
        };
        let item = CollectionItem::from(row);
        assert_eq!(item.fill_percentage, 100);
        assert_eq!(item.count_owned, 0);
    }
}
