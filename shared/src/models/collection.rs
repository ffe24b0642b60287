//! "My Bar" collection models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound for the number of bottles owned
pub const MAX_COUNT_OWNED: u16 = 999;

/// Maximum length of collection notes, in characters
pub const MAX_COLLECTION_NOTES_LEN: usize = 250;

/// A bottle owned by a user. One per (user, bottle) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bottle_id: Uuid,
    /// How full the bottle is, 0-100
    pub fill_percentage: u8,
    /// Number of bottles owned, 0-999
    pub count_owned: u16,
    pub notes: String,
    pub added_at: DateTime<Utc>,
}

impl CollectionItem {
    /// A freshly added bottle: full, one owned, no notes
    pub fn new(user_id: Uuid, bottle_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            bottle_id,
            fill_percentage: 100,
            count_owned: 1,
            notes: String::new(),
            added_at: Utc::now(),
        }
    }

    /// Apply an edit, clamping numeric fields into range
    pub fn apply(&mut self, edit: &CollectionEdit) -> Result<(), &'static str> {
        if let Some(notes) = &edit.notes {
            crate::validation::validate_collection_notes(notes)?;
            self.notes = notes.clone();
        }
        if let Some(fill) = edit.fill_percentage {
            self.fill_percentage = clamp_fill_percentage(fill);
        }
        if let Some(count) = edit.count_owned {
            self.count_owned = clamp_count_owned(count);
        }
        Ok(())
    }
}

/// Partial update of a collection item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionEdit {
    pub fill_percentage: Option<i32>,
    pub count_owned: Option<i32>,
    pub notes: Option<String>,
}

/// Clamp a fill level into 0-100
pub fn clamp_fill_percentage(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

/// Clamp a bottle count into 0-999
pub fn clamp_count_owned(value: i32) -> u16 {
    value.clamp(0, MAX_COUNT_OWNED as i32) as u16
}
