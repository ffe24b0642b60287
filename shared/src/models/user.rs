//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{normalize_phone, validate_username};

/// A user account on the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_pic: Option<String>,
    pub toggles: UserToggles,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Apply a profile edit. On failure the account is left unchanged and
    /// the offending field is returned with the message.
    pub fn apply(&mut self, edit: &ProfileEdit) -> Result<(), (&'static str, &'static str)> {
        let mut updated = self.clone();
        if let Some(username) = &edit.username {
            let username = username.trim();
            validate_username(username).map_err(|m| ("username", m))?;
            updated.username = username.to_string();
        }
        if let Some(phone) = &edit.phone {
            updated.phone = normalize_phone(phone).map_err(|m| ("phone", m))?;
        }
        if let Some(pic) = &edit.profile_pic {
            let pic = pic.trim();
            updated.profile_pic = (!pic.is_empty()).then(|| pic.to_string());
        }
        if let Some(toggles) = edit.toggles {
            updated.toggles = toggles;
        }
        *self = updated;
        Ok(())
    }
}

/// Partial update of the signed-in user's profile. The email cannot change.
///
/// A blank `phone` or `profile_pic` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEdit {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub profile_pic: Option<String>,
    pub toggles: Option<UserToggles>,
}

/// Per-account preferences chosen at signup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserToggles {
    #[serde(default)]
    pub add_to_home: bool,
    #[serde(default)]
    pub stay_logged_in: bool,
}

/// Profile statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserStats {
    pub bottles_in_bar: i64,
    pub total_tastings: i64,
}
