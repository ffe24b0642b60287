//! Bottle catalog models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bottle in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bottle {
    pub id: Uuid,
    pub name: String,
    pub distillery: String,
    #[serde(rename = "type")]
    pub bottle_type: BottleType,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub images: Vec<String>,
    pub barcode: Option<String>,
}

impl Bottle {
    /// Icon shown next to the bottle in lists
    pub fn emoji(&self) -> &'static str {
        self.bottle_type.emoji()
    }

    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }
}

/// Whisky style. Anything outside the known styles is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum BottleType {
    Blended,
    Bourbon,
    SingleMalt,
    Rye,
    Other(String),
}

impl BottleType {
    pub fn label(&self) -> &str {
        match self {
            BottleType::Blended => "Blended",
            BottleType::Bourbon => "Bourbon",
            BottleType::SingleMalt => "Single Malt",
            BottleType::Rye => "Rye",
            BottleType::Other(custom) => custom,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            BottleType::Rye => "🌾",
            BottleType::Other(_) => "🍺",
            _ => "🥃",
        }
    }
}

impl From<String> for BottleType {
    fn from(value: String) -> Self {
        match value.trim() {
            "Blended" => BottleType::Blended,
            "Bourbon" => BottleType::Bourbon,
            "Single Malt" => BottleType::SingleMalt,
            "Rye" => BottleType::Rye,
            other => BottleType::Other(other.to_string()),
        }
    }
}

impl From<&str> for BottleType {
    fn from(value: &str) -> Self {
        BottleType::from(value.to_string())
    }
}

impl From<BottleType> for String {
    fn from(value: BottleType) -> Self {
        value.label().to_string()
    }
}

impl std::fmt::Display for BottleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Moderation state of a user-submitted bottle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            _ => None,
        }
    }
}

/// Percentile standing of a bottle for the viewing user and the community
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BottleRankings {
    /// Personal percentile, 50 when the user has not rated the bottle
    pub your: u8,
    /// Community percentile, 50 when nobody has rated the bottle
    pub global: u8,
    pub your_rated: bool,
    pub global_rated: bool,
}

/// Bottle with rankings, as shown on the details screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleDetails {
    #[serde(flatten)]
    pub bottle: Bottle,
    pub emoji: String,
    pub rankings: BottleRankings,
}

/// A bottle reported as a likely duplicate of a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub id: Uuid,
    pub name: String,
    pub distillery: String,
    pub similarity: f32,
}
