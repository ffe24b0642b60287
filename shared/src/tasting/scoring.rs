//! Elo to percentile conversion

use serde::{Deserialize, Serialize};

/// Bottom of the reference window; maps to 0
pub const MIN_ELO: f64 = 1000.0;

/// Top of the reference window; maps to 100
pub const MAX_ELO: f64 = 2000.0;

/// Percentile shown for a bottle with no rating data.
///
/// This is a deliberate "average" default, not a measured value. Callers keep
/// the `rated` flag on [`Standing`] so the two cases stay distinguishable.
pub const UNRATED_PERCENTILE: f64 = 50.0;

/// Converts raw Elo-style ratings into a 0-100 display scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingScorer {
    min_elo: f64,
    max_elo: f64,
}

impl Default for RankingScorer {
    fn default() -> Self {
        Self {
            min_elo: MIN_ELO,
            max_elo: MAX_ELO,
        }
    }
}

impl RankingScorer {
    /// Custom reference window. Returns `None` unless `min_elo < max_elo`.
    pub fn with_window(min_elo: f64, max_elo: f64) -> Option<Self> {
        (min_elo.is_finite() && max_elo.is_finite() && min_elo < max_elo)
            .then_some(Self { min_elo, max_elo })
    }

    /// Linear position of `elo` in the window, clamped to [0, 100]
    pub fn percentile(&self, elo: f64) -> f64 {
        if elo.is_nan() {
            return 0.0;
        }
        let normalized = (elo - self.min_elo) / (self.max_elo - self.min_elo) * 100.0;
        normalized.clamp(0.0, 100.0)
    }

    /// Standing for an optional rating; missing data is reported as unrated
    pub fn standing(&self, elo: Option<f64>) -> Standing {
        match elo {
            Some(elo) => Standing {
                percentile: self.percentile(elo),
                rated: true,
            },
            None => Standing::unrated(),
        }
    }
}

/// Percentile with the default window
pub fn percentile(elo: f64) -> f64 {
    RankingScorer::default().percentile(elo)
}

/// Where a bottle sits on the 0-100 scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Standing {
    pub percentile: f64,
    /// False when no rating existed and [`UNRATED_PERCENTILE`] was used
    pub rated: bool,
}

impl Standing {
    pub fn unrated() -> Self {
        Self {
            percentile: UNRATED_PERCENTILE,
            rated: false,
        }
    }

    /// Whole-number percentile for display
    pub fn rounded(&self) -> u8 {
        self.percentile.round().clamp(0.0, 100.0) as u8
    }
}
