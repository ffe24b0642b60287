//! End-of-tasting reveal
//!
//! Slots are unmasked in descending label order (E first, A last) regardless
//! of rank. The report then lists the personal ranking (rank 1 first), the
//! community ranking (highest percentile first), and flags an upset when the
//! user's favorite sits far above its community standing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Rank, RankingScorer, Slot, Standing, TastingError, TastingResult, TastingSession, TastingStep};
use crate::models::Bottle;

/// Percentile points a favorite must exceed its community standing by
pub const DEFAULT_UPSET_THRESHOLD: f64 = 10.0;

/// Delay between two slot reveals
pub const DEFAULT_STEP_DELAY_MS: u64 = 300;

/// Extra delay before scores appear once the last slot is revealed
pub const DEFAULT_SCORES_DELAY_MS: u64 = 500;

/// Raw ratings for one bottle, as supplied by the rating service
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BottleRatings {
    pub user_elo: Option<f64>,
    pub global_elo: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct RevealEngine {
    scorer: RankingScorer,
    upset_threshold: f64,
    step_delay_ms: u64,
    scores_delay_ms: u64,
}

impl Default for RevealEngine {
    fn default() -> Self {
        Self {
            scorer: RankingScorer::default(),
            upset_threshold: DEFAULT_UPSET_THRESHOLD,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            scores_delay_ms: DEFAULT_SCORES_DELAY_MS,
        }
    }
}

impl RevealEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upset_threshold(mut self, threshold: f64) -> Self {
        self.upset_threshold = threshold;
        self
    }

    pub fn with_pacing(mut self, step_delay_ms: u64, scores_delay_ms: u64) -> Self {
        self.step_delay_ms = step_delay_ms;
        self.scores_delay_ms = scores_delay_ms;
        self
    }

    pub fn with_scorer(mut self, scorer: RankingScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn upset_threshold(&self) -> f64 {
        self.upset_threshold
    }

    /// Occupied slots in the order they are unmasked (E..A)
    pub fn reveal_order(session: &TastingSession) -> Vec<Slot> {
        let mut slots: Vec<Slot> = session.slot_assignment().occupied().collect();
        slots.sort_unstable_by(|a, b| b.cmp(a));
        slots
    }

    /// Build the reveal report for a session that reached the reveal step.
    ///
    /// Bottles missing from `ratings` are treated as unrated.
    pub fn reveal(
        &self,
        session: &TastingSession,
        ratings: &HashMap<Uuid, BottleRatings>,
    ) -> TastingResult<RevealReport> {
        if session.step() != TastingStep::Reveal {
            return Err(TastingError::WrongStep {
                action: "build the reveal",
                current: session.step(),
            });
        }

        let mut entries = Vec::with_capacity(session.bottle_count());
        for slot in Self::reveal_order(session) {
            let bottle = session
                .bottle_in(slot)
                .ok_or(TastingError::UnassignedSlot(slot))?;
            let rating = ratings.get(&bottle.id).copied().unwrap_or_default();
            entries.push((
                slot,
                bottle,
                session.ranks().get(&slot).copied(),
                self.scorer.standing(rating.user_elo),
                self.scorer.standing(rating.global_elo),
            ));
        }

        let sequence: Vec<RevealedSlot> = entries
            .iter()
            .enumerate()
            .map(|(i, (slot, bottle, rank, _, _))| RevealedSlot {
                slot: *slot,
                bottle: (*bottle).clone(),
                rank: *rank,
                rank_label: rank_label(*rank).to_string(),
                reveal_at_ms: i as u64 * self.step_delay_ms,
            })
            .collect();

        let mut personal: Vec<PersonalScore> = entries
            .iter()
            .filter_map(|(slot, bottle, rank, personal, _)| {
                rank.map(|rank| PersonalScore {
                    rank,
                    rank_label: rank_label(Some(rank)).to_string(),
                    slot: *slot,
                    bottle_id: bottle.id,
                    bottle_name: bottle.name.clone(),
                    standing: *personal,
                })
            })
            .collect();
        personal.sort_by_key(|p| p.rank);

        let mut global: Vec<GlobalScore> = entries
            .iter()
            .map(|(slot, bottle, _, _, global)| GlobalScore {
                slot: *slot,
                bottle_id: bottle.id,
                bottle_name: bottle.name.clone(),
                standing: *global,
            })
            .collect();
        global.sort_by(|a, b| b.standing.percentile.total_cmp(&a.standing.percentile));

        let upset = personal.first().and_then(|top| {
            let global = global.iter().find(|g| g.bottle_id == top.bottle_id)?;
            self.detect_upset(top, global.standing)
        });

        Ok(RevealReport {
            tasting_id: session.id(),
            scores_at_ms: sequence.len() as u64 * self.step_delay_ms + self.scores_delay_ms,
            sequence,
            personal,
            global,
            upset,
        })
    }

    /// Both standings must come from real ratings; the unrated midpoint never counts
    fn detect_upset(&self, top: &PersonalScore, global: Standing) -> Option<Upset> {
        if !(top.standing.rated && global.rated) {
            return None;
        }
        let personal = top.standing.percentile;
        if personal > global.percentile + self.upset_threshold {
            Some(Upset {
                slot: top.slot,
                bottle_id: top.bottle_id,
                bottle_name: top.bottle_name.clone(),
                personal_percentile: personal,
                global_percentile: global.percentile,
                margin: personal - global.percentile,
            })
        } else {
            None
        }
    }
}

/// Ordinal label for a rank
pub fn rank_label(rank: Option<Rank>) -> &'static str {
    match rank {
        Some(1) => "1st",
        Some(2) => "2nd",
        Some(3) => "3rd",
        Some(4) => "4th",
        Some(5) => "5th",
        _ => "Unranked",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevealReport {
    pub tasting_id: Uuid,
    /// Slots in unmasking order
    pub sequence: Vec<RevealedSlot>,
    /// When the score panels appear, relative to the first reveal
    pub scores_at_ms: u64,
    /// Sorted by rank, best first
    pub personal: Vec<PersonalScore>,
    /// Sorted by community percentile, highest first
    pub global: Vec<GlobalScore>,
    pub upset: Option<Upset>,
}

impl RevealReport {
    pub fn is_upset(&self) -> bool {
        self.upset.is_some()
    }

    /// The user's favorite bottle
    pub fn personal_top(&self) -> Option<&PersonalScore> {
        self.personal.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevealedSlot {
    pub slot: Slot,
    pub bottle: Bottle,
    pub rank: Option<Rank>,
    pub rank_label: String,
    pub reveal_at_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalScore {
    pub rank: Rank,
    pub rank_label: String,
    pub slot: Slot,
    pub bottle_id: Uuid,
    pub bottle_name: String,
    pub standing: Standing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalScore {
    pub slot: Slot,
    pub bottle_id: Uuid,
    pub bottle_name: String,
    pub standing: Standing,
}

/// The favorite was rated well above community consensus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Upset {
    pub slot: Slot,
    pub bottle_id: Uuid,
    pub bottle_name: String,
    pub personal_percentile: f64,
    pub global_percentile: f64,
    pub margin: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApprovalStatus, BottleType};

    fn bottle(name: &str) -> Bottle {
        Bottle {
            id: Uuid::new_v4(),
            name: name.to_string(),
            distillery: "Test".to_string(),
            bottle_type: BottleType::Bourbon,
            status: ApprovalStatus::Approved,
            images: vec![],
            barcode: None,
        }
    }

    /// Three bottles poured A=B2, B=B3, C=B1 and ranked A, B, C
    fn revealed() -> (TastingSession, [Bottle; 3]) {
        let bottles = [bottle("B1"), bottle("B2"), bottle("B3")];
        let mut session = TastingSession::start(Uuid::new_v4(), bottles[0].clone());
        session.add_bottle(bottles[1].clone()).unwrap();
        session.add_bottle(bottles[2].clone()).unwrap();
        session.proceed_to_pourer().unwrap();
        session.assign(bottles[1].id, Slot::A).unwrap();
        session.assign(bottles[2].id, Slot::B).unwrap();
        session.assign(bottles[0].id, Slot::C).unwrap();
        session.proceed_to_taster().unwrap();
        session
            .update_ranking(&[Some(Slot::A), Some(Slot::B), Some(Slot::C)])
            .unwrap();
        session.proceed_to_reveal().unwrap();
        (session, bottles)
    }

    fn ratings(entries: &[(Uuid, Option<f64>, Option<f64>)]) -> HashMap<Uuid, BottleRatings> {
        entries
            .iter()
            .map(|(id, user_elo, global_elo)| {
                (
                    *id,
                    BottleRatings {
                        user_elo: *user_elo,
                        global_elo: *global_elo,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_reveal_requires_reveal_step() {
        let bottles = [bottle("X"), bottle("Y")];
        let mut session = TastingSession::start(Uuid::new_v4(), bottles[0].clone());
        session.add_bottle(bottles[1].clone()).unwrap();
        let err = RevealEngine::new()
            .reveal(&session, &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, TastingError::WrongStep { .. }));
    }

    #[test]
    fn test_reveal_order_is_descending_labels() {
        let (session, _) = revealed();
        assert_eq!(
            RevealEngine::reveal_order(&session),
            vec![Slot::C, Slot::B, Slot::A]
        );
    }

    #[test]
    fn test_sequence_pacing() {
        let (session, bottles) = revealed();
        let report = RevealEngine::new().reveal(&session, &HashMap::new()).unwrap();
        let at: Vec<u64> = report.sequence.iter().map(|s| s.reveal_at_ms).collect();
        assert_eq!(at, vec![0, 300, 600]);
        assert_eq!(report.scores_at_ms, 3 * 300 + 500);
        assert_eq!(report.sequence[0].bottle.id, bottles[0].id);
        assert_eq!(report.sequence[0].rank_label, "3rd");
    }

    #[test]
    fn test_personal_sorted_by_rank() {
        let (session, bottles) = revealed();
        let report = RevealEngine::new().reveal(&session, &HashMap::new()).unwrap();
        let order: Vec<Uuid> = report.personal.iter().map(|p| p.bottle_id).collect();
        assert_eq!(order, vec![bottles[1].id, bottles[2].id, bottles[0].id]);
        assert_eq!(report.personal_top().unwrap().rank_label, "1st");
    }

    #[test]
    fn test_global_sorted_by_percentile_desc() {
        let (session, bottles) = revealed();
        let ratings = ratings(&[
            (bottles[0].id, None, Some(1800.0)),
            (bottles[1].id, None, Some(1200.0)),
            (bottles[2].id, None, Some(1600.0)),
        ]);
        let report = RevealEngine::new().reveal(&session, &ratings).unwrap();
        let order: Vec<Uuid> = report.global.iter().map(|g| g.bottle_id).collect();
        assert_eq!(order, vec![bottles[0].id, bottles[2].id, bottles[1].id]);
    }

    #[test]
    fn test_upset_detected_for_favorite() {
        let (session, bottles) = revealed();
        // B2 is in slot A and ranked first: 90 personal vs 40 community
        let ratings = ratings(&[(bottles[1].id, Some(1900.0), Some(1400.0))]);
        let report = RevealEngine::new().reveal(&session, &ratings).unwrap();

        assert_eq!(report.personal_top().unwrap().bottle_id, bottles[1].id);
        let upset = report.upset.expect("upset expected");
        assert_eq!(upset.bottle_id, bottles[1].id);
        assert_eq!(upset.slot, Slot::A);
        assert!((upset.margin - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_upset_within_threshold() {
        let (session, bottles) = revealed();
        let ratings = ratings(&[(bottles[1].id, Some(1600.0), Some(1500.0))]);
        let report = RevealEngine::new().reveal(&session, &ratings).unwrap();
        assert!(!report.is_upset());
    }

    #[test]
    fn test_only_favorite_checked() {
        let (session, bottles) = revealed();
        // Second-ranked bottle is wildly overrated, favorite is not
        let ratings = ratings(&[
            (bottles[1].id, Some(1500.0), Some(1500.0)),
            (bottles[2].id, Some(2000.0), Some(1000.0)),
        ]);
        let report = RevealEngine::new().reveal(&session, &ratings).unwrap();
        assert!(report.upset.is_none());
    }

    #[test]
    fn test_threshold_is_overridable() {
        let (session, bottles) = revealed();
        let ratings = ratings(&[(bottles[1].id, Some(1600.0), Some(1500.0))]);
        let report = RevealEngine::new()
            .with_upset_threshold(5.0)
            .reveal(&session, &ratings)
            .unwrap();
        assert!(report.is_upset());
    }

    #[test]
    fn test_unrated_bottles_use_default_and_are_flagged() {
        let (session, _) = revealed();
        let report = RevealEngine::new().reveal(&session, &HashMap::new()).unwrap();
        for score in &report.global {
            assert_eq!(score.standing, Standing::unrated());
        }
        assert!(!report.personal[0].standing.rated);
        assert!(report.upset.is_none());
    }

    #[test]
    fn test_rank_labels() {
        assert_eq!(rank_label(Some(1)), "1st");
        assert_eq!(rank_label(Some(5)), "5th");
        assert_eq!(rank_label(Some(6)), "Unranked");
        assert_eq!(rank_label(None), "Unranked");
    }
}
