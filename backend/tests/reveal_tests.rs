//! Reveal and scoring tests
//!
//! Property-based and unit tests for:
//! - Elo to percentile conversion
//! - Staged reveal pacing
//! - Upset detection against community ratings

use std::collections::HashMap;

use proptest::prelude::*;
use shared::{
    percentile, rank_label, ApprovalStatus, Bottle, BottleRatings, BottleType, RankingScorer,
    RevealEngine, Slot, TastingSession, DEFAULT_SCORES_DELAY_MS, DEFAULT_STEP_DELAY_MS, MAX_ELO,
    MIN_ELO, UNRATED_PERCENTILE,
};
use uuid::Uuid;

fn bottle(name: &str, bottle_type: BottleType) -> Bottle {
    Bottle {
        id: Uuid::new_v4(),
        name: name.to_string(),
        distillery: "Test Distillery".to_string(),
        bottle_type,
        status: ApprovalStatus::Approved,
        images: vec![],
        barcode: None,
    }
}

/// A revealed tasting of `n` bottles poured A.. in order and ranked A=1st, B=2nd, ...
fn revealed(n: usize) -> TastingSession {
    let mut session = TastingSession::start(Uuid::new_v4(), bottle("Bottle 1", BottleType::Bourbon));
    for i in 2..=n {
        session
            .add_bottle(bottle(&format!("Bottle {}", i), BottleType::Rye))
            .unwrap();
    }
    session.proceed_to_pourer().unwrap();
    let ids: Vec<Uuid> = session.selected_bottles().iter().map(|b| b.id).collect();
    for (id, slot) in ids.iter().zip(Slot::first(n)) {
        session.assign(*id, *slot).unwrap();
    }
    session.proceed_to_taster().unwrap();
    let controls: Vec<Option<Slot>> = Slot::first(n).iter().copied().map(Some).collect();
    session.update_ranking(&controls).unwrap();
    session.proceed_to_reveal().unwrap();
    session
}

fn top_bottle(session: &TastingSession) -> Uuid {
    session.bottle_in(Slot::A).map(|b| b.id).unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_percentile_in_range(elo in -10_000.0f64..10_000.0) {
        let p = percentile(elo);
        prop_assert!((0.0..=100.0).contains(&p));
    }

    #[test]
    fn prop_percentile_monotonic(a in 0.0f64..3000.0, b in 0.0f64..3000.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(percentile(lo) <= percentile(hi));
    }

    #[test]
    fn prop_reveal_covers_every_slot_once(n in 2usize..=5) {
        let session = revealed(n);
        let report = RevealEngine::new().reveal(&session, &HashMap::new()).unwrap();

        prop_assert_eq!(report.sequence.len(), n);
        prop_assert_eq!(report.personal.len(), n);
        prop_assert_eq!(report.global.len(), n);
        for (i, revealed) in report.sequence.iter().enumerate() {
            prop_assert_eq!(revealed.reveal_at_ms, i as u64 * DEFAULT_STEP_DELAY_MS);
        }
        prop_assert_eq!(
            report.scores_at_ms,
            n as u64 * DEFAULT_STEP_DELAY_MS + DEFAULT_SCORES_DELAY_MS
        );
    }

    #[test]
    fn prop_no_upset_without_margin(user in MIN_ELO..MAX_ELO, spread in 0.0f64..99.0) {
        // A favorite at most 10 points above consensus is not an upset
        let session = revealed(2);
        let global = user - spread;
        let ratings = HashMap::from([(
            top_bottle(&session),
            BottleRatings { user_elo: Some(user), global_elo: Some(global) },
        )]);
        let report = RevealEngine::new().reveal(&session, &ratings).unwrap();
        prop_assert!(!report.is_upset());
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_reference_percentiles() {
        assert_eq!(percentile(1000.0), 0.0);
        assert_eq!(percentile(1500.0), 50.0);
        assert_eq!(percentile(2000.0), 100.0);
        assert_eq!(percentile(500.0), 0.0);
        assert_eq!(percentile(2500.0), 100.0);
    }

    #[test]
    fn test_unrated_bottles_sit_at_midpoint() {
        let standing = RankingScorer::default().standing(None);
        assert_eq!(standing.percentile, UNRATED_PERCENTILE);
        assert!(!standing.rated);
    }

    #[test]
    fn test_reveal_runs_from_last_slot_to_first() {
        let session = revealed(4);
        let report = RevealEngine::new().reveal(&session, &HashMap::new()).unwrap();
        let order: Vec<Slot> = report.sequence.iter().map(|s| s.slot).collect();
        assert_eq!(order, vec![Slot::D, Slot::C, Slot::B, Slot::A]);
    }

    #[test]
    fn test_rank_labels() {
        assert_eq!(rank_label(Some(1)), "1st");
        assert_eq!(rank_label(Some(2)), "2nd");
        assert_eq!(rank_label(Some(3)), "3rd");
        assert_eq!(rank_label(Some(5)), "5th");
        assert_eq!(rank_label(None), "Unranked");
    }

    #[test]
    fn test_upset_requires_strictly_more_than_threshold() {
        let session = revealed(2);
        let top = top_bottle(&session);

        // 60th vs 50th percentile: exactly 10 points, not an upset
        let even = HashMap::from([(
            top,
            BottleRatings {
                user_elo: Some(1600.0),
                global_elo: Some(1500.0),
            },
        )]);
        assert!(!RevealEngine::new().reveal(&session, &even).unwrap().is_upset());

        let wide = HashMap::from([(
            top,
            BottleRatings {
                user_elo: Some(1700.0),
                global_elo: Some(1500.0),
            },
        )]);
        assert!(RevealEngine::new().reveal(&session, &wide).unwrap().is_upset());
    }

    #[test]
    fn test_custom_threshold_changes_verdict() {
        let session = revealed(2);
        let ratings = HashMap::from([(
            top_bottle(&session),
            BottleRatings {
                user_elo: Some(1700.0),
                global_elo: Some(1500.0),
            },
        )]);
        let strict = RevealEngine::new().with_upset_threshold(25.0);
        assert!(!strict.reveal(&session, &ratings).unwrap().is_upset());
    }

    #[test]
    fn test_unrated_favorite_is_not_an_upset() {
        let session = revealed(3);
        let report = RevealEngine::new().reveal(&session, &HashMap::new()).unwrap();
        assert!(report.upset.is_none());
        let top = report.personal_top().unwrap();
        assert_eq!(top.rank, 1);
        assert!(!top.standing.rated);
    }

    #[test]
    fn test_unrated_favorite_against_low_consensus_is_not_an_upset() {
        let session = revealed(2);
        let ratings = HashMap::from([(
            top_bottle(&session),
            BottleRatings {
                user_elo: None,
                global_elo: Some(1200.0),
            },
        )]);
        let report = RevealEngine::new().reveal(&session, &ratings).unwrap();
        assert!(report.upset.is_none());
        assert!(!report.personal_top().unwrap().standing.rated);
    }

    #[test]
    fn test_rated_favorite_against_unrated_consensus_is_not_an_upset() {
        let session = revealed(2);
        let ratings = HashMap::from([(
            top_bottle(&session),
            BottleRatings {
                user_elo: Some(2000.0),
                global_elo: None,
            },
        )]);
        assert!(!RevealEngine::new().reveal(&session, &ratings).unwrap().is_upset());
    }
}
