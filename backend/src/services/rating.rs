//! Rating lookups: personal and community Elo per bottle

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{BottleRankings, BottleRatings, RankingScorer};

/// Rating service
#[derive(Clone)]
pub struct RatingService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    bottle_id: Uuid,
    user_elo: Option<f64>,
    global_elo: Option<f64>,
}

impl RatingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Ratings for each of `bottle_ids`. Bottles nobody has rated are absent.
    pub async fn ratings_for(
        &self,
        user_id: Uuid,
        bottle_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, BottleRatings>> {
        let rows = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT
                g.bottle_id,
                mine.elo_raw AS user_elo,
                g.global_elo
            FROM (
                SELECT bottle_id, AVG(global_elo)::FLOAT8 AS global_elo
                FROM bottle_ratings
                WHERE bottle_id = ANY($2)
                GROUP BY bottle_id
            ) g
            LEFT JOIN bottle_ratings mine
                ON mine.bottle_id = g.bottle_id AND mine.user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(bottle_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.bottle_id,
                    BottleRatings {
                        user_elo: row.user_elo,
                        global_elo: row.global_elo,
                    },
                )
            })
            .collect())
    }

    /// Ratings for a single bottle
    pub async fn ratings_of(&self, user_id: Uuid, bottle_id: Uuid) -> AppResult<BottleRatings> {
        Ok(self
            .ratings_for(user_id, &[bottle_id])
            .await?
            .remove(&bottle_id)
            .unwrap_or_default())
    }
}

/// Percentile rankings shown alongside a bottle
pub fn rankings(scorer: &RankingScorer, ratings: &BottleRatings) -> BottleRankings {
    let your = scorer.standing(ratings.user_elo);
    let global = scorer.standing(ratings.global_elo);
    BottleRankings {
        your: your.rounded(),
        global: global.rounded(),
        your_rated: your.rated,
        global_rated: global.rated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrated_bottle_ranks_at_midpoint() {
        let r = rankings(&RankingScorer::default(), &BottleRatings::default());
        assert_eq!((r.your, r.global), (50, 50));
        assert!(!r.your_rated && !r.global_rated);
    }

    #[test]
    fn test_rated_bottle_rankings() {
        let ratings = BottleRatings {
            user_elo: Some(1900.0),
            global_elo: Some(1400.0),
        };
        let r = rankings(&RankingScorer::default(), &ratings);
        assert_eq!((r.your, r.global), (90, 40));
        assert!(r.your_rated && r.global_rated);
    }
}
