//! Blind tasting service
//!
//! Each user has at most one tasting in progress, held in server memory in
//! [`ActiveTastings`]. Finished tastings are written to the `tastings` table
//! and removed from memory only once the write succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{CollectionService, RatingService};
use shared::{
    Bottle, CompletedTasting, PaginatedResponse, Pagination, RevealEngine, RevealReport,
    Section, Slot, TastingResult, TastingSession, TastingStep, TastingView, UserStats,
};

/// In-progress tastings keyed by user
#[derive(Clone, Default)]
pub struct ActiveTastings {
    sessions: Arc<Mutex<HashMap<Uuid, TastingSession>>>,
}

impl ActiveTastings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `session` as its user's tasting, returning any tasting it replaced
    pub async fn begin(&self, session: TastingSession) -> Option<TastingSession> {
        self.sessions.lock().await.insert(session.user_id(), session)
    }

    /// Run `f` against the user's tasting
    pub async fn with_session<T, F>(&self, user_id: Uuid, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut TastingSession) -> TastingResult<T>,
    {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&user_id).ok_or(AppError::NoActiveTasting)?;
        Ok(f(session)?)
    }

    pub async fn snapshot(&self, user_id: Uuid) -> AppResult<TastingSession> {
        self.sessions
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(AppError::NoActiveTasting)
    }

    /// Drop the user's tasting if it is still `tasting_id`
    pub async fn finish(&self, user_id: Uuid, tasting_id: Uuid) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&user_id) {
            Some(session) if session.id() == tasting_id => sessions.remove(&user_id).is_some(),
            _ => false,
        }
    }

    /// Number of tastings in progress
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// One line in the tasting history
#[derive(Debug, Clone, Serialize)]
pub struct TastingSummary {
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub bottle_count: usize,
    pub favorite: Option<Bottle>,
}

impl From<&CompletedTasting> for TastingSummary {
    fn from(tasting: &CompletedTasting) -> Self {
        Self {
            id: tasting.id,
            completed_at: tasting.completed_at,
            bottle_count: tasting.bottles.len(),
            favorite: tasting.favorite().cloned(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TastingRow {
    payload: Json<CompletedTasting>,
}

/// Tasting service
#[derive(Clone)]
pub struct TastingService {
    db: PgPool,
    active: ActiveTastings,
    engine: RevealEngine,
}

impl TastingService {
    pub fn new(db: PgPool, active: ActiveTastings, config: &Config) -> Self {
        Self {
            db,
            active,
            engine: config.tasting.reveal_engine(),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Start a tasting from a bottle in the user's bar. Replaces any tasting in progress.
    pub async fn start(&self, user_id: Uuid, bottle_id: Uuid) -> AppResult<TastingView> {
        let bottle = self.collection().owned_bottle(user_id, bottle_id).await?;
        let session = TastingSession::start(user_id, bottle);
        let view = session.view();

        if let Some(previous) = self.active.begin(session).await {
            tracing::info!(
                user_id = %user_id,
                tasting_id = %previous.id(),
                step = %previous.step(),
                "Abandoned unfinished tasting"
            );
        }
        tracing::info!(user_id = %user_id, tasting_id = %view.id, "Tasting started");
        Ok(view)
    }

    pub async fn current(&self, user_id: Uuid) -> AppResult<TastingView> {
        Ok(self.active.snapshot(user_id).await?.view())
    }

    pub async fn add_bottle(&self, user_id: Uuid, bottle_id: Uuid) -> AppResult<TastingView> {
        let bottle = self.collection().owned_bottle(user_id, bottle_id).await?;
        self.mutate(user_id, |s| s.add_bottle(bottle)).await
    }

    pub async fn remove_bottle(&self, user_id: Uuid, bottle_id: Uuid) -> AppResult<TastingView> {
        self.mutate(user_id, |s| s.remove_bottle(bottle_id).map(|_| ()))
            .await
    }

    /// Owned bottles that could still be added to the tasting
    pub async fn candidates(&self, user_id: Uuid) -> AppResult<Vec<Bottle>> {
        let session = self.active.snapshot(user_id).await?;
        let owned = self.collection().owned_bottles(user_id).await?;
        Ok(session.candidates(&owned).into_iter().cloned().collect())
    }

    pub async fn proceed_to_pourer(&self, user_id: Uuid) -> AppResult<TastingView> {
        let view = self.mutate(user_id, |s| s.proceed_to_pourer()).await?;
        tracing::info!(user_id = %user_id, bottles = view.selected_bottles.len(), "Pouring started");
        Ok(view)
    }

    // =========================================================================
    // Pourer
    // =========================================================================

    pub async fn assign(&self, user_id: Uuid, bottle_id: Uuid, slot: Slot) -> AppResult<TastingView> {
        self.mutate(user_id, |s| s.assign(bottle_id, slot)).await
    }

    pub async fn randomize(&self, user_id: Uuid) -> AppResult<TastingView> {
        self.mutate(user_id, |s| s.randomize(&mut rand::thread_rng()))
            .await
    }

    pub async fn proceed_to_taster(&self, user_id: Uuid) -> AppResult<TastingView> {
        let view = self.mutate(user_id, |s| s.proceed_to_taster()).await?;
        tracing::info!(user_id = %user_id, tasting_id = %view.id, "Blind tasting started");
        Ok(view)
    }

    // =========================================================================
    // Taster
    // =========================================================================

    pub async fn add_tag(
        &self,
        user_id: Uuid,
        slot: Slot,
        section: Section,
        tag: &str,
    ) -> AppResult<TastingView> {
        let (added, view) = self
            .active
            .with_session(user_id, |s| Ok((s.add_tag(slot, section, tag)?, s.view())))
            .await?;
        tracing::debug!(user_id = %user_id, %slot, %section, tag, added, "Tag added");
        Ok(view)
    }

    pub async fn remove_tag(
        &self,
        user_id: Uuid,
        slot: Slot,
        section: Section,
        tag: &str,
    ) -> AppResult<TastingView> {
        self.mutate(user_id, |s| s.remove_tag(slot, section, tag).map(|_| ()))
            .await
    }

    pub async fn set_custom_note(
        &self,
        user_id: Uuid,
        slot: Slot,
        section: Section,
        text: &str,
    ) -> AppResult<TastingView> {
        self.mutate(user_id, |s| s.set_custom_note(slot, section, text))
            .await
    }

    pub async fn update_ranking(
        &self,
        user_id: Uuid,
        controls: &[Option<Slot>],
    ) -> AppResult<TastingView> {
        self.mutate(user_id, |s| s.update_ranking(controls)).await
    }

    /// Lock in the ranking and unmask the bottles
    pub async fn proceed_to_reveal(&self, user_id: Uuid) -> AppResult<RevealReport> {
        let session = self
            .active
            .with_session(user_id, |s| {
                s.proceed_to_reveal()?;
                Ok(s.clone())
            })
            .await?;
        tracing::info!(user_id = %user_id, tasting_id = %session.id(), "Tasting revealed");
        self.report(&session).await
    }

    // =========================================================================
    // Reveal
    // =========================================================================

    /// The reveal report for a tasting already in the reveal step
    pub async fn reveal(&self, user_id: Uuid) -> AppResult<RevealReport> {
        let session = self.active.snapshot(user_id).await?;
        self.report(&session).await
    }

    /// Persist the finished tasting. On failure the tasting stays in memory and
    /// saving again writes the same record.
    pub async fn save(&self, user_id: Uuid) -> AppResult<CompletedTasting> {
        let record = self
            .active
            .with_session(user_id, |s| s.complete(Utc::now()))
            .await?;

        let saved = sqlx::query(
            r#"
            INSERT INTO tastings (id, user_id, created_at, completed_at, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.completed_at)
        .bind(Json(&record))
        .execute(&self.db)
        .await;

        if let Err(e) = saved {
            tracing::warn!(user_id = %user_id, tasting_id = %record.id, "Saving tasting failed, kept for retry");
            return Err(e.into());
        }

        self.active.finish(user_id, record.id).await;
        tracing::info!(user_id = %user_id, tasting_id = %record.id, "Tasting saved");
        Ok(record)
    }

    // =========================================================================
    // History
    // =========================================================================

    pub async fn history(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<TastingSummary>> {
        let rows = sqlx::query_as::<_, TastingRow>(
            r#"
            SELECT payload FROM tastings
            WHERE user_id = $1
            ORDER BY completed_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = self.count(user_id).await?;

        Ok(PaginatedResponse {
            results: rows
                .iter()
                .map(|row| TastingSummary::from(&row.payload.0))
                .collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    pub async fn get(&self, user_id: Uuid, tasting_id: Uuid) -> AppResult<CompletedTasting> {
        sqlx::query_as::<_, TastingRow>(
            "SELECT payload FROM tastings WHERE id = $1 AND user_id = $2",
        )
        .bind(tasting_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .map(|row| row.payload.0)
        .ok_or_else(|| AppError::NotFound("Tasting".to_string()))
    }

    pub async fn stats(&self, user_id: Uuid) -> AppResult<UserStats> {
        Ok(UserStats {
            bottles_in_bar: self.collection().count(user_id).await?,
            total_tastings: self.count(user_id).await?,
        })
    }

    async fn count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tastings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn report(&self, session: &TastingSession) -> AppResult<RevealReport> {
        if session.step() != TastingStep::Reveal {
            return Err(AppError::Tasting(shared::TastingError::WrongStep {
                action: "build the reveal",
                current: session.step(),
            }));
        }

        let ids: Vec<Uuid> = session.selected_bottles().iter().map(|b| b.id).collect();
        let ratings = RatingService::new(self.db.clone())
            .ratings_for(session.user_id(), &ids)
            .await?;

        let report = self.engine.reveal(session, &ratings)?;
        if let Some(upset) = &report.upset {
            tracing::debug!(
                tasting_id = %session.id(),
                bottle_id = %upset.bottle_id,
                margin = upset.margin,
                "Upset detected"
            );
        }
        Ok(report)
    }

    async fn mutate<F>(&self, user_id: Uuid, f: F) -> AppResult<TastingView>
    where
        F: FnOnce(&mut TastingSession) -> TastingResult<()>,
    {
        self.active
            .with_session(user_id, |s| {
                f(s)?;
                Ok(s.view())
            })
            .await
    }

    fn collection(&self) -> CollectionService {
        CollectionService::new(self.db.clone())
    }
}
