//! Bottle catalog service: search, filtering, details, and user submissions

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::rating::{rankings, RatingService};
use shared::{
    validate_barcode, validate_bottle_name, validate_bottle_type, validate_image_uri,
    ApprovalStatus, Bottle, BottleDetails, BottleRankings, BottleRatings, BottleType,
    DuplicateCandidate, PaginatedResponse, Pagination, RankingScorer, MAX_ELO, MIN_ELO,
};

/// Name + distillery similarity above which a submission is treated as a duplicate
pub const DUPLICATE_SIMILARITY: f32 = 0.8;

/// Bottle catalog service
#[derive(Clone)]
pub struct BottleService {
    db: PgPool,
}

/// A bottle as listed in search results
#[derive(Debug, Clone, Serialize)]
pub struct BottleSummary {
    #[serde(flatten)]
    pub bottle: Bottle,
    pub emoji: String,
}

impl From<Bottle> for BottleSummary {
    fn from(bottle: Bottle) -> Self {
        let emoji = bottle.emoji().to_string();
        Self { bottle, emoji }
    }
}

/// Input for submitting a bottle to the catalog
#[derive(Debug, Deserialize)]
pub struct NewBottleInput {
    pub name: String,
    pub distillery: String,
    #[serde(rename = "type")]
    pub bottle_type: String,
    pub barcode: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Which rating a filtered listing is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSort {
    #[default]
    Your,
    Global,
}

/// Structured catalog filter. Percentile bounds are inclusive.
#[derive(Debug, Clone)]
pub struct BottleFilter {
    pub name: Option<String>,
    pub distillery: Option<String>,
    pub bottle_type: Option<String>,
    pub your_range: (f64, f64),
    pub global_range: (f64, f64),
    pub sort: RankSort,
}

impl Default for BottleFilter {
    fn default() -> Self {
        Self {
            name: None,
            distillery: None,
            bottle_type: None,
            your_range: (0.0, 100.0),
            global_range: (0.0, 100.0),
            sort: RankSort::Your,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SpiritRow {
    pub id: Uuid,
    pub name: String,
    pub distillery: String,
    #[sqlx(rename = "type")]
    pub bottle_type: String,
    pub barcode: Option<String>,
    pub images: Json<Vec<String>>,
    pub status: String,
}

impl From<SpiritRow> for Bottle {
    fn from(row: SpiritRow) -> Self {
        Bottle {
            id: row.id,
            name: row.name,
            distillery: row.distillery,
            bottle_type: BottleType::from(row.bottle_type),
            status: ApprovalStatus::parse(&row.status).unwrap_or_default(),
            images: row.images.0,
            barcode: row.barcode,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RankedSpiritRow {
    #[sqlx(flatten)]
    spirit: SpiritRow,
    user_elo: Option<f64>,
    global_elo: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct DuplicateRow {
    id: Uuid,
    name: String,
    distillery: String,
    sim: f32,
}

pub(crate) const SPIRIT_COLUMNS: &str =
    "s.id, s.name, s.distillery, s.type, s.barcode, s.images, s.status";

const SEARCH_DOCUMENT: &str =
    "to_tsvector('english', s.name || ' ' || s.distillery || ' ' || s.type)";

impl BottleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Full-text search over approved bottles, best matches first
    pub async fn search(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<BottleSummary>> {
        let rows = sqlx::query_as::<_, SpiritRow>(&format!(
            r#"
            SELECT {SPIRIT_COLUMNS}
            FROM spirits s
            WHERE {SEARCH_DOCUMENT} @@ plainto_tsquery('english', $1)
              AND s.status = 'approved'
            ORDER BY ts_rank({SEARCH_DOCUMENT}, plainto_tsquery('english', $1)) DESC, s.name ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(query)
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*)
            FROM spirits s
            WHERE {SEARCH_DOCUMENT} @@ plainto_tsquery('english', $1)
              AND s.status = 'approved'
            "#
        ))
        .bind(query)
        .fetch_one(&self.db)
        .await?;

        Ok(PaginatedResponse {
            results: rows
                .into_iter()
                .map(|row| BottleSummary::from(Bottle::from(row)))
                .collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// Structured filtering with percentile bounds. Unrated bottles always pass
    /// the rating bounds.
    pub async fn filter(
        &self,
        user_id: Uuid,
        filter: &BottleFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<BottleDetails>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(SPIRIT_COLUMNS)
            .push(", br.elo_raw AS user_elo, g.global_elo");
        push_filtered_source(&mut qb, user_id, filter);
        qb.push(match filter.sort {
            RankSort::Your => " ORDER BY br.elo_raw DESC NULLS LAST, s.name ASC",
            RankSort::Global => " ORDER BY g.global_elo DESC NULLS LAST, s.name ASC",
        });
        qb.push(" LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = qb
            .build_query_as::<RankedSpiritRow>()
            .fetch_all(&self.db)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_filtered_source(&mut count, user_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let scorer = RankingScorer::default();
        Ok(PaginatedResponse {
            results: rows
                .into_iter()
                .map(|row| {
                    let ratings = BottleRatings {
                        user_elo: row.user_elo,
                        global_elo: row.global_elo,
                    };
                    details(Bottle::from(row.spirit), rankings(&scorer, &ratings))
                })
                .collect(),
            pagination: pagination.meta(total.max(0) as u64),
        })
    }

    /// An approved bottle with the caller's and the community's standing
    pub async fn get_details(&self, id: Uuid, user_id: Uuid) -> AppResult<BottleDetails> {
        let bottle = self.get_approved(id).await?;
        let ratings = RatingService::new(self.db.clone())
            .ratings_of(user_id, id)
            .await?;

        Ok(details(bottle, rankings(&RankingScorer::default(), &ratings)))
    }

    pub async fn get_approved(&self, id: Uuid) -> AppResult<Bottle> {
        sqlx::query_as::<_, SpiritRow>(&format!(
            "SELECT {SPIRIT_COLUMNS} FROM spirits s WHERE s.id = $1 AND s.status = 'approved'"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Bottle::from)
        .ok_or_else(|| AppError::NotFound("Bottle".to_string()))
    }

    /// Submit a bottle. New bottles wait for approval; near-duplicates are rejected.
    pub async fn add(&self, input: NewBottleInput, added_by: Uuid) -> AppResult<Bottle> {
        validate_new_bottle(&input)?;

        let duplicates = sqlx::query_as::<_, DuplicateRow>(
            r#"
            SELECT id, name, distillery,
                   similarity(name || ' ' || distillery, $1 || ' ' || $2) AS sim
            FROM spirits
            WHERE similarity(name || ' ' || distillery, $1 || ' ' || $2) > $3
            ORDER BY sim DESC
            "#,
        )
        .bind(&input.name)
        .bind(&input.distillery)
        .bind(DUPLICATE_SIMILARITY)
        .fetch_all(&self.db)
        .await?;

        if !duplicates.is_empty() {
            return Err(AppError::DuplicateBottle {
                duplicates: duplicates
                    .into_iter()
                    .map(|row| DuplicateCandidate {
                        id: row.id,
                        name: row.name,
                        distillery: row.distillery,
                        similarity: row.sim,
                    })
                    .collect(),
            });
        }

        let bottle: Bottle = sqlx::query_as::<_, SpiritRow>(
            r#"
            INSERT INTO spirits (name, distillery, type, barcode, images, added_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, distillery, type, barcode, images, status
            "#,
        )
        .bind(&input.name)
        .bind(&input.distillery)
        .bind(&input.bottle_type)
        .bind(&input.barcode)
        .bind(Json(&input.images))
        .bind(added_by)
        .fetch_one(&self.db)
        .await?
        .into();

        tracing::info!(bottle_id = %bottle.id, added_by = %added_by, "Bottle submitted for approval");
        Ok(bottle)
    }
}

fn details(bottle: Bottle, rankings: BottleRankings) -> BottleDetails {
    BottleDetails {
        emoji: bottle.emoji().to_string(),
        bottle,
        rankings,
    }
}

/// `FROM ... WHERE ...` shared by the filter listing and its count
fn push_filtered_source(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &BottleFilter) {
    qb.push(
        r#"
        FROM spirits s
        LEFT JOIN (
            SELECT bottle_id, AVG(global_elo)::FLOAT8 AS global_elo
            FROM bottle_ratings
            GROUP BY bottle_id
        ) g ON g.bottle_id = s.id
        LEFT JOIN bottle_ratings br ON br.bottle_id = s.id AND br.user_id = "#,
    )
    .push_bind(user_id)
    .push(" WHERE s.status = 'approved'");

    if let Some(name) = &filter.name {
        qb.push(" AND s.name ILIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(distillery) = &filter.distillery {
        qb.push(" AND s.distillery ILIKE ")
            .push_bind(format!("%{}%", distillery));
    }
    if let Some(bottle_type) = &filter.bottle_type {
        qb.push(" AND s.type = ").push_bind(bottle_type.clone());
    }

    push_percentile_bounds(qb, "br.elo_raw", filter.your_range);
    push_percentile_bounds(qb, "g.global_elo", filter.global_range);
}

fn push_percentile_bounds(qb: &mut QueryBuilder<'_, Postgres>, column: &str, (min, max): (f64, f64)) {
    qb.push(format!(" AND ({column} IS NULL OR LEAST(100.0, GREATEST(0.0, ({column} - "))
        .push_bind(MIN_ELO)
        .push(") / ")
        .push_bind(MAX_ELO - MIN_ELO)
        .push(" * 100.0)) BETWEEN ")
        .push_bind(min)
        .push(" AND ")
        .push_bind(max)
        .push(")");
}

/// Field checks for a catalog submission
pub fn validate_new_bottle(input: &NewBottleInput) -> AppResult<()> {
    validate_bottle_name(&input.name).map_err(|m| AppError::field("name", m))?;
    validate_bottle_name(&input.distillery).map_err(|m| AppError::field("distillery", m))?;
    validate_bottle_type(&input.bottle_type).map_err(|m| AppError::field("type", m))?;
    if let Some(barcode) = &input.barcode {
        validate_barcode(barcode).map_err(|m| AppError::field("barcode", m))?;
    }
    for uri in &input.images {
        validate_image_uri(uri).map_err(|m| AppError::field("images", m))?;
    }
    Ok(())
}
