//! Account service: passwordless signup, login by email, and token handling

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::{ProfileEdit, User, UserToggles};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    token_expiry: i64,
    extended_token_expiry: i64,
}

/// Input for creating an account
#[derive(Debug, Deserialize)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_pic: Option<String>,
    pub toggles: UserToggles,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// A signed-in user and their bearer token
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub profile_pic_url: Option<String>,
    pub toggles: Json<UserToggles>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            phone: row.phone,
            profile_pic: row.profile_pic_url,
            toggles: row.toggles.0,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, phone, profile_pic_url, toggles, created_at";

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            token_expiry: config.jwt.token_expiry,
            extended_token_expiry: config.jwt.extended_token_expiry,
        }
    }

    /// Create an account. Email and username must both be unused.
    pub async fn signup(&self, input: SignupInput) -> AppResult<AuthSession> {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 OR username = $2",
        )
        .bind(&input.email)
        .bind(&input.username)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("User".to_string()));
        }

        let user: User = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, phone, profile_pic_url, toggles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.profile_pic)
        .bind(Json(input.toggles))
        .fetch_one(&self.db)
        .await?
        .into();

        tracing::info!(user_id = %user.id, "Account created");
        self.session_for(user)
    }

    /// Sign in by email
    pub async fn login(&self, email: &str) -> AppResult<AuthSession> {
        let user: User = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?
        .into();

        tracing::debug!(user_id = %user.id, "User signed in");
        self.session_for(user)
    }

    /// Look up the account behind a verified token
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Apply a profile edit. A username held by another account is a conflict.
    pub async fn update_profile(&self, user_id: Uuid, edit: &ProfileEdit) -> AppResult<User> {
        let mut user = self.current_user(user_id).await?;
        user.apply(edit)
            .map_err(|(field, message)| AppError::field(field, message))?;

        if edit.username.is_some() {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE username = $1 AND id <> $2",
            )
            .bind(&user.username)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

            if taken > 0 {
                return Err(AppError::DuplicateEntry("Username".to_string()));
            }
        }

        let updated = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET username = $2, phone = $3, profile_pic_url = $4, toggles = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&user.username)
        .bind(&user.phone)
        .bind(&user.profile_pic)
        .bind(Json(user.toggles))
        .fetch_optional(&self.db)
        .await
        .map_err(|e| match e {
            // Lost a race for the username after the check above
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateEntry("Username".to_string())
            }
            other => AppError::DatabaseError(other),
        })?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(updated.into())
    }

    fn session_for(&self, user: User) -> AppResult<AuthSession> {
        let expires_in = self.expiry_for(&user.toggles);
        let token = encode_token(user.id, &user.email, expires_in, &self.jwt_secret)?;

        Ok(AuthSession {
            user,
            token,
            token_type: "Bearer".to_string(),
            expires_in,
        })
    }

    fn expiry_for(&self, toggles: &UserToggles) -> i64 {
        if toggles.stay_logged_in {
            self.extended_token_expiry
        } else {
            self.token_expiry
        }
    }
}

/// Sign a token for `user_id` valid for `expires_in` seconds
pub fn encode_token(
    user_id: Uuid,
    email: &str,
    expires_in: i64,
    secret: &str,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: (now + Duration::seconds(expires_in)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate a token's signature and expiry
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
