use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::info;

use crate::auth::password::hash_password;
use crate::error::{conflict_on_unique, ApiError};

pub const SEED_ADMIN_EMAIL: &str = "admin@admin.com";
const SEED_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// User record. Password material is never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, salt, role, created_at, updated_at";

impl User {
    /// Inserts a new user. Email is normalized to lowercase before storing;
    /// a duplicate surfaces as `Conflict`.
    pub async fn create(
        db: &SqlitePool,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();
        let (hash, salt) = hash_password(password, None);
        let now = crate::db::timestamp(OffsetDateTime::now_utc())?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, salt, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(&email)
        .bind(&hash)
        .bind(&salt)
        .bind(role)
        .bind(&now)
        .bind(&now)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already exists"))?;
        Ok(user)
    }

    /// Case-insensitive lookup. Returns the full record including password
    /// material; for internal verification only.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

/// Creates the default admin account if absent. Safe to call on every start;
/// a concurrent seed racing us resolves through the unique email constraint.
pub async fn seed_admin(db: &SqlitePool) -> Result<(), ApiError> {
    if User::find_by_email(db, SEED_ADMIN_EMAIL).await?.is_some() {
        return Ok(());
    }
    match User::create(db, "Admin", SEED_ADMIN_EMAIL, SEED_ADMIN_PASSWORD, Role::Admin).await {
        Ok(user) => {
            info!(user_id = user.id, "seeded default admin account");
            Ok(())
        }
        Err(ApiError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
