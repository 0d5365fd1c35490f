use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;

use crate::error::{conflict_on_unique, ApiError};

/// A blog post with its author's display name joined at read time; the name
/// is never stored on the row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub author_id: i64,
    pub author_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub excerpt: &'a str,
    pub content: &'a str,
    pub author_id: i64,
    pub published: bool,
    pub cover_image: Option<&'a str>,
}

/// Sparse update; only `Some` fields are applied.
#[derive(Debug, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub cover_image: Option<String>,
}

impl PostPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.excerpt.is_none()
            && self.content.is_none()
            && self.published.is_none()
            && self.cover_image.is_none()
    }
}

const SELECT_POST: &str = r#"
    SELECT p.id, p.title, p.slug, p.excerpt, p.content, p.cover_image,
           p.published, p.author_id, u.name AS author_name,
           p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

impl Post {
    /// Inserts a post; a duplicate slug surfaces as `Conflict`. A missing
    /// author is caught by the foreign key.
    pub async fn create(db: &SqlitePool, new: NewPost<'_>) -> Result<Post, ApiError> {
        let now = crate::db::timestamp(OffsetDateTime::now_utc())?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, slug, excerpt, content, cover_image, published,
                               author_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.title)
        .bind(new.slug)
        .bind(new.excerpt)
        .bind(new.content)
        .bind(new.cover_image)
        .bind(new.published)
        .bind(new.author_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Slug already exists"))?;

        Self::get_by_id(db, id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post {id} vanished after insert")))
    }

    /// Applies the provided fields only and refreshes `updated_at`. An empty
    /// patch or an unknown id both come back as `None`.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, ApiError> {
        if patch.is_empty() {
            return Ok(None);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE posts SET ");
        let mut fields = builder.separated(", ");
        if let Some(title) = &patch.title {
            fields.push("title = ").push_bind_unseparated(title);
        }
        if let Some(slug) = &patch.slug {
            fields.push("slug = ").push_bind_unseparated(slug);
        }
        if let Some(excerpt) = &patch.excerpt {
            fields.push("excerpt = ").push_bind_unseparated(excerpt);
        }
        if let Some(content) = &patch.content {
            fields.push("content = ").push_bind_unseparated(content);
        }
        if let Some(published) = patch.published {
            fields.push("published = ").push_bind_unseparated(published);
        }
        if let Some(cover_image) = &patch.cover_image {
            fields
                .push("cover_image = ")
                .push_bind_unseparated(cover_image);
        }
        fields
            .push("updated_at = ")
            .push_bind_unseparated(crate::db::timestamp(OffsetDateTime::now_utc())?);
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder
            .build()
            .execute(db)
            .await
            .map_err(|e| conflict_on_unique(e, "Slug already exists"))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::get_by_id(db, id).await
    }

    /// Hard delete. Returns whether a row was actually removed.
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_by_id(db: &SqlitePool, id: i64) -> Result<Option<Post>, ApiError> {
        let post = sqlx::query_as::<_, Post>(&format!("{SELECT_POST} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(post)
    }

    pub async fn get_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Post>, ApiError> {
        let post = sqlx::query_as::<_, Post>(&format!("{SELECT_POST} WHERE p.slug = ?"))
            .bind(slug)
            .fetch_optional(db)
            .await?;
        Ok(post)
    }

    /// Published posts, newest first.
    pub async fn list_published(db: &SqlitePool) -> Result<Vec<Post>, ApiError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{SELECT_POST} WHERE p.published = 1 ORDER BY p.created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(posts)
    }

    /// Every post including drafts, newest first. Admin views only.
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<Post>, ApiError> {
        let posts =
            sqlx::query_as::<_, Post>(&format!("{SELECT_POST} ORDER BY p.created_at DESC"))
                .fetch_all(db)
                .await?;
        Ok(posts)
    }
}
