pub mod handlers;

use axum::{routing::post, Router};
use tracing::error;

use crate::auth::repo::{User, SEED_ADMIN_EMAIL};
use crate::auth::token::now_millis;
use crate::error::ApiError;
use crate::posts::repo::{NewPost, Post};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/generate-content", post(handlers::generate_content))
}

/// A candidate topic for a generated draft.
#[derive(Debug, Clone)]
pub struct Topic {
    pub title: String,
    pub description: String,
}

/// Source of candidate topics, most relevant first. The sequence is finite;
/// callers take as many as they need. Swap the implementation to plug in a
/// real trend feed without touching draft creation.
pub trait TopicSource: Send + Sync {
    fn topics(&self) -> Vec<Topic>;
}

/// Canned topics standing in for a trend integration.
pub struct SampleTopics;

impl TopicSource for SampleTopics {
    fn topics(&self) -> Vec<Topic> {
        vec![
            Topic {
                title: "The Rise of AI Agents in Software Development".into(),
                description:
                    "How AI agents are transforming the way developers build and deploy applications"
                        .into(),
            },
            Topic {
                title: "WebAssembly on the Server: State of the Ecosystem".into(),
                description:
                    "Where server-side WebAssembly runtimes are today and where they are heading"
                        .into(),
            },
        ]
    }
}

const DRAFT_COUNT: usize = 2;

/// Turns the topic source's first candidates into unpublished `[DRAFT]`
/// posts attributed to the seeded admin. Returns the created titles; a
/// single failed draft is logged and skipped rather than aborting the batch.
pub async fn generate_drafts(state: &AppState) -> Result<Vec<String>, ApiError> {
    let admin = User::find_by_email(&state.db, SEED_ADMIN_EMAIL)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("seed admin account missing")))?;

    let mut titles = Vec::new();
    for topic in state.topics.topics().into_iter().take(DRAFT_COUNT) {
        // Millisecond suffix keeps repeated runs from colliding on slug.
        let slug = format!("{}-{}", slugify(&topic.title), now_millis());
        let title = format!("[DRAFT] {}", topic.title);
        let content = draft_body(&topic.description);

        let created = Post::create(
            &state.db,
            NewPost {
                title: &title,
                slug: &slug,
                excerpt: &topic.description,
                content: &content,
                author_id: admin.id,
                published: false,
                cover_image: None,
            },
        )
        .await;

        match created {
            Ok(post) => titles.push(post.title),
            Err(e) => error!(error = %e, topic = %topic.title, "failed to create draft"),
        }
    }
    Ok(titles)
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn draft_body(description: &str) -> String {
    format!(
        "## Introduction\n\n{description}\n\n## Key Points\n\n\
         - Point 1: [To be expanded by the editor]\n\
         - Point 2: [To be expanded by the editor]\n\
         - Point 3: [To be expanded by the editor]\n\n\
         ## Conclusion\n\n[Summary to be added by the editor]\n\n---\n\
         *This draft was auto-generated from trending topics. Review and expand before publishing.*"
    )
}
