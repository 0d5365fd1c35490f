use serde::{Deserialize, Serialize};

/// Create body. Title and slug are validated in the handler so a missing key
/// comes back as a 400, not a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
    pub cover_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}
