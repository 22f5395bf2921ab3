/**
 * Blog Routes
 * Public blog list with title search, and blog detail by slug
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::content::catalog::{self, reading_time_minutes};
use crate::content::search::filter_by_title;
use crate::content::slug::is_valid_slug;
use crate::content::Blog;
use crate::error::{ContentError, ContentResult};
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blogs
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    #[serde(default)]
    pub search: String,
}

/// Blog card for the list view
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub cover_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub reading_time_minutes: u32,
}

impl From<&Blog> for BlogSummary {
    fn from(blog: &Blog) -> Self {
        Self {
            id: blog.id,
            title: blog.title.clone(),
            slug: blog.slug.clone(),
            cover_image: blog.cover_image.clone(),
            published_at: blog.published_at,
            reading_time_minutes: reading_time_minutes(&blog.content),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub items: Vec<BlogSummary>,
    pub total: usize,
}

/// Full blog post with its reading time
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetail {
    #[serde(flatten)]
    pub blog: Blog,
    pub reading_time_minutes: u32,
}

/// Rejects malformed slugs before they reach the store.
pub(crate) fn checked_slug(slug: &str) -> ContentResult<&str> {
    if is_valid_slug(slug) {
        Ok(slug)
    } else {
        Err(ContentError::Validation(format!("invalid slug '{}'", slug)))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blogs?search= - all blogs, newest publication first
pub async fn list_blogs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlogListQuery>,
) -> ContentResult<Json<BlogListResponse>> {
    let blogs = catalog::blogs(state.store.as_ref(), None).await?;
    let items: Vec<BlogSummary> = filter_by_title(&blogs, &query.search)
        .into_iter()
        .map(BlogSummary::from)
        .collect();

    Ok(Json(BlogListResponse {
        total: items.len(),
        items,
    }))
}

/// GET /api/blogs/{slug}
pub async fn get_blog(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ContentResult<Json<BlogDetail>> {
    let slug = checked_slug(&slug)?;
    let blog = catalog::blog_by_slug(state.store.as_ref(), slug)
        .await?
        .ok_or_else(|| ContentError::NotFound(format!("blog '{}'", slug)))?;

    Ok(Json(BlogDetail {
        reading_time_minutes: reading_time_minutes(&blog.content),
        blog,
    }))
}
