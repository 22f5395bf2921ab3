//! Database Models - rows of the content tables as read by sqlx.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::content::{Blog, Experience, Profile, Project};

/// Row of `blogs`
#[derive(Debug, Clone, FromRow)]
pub struct BlogRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        Blog {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            cover_image: row.cover_image,
            published_at: row.published_at,
            created_at: row.created_at,
        }
    }
}

/// Row of `projects`
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            tech_stack: row.tech_stack,
            repo_url: row.repo_url,
            demo_url: row.demo_url,
            thumbnail: row.thumbnail,
            created_at: row.created_at,
        }
    }
}

/// Row of `profile`; list columns are nullable in the schema.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<Json<Vec<Experience>>>,
    pub photo: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            name: row.name,
            bio: row.bio,
            skills: row.skills.unwrap_or_default(),
            experience: row.experience.map(|json| json.0).unwrap_or_default(),
            photo: row.photo,
        }
    }
}
