//! Content model: published items, editor drafts and typed field changes.

pub mod catalog;
pub mod dashboard;
pub mod editor;
pub mod list;
pub mod search;
pub mod slug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContentError, ContentResult};

pub type ItemId = Uuid;

// ============================================================================
// Content types
// ============================================================================

/// Selects the collection, the draft shape and the image field in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Project,
}

impl ContentType {
    /// Collection (table) name in the store.
    pub fn collection(self) -> &'static str {
        match self {
            ContentType::Blog => "blogs",
            ContentType::Project => "projects",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "blog" | "blogs" => Some(ContentType::Blog),
            "project" | "projects" => Some(ContentType::Project),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

// ============================================================================
// Stored items
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: ItemId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ItemId,
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Insertion order is display order.
    pub tech_stack: Vec<String>,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Blog(Blog),
    Project(Project),
}

impl ContentItem {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentItem::Blog(_) => ContentType::Blog,
            ContentItem::Project(_) => ContentType::Project,
        }
    }

    pub fn id(&self) -> ItemId {
        match self {
            ContentItem::Blog(blog) => blog.id,
            ContentItem::Project(project) => project.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentItem::Blog(blog) => &blog.title,
            ContentItem::Project(project) => &project.title,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            ContentItem::Blog(blog) => &blog.slug,
            ContentItem::Project(project) => &project.slug,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Blog(blog) => blog.created_at,
            ContentItem::Project(project) => project.created_at,
        }
    }

    /// Projects have no publish time and fall back to their creation time.
    pub fn published_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Blog(blog) => blog.published_at,
            ContentItem::Project(project) => project.created_at,
        }
    }

    /// `coverImage` for blogs, `thumbnail` for projects.
    pub fn image(&self) -> Option<&str> {
        match self {
            ContentItem::Blog(blog) => blog.cover_image.as_deref(),
            ContentItem::Project(project) => project.thumbnail.as_deref(),
        }
    }

    pub fn into_blog(self) -> Option<Blog> {
        match self {
            ContentItem::Blog(blog) => Some(blog),
            ContentItem::Project(_) => None,
        }
    }

    pub fn into_project(self) -> Option<Project> {
        match self {
            ContentItem::Project(project) => Some(project),
            ContentItem::Blog(_) => None,
        }
    }
}

// ============================================================================
// Drafts
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    pub id: Option<ItemId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub id: Option<ItemId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
    pub thumbnail: Option<String>,
}

/// A partial item under construction. A draft with an `id` edits that
/// item; a draft without one is a pending creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Draft {
    Blog(BlogDraft),
    Project(ProjectDraft),
}

impl Draft {
    /// Minimal valid shape for a new item of the given type.
    pub fn empty(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Blog => Draft::Blog(BlogDraft {
                content: Some(String::new()),
                ..BlogDraft::default()
            }),
            ContentType::Project => Draft::Project(ProjectDraft {
                tech_stack: Some(Vec::new()),
                ..ProjectDraft::default()
            }),
        }
    }

    pub fn from_item(item: &ContentItem) -> Self {
        match item {
            ContentItem::Blog(blog) => Draft::Blog(BlogDraft {
                id: Some(blog.id),
                title: Some(blog.title.clone()),
                slug: Some(blog.slug.clone()),
                content: Some(blog.content.clone()),
                cover_image: blog.cover_image.clone(),
                published_at: Some(blog.published_at),
            }),
            ContentItem::Project(project) => Draft::Project(ProjectDraft {
                id: Some(project.id),
                title: Some(project.title.clone()),
                slug: Some(project.slug.clone()),
                description: Some(project.description.clone()),
                tech_stack: Some(project.tech_stack.clone()),
                repo_url: project.repo_url.clone(),
                demo_url: project.demo_url.clone(),
                thumbnail: project.thumbnail.clone(),
            }),
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Draft::Blog(_) => ContentType::Blog,
            Draft::Project(_) => ContentType::Project,
        }
    }

    pub fn id(&self) -> Option<ItemId> {
        match self {
            Draft::Blog(draft) => draft.id,
            Draft::Project(draft) => draft.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Draft::Blog(draft) => draft.title.as_deref(),
            Draft::Project(draft) => draft.title.as_deref(),
        }
    }

    pub fn slug(&self) -> Option<&str> {
        match self {
            Draft::Blog(draft) => draft.slug.as_deref(),
            Draft::Project(draft) => draft.slug.as_deref(),
        }
    }

    pub fn set_slug(&mut self, slug: String) {
        match self {
            Draft::Blog(draft) => draft.slug = Some(slug),
            Draft::Project(draft) => draft.slug = Some(slug),
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            Draft::Blog(draft) => draft.cover_image.as_deref(),
            Draft::Project(draft) => draft.thumbnail.as_deref(),
        }
    }

    /// Writes an uploaded image reference into the type's image field.
    pub fn set_image(&mut self, reference: String) {
        match self {
            Draft::Blog(draft) => draft.cover_image = Some(reference),
            Draft::Project(draft) => draft.thumbnail = Some(reference),
        }
    }

    /// Applies one field change. Values are taken as-is; a field that the
    /// draft's shape does not have is rejected and nothing changes.
    pub fn apply(&mut self, change: DraftField) -> ContentResult<()> {
        match (self, change) {
            (Draft::Blog(draft), DraftField::Title(value)) => draft.title = Some(value),
            (Draft::Project(draft), DraftField::Title(value)) => draft.title = Some(value),
            (Draft::Blog(draft), DraftField::Content(value)) => draft.content = Some(value),
            (Draft::Blog(draft), DraftField::CoverImage(value)) => draft.cover_image = value,
            (Draft::Blog(draft), DraftField::PublishedAt(value)) => {
                draft.published_at = Some(value)
            }
            (Draft::Project(draft), DraftField::Description(value)) => {
                draft.description = Some(value)
            }
            (Draft::Project(draft), DraftField::TechStack(value)) => {
                draft.tech_stack = Some(value)
            }
            (Draft::Project(draft), DraftField::RepoUrl(value)) => draft.repo_url = value,
            (Draft::Project(draft), DraftField::DemoUrl(value)) => draft.demo_url = value,
            (Draft::Project(draft), DraftField::Thumbnail(value)) => draft.thumbnail = value,
            (draft, change) => {
                return Err(ContentError::Validation(format!(
                    "field '{}' does not exist on {} drafts",
                    change.name(),
                    draft.content_type()
                )))
            }
        }
        Ok(())
    }
}

/// One editor field change, e.g. `{"field": "title", "value": "Hello"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum DraftField {
    Title(String),
    Content(String),
    CoverImage(Option<String>),
    PublishedAt(DateTime<Utc>),
    Description(String),
    #[serde(deserialize_with = "deserialize_tech_stack")]
    TechStack(Vec<String>),
    RepoUrl(Option<String>),
    DemoUrl(Option<String>),
    Thumbnail(Option<String>),
}

impl DraftField {
    pub fn name(&self) -> &'static str {
        match self {
            DraftField::Title(_) => "title",
            DraftField::Content(_) => "content",
            DraftField::CoverImage(_) => "coverImage",
            DraftField::PublishedAt(_) => "publishedAt",
            DraftField::Description(_) => "description",
            DraftField::TechStack(_) => "techStack",
            DraftField::RepoUrl(_) => "repoUrl",
            DraftField::DemoUrl(_) => "demoUrl",
            DraftField::Thumbnail(_) => "thumbnail",
        }
    }

    /// Parses the comma separated form used by the editor ("React, Tailwind").
    pub fn tech_stack_from_list(input: &str) -> Self {
        DraftField::TechStack(split_labels(input))
    }
}

fn split_labels(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts either a JSON array of labels or a comma separated string.
fn deserialize_tech_stack<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Labels {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Labels::deserialize(deserializer)? {
        Labels::List(labels) => labels,
        Labels::Csv(csv) => split_labels(&csv),
    })
}

// ============================================================================
// Profile (about page)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ItemId,
    pub name: String,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub photo: Option<String>,
}
