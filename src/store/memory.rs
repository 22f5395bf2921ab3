//! In-process content store with the same constraints as the database
//! schema. Backs the service when no database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContentQuery, ContentStore, LookupField, OrderField};
use crate::content::{
    Blog, BlogDraft, ContentItem, ContentType, Draft, ItemId, Profile, Project, ProjectDraft,
};
use crate::error::{ContentError, ContentResult};

pub struct MemoryStore {
    blogs: RwLock<Vec<Blog>>,
    projects: RwLock<Vec<Project>>,
    profile: RwLock<Option<Profile>>,
    /// Last issued timestamp; keeps `createdAt` strictly increasing.
    clock: RwLock<DateTime<Utc>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            blogs: RwLock::new(Vec::new()),
            projects: RwLock::new(Vec::new()),
            profile: RwLock::new(None),
            clock: RwLock::new(DateTime::<Utc>::MIN_UTC),
            available: AtomicBool::new(true),
        }
    }

    pub fn with_profile(profile: Profile) -> Self {
        Self {
            profile: RwLock::new(Some(profile)),
            ..Self::new()
        }
    }

    /// Simulates an outage: while unavailable every operation fails with a
    /// network error and no data changes.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> ContentResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ContentError::Network("content store unreachable".to_string()))
        }
    }

    async fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.clock.write().await;
        let now = Utc::now();
        let stamp = if now > *last {
            now
        } else {
            *last + chrono::Duration::microseconds(1)
        };
        *last = stamp;
        stamp
    }
}

fn required<'a, T>(value: &'a Option<T>, collection: &str, field: &str) -> ContentResult<&'a T> {
    value.as_ref().ok_or_else(|| {
        ContentError::Validation(format!("{}.{} is required", collection, field))
    })
}

fn build_blog(
    draft: &BlogDraft,
    id: ItemId,
    created_at: DateTime<Utc>,
    published_at: DateTime<Utc>,
) -> ContentResult<Blog> {
    Ok(Blog {
        id,
        title: required(&draft.title, "blogs", "title")?.clone(),
        slug: required(&draft.slug, "blogs", "slug")?.clone(),
        content: required(&draft.content, "blogs", "content")?.clone(),
        cover_image: draft.cover_image.clone(),
        published_at: draft.published_at.unwrap_or(published_at),
        created_at,
    })
}

fn build_project(
    draft: &ProjectDraft,
    id: ItemId,
    created_at: DateTime<Utc>,
) -> ContentResult<Project> {
    Ok(Project {
        id,
        title: required(&draft.title, "projects", "title")?.clone(),
        slug: required(&draft.slug, "projects", "slug")?.clone(),
        description: required(&draft.description, "projects", "description")?.clone(),
        tech_stack: required(&draft.tech_stack, "projects", "tech_stack")?.clone(),
        repo_url: draft.repo_url.clone(),
        demo_url: draft.demo_url.clone(),
        thumbnail: draft.thumbnail.clone(),
        created_at,
    })
}

fn matches_filter(item: &ContentItem, field: LookupField, value: &str) -> bool {
    match field {
        LookupField::Id => Uuid::parse_str(value).map_or(false, |id| item.id() == id),
        LookupField::Slug => item.slug() == value,
    }
}

fn sort_key(item: &ContentItem, field: OrderField) -> DateTime<Utc> {
    match field {
        OrderField::CreatedAt => item.created_at(),
        OrderField::PublishedAt => item.published_at(),
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn query(&self, query: &ContentQuery) -> ContentResult<Vec<ContentItem>> {
        self.ensure_available()?;

        let mut items: Vec<ContentItem> = match query.collection {
            ContentType::Blog => self
                .blogs
                .read()
                .await
                .iter()
                .cloned()
                .map(ContentItem::Blog)
                .collect(),
            ContentType::Project => self
                .projects
                .read()
                .await
                .iter()
                .cloned()
                .map(ContentItem::Project)
                .collect(),
        };

        if let Some(filter) = &query.filter {
            items.retain(|item| matches_filter(item, filter.field, &filter.value));
        }

        let order = query.order_by;
        items.sort_by(|a, b| {
            let (ka, kb) = (sort_key(a, order.field), sort_key(b, order.field));
            if order.descending {
                kb.cmp(&ka)
            } else {
                ka.cmp(&kb)
            }
        });

        if let Some(limit) = query.limit {
            items.truncate(limit);
        }

        Ok(items)
    }

    async fn get_one(
        &self,
        collection: ContentType,
        field: LookupField,
        value: &str,
    ) -> ContentResult<Option<ContentItem>> {
        let query = ContentQuery::all(collection, OrderField::CreatedAt).filter(field, value);
        Ok(self.query(&query).await?.into_iter().next())
    }

    async fn insert(&self, record: &Draft) -> ContentResult<ContentItem> {
        self.ensure_available()?;

        let id = Uuid::new_v4();
        let created_at = self.next_timestamp().await;

        match record {
            Draft::Blog(draft) => {
                let blog = build_blog(draft, id, created_at, created_at)?;
                let mut blogs = self.blogs.write().await;
                if blogs.iter().any(|b| b.slug == blog.slug) {
                    return Err(ContentError::SlugConflict(blog.slug));
                }
                blogs.push(blog.clone());
                tracing::debug!(id = %id, slug = %blog.slug, "blog inserted");
                Ok(ContentItem::Blog(blog))
            }
            Draft::Project(draft) => {
                let project = build_project(draft, id, created_at)?;
                let mut projects = self.projects.write().await;
                if projects.iter().any(|p| p.slug == project.slug) {
                    return Err(ContentError::SlugConflict(project.slug));
                }
                projects.push(project.clone());
                tracing::debug!(id = %id, slug = %project.slug, "project inserted");
                Ok(ContentItem::Project(project))
            }
        }
    }

    async fn update(&self, id: ItemId, record: &Draft) -> ContentResult<ContentItem> {
        self.ensure_available()?;

        match record {
            Draft::Blog(draft) => {
                let mut blogs = self.blogs.write().await;
                let index = blogs
                    .iter()
                    .position(|b| b.id == id)
                    .ok_or_else(|| ContentError::NotFound(format!("blog {}", id)))?;
                let existing = &blogs[index];
                let blog = build_blog(draft, id, existing.created_at, existing.published_at)?;
                if blogs.iter().any(|b| b.id != id && b.slug == blog.slug) {
                    return Err(ContentError::SlugConflict(blog.slug));
                }
                blogs[index] = blog.clone();
                Ok(ContentItem::Blog(blog))
            }
            Draft::Project(draft) => {
                let mut projects = self.projects.write().await;
                let index = projects
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| ContentError::NotFound(format!("project {}", id)))?;
                let project = build_project(draft, id, projects[index].created_at)?;
                if projects.iter().any(|p| p.id != id && p.slug == project.slug) {
                    return Err(ContentError::SlugConflict(project.slug));
                }
                projects[index] = project.clone();
                Ok(ContentItem::Project(project))
            }
        }
    }

    async fn delete(&self, collection: ContentType, id: ItemId) -> ContentResult<()> {
        self.ensure_available()?;

        let removed = match collection {
            ContentType::Blog => {
                let mut blogs = self.blogs.write().await;
                let before = blogs.len();
                blogs.retain(|b| b.id != id);
                before != blogs.len()
            }
            ContentType::Project => {
                let mut projects = self.projects.write().await;
                let before = projects.len();
                projects.retain(|p| p.id != id);
                before != projects.len()
            }
        };

        if removed {
            Ok(())
        } else {
            Err(ContentError::NotFound(format!("{} {}", collection, id)))
        }
    }

    async fn profile(&self) -> ContentResult<Option<Profile>> {
        self.ensure_available()?;
        Ok(self.profile.read().await.clone())
    }

    async fn health_check(&self) -> ContentResult<Duration> {
        let start = Instant::now();
        self.ensure_available()?;
        Ok(start.elapsed())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DraftField;

    fn blog_draft(title: &str, slug: &str) -> Draft {
        let mut draft = Draft::empty(ContentType::Blog);
        draft.apply(DraftField::Title(title.to_string())).unwrap();
        draft.apply(DraftField::Content("body".to_string())).unwrap();
        draft.set_slug(slug.to_string());
        draft
    }

    fn project_draft(title: &str, slug: &str) -> Draft {
        let mut draft = Draft::empty(ContentType::Project);
        draft.apply(DraftField::Title(title.to_string())).unwrap();
        draft
            .apply(DraftField::Description("desc".to_string()))
            .unwrap();
        draft.set_slug(slug.to_string());
        draft
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let store = MemoryStore::new();
        let before = Utc::now();
        let item = store.insert(&blog_draft("Hello", "hello")).await.unwrap();
        assert!(item.created_at() >= before);
        let fetched = store
            .get_one(ContentType::Blog, LookupField::Id, &item.id().to_string())
            .await
            .unwrap();
        assert_eq!(fetched, Some(item));
    }

    #[tokio::test]
    async fn test_insert_ignores_client_id() {
        let store = MemoryStore::new();
        let mut draft = blog_draft("Hello", "hello");
        let client_id = Uuid::new_v4();
        if let Draft::Blog(d) = &mut draft {
            d.id = Some(client_id);
        }
        let item = store.insert(&draft).await.unwrap();
        assert_ne!(item.id(), client_id);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict_per_collection() {
        let store = MemoryStore::new();
        store.insert(&blog_draft("Hello", "hello")).await.unwrap();
        let err = store
            .insert(&blog_draft("Hello again", "hello"))
            .await
            .unwrap_err();
        assert_eq!(err, ContentError::SlugConflict("hello".to_string()));

        // Same slug in another collection is fine.
        store
            .insert(&project_draft("Hello", "hello"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_required_field_is_validation_error() {
        let store = MemoryStore::new();
        let mut draft = Draft::empty(ContentType::Project);
        draft.set_slug("no-title".to_string());
        let err = store.insert(&draft).await.unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_overwrites_but_keeps_created_at() {
        let store = MemoryStore::new();
        let item = store.insert(&blog_draft("Hello", "hello")).await.unwrap();

        let mut draft = Draft::from_item(&item);
        draft.apply(DraftField::Title("Changed".to_string())).unwrap();
        draft.apply(DraftField::CoverImage(None)).unwrap();
        let updated = store.update(item.id(), &draft).await.unwrap();

        assert_eq!(updated.title(), "Changed");
        assert_eq!(updated.created_at(), item.created_at());
        assert_eq!(updated.id(), item.id());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Uuid::new_v4(), &blog_draft("Ghost", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_into_taken_slug_conflicts() {
        let store = MemoryStore::new();
        store.insert(&blog_draft("First", "first")).await.unwrap();
        let second = store.insert(&blog_draft("Second", "second")).await.unwrap();
        let err = store
            .update(second.id(), &blog_draft("First", "first"))
            .await
            .unwrap_err();
        assert_eq!(err, ContentError::SlugConflict("first".to_string()));
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let store = MemoryStore::new();
        let item = store
            .insert(&project_draft("Tool", "tool"))
            .await
            .unwrap();
        store.delete(ContentType::Project, item.id()).await.unwrap();
        let err = store
            .delete(ContentType::Project, item.id())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_orders_newest_first_and_limits() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store
                .insert(&project_draft(&format!("P{n}"), &format!("p{n}")))
                .await
                .unwrap();
        }
        let items = store
            .query(&ContentQuery::all(ContentType::Project, OrderField::CreatedAt).limit(3))
            .await
            .unwrap();
        let slugs: Vec<&str> = items.iter().map(|i| i.slug()).collect();
        assert_eq!(slugs, vec!["p4", "p3", "p2"]);
    }

    #[tokio::test]
    async fn test_get_one_with_malformed_id_is_absent() {
        let store = MemoryStore::new();
        store.insert(&blog_draft("Hello", "hello")).await.unwrap();
        let found = store
            .get_one(ContentType::Blog, LookupField::Id, "not-a-uuid")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_without_changes() {
        let store = MemoryStore::new();
        store.set_available(false);
        let err = store.insert(&blog_draft("Hello", "hello")).await.unwrap_err();
        assert!(matches!(err, ContentError::Network(_)));
        assert!(store.health_check().await.is_err());

        store.set_available(true);
        let items = store
            .query(&ContentQuery::all(ContentType::Blog, OrderField::PublishedAt))
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
