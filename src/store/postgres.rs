//! PostgreSQL content store. NOT NULL and UNIQUE constraints in the schema
//! are the validation authority; their violations map onto `ContentError`.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{ContentQuery, ContentStore, LookupField, OrderField};
use crate::content::{BlogDraft, ContentItem, ContentType, Draft, ItemId, Profile, ProjectDraft};
use crate::db::models::{BlogRow, ProfileRow, ProjectRow};
use crate::error::{ContentError, ContentResult};

const BLOG_COLUMNS: &str = "id, title, slug, content, cover_image, published_at, created_at";
const PROJECT_COLUMNS: &str =
    "id, title, slug, description, tech_stack, repo_url, demo_url, thumbnail, created_at";

#[derive(Clone)]
pub struct PgContentStore {
    pool: Arc<PgPool>,
}

impl PgContentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a write error, turning a unique violation into a slug conflict.
fn write_error(err: sqlx::Error, slug: Option<&str>) -> ContentError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ContentError::SlugConflict(slug.unwrap_or_default().to_string());
        }
    }
    let mapped = ContentError::from(err);
    tracing::warn!(error = %mapped, "content write rejected");
    mapped
}

/// Builds the SELECT for a query. Returns `None` when the filter can never
/// match (an id that is not a UUID).
fn select_sql(query: &ContentQuery) -> Option<(String, Option<FilterValue>)> {
    let (table, columns) = match query.collection {
        ContentType::Blog => ("blogs", BLOG_COLUMNS),
        ContentType::Project => ("projects", PROJECT_COLUMNS),
    };
    let mut sql = format!("SELECT {} FROM {}", columns, table);

    let bound = match &query.filter {
        Some(filter) => match filter.field {
            LookupField::Id => {
                let id = Uuid::parse_str(&filter.value).ok()?;
                sql.push_str(" WHERE id = $1");
                Some(FilterValue::Id(id))
            }
            LookupField::Slug => {
                sql.push_str(" WHERE slug = $1");
                Some(FilterValue::Slug(filter.value.clone()))
            }
        },
        None => None,
    };

    let order_column = match (query.order_by.field, query.collection) {
        (OrderField::PublishedAt, ContentType::Blog) => "published_at",
        _ => "created_at",
    };
    let direction = if query.order_by.descending {
        "DESC"
    } else {
        "ASC"
    };
    sql.push_str(&format!(" ORDER BY {} {}", order_column, direction));

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Some((sql, bound))
}

enum FilterValue {
    Id(Uuid),
    Slug(String),
}

macro_rules! fetch_rows {
    ($row:ty, $sql:expr, $bound:expr, $pool:expr) => {{
        let q = sqlx::query_as::<_, $row>($sql);
        let q = match $bound {
            Some(FilterValue::Id(id)) => q.bind(id),
            Some(FilterValue::Slug(slug)) => q.bind(slug),
            None => q,
        };
        q.fetch_all($pool).await
    }};
}

impl PgContentStore {
    async fn insert_blog(&self, draft: &BlogDraft) -> ContentResult<ContentItem> {
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            r#"
            INSERT INTO blogs (title, slug, content, cover_image, published_at)
            VALUES ($1, $2, $3, $4, COALESCE($5, now()))
            RETURNING {}
            "#,
            BLOG_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.content)
        .bind(&draft.cover_image)
        .bind(draft.published_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, draft.slug.as_deref()))?;

        Ok(ContentItem::Blog(row.into()))
    }

    async fn insert_project(&self, draft: &ProjectDraft) -> ContentResult<ContentItem> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            INSERT INTO projects (title, slug, description, tech_stack, repo_url, demo_url, thumbnail)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.tech_stack)
        .bind(&draft.repo_url)
        .bind(&draft.demo_url)
        .bind(&draft.thumbnail)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, draft.slug.as_deref()))?;

        Ok(ContentItem::Project(row.into()))
    }

    async fn update_blog(&self, id: ItemId, draft: &BlogDraft) -> ContentResult<ContentItem> {
        let row = sqlx::query_as::<_, BlogRow>(&format!(
            r#"
            UPDATE blogs
            SET title = $2, slug = $3, content = $4, cover_image = $5,
                published_at = COALESCE($6, published_at)
            WHERE id = $1
            RETURNING {}
            "#,
            BLOG_COLUMNS
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.content)
        .bind(&draft.cover_image)
        .bind(draft.published_at)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| write_error(e, draft.slug.as_deref()))?
        .ok_or_else(|| ContentError::NotFound(format!("blog {}", id)))?;

        Ok(ContentItem::Blog(row.into()))
    }

    async fn update_project(
        &self,
        id: ItemId,
        draft: &ProjectDraft,
    ) -> ContentResult<ContentItem> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            UPDATE projects
            SET title = $2, slug = $3, description = $4, tech_stack = $5,
                repo_url = $6, demo_url = $7, thumbnail = $8
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.description)
        .bind(&draft.tech_stack)
        .bind(&draft.repo_url)
        .bind(&draft.demo_url)
        .bind(&draft.thumbnail)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| write_error(e, draft.slug.as_deref()))?
        .ok_or_else(|| ContentError::NotFound(format!("project {}", id)))?;

        Ok(ContentItem::Project(row.into()))
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn query(&self, query: &ContentQuery) -> ContentResult<Vec<ContentItem>> {
        let Some((sql, bound)) = select_sql(query) else {
            return Ok(Vec::new());
        };

        let items: Vec<ContentItem> = match query.collection {
            ContentType::Blog => fetch_rows!(BlogRow, &sql, bound, self.pool())
                .map_err(|e| {
                    tracing::error!("Failed to query blogs: {}", e);
                    ContentError::from(e)
                })?
                .into_iter()
                .map(|row| ContentItem::Blog(row.into()))
                .collect(),
            ContentType::Project => fetch_rows!(ProjectRow, &sql, bound, self.pool())
                .map_err(|e| {
                    tracing::error!("Failed to query projects: {}", e);
                    ContentError::from(e)
                })?
                .into_iter()
                .map(|row| ContentItem::Project(row.into()))
                .collect(),
        };

        Ok(items)
    }

    async fn get_one(
        &self,
        collection: ContentType,
        field: LookupField,
        value: &str,
    ) -> ContentResult<Option<ContentItem>> {
        let query = ContentQuery::all(collection, OrderField::CreatedAt)
            .filter(field, value)
            .limit(1);
        Ok(self.query(&query).await?.into_iter().next())
    }

    async fn insert(&self, record: &Draft) -> ContentResult<ContentItem> {
        let item = match record {
            Draft::Blog(draft) => self.insert_blog(draft).await?,
            Draft::Project(draft) => self.insert_project(draft).await?,
        };
        tracing::info!(id = %item.id(), slug = %item.slug(), kind = %item.content_type(), "content created");
        Ok(item)
    }

    async fn update(&self, id: ItemId, record: &Draft) -> ContentResult<ContentItem> {
        let item = match record {
            Draft::Blog(draft) => self.update_blog(id, draft).await?,
            Draft::Project(draft) => self.update_project(id, draft).await?,
        };
        tracing::info!(id = %id, slug = %item.slug(), kind = %item.content_type(), "content updated");
        Ok(item)
    }

    async fn delete(&self, collection: ContentType, id: ItemId) -> ContentResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.collection());
        let result = sqlx::query(&sql).bind(id).execute(self.pool()).await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::NotFound(format!("{} {}", collection, id)));
        }
        tracing::info!(id = %id, kind = %collection, "content deleted");
        Ok(())
    }

    async fn profile(&self) -> ContentResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, bio, skills, experience, photo FROM profile LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Profile::from))
    }

    async fn health_check(&self) -> ContentResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(self.pool()).await?;
        Ok(start.elapsed())
    }
}
