//! Read-only fetches behind the public pages. Each page issues one fetch
//! and never retries.

use serde::Serialize;

use super::list::list_order;
use super::{Blog, ContentType, Project};
use crate::error::ContentResult;
use crate::store::{ContentQuery, ContentStore, LookupField};

/// Items per section on the home page.
pub const HOME_SECTION_LIMIT: usize = 3;

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub latest_blogs: Vec<Blog>,
    pub latest_projects: Vec<Project>,
}

/// Estimated reading time, never below one minute.
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

pub async fn blogs(store: &dyn ContentStore, limit: Option<usize>) -> ContentResult<Vec<Blog>> {
    let mut query = ContentQuery::all(ContentType::Blog, list_order(ContentType::Blog));
    query.limit = limit;
    Ok(store
        .query(&query)
        .await?
        .into_iter()
        .filter_map(|item| item.into_blog())
        .collect())
}

pub async fn projects(
    store: &dyn ContentStore,
    limit: Option<usize>,
) -> ContentResult<Vec<Project>> {
    let mut query = ContentQuery::all(ContentType::Project, list_order(ContentType::Project));
    query.limit = limit;
    Ok(store
        .query(&query)
        .await?
        .into_iter()
        .filter_map(|item| item.into_project())
        .collect())
}

pub async fn blog_by_slug(store: &dyn ContentStore, slug: &str) -> ContentResult<Option<Blog>> {
    Ok(store
        .get_one(ContentType::Blog, LookupField::Slug, slug)
        .await?
        .and_then(|item| item.into_blog()))
}

pub async fn project_by_slug(
    store: &dyn ContentStore,
    slug: &str,
) -> ContentResult<Option<Project>> {
    Ok(store
        .get_one(ContentType::Project, LookupField::Slug, slug)
        .await?
        .and_then(|item| item.into_project()))
}

/// Latest blogs and projects, fetched together.
pub async fn home(store: &dyn ContentStore) -> ContentResult<HomePage> {
    let (latest_blogs, latest_projects) = tokio::try_join!(
        blogs(store, Some(HOME_SECTION_LIMIT)),
        projects(store, Some(HOME_SECTION_LIMIT))
    )?;
    Ok(HomePage {
        latest_blogs,
        latest_projects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Draft, DraftField};
    use crate::store::memory::MemoryStore;

    async fn seed(store: &MemoryStore, content_type: ContentType, count: usize) {
        for n in 0..count {
            let mut draft = Draft::empty(content_type);
            draft.apply(DraftField::Title(format!("Item {n}"))).unwrap();
            if content_type == ContentType::Project {
                draft
                    .apply(DraftField::Description("desc".to_string()))
                    .unwrap();
            }
            draft.set_slug(format!("item-{n}"));
            store.insert(&draft).await.unwrap();
        }
    }

    #[test]
    fn test_reading_time_rounds_up_with_floor_of_one() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("just a few words"), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"word ".repeat(1000)), 5);
    }

    #[tokio::test]
    async fn test_home_limits_each_section() {
        let store = MemoryStore::new();
        seed(&store, ContentType::Blog, 5).await;
        seed(&store, ContentType::Project, 2).await;

        let page = home(&store).await.unwrap();
        assert_eq!(page.latest_blogs.len(), HOME_SECTION_LIMIT);
        assert_eq!(page.latest_projects.len(), 2);
        assert_eq!(page.latest_blogs[0].slug, "item-4");
    }

    #[tokio::test]
    async fn test_lookup_by_slug_is_scoped_to_type() {
        let store = MemoryStore::new();
        seed(&store, ContentType::Project, 1).await;

        assert!(project_by_slug(&store, "item-0").await.unwrap().is_some());
        assert!(blog_by_slug(&store, "item-0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_error() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(blogs(&store, None).await.is_err());
        assert!(home(&store).await.is_err());
    }
}
