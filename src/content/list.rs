//! Holds the current collection for the admin list view and refreshes it
//! after mutations.

use super::{ContentItem, ContentType, ItemId};
use crate::error::{ContentError, ContentResult};
use crate::store::{ContentQuery, ContentStore, OrderField};

/// Blogs list by publish time, projects by creation time.
pub fn list_order(content_type: ContentType) -> OrderField {
    match content_type {
        ContentType::Blog => OrderField::PublishedAt,
        ContentType::Project => OrderField::CreatedAt,
    }
}

#[derive(Debug, Clone)]
pub struct ContentList {
    content_type: ContentType,
    items: Vec<ContentItem>,
    /// Set by the first successful load; an unloaded list is not an empty
    /// collection.
    loaded: bool,
}

impl ContentList {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            items: Vec::new(),
            loaded: false,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn find(&self, id: ItemId) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Fetches `content_type` and replaces the held collection. On failure
    /// the previous collection (and its type) stay in place.
    pub async fn load(
        &mut self,
        store: &dyn ContentStore,
        content_type: ContentType,
    ) -> ContentResult<&[ContentItem]> {
        let query = ContentQuery::all(content_type, list_order(content_type));
        match store.query(&query).await {
            Ok(items) => {
                tracing::debug!(content_type = %content_type, count = items.len(), "content list loaded");
                self.content_type = content_type;
                self.items = items;
                self.loaded = true;
                Ok(&self.items)
            }
            Err(e) => {
                tracing::warn!(
                    content_type = %content_type,
                    error = %e,
                    "content list load failed; keeping previous items"
                );
                Err(e)
            }
        }
    }

    /// Re-issues the current query; atomically replaces the collection.
    pub async fn refresh(&mut self, store: &dyn ContentStore) -> ContentResult<&[ContentItem]> {
        let content_type = self.content_type;
        self.load(store, content_type).await
    }

    /// Irreversibly deletes an item of the current type, then refreshes.
    /// `confirmed` must carry the user's explicit confirmation.
    pub async fn delete(
        &mut self,
        store: &dyn ContentStore,
        id: ItemId,
        confirmed: bool,
    ) -> ContentResult<()> {
        if !confirmed {
            return Err(ContentError::ConfirmationRequired);
        }

        store.delete(self.content_type, id).await?;
        tracing::info!(content_type = %self.content_type, id = %id, "content deleted");

        let refreshed = self.refresh(store).await.map(|_| ());
        if let Err(e) = refreshed {
            // The delete itself went through; drop the stale entry locally.
            self.items.retain(|item| item.id() != id);
            tracing::warn!(error = %e, "refresh after delete failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Draft, DraftField};
    use crate::store::memory::testing::ReadFailingStore;
    use crate::store::memory::MemoryStore;
    use chrono::{Duration, Utc};

    async fn insert_blog(store: &MemoryStore, title: &str, published_days_ago: i64) -> ContentItem {
        let mut draft = Draft::empty(ContentType::Blog);
        draft.apply(DraftField::Title(title.to_string())).unwrap();
        draft
            .apply(DraftField::PublishedAt(
                Utc::now() - Duration::days(published_days_ago),
            ))
            .unwrap();
        draft.set_slug(crate::content::slug::derive_slug(title));
        store.insert(&draft).await.unwrap()
    }

    async fn insert_project(store: &MemoryStore, title: &str) -> ContentItem {
        let mut draft = Draft::empty(ContentType::Project);
        draft.apply(DraftField::Title(title.to_string())).unwrap();
        draft
            .apply(DraftField::Description("desc".to_string()))
            .unwrap();
        draft.set_slug(crate::content::slug::derive_slug(title));
        store.insert(&draft).await.unwrap()
    }

    #[tokio::test]
    async fn test_blogs_order_by_published_at() {
        let store = MemoryStore::new();
        // Created first but published most recently.
        insert_blog(&store, "Fresh", 0).await;
        insert_blog(&store, "Old", 30).await;
        insert_blog(&store, "Middle", 7).await;

        let mut list = ContentList::new(ContentType::Blog);
        let titles: Vec<String> = list
            .load(&store, ContentType::Blog)
            .await
            .unwrap()
            .iter()
            .map(|i| i.title().to_string())
            .collect();
        assert_eq!(titles, vec!["Fresh", "Middle", "Old"]);
    }

    #[tokio::test]
    async fn test_projects_order_by_created_at() {
        let store = MemoryStore::new();
        insert_project(&store, "First").await;
        insert_project(&store, "Second").await;

        let mut list = ContentList::new(ContentType::Blog);
        let items = list.load(&store, ContentType::Project).await.unwrap();
        assert_eq!(items[0].title(), "Second");
        assert_eq!(list.content_type(), ContentType::Project);
    }

    #[tokio::test]
    async fn test_loaded_flag_tracks_first_successful_load() {
        let store = MemoryStore::new();
        let mut list = ContentList::new(ContentType::Blog);
        assert!(!list.is_loaded());

        store.set_available(false);
        assert!(list.load(&store, ContentType::Blog).await.is_err());
        assert!(!list.is_loaded());

        store.set_available(true);
        list.load(&store, ContentType::Blog).await.unwrap();
        assert!(list.is_loaded());
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection() {
        let store = MemoryStore::new();
        let mut list = ContentList::new(ContentType::Project);
        list.load(&store, ContentType::Project).await.unwrap();
        assert!(list.items().is_empty());

        let created = insert_project(&store, "New Tool").await;
        list.refresh(&store).await.unwrap();
        assert_eq!(list.items(), &[created]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_items() {
        let store = MemoryStore::new();
        insert_blog(&store, "Visible", 1).await;

        let mut list = ContentList::new(ContentType::Blog);
        list.load(&store, ContentType::Blog).await.unwrap();

        store.set_available(false);
        assert!(list.load(&store, ContentType::Project).await.is_err());
        assert!(list.refresh(&store).await.is_err());

        assert_eq!(list.content_type(), ContentType::Blog);
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].title(), "Visible");
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let store = MemoryStore::new();
        let item = insert_project(&store, "Keep").await;
        let mut list = ContentList::new(ContentType::Project);
        list.load(&store, ContentType::Project).await.unwrap();

        let err = list.delete(&store, item.id(), false).await.unwrap_err();
        assert_eq!(err, ContentError::ConfirmationRequired);
        assert_eq!(list.items().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_item_and_second_delete_errors() {
        let store = MemoryStore::new();
        let item = insert_project(&store, "Doomed").await;
        insert_project(&store, "Survivor").await;
        let mut list = ContentList::new(ContentType::Project);
        list.load(&store, ContentType::Project).await.unwrap();

        list.delete(&store, item.id(), true).await.unwrap();
        assert!(list.find(item.id()).is_none());
        assert_eq!(list.items().len(), 1);

        let err = list.delete(&store, item.id(), true).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound(_)));
        assert_eq!(list.items().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_with_failed_refresh_drops_item_locally() {
        let store = ReadFailingStore::new();
        let doomed = insert_project(&store.inner, "Doomed").await;
        let survivor = insert_project(&store.inner, "Survivor").await;
        let mut list = ContentList::new(ContentType::Project);
        list.load(&store, ContentType::Project).await.unwrap();

        store.fail_reads(true);
        list.delete(&store, doomed.id(), true).await.unwrap();

        assert!(list.find(doomed.id()).is_none());
        assert_eq!(list.items(), &[survivor]);
        let query = ContentQuery::all(ContentType::Project, OrderField::CreatedAt);
        assert_eq!(store.inner.query(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_created_item_gets_store_assigned_fields() {
        let store = MemoryStore::new();
        let before = Utc::now();
        let created = insert_project(&store, "Stamped").await;

        let mut list = ContentList::new(ContentType::Project);
        list.load(&store, ContentType::Project).await.unwrap();
        let listed = list.find(created.id()).unwrap();
        assert!(listed.created_at() >= before);
        assert_eq!(listed, &created);
    }
}
