//! Admin dashboard: the active content type, its editor and its list.
//!
//! The dashboard lives behind a `tokio::sync::Mutex` in the application
//! state. Saves hold the lock for their whole round-trip (one save slot);
//! image uploads release it while bytes are in flight so the in-flight
//! flag is what guards the draft's image field.

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::editor::{ContentEditor, EditorMode};
use super::list::ContentList;
use super::{ContentItem, ContentType, Draft, DraftField, ItemId};
use crate::error::{ContentError, ContentResult};
use crate::store::{ContentStore, ObjectStorage, UPLOAD_BUCKET};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub active: ContentType,
    pub mode: &'static str,
    pub draft: Option<Draft>,
    pub uploading: bool,
    /// Type of the held items; differs from `active` only when the last
    /// load for `active` failed.
    pub items_type: ContentType,
    /// False until the collection has been fetched once.
    pub loaded: bool,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    editor: ContentEditor,
    list: ContentList,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(ContentType::Blog)
    }
}

impl Dashboard {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            editor: ContentEditor::new(content_type),
            list: ContentList::new(content_type),
        }
    }

    pub fn active_type(&self) -> ContentType {
        self.editor.content_type()
    }

    pub fn editor(&self) -> &ContentEditor {
        &self.editor
    }

    pub fn list(&self) -> &ContentList {
        &self.list
    }

    /// Switches to `content_type`, discarding any unsaved draft, and loads
    /// its collection.
    pub async fn open(
        &mut self,
        store: &dyn ContentStore,
        content_type: ContentType,
    ) -> ContentResult<()> {
        self.editor.switch_type(content_type);
        self.list.load(store, content_type).await.map(|_| ())
    }

    pub async fn refresh(&mut self, store: &dyn ContentStore) -> ContentResult<()> {
        if self.list.content_type() != self.active_type() {
            let active = self.active_type();
            return self.list.load(store, active).await.map(|_| ());
        }
        self.list.refresh(store).await.map(|_| ())
    }

    /// Loads the active collection unless it is already held. Callers that
    /// read or act on the list go through this first.
    pub async fn ensure_loaded(&mut self, store: &dyn ContentStore) -> ContentResult<()> {
        if self.list.is_loaded() && self.list.content_type() == self.active_type() {
            return Ok(());
        }
        self.refresh(store).await
    }

    pub fn new_draft(&mut self) -> ContentResult<Draft> {
        self.editor.new_draft().cloned()
    }

    /// Opens a held item for editing.
    pub fn edit(&mut self, id: ItemId) -> ContentResult<Draft> {
        let item = self
            .list
            .find(id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(format!("{} {}", self.active_type(), id)))?;
        self.editor.select_existing(&item).cloned()
    }

    pub fn change_field(&mut self, change: DraftField) -> ContentResult<Draft> {
        self.editor.change_field(change).cloned()
    }

    pub fn cancel(&mut self) {
        self.editor.cancel();
    }

    /// Saves the draft and, once back in listing mode, refreshes the list.
    /// A failed refresh keeps the stale list; the save still succeeded.
    pub async fn save(&mut self, store: &dyn ContentStore) -> ContentResult<ContentItem> {
        let item = self.editor.save(store).await?;
        if let Err(e) = self.refresh(store).await {
            tracing::warn!(error = %e, "list refresh after save failed");
        }
        Ok(item)
    }

    pub async fn delete(
        &mut self,
        store: &dyn ContentStore,
        id: ItemId,
        confirmed: bool,
    ) -> ContentResult<()> {
        if self.editor.is_editing() {
            return Err(ContentError::InvalidTransition(
                "close the open draft before deleting",
            ));
        }
        self.list.delete(store, id, confirmed).await
    }

    /// Back to listing with the draft discarded (used on sign-out).
    pub fn reset(&mut self) {
        self.editor.cancel();
    }

    pub fn view(&self) -> DashboardView {
        let (mode, draft) = match self.editor.mode() {
            EditorMode::Listing => ("listing", None),
            EditorMode::Editing(draft) => ("editing", Some(draft.clone())),
        };
        DashboardView {
            active: self.active_type(),
            mode,
            draft,
            uploading: self.editor.is_uploading(),
            items_type: self.list.content_type(),
            loaded: self.list.is_loaded(),
            items: self.list.items().to_vec(),
        }
    }
}

/// Uploads an image for the open draft and writes its public URL into the
/// draft's image field. The dashboard lock is released during the upload;
/// a second upload in the meantime is rejected.
pub async fn upload_image(
    dashboard: &Mutex<Dashboard>,
    objects: &dyn ObjectStorage,
    extension: &str,
    bytes: &[u8],
) -> ContentResult<String> {
    let ticket = dashboard.lock().await.editor.begin_upload()?;

    let path = format!(
        "{}/{}.{}",
        ticket.content_type().collection(),
        Uuid::new_v4(),
        extension
    );
    let uploaded = objects.upload_file(UPLOAD_BUCKET, &path, bytes).await;

    let mut dashboard = dashboard.lock().await;
    match uploaded {
        Ok(object) => {
            let url = objects.public_url(&object.bucket, &object.path);
            if let Err(e) = dashboard.editor.complete_upload(ticket, url.clone()) {
                drop(dashboard);
                // Nothing references the object any more.
                if let Err(remove_err) = objects.remove_file(&object.bucket, &object.path).await {
                    tracing::warn!(
                        bucket = %object.bucket,
                        path = %object.path,
                        error = %remove_err,
                        "orphaned upload could not be removed"
                    );
                }
                return Err(e);
            }
            tracing::info!(path = %object.path, size = bytes.len(), "image attached to draft");
            Ok(url)
        }
        Err(e) => {
            dashboard.editor.fail_upload(ticket);
            tracing::warn!(path = %path, error = %e, "image upload failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::testing::ReadFailingStore;
    use crate::store::memory::MemoryStore;
    use crate::store::ObjectRef;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Object storage whose uploads wait until released.
    struct GatedStorage {
        release: Notify,
        fail: bool,
        removed: std::sync::Mutex<Vec<String>>,
    }

    impl GatedStorage {
        fn new(fail: bool) -> Self {
            Self {
                release: Notify::new(),
                fail,
                removed: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ObjectStorage for GatedStorage {
        async fn upload_file(
            &self,
            bucket: &str,
            path: &str,
            _bytes: &[u8],
        ) -> ContentResult<ObjectRef> {
            self.release.notified().await;
            if self.fail {
                return Err(ContentError::Upload("bucket full".to_string()));
            }
            Ok(ObjectRef {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
        }

        async fn remove_file(&self, bucket: &str, path: &str) -> ContentResult<()> {
            self.removed
                .lock()
                .unwrap()
                .push(format!("{}/{}", bucket, path));
            Ok(())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("/storage/{}/{}", bucket, path)
        }
    }

    async fn wait_until_uploading(dashboard: &Mutex<Dashboard>) {
        for _ in 0..1000 {
            if dashboard.lock().await.editor().is_uploading() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("upload never started");
    }

    #[tokio::test]
    async fn test_save_then_refresh_lists_identical_item() {
        let store = MemoryStore::new();
        let mut dashboard = Dashboard::new(ContentType::Project);
        dashboard.open(&store, ContentType::Project).await.unwrap();

        dashboard.new_draft().unwrap();
        dashboard
            .change_field(DraftField::Title("Portfolio Engine".to_string()))
            .unwrap();
        dashboard
            .change_field(DraftField::Description("Static site builder".to_string()))
            .unwrap();
        dashboard
            .change_field(DraftField::tech_stack_from_list("Rust, Axum, Postgres"))
            .unwrap();
        let saved = dashboard.save(&store).await.unwrap();

        let view = dashboard.view();
        assert_eq!(view.mode, "listing");
        assert_eq!(view.items, vec![saved.clone()]);
        match saved {
            ContentItem::Project(project) => {
                assert_eq!(project.slug, "portfolio-engine");
                assert_eq!(project.tech_stack, vec!["Rust", "Axum", "Postgres"]);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_succeeds_when_refresh_fails() {
        let store = ReadFailingStore::new();
        let mut dashboard = Dashboard::new(ContentType::Blog);
        dashboard.open(&store, ContentType::Blog).await.unwrap();
        let before = dashboard.view().items;
        assert!(before.is_empty());

        dashboard.new_draft().unwrap();
        dashboard
            .change_field(DraftField::Title("Saved Anyway".to_string()))
            .unwrap();
        store.fail_reads(true);
        let saved = dashboard.save(&store).await.unwrap();

        let view = dashboard.view();
        assert_eq!(view.mode, "listing");
        assert_eq!(view.items, before);

        store.fail_reads(false);
        dashboard.refresh(&store).await.unwrap();
        assert_eq!(dashboard.view().items, vec![saved]);
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once_per_type() {
        let store = ReadFailingStore::new();
        let mut draft = Draft::empty(ContentType::Blog);
        draft.apply(DraftField::Title("Seeded".to_string())).unwrap();
        draft.set_slug("seeded".to_string());
        store.inner.insert(&draft).await.unwrap();

        let mut dashboard = Dashboard::default();
        assert!(!dashboard.view().loaded);
        dashboard.ensure_loaded(&store).await.unwrap();
        assert!(dashboard.view().loaded);
        assert_eq!(dashboard.view().items.len(), 1);

        // Already held: no read needed.
        store.fail_reads(true);
        dashboard.ensure_loaded(&store).await.unwrap();
        assert_eq!(dashboard.view().items.len(), 1);
    }

    #[tokio::test]
    async fn test_open_other_type_discards_draft() {
        let store = MemoryStore::new();
        let mut dashboard = Dashboard::default();
        dashboard.open(&store, ContentType::Blog).await.unwrap();
        dashboard.new_draft().unwrap();
        dashboard
            .change_field(DraftField::Title("Unsaved".to_string()))
            .unwrap();

        dashboard.open(&store, ContentType::Project).await.unwrap();
        let view = dashboard.view();
        assert_eq!(view.active, ContentType::Project);
        assert!(view.draft.is_none());
        assert_eq!(dashboard.list().content_type(), ContentType::Project);
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let mut dashboard = Dashboard::default();
        dashboard.open(&store, ContentType::Blog).await.unwrap();
        assert!(matches!(
            dashboard.edit(Uuid::new_v4()),
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_while_editing_is_rejected() {
        let store = MemoryStore::new();
        let mut dashboard = Dashboard::default();
        dashboard.new_draft().unwrap();
        let err = dashboard
            .delete(&store, Uuid::new_v4(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_concurrent_upload_rejected_without_losing_first_result() {
        let dashboard = Arc::new(Mutex::new(Dashboard::default()));
        let storage = Arc::new(GatedStorage::new(false));
        dashboard.lock().await.new_draft().unwrap();

        let first = {
            let dashboard = dashboard.clone();
            let storage = storage.clone();
            tokio::spawn(async move {
                upload_image(&dashboard, storage.as_ref(), "png", b"first").await
            })
        };
        wait_until_uploading(&dashboard).await;

        let second = upload_image(&dashboard, storage.as_ref(), "png", b"second").await;
        assert_eq!(second.unwrap_err(), ContentError::UploadInProgress);

        storage.release.notify_one();
        let url = first.await.unwrap().unwrap();
        assert!(url.starts_with("/storage/uploads/blogs/"));

        let dashboard = dashboard.lock().await;
        assert!(!dashboard.editor().is_uploading());
        assert_eq!(dashboard.editor().draft().unwrap().image(), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_failed_upload_clears_flag_and_keeps_draft() {
        let dashboard = Mutex::new(Dashboard::new(ContentType::Project));
        let storage = GatedStorage::new(true);
        dashboard.lock().await.new_draft().unwrap();
        let before = dashboard.lock().await.editor().draft().cloned();

        storage.release.notify_one();
        let err = upload_image(&dashboard, &storage, "jpg", b"bytes")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Upload(_)));

        let dashboard = dashboard.lock().await;
        assert!(!dashboard.editor().is_uploading());
        assert_eq!(dashboard.editor().draft().cloned(), before);
    }

    #[tokio::test]
    async fn test_upload_finishing_after_cancel_is_discarded() {
        let dashboard = Arc::new(Mutex::new(Dashboard::default()));
        let storage = Arc::new(GatedStorage::new(false));
        dashboard.lock().await.new_draft().unwrap();

        let pending = {
            let dashboard = dashboard.clone();
            let storage = storage.clone();
            tokio::spawn(async move {
                upload_image(&dashboard, storage.as_ref(), "gif", b"late").await
            })
        };
        wait_until_uploading(&dashboard).await;

        dashboard.lock().await.cancel();
        dashboard.lock().await.new_draft().unwrap();
        storage.release.notify_one();

        assert!(pending.await.unwrap().is_err());
        let dashboard = dashboard.lock().await;
        assert_eq!(dashboard.editor().draft().unwrap().image(), None);

        let removed = storage.removed.lock().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(removed[0].starts_with("uploads/blogs/"));
        assert!(removed[0].ends_with(".gif"));
    }
}
