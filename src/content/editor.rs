//! Single-draft editor: list/edit mode, the in-progress draft and the
//! image-upload guard for one content type at a time.

use serde::Serialize;

use super::slug::derive_slug;
use super::{ContentItem, ContentType, Draft, DraftField};
use crate::error::{ContentError, ContentResult};
use crate::store::ContentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "draft", rename_all = "lowercase")]
pub enum EditorMode {
    Listing,
    Editing(Draft),
}

/// Issued by [`ContentEditor::begin_upload`]; only the ticket for the
/// current draft may write the image field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
    content_type: ContentType,
}

impl UploadTicket {
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }
}

#[derive(Debug, Clone)]
pub struct ContentEditor {
    content_type: ContentType,
    mode: EditorMode,
    uploading: bool,
    /// Bumped whenever the draft slot is replaced or emptied.
    generation: u64,
}

impl ContentEditor {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            mode: EditorMode::Listing,
            uploading: false,
            generation: 0,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.mode {
            EditorMode::Editing(draft) => Some(draft),
            EditorMode::Listing => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Editing(_))
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    fn replace_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
        self.uploading = false;
        self.generation += 1;
    }

    fn editing_draft(&mut self) -> ContentResult<&mut Draft> {
        match &mut self.mode {
            EditorMode::Editing(draft) => Ok(draft),
            EditorMode::Listing => Err(ContentError::InvalidTransition("no draft is open")),
        }
    }

    /// Changes the active content type. Any unsaved draft is discarded.
    pub fn switch_type(&mut self, content_type: ContentType) {
        if self.is_editing() {
            tracing::debug!(from = %self.content_type, to = %content_type, "discarding draft on type switch");
        }
        self.content_type = content_type;
        self.replace_mode(EditorMode::Listing);
    }

    pub fn new_draft(&mut self) -> ContentResult<&Draft> {
        if self.is_editing() {
            return Err(ContentError::InvalidTransition(
                "finish or cancel the open draft first",
            ));
        }
        self.replace_mode(EditorMode::Editing(Draft::empty(self.content_type)));
        self.editing_draft().map(|draft| &*draft)
    }

    pub fn select_existing(&mut self, item: &ContentItem) -> ContentResult<&Draft> {
        if self.is_editing() {
            return Err(ContentError::InvalidTransition(
                "finish or cancel the open draft first",
            ));
        }
        if item.content_type() != self.content_type {
            return Err(ContentError::Validation(format!(
                "cannot edit {} while managing {}",
                item.content_type(),
                self.content_type
            )));
        }
        self.replace_mode(EditorMode::Editing(Draft::from_item(item)));
        self.editing_draft().map(|draft| &*draft)
    }

    /// Pure field update, no side effects and no eager validation.
    pub fn change_field(&mut self, change: DraftField) -> ContentResult<&Draft> {
        let draft = self.editing_draft()?;
        draft.apply(change)?;
        Ok(&*draft)
    }

    /// Discards the draft unconditionally.
    pub fn cancel(&mut self) {
        if self.is_editing() {
            self.replace_mode(EditorMode::Listing);
        }
    }

    /// The record a save would send: the draft with its slug re-derived
    /// from the title. The open draft itself is left untouched.
    pub fn prepare_save(&self) -> ContentResult<Draft> {
        let draft = self
            .draft()
            .ok_or(ContentError::InvalidTransition("no draft is open"))?;
        if self.uploading {
            return Err(ContentError::UploadInProgress);
        }

        let slug = derive_slug(draft.title().unwrap_or_default());
        if slug.is_empty() {
            return Err(ContentError::Validation(
                "title must contain at least one letter or digit".to_string(),
            ));
        }

        let mut record = draft.clone();
        record.set_slug(slug);
        Ok(record)
    }

    /// Inserts (no id) or overwrites (has id) the draft. On success the
    /// editor returns to listing; on failure it stays in editing with the
    /// draft intact.
    pub async fn save(&mut self, store: &dyn ContentStore) -> ContentResult<ContentItem> {
        let record = self.prepare_save()?;

        let result = match record.id() {
            Some(id) => store.update(id, &record).await,
            None => store.insert(&record).await,
        };

        match result {
            Ok(item) => {
                tracing::info!(
                    content_type = %item.content_type(),
                    id = %item.id(),
                    slug = %item.slug(),
                    created = record.id().is_none(),
                    "content saved"
                );
                self.replace_mode(EditorMode::Listing);
                Ok(item)
            }
            Err(e) => {
                tracing::warn!(
                    content_type = %self.content_type,
                    slug = record.slug().unwrap_or_default(),
                    error = %e,
                    "save failed; draft kept"
                );
                Err(e)
            }
        }
    }

    /// Marks an upload as in flight. At most one per draft.
    pub fn begin_upload(&mut self) -> ContentResult<UploadTicket> {
        if !self.is_editing() {
            return Err(ContentError::InvalidTransition("no draft is open"));
        }
        if self.uploading {
            return Err(ContentError::UploadInProgress);
        }
        self.uploading = true;
        Ok(UploadTicket {
            generation: self.generation,
            content_type: self.content_type,
        })
    }

    fn is_current(&self, ticket: UploadTicket) -> bool {
        self.uploading && ticket.generation == self.generation
    }

    /// Writes the uploaded reference into the draft's image field. Results
    /// for a draft that has since been replaced are discarded.
    pub fn complete_upload(&mut self, ticket: UploadTicket, reference: String) -> ContentResult<()> {
        if !self.is_current(ticket) {
            tracing::debug!(reference = %reference, "discarding stale upload result");
            return Err(ContentError::InvalidTransition(
                "the draft this upload belonged to is no longer open",
            ));
        }
        self.uploading = false;
        self.editing_draft()?.set_image(reference);
        Ok(())
    }

    /// Clears the in-flight flag; the draft and any prior image stay as they were.
    pub fn fail_upload(&mut self, ticket: UploadTicket) {
        if self.is_current(ticket) {
            self.uploading = false;
        }
    }
}
