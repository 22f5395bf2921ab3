//! Content Store capability surface: record queries and commands, object
//! storage and the admin auth capability.

pub mod auth;
pub mod memory;
pub mod objects;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::content::{ContentItem, ContentType, Draft, ItemId, Profile};
use crate::error::ContentResult;

/// Public bucket that holds every uploaded image.
pub const UPLOAD_BUCKET: &str = "uploads";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderField {
    CreatedAt,
    /// Falls back to `createdAt` for collections without a publish time.
    PublishedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderBy {
    pub fn newest_first(field: OrderField) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    Id,
    Slug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: LookupField,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub collection: ContentType,
    pub filter: Option<Filter>,
    pub order_by: OrderBy,
    pub limit: Option<usize>,
}

impl ContentQuery {
    /// Every item of the collection, newest first by `field`.
    pub fn all(collection: ContentType, field: OrderField) -> Self {
        Self {
            collection,
            filter: None,
            order_by: OrderBy::newest_first(field),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, field: LookupField, value: impl Into<String>) -> Self {
        self.filter = Some(Filter {
            field,
            value: value.into(),
        });
        self
    }
}

/// Location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub path: String,
}

/// Record persistence. The store assigns `id` and `createdAt`, enforces
/// slug uniqueness per collection and rejects missing required fields.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn query(&self, query: &ContentQuery) -> ContentResult<Vec<ContentItem>>;

    async fn get_one(
        &self,
        collection: ContentType,
        field: LookupField,
        value: &str,
    ) -> ContentResult<Option<ContentItem>>;

    /// Inserts into the draft's collection; any `id` on the draft is ignored.
    async fn insert(&self, record: &Draft) -> ContentResult<ContentItem>;

    /// Full overwrite of the item with `id`.
    async fn update(&self, id: ItemId, record: &Draft) -> ContentResult<ContentItem>;

    async fn delete(&self, collection: ContentType, id: ItemId) -> ContentResult<()>;

    async fn profile(&self) -> ContentResult<Option<Profile>>;

    /// Round-trip latency of a trivial request.
    async fn health_check(&self) -> ContentResult<Duration>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload_file(&self, bucket: &str, path: &str, bytes: &[u8])
        -> ContentResult<ObjectRef>;

    async fn remove_file(&self, bucket: &str, path: &str) -> ContentResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
