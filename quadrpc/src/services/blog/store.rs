//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Persistence collaborator for the blog service.

use super::messages::Blog;
use crate::status::Status;
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlogId(Uuid);

impl BlogId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the textual form of an id.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_ARGUMENT` if `id` is not a valid id. The store is
    /// never consulted for malformed ids.
    pub fn parse(id: &str) -> Result<Self, Status> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| Status::invalid_argument(format!("cannot parse blog id {id:?}")))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BlogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// The mutable part of a blog post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFields {
    /// Author identifier.
    pub author_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
}

impl From<Blog> for BlogFields {
    fn from(blog: Blog) -> Self {
        Self {
            author_id: blog.author_id,
            title: blog.title,
            content: blog.content,
        }
    }
}

/// A stored blog post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogRecord {
    /// Record id.
    pub id: BlogId,
    /// Stored fields.
    pub fields: BlogFields,
}

impl From<BlogRecord> for Blog {
    fn from(record: BlogRecord) -> Self {
        Self {
            id: record.id.to_string(),
            author_id: record.fields.author_id,
            title: record.fields.title,
            content: record.fields.content,
        }
    }
}

/// Failures reported by a [`BlogStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record has the given id.
    #[error("blog {id} not found")]
    NotFound {
        /// The id that was looked up.
        id: BlogId,
    },

    /// The backing store failed.
    #[error("store backend failed: {0}")]
    Backend(String),
}

impl From<StoreError> for Status {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => Status::not_found(error.to_string()),
            StoreError::Backend(_) => Status::internal(error.to_string()),
        }
    }
}

/// Storage for blog posts.
///
/// Implementations are shared between concurrent calls and must handle
/// their own synchronization.
#[async_trait]
pub trait BlogStore: Send + Sync + fmt::Debug + 'static {
    /// Stores a new post under a fresh id.
    async fn create(&self, fields: BlogFields) -> Result<BlogRecord, StoreError>;

    /// Reads a post.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no post has `id`.
    async fn read(&self, id: BlogId) -> Result<BlogRecord, StoreError>;

    /// Replaces every field of an existing post.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no post has `id`.
    async fn update(&self, id: BlogId, fields: BlogFields) -> Result<BlogRecord, StoreError>;

    /// Deletes a post.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no post has `id`.
    async fn delete(&self, id: BlogId) -> Result<(), StoreError>;

    /// Returns every post, in insertion order, as a lazy sequence.
    fn list(&self) -> BoxStream<'static, Result<BlogRecord, StoreError>>;
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<BlogId, BlogFields>,
    order: Vec<BlogId>,
}

/// A [`BlogStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBlogStore {
    records: RwLock<Records>,
}

impl InMemoryBlogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored posts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().order.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlogStore for InMemoryBlogStore {
    async fn create(&self, fields: BlogFields) -> Result<BlogRecord, StoreError> {
        let id = BlogId::new();
        let mut records = self.records.write();
        records.by_id.insert(id, fields.clone());
        records.order.push(id);
        Ok(BlogRecord { id, fields })
    }

    async fn read(&self, id: BlogId) -> Result<BlogRecord, StoreError> {
        self.records
            .read()
            .by_id
            .get(&id)
            .map(|fields| BlogRecord {
                id,
                fields: fields.clone(),
            })
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, id: BlogId, fields: BlogFields) -> Result<BlogRecord, StoreError> {
        let mut records = self.records.write();
        let stored = records
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;
        *stored = fields.clone();
        Ok(BlogRecord { id, fields })
    }

    async fn delete(&self, id: BlogId) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.by_id.remove(&id).is_none() {
            return Err(StoreError::NotFound { id });
        }
        records.order.retain(|stored| *stored != id);
        Ok(())
    }

    fn list(&self) -> BoxStream<'static, Result<BlogRecord, StoreError>> {
        // Snapshot under the lock; records are handed out one poll at a time.
        let snapshot: Vec<_> = {
            let records = self.records.read();
            records
                .order
                .iter()
                .filter_map(|id| {
                    records.by_id.get(id).map(|fields| BlogRecord {
                        id: *id,
                        fields: fields.clone(),
                    })
                })
                .collect()
        };
        futures_util::stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }
}
