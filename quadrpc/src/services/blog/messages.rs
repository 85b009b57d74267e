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

//! Blog service messages.

use crate::channel::Message;

/// `blog.BlogService/CreateBlog` (unary).
pub const CREATE_BLOG: &str = "blog.BlogService/CreateBlog";
/// `blog.BlogService/ReadBlog` (unary).
pub const READ_BLOG: &str = "blog.BlogService/ReadBlog";
/// `blog.BlogService/UpdateBlog` (unary).
pub const UPDATE_BLOG: &str = "blog.BlogService/UpdateBlog";
/// `blog.BlogService/DeleteBlog` (unary).
pub const DELETE_BLOG: &str = "blog.BlogService/DeleteBlog";
/// `blog.BlogService/ListBlog` (server streaming).
pub const LIST_BLOG: &str = "blog.BlogService/ListBlog";

/// A blog post as it travels on the wire.
///
/// `id` is the textual form of the record id. It is ignored by
/// `CreateBlog`, which assigns a fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blog {
    /// Record id.
    pub id: String,
    /// Author identifier.
    pub author_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
}

impl Blog {
    /// Creates a post without an id, as sent to `CreateBlog`.
    pub fn draft(
        author_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            author_id: author_id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Returns a copy carrying `id`.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Every message exchanged by the blog service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlogProtocol {
    /// Request to call `CreateBlog`.
    CreateBlogRequest {
        /// The post to store; `id` is ignored.
        blog: Blog,
    },
    /// Response from `CreateBlog`.
    CreateBlogResponse {
        /// The stored post with its assigned id.
        blog: Blog,
    },
    /// Request to call `ReadBlog`.
    ReadBlogRequest {
        /// Id of the post to read.
        blog_id: String,
    },
    /// Response from `ReadBlog`.
    ReadBlogResponse {
        /// The stored post.
        blog: Blog,
    },
    /// Request to call `UpdateBlog`.
    UpdateBlogRequest {
        /// Replacement fields; `id` selects the post.
        blog: Blog,
    },
    /// Response from `UpdateBlog`.
    UpdateBlogResponse {
        /// The post after the update.
        blog: Blog,
    },
    /// Request to call `DeleteBlog`.
    DeleteBlogRequest {
        /// Id of the post to delete.
        blog_id: String,
    },
    /// Response from `DeleteBlog`.
    DeleteBlogResponse {
        /// Id of the deleted post.
        blog_id: String,
    },
    /// Request to call `ListBlog`.
    ListBlogRequest,
    /// One post from `ListBlog`.
    ListBlogResponse {
        /// A stored post.
        blog: Blog,
    },
}

impl BlogProtocol {
    /// Extracts the post carried by a response, if any.
    #[must_use]
    pub fn into_blog(self) -> Option<Blog> {
        match self {
            Self::CreateBlogResponse { blog }
            | Self::ReadBlogResponse { blog }
            | Self::UpdateBlogResponse { blog }
            | Self::ListBlogResponse { blog } => Some(blog),
            _ => None,
        }
    }
}

impl Message for BlogProtocol {
    fn method_name(&self) -> &'static str {
        match self {
            Self::CreateBlogRequest { .. } | Self::CreateBlogResponse { .. } => CREATE_BLOG,
            Self::ReadBlogRequest { .. } | Self::ReadBlogResponse { .. } => READ_BLOG,
            Self::UpdateBlogRequest { .. } | Self::UpdateBlogResponse { .. } => UPDATE_BLOG,
            Self::DeleteBlogRequest { .. } | Self::DeleteBlogResponse { .. } => DELETE_BLOG,
            Self::ListBlogRequest | Self::ListBlogResponse { .. } => LIST_BLOG,
        }
    }

    fn is_request(&self) -> bool {
        matches!(
            self,
            Self::CreateBlogRequest { .. }
                | Self::ReadBlogRequest { .. }
                | Self::UpdateBlogRequest { .. }
                | Self::DeleteBlogRequest { .. }
                | Self::ListBlogRequest
        )
    }
}
