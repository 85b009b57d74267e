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

//! Typed caller for the blog service.

use super::messages::{Blog, BlogProtocol, CREATE_BLOG, DELETE_BLOG, LIST_BLOG, READ_BLOG, UPDATE_BLOG};
use crate::channel::Message;
use crate::client::{CallOptions, Client, ResponseStream};
use crate::error::QuadrpcError;
use crate::status::Status;
use futures_util::Stream;

/// Client stub for the blog service.
#[derive(Debug, Clone)]
pub struct BlogClient {
    client: Client<BlogProtocol>,
}

impl BlogClient {
    /// Wraps a connected client.
    #[must_use]
    pub const fn new(client: Client<BlogProtocol>) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn inner(&self) -> &Client<BlogProtocol> {
        &self.client
    }

    /// Stores `blog` and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// See [`Client::unary`].
    pub async fn create_blog(&self, blog: Blog, options: CallOptions) -> Result<Blog, QuadrpcError> {
        let response = self
            .client
            .unary(CREATE_BLOG, BlogProtocol::CreateBlogRequest { blog }, options)
            .await?;
        expect_blog(response, CREATE_BLOG)
    }

    /// Reads one post.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a malformed id, `NOT_FOUND` for an unknown one.
    pub async fn read_blog(&self, blog_id: &str, options: CallOptions) -> Result<Blog, QuadrpcError> {
        let response = self
            .client
            .unary(
                READ_BLOG,
                BlogProtocol::ReadBlogRequest {
                    blog_id: blog_id.to_owned(),
                },
                options,
            )
            .await?;
        expect_blog(response, READ_BLOG)
    }

    /// Replaces the author, title and content of the post `blog.id`.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a malformed id, `NOT_FOUND` for an unknown one.
    pub async fn update_blog(&self, blog: Blog, options: CallOptions) -> Result<Blog, QuadrpcError> {
        let response = self
            .client
            .unary(UPDATE_BLOG, BlogProtocol::UpdateBlogRequest { blog }, options)
            .await?;
        expect_blog(response, UPDATE_BLOG)
    }

    /// Deletes one post and returns its id.
    ///
    /// # Errors
    ///
    /// `INVALID_ARGUMENT` for a malformed id, `NOT_FOUND` for an unknown one.
    pub async fn delete_blog(&self, blog_id: &str, options: CallOptions) -> Result<String, QuadrpcError> {
        let response = self
            .client
            .unary(
                DELETE_BLOG,
                BlogProtocol::DeleteBlogRequest {
                    blog_id: blog_id.to_owned(),
                },
                options,
            )
            .await?;
        match response {
            BlogProtocol::DeleteBlogResponse { blog_id } => Ok(blog_id),
            other => Err(violation(DELETE_BLOG, &other)),
        }
    }

    /// Lists every post.
    ///
    /// # Errors
    ///
    /// See [`Client::server_streaming`].
    pub async fn list_blog(&self, options: CallOptions) -> Result<BlogListing, QuadrpcError> {
        let responses = self
            .client
            .server_streaming(LIST_BLOG, BlogProtocol::ListBlogRequest, options)
            .await?;
        Ok(BlogListing { responses })
    }
}

/// Posts streamed by `ListBlog`.
#[derive(Debug)]
pub struct BlogListing {
    responses: ResponseStream<BlogProtocol>,
}

impl BlogListing {
    /// Receives the next post; `Ok(None)` is the end of the listing.
    ///
    /// # Errors
    ///
    /// See [`ResponseStream::recv`].
    pub async fn recv(&mut self) -> Result<Option<Blog>, QuadrpcError> {
        match self.responses.recv().await? {
            Some(response) => expect_blog(response, LIST_BLOG).map(Some),
            None => Ok(None),
        }
    }

    /// Reads the rest of the listing.
    ///
    /// # Errors
    ///
    /// The first error encountered.
    pub async fn collect(mut self) -> Result<Vec<Blog>, QuadrpcError> {
        let mut blogs = Vec::new();
        while let Some(blog) = self.recv().await? {
            blogs.push(blog);
        }
        Ok(blogs)
    }

    /// Turns the listing into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Blog, QuadrpcError>> + Send + 'static {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut listing = state?;
            match listing.recv().await {
                Ok(Some(blog)) => Some((Ok(blog), Some(listing))),
                Ok(None) => None,
                Err(error) => Some((Err(error), None)),
            }
        })
    }
}

fn expect_blog(response: BlogProtocol, method: &'static str) -> Result<Blog, QuadrpcError> {
    if response.method_name() != method {
        return Err(violation(method, &response));
    }
    let received = response.method_name();
    response
        .into_blog()
        .ok_or_else(|| violation_from(method, received))
}

fn violation(method: &'static str, response: &BlogProtocol) -> QuadrpcError {
    violation_from(method, response.method_name())
}

fn violation_from(method: &'static str, received: &'static str) -> QuadrpcError {
    QuadrpcError::from(Status::internal(format!(
        "protocol violation: expected {method} response, got {received} message"
    )))
}
