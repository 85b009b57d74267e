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

//! The blog service: CRUD over an injected [`BlogStore`].
//!
//! Ids travel as text and are parsed before the store is consulted, so a
//! malformed id is `INVALID_ARGUMENT` and an unknown one is `NOT_FOUND`.
//!
//! # Example
//!
//! ```rust
//! use quadrpc::{CallOptions, ClientConfig, Connection, Server};
//! use quadrpc::services::blog::{Blog, BlogClient, InMemoryBlogStore, blog_dispatcher};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), quadrpc::QuadrpcError> {
//! let server = Server::new(blog_dispatcher(Arc::new(InMemoryBlogStore::new())));
//! let connection = Connection::open(server, ClientConfig::default())?;
//! let blogs = BlogClient::new(connection.client().clone());
//!
//! let created = blogs
//!     .create_blog(Blog::draft("jack", "Title", "Content"), CallOptions::new())
//!     .await?;
//! let read = blogs.read_blog(&created.id, CallOptions::new()).await?;
//! assert_eq!(read, created);
//! # Ok(())
//! # }
//! ```

mod client;
mod messages;
mod server;
mod store;

pub use client::{BlogClient, BlogListing};
pub use messages::{Blog, BlogProtocol, CREATE_BLOG, DELETE_BLOG, LIST_BLOG, READ_BLOG, UPDATE_BLOG};
pub use server::blog_dispatcher;
pub use store::{BlogFields, BlogId, BlogRecord, BlogStore, InMemoryBlogStore, StoreError};
