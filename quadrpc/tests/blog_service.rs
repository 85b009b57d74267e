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

//! End-to-end tests of the blog service over an in-process connection.

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use quadrpc::services::blog::{
    Blog, BlogClient, BlogFields, BlogId, BlogProtocol, BlogRecord, BlogStore, InMemoryBlogStore,
    StoreError, blog_dispatcher,
};
use quadrpc::{CallOptions, ClientConfig, Code, Connection, Server};
use std::sync::Arc;

fn connect(store: Arc<dyn BlogStore>) -> (BlogClient, Connection<BlogProtocol>) {
    let server = Server::new(blog_dispatcher(store));
    let connection = Connection::open(server, ClientConfig::default()).unwrap();
    (BlogClient::new(connection.client().clone()), connection)
}

fn connect_in_memory() -> (BlogClient, Arc<InMemoryBlogStore>, Connection<BlogProtocol>) {
    let store = Arc::new(InMemoryBlogStore::new());
    let (blogs, connection) = connect(Arc::clone(&store) as Arc<dyn BlogStore>);
    (blogs, store, connection)
}

fn opts() -> CallOptions {
    CallOptions::new()
}

#[tokio::test]
async fn test_create_then_read_round_trip() {
    let (blogs, store, connection) = connect_in_memory();

    let created = blogs
        .create_blog(Blog::draft("jack", "Unsinkable", "Or so they said"), opts())
        .await
        .unwrap();
    assert!(BlogId::parse(&created.id).is_ok());
    assert_eq!(created.author_id, "jack");
    assert_eq!(store.len(), 1);

    let read = blogs.read_blog(&created.id, opts()).await.unwrap();
    assert_eq!(read, created);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_create_ignores_supplied_id() {
    let (blogs, _store, connection) = connect_in_memory();

    let created = blogs
        .create_blog(Blog::draft("rose", "t", "c").with_id("chosen-by-caller"), opts())
        .await
        .unwrap();
    assert_ne!(created.id, "chosen-by-caller");

    connection.shutdown().await;
}

#[tokio::test]
async fn test_update_replaces_every_field() {
    let (blogs, _store, connection) = connect_in_memory();

    let created = blogs
        .create_blog(Blog::draft("jack", "Draft", "First version"), opts())
        .await
        .unwrap();
    let replacement = Blog::draft("rose", "Final", "Second version").with_id(created.id.clone());
    let updated = blogs.update_blog(replacement.clone(), opts()).await.unwrap();
    assert_eq!(updated, replacement);

    let read = blogs.read_blog(&created.id, opts()).await.unwrap();
    assert_eq!(read, replacement);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
    let (blogs, store, connection) = connect_in_memory();

    let created = blogs
        .create_blog(Blog::draft("cal", "Gone", "Soon"), opts())
        .await
        .unwrap();
    let deleted = blogs.delete_blog(&created.id, opts()).await.unwrap();
    assert_eq!(deleted, created.id);
    assert!(store.is_empty());

    let error = blogs.read_blog(&created.id, opts()).await.unwrap_err();
    assert_eq!(error.code(), Code::NotFound);
    let error = blogs.delete_blog(&created.id, opts()).await.unwrap_err();
    assert_eq!(error.code(), Code::NotFound);
    let error = blogs
        .update_blog(Blog::draft("a", "b", "c").with_id(created.id), opts())
        .await
        .unwrap_err();
    assert_eq!(error.code(), Code::NotFound);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_malformed_ids_are_invalid_argument() {
    let (blogs, _store, connection) = connect_in_memory();

    let error = blogs.read_blog("5f2b-nope", opts()).await.unwrap_err();
    assert_eq!(error.code(), Code::InvalidArgument);
    let error = blogs.delete_blog("", opts()).await.unwrap_err();
    assert_eq!(error.code(), Code::InvalidArgument);
    let error = blogs
        .update_blog(Blog::draft("a", "b", "c").with_id("xyz"), opts())
        .await
        .unwrap_err();
    assert_eq!(error.code(), Code::InvalidArgument);

    connection.shutdown().await;
}

#[tokio::test]
async fn test_list_streams_every_post_in_order() {
    let (blogs, _store, connection) = connect_in_memory();

    assert!(blogs.list_blog(opts()).await.unwrap().collect().await.unwrap().is_empty());

    let mut created = Vec::new();
    for title in ["one", "two", "three"] {
        created.push(
            blogs
                .create_blog(Blog::draft("jack", title, "body"), opts())
                .await
                .unwrap(),
        );
    }

    let listed: Vec<_> = blogs
        .list_blog(opts())
        .await
        .unwrap()
        .into_stream()
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(listed, created);

    connection.shutdown().await;
}

/// A store whose backend is down.
#[derive(Debug)]
struct BrokenStore;

#[async_trait]
impl BlogStore for BrokenStore {
    async fn create(&self, _fields: BlogFields) -> Result<BlogRecord, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn read(&self, _id: BlogId) -> Result<BlogRecord, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn update(&self, _id: BlogId, _fields: BlogFields) -> Result<BlogRecord, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn delete(&self, _id: BlogId) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn list(&self) -> BoxStream<'static, Result<BlogRecord, StoreError>> {
        let first = BlogRecord {
            id: BlogId::new(),
            fields: BlogFields {
                author_id: "jack".into(),
                title: "cached".into(),
                content: String::new(),
            },
        };
        futures_util::stream::iter([
            Ok(first),
            Err(StoreError::Backend("cursor lost".into())),
        ])
        .boxed()
    }
}

#[tokio::test]
async fn test_backend_failures_are_internal() {
    let (blogs, connection) = connect(Arc::new(BrokenStore));

    let error = blogs
        .create_blog(Blog::draft("jack", "t", "c"), opts())
        .await
        .unwrap_err();
    assert_eq!(error.code(), Code::Internal);

    // A failure mid-listing ends the stream with a trailer, not a clean end.
    let mut listing = blogs.list_blog(opts()).await.unwrap();
    assert_eq!(listing.recv().await.unwrap().unwrap().title, "cached");
    let error = listing.recv().await.unwrap_err();
    assert_eq!(error.code(), Code::Internal);
    assert!(error.to_string().contains("cursor lost"));

    connection.shutdown().await;
}
