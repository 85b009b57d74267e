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


//! # Blog Service Example
//!
//! Runs the blog service against the in-memory store and walks one post
//! through its whole life: create, read, update, list and delete. Finishes
//! by reading the deleted post to show the `NOT_FOUND` status.
//!
//! ## Running This Example
//!
//! ```bash
//! cargo run --example blog
//! ```

use futures_util::StreamExt;
use quadrpc::services::blog::{Blog, BlogClient, InMemoryBlogStore, blog_dispatcher};
use quadrpc::{CallOptions, ClientConfig, Code, Connection, Server};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Blog Service Example ===\n");

    let store = Arc::new(InMemoryBlogStore::new());
    let server = Server::new(blog_dispatcher(store.clone()));
    let connection = Connection::open(
        server,
        ClientConfig::default().with_default_timeout(Some(Duration::from_secs(5))),
    )?;
    let blog = BlogClient::new(connection.client().clone());

    println!("1. Create");
    let created = blog
        .create_blog(
            Blog::draft("jack", "My First Blog", "content of first blog"),
            CallOptions::new(),
        )
        .await?;
    println!("   {created:?}\n");

    blog.create_blog(
        Blog::draft("rose", "A Second Blog", "content of second blog"),
        CallOptions::new(),
    )
    .await?;

    println!("2. Read");
    let read = blog.read_blog(&created.id, CallOptions::new()).await?;
    println!("   {read:?}\n");

    println!("3. Update");
    let updated = blog
        .update_blog(
            Blog::draft("jack", "My First Blog(edited)", "content of first updated blog(edited)")
                .with_id(created.id.clone()),
            CallOptions::new(),
        )
        .await?;
    println!("   {updated:?}\n");

    println!("4. List");
    let mut listing = std::pin::pin!(blog.list_blog(CallOptions::new()).await?.into_stream());
    while let Some(post) = listing.next().await {
        let post = post?;
        println!("   {} by {}: {}", post.id, post.author_id, post.title);
    }
    println!();

    println!("5. Delete");
    let deleted = blog.delete_blog(&created.id, CallOptions::new()).await?;
    println!("   deleted {deleted}, {} post(s) left\n", store.len());

    println!("6. Read after delete");
    match blog.read_blog(&created.id, CallOptions::new()).await {
        Err(error) if error.code() == Code::NotFound => println!("   {error}"),
        Err(error) => return Err(error.into()),
        Ok(post) => return Err(format!("post {} survived its deletion", post.id).into()),
    }

    connection.shutdown().await;
    println!("\n=== Example Complete ===");
    Ok(())
}
