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

//! Blog service handlers.

use super::messages::{BlogProtocol, CREATE_BLOG, DELETE_BLOG, LIST_BLOG, READ_BLOG, UPDATE_BLOG};
use super::store::{BlogFields, BlogId, BlogStore};
use crate::channel::{Message, StreamSender};
use crate::context::CallContext;
use crate::dispatch::Dispatcher;
use crate::status::Status;
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a dispatcher that serves the blog methods from `store`.
///
/// The store is the only state shared between calls.
pub fn blog_dispatcher(store: Arc<dyn BlogStore>) -> Dispatcher<BlogProtocol> {
    let create = Arc::clone(&store);
    let read = Arc::clone(&store);
    let update = Arc::clone(&store);
    let delete = Arc::clone(&store);
    let list = store;

    Dispatcher::builder()
        .unary(CREATE_BLOG, move |ctx, request| {
            create_blog(Arc::clone(&create), ctx, request)
        })
        .unary(READ_BLOG, move |ctx, request| {
            read_blog(Arc::clone(&read), ctx, request)
        })
        .unary(UPDATE_BLOG, move |ctx, request| {
            update_blog(Arc::clone(&update), ctx, request)
        })
        .unary(DELETE_BLOG, move |ctx, request| {
            delete_blog(Arc::clone(&delete), ctx, request)
        })
        .server_streaming(LIST_BLOG, move |ctx, request, sender| {
            list_blog(Arc::clone(&list), ctx, request, sender)
        })
        .build()
}

async fn create_blog(
    store: Arc<dyn BlogStore>,
    ctx: CallContext,
    request: BlogProtocol,
) -> Result<BlogProtocol, Status> {
    let blog = match request {
        BlogProtocol::CreateBlogRequest { blog } => blog,
        other => return Err(unexpected(CREATE_BLOG, &other)),
    };
    ctx.check()?;

    let record = store.create(BlogFields::from(blog)).await?;
    info!(blog_id = %record.id, "blog created");
    Ok(BlogProtocol::CreateBlogResponse {
        blog: record.into(),
    })
}

async fn read_blog(
    store: Arc<dyn BlogStore>,
    ctx: CallContext,
    request: BlogProtocol,
) -> Result<BlogProtocol, Status> {
    let blog_id = match request {
        BlogProtocol::ReadBlogRequest { blog_id } => blog_id,
        other => return Err(unexpected(READ_BLOG, &other)),
    };
    let id = BlogId::parse(&blog_id)?;
    ctx.check()?;

    let record = store.read(id).await?;
    Ok(BlogProtocol::ReadBlogResponse {
        blog: record.into(),
    })
}

async fn update_blog(
    store: Arc<dyn BlogStore>,
    ctx: CallContext,
    request: BlogProtocol,
) -> Result<BlogProtocol, Status> {
    let blog = match request {
        BlogProtocol::UpdateBlogRequest { blog } => blog,
        other => return Err(unexpected(UPDATE_BLOG, &other)),
    };
    let id = BlogId::parse(&blog.id)?;
    ctx.check()?;

    let record = store.update(id, BlogFields::from(blog)).await?;
    info!(blog_id = %record.id, "blog updated");
    Ok(BlogProtocol::UpdateBlogResponse {
        blog: record.into(),
    })
}

async fn delete_blog(
    store: Arc<dyn BlogStore>,
    ctx: CallContext,
    request: BlogProtocol,
) -> Result<BlogProtocol, Status> {
    let blog_id = match request {
        BlogProtocol::DeleteBlogRequest { blog_id } => blog_id,
        other => return Err(unexpected(DELETE_BLOG, &other)),
    };
    let id = BlogId::parse(&blog_id)?;
    ctx.check()?;

    store.delete(id).await?;
    info!(blog_id = %id, "blog deleted");
    Ok(BlogProtocol::DeleteBlogResponse { blog_id })
}

async fn list_blog(
    store: Arc<dyn BlogStore>,
    ctx: CallContext,
    request: BlogProtocol,
    mut sender: StreamSender<BlogProtocol>,
) -> Result<(), Status> {
    if !matches!(request, BlogProtocol::ListBlogRequest) {
        return Err(unexpected(LIST_BLOG, &request));
    }

    let mut records = store.list();
    let mut sent = 0_usize;
    while let Some(record) = records.next().await {
        ctx.check()?;
        let record = record?;
        sender
            .send(BlogProtocol::ListBlogResponse {
                blog: record.into(),
            })
            .await?;
        sent += 1;
    }
    debug!(sent, "blog listing finished");
    Ok(())
}

fn unexpected(method: &'static str, message: &BlogProtocol) -> Status {
    Status::invalid_argument(format!(
        "{method} cannot accept {} message",
        message.method_name()
    ))
}
