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

use super::CallShape;
use crate::channel::{Message, StreamReceiver, StreamSender};
use crate::context::CallContext;
use crate::status::Status;
use futures_util::future::BoxFuture;

pub(crate) type UnaryFn<M> =
    Box<dyn Fn(CallContext, M) -> BoxFuture<'static, Result<M, Status>> + Send + Sync>;

pub(crate) type ServerStreamingFn<M> = Box<
    dyn Fn(CallContext, M, StreamSender<M>) -> BoxFuture<'static, Result<(), Status>>
        + Send
        + Sync,
>;

pub(crate) type ClientStreamingFn<M> = Box<
    dyn Fn(CallContext, StreamReceiver<M>) -> BoxFuture<'static, Result<M, Status>> + Send + Sync,
>;

pub(crate) type BidiStreamingFn<M> = Box<
    dyn Fn(CallContext, StreamReceiver<M>, StreamSender<M>) -> BoxFuture<'static, Result<(), Status>>
        + Send
        + Sync,
>;

/// A registered handler, one variant per call shape.
pub(crate) enum MethodHandler<M: Message> {
    Unary(UnaryFn<M>),
    ServerStreaming(ServerStreamingFn<M>),
    ClientStreaming(ClientStreamingFn<M>),
    Bidirectional(BidiStreamingFn<M>),
}

impl<M: Message> MethodHandler<M> {
    pub(crate) const fn shape(&self) -> CallShape {
        match self {
            Self::Unary(_) => CallShape::Unary,
            Self::ServerStreaming(_) => CallShape::ServerStreaming,
            Self::ClientStreaming(_) => CallShape::ClientStreaming,
            Self::Bidirectional(_) => CallShape::Bidirectional,
        }
    }
}
