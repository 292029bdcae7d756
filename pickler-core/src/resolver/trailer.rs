// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Deferred work that must run after the current object graph is complete.
//!
//! A trailer is queued while a value is being written or read and runs once
//! the outermost [`run_with_trailers`] call finishes its action. Trailers run
//! last-in first-out, including any queued while the queue is being flushed.
//! Static initializers run after every trailer, in the order they were
//! registered, each exactly once.

use crate::error::Error;
use std::mem;

pub type Trailer<C> = Box<dyn FnOnce(&mut C) -> Result<(), Error>>;

pub struct TrailerQueue<C> {
    trailers: Vec<Trailer<C>>,
    static_inits: Vec<Trailer<C>>,
    depth: usize,
}

impl<C> Default for TrailerQueue<C> {
    fn default() -> Self {
        TrailerQueue {
            trailers: Vec::new(),
            static_inits: Vec::new(),
            depth: 0,
        }
    }
}

impl<C> TrailerQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `trailer`, and `static_init` if given. Nothing runs here.
    pub fn push_trailer(&mut self, trailer: Trailer<C>, static_init: Option<Trailer<C>>) {
        self.trailers.push(trailer);
        if let Some(init) = static_init {
            self.static_inits.push(init);
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn pending(&self) -> usize {
        self.trailers.len() + self.static_inits.len()
    }

    pub fn clear(&mut self) {
        self.trailers.clear();
        self.static_inits.clear();
        self.depth = 0;
    }
}

/// A context that owns a trailer queue over itself.
pub trait TrailerHost: Sized {
    fn trailers(&mut self) -> &mut TrailerQueue<Self>;
}

/// Runs `action`, then flushes queued trailers if this was the outermost call.
///
/// On error the queue is discarded; a failed call produces no usable output.
pub fn run_with_trailers<C, R, F>(ctx: &mut C, action: F) -> Result<R, Error>
where
    C: TrailerHost,
    F: FnOnce(&mut C) -> Result<R, Error>,
{
    ctx.trailers().depth += 1;
    let result = action(ctx);
    ctx.trailers().depth -= 1;
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            if ctx.trailers().depth == 0 {
                ctx.trailers().clear();
            }
            return Err(e);
        }
    };
    if ctx.trailers().depth == 0 {
        if let Err(e) = flush(ctx) {
            ctx.trailers().clear();
            return Err(e);
        }
    }
    Ok(value)
}

fn flush<C: TrailerHost>(ctx: &mut C) -> Result<(), Error> {
    loop {
        while let Some(trailer) = ctx.trailers().trailers.pop() {
            tracing::trace!(remaining = ctx.trailers().trailers.len(), "running trailer");
            trailer(ctx)?;
        }
        let inits = mem::take(&mut ctx.trailers().static_inits);
        if inits.is_empty() {
            return Ok(());
        }
        for init in inits {
            init(ctx)?;
        }
    }
}
