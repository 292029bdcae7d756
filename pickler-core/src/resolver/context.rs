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

use crate::buffer::{Reader, Writer};
use crate::meta::context::UnitContext;
use crate::meta::descriptor::UnitDescriptor;
use crate::meta::unit::Unit;
use crate::pickler::Pickler;
use crate::policy::{PolicyCache, UnitMode};
use crate::resolver::memo::{MemoReader, MemoWriter};
use crate::resolver::trailer::{TrailerHost, TrailerQueue};
use std::sync::Arc;

/// State of one serialization call.
pub struct WriteContext<'a> {
    pub writer: Writer<'a>,
    pub memo: MemoWriter,
    pickler: &'a Pickler,
    trailers: TrailerQueue<WriteContext<'a>>,
    policy_cache: PolicyCache,
}

impl<'a> WriteContext<'a> {
    pub fn new(pickler: &'a Pickler, writer: Writer<'a>) -> WriteContext<'a> {
        WriteContext {
            writer,
            memo: MemoWriter::new(),
            pickler,
            trailers: TrailerQueue::new(),
            policy_cache: PolicyCache::default(),
        }
    }

    pub fn get_pickler(&self) -> &'a Pickler {
        self.pickler
    }

    pub fn unit_context(&self) -> &'a UnitContext {
        self.pickler.get_context()
    }

    /// The resolved mode for `unit`, asking the policy at most once per call.
    pub fn unit_mode(&mut self, unit: &Unit) -> UnitMode {
        let pickler = self.pickler;
        self.policy_cache
            .resolve(pickler.get_policy(), unit, pickler.get_config().home_unit())
    }

    pub fn describe(&self, unit: &Arc<Unit>) -> Arc<UnitDescriptor> {
        self.unit_context()
            .describe(unit, self.pickler.get_provider())
    }
}

impl<'a> TrailerHost for WriteContext<'a> {
    fn trailers(&mut self) -> &mut TrailerQueue<Self> {
        &mut self.trailers
    }
}

/// State of one deserialization call.
pub struct ReadContext<'a> {
    pub reader: Reader<'a>,
    pub memo: MemoReader,
    pickler: &'a Pickler,
    trailers: TrailerQueue<ReadContext<'a>>,
    pending_units: Vec<Arc<Unit>>,
}

impl<'a> ReadContext<'a> {
    pub fn new(pickler: &'a Pickler, reader: Reader<'a>) -> ReadContext<'a> {
        ReadContext {
            reader,
            memo: MemoReader::new(),
            pickler,
            trailers: TrailerQueue::new(),
            pending_units: Vec::new(),
        }
    }

    pub fn get_pickler(&self) -> &'a Pickler {
        self.pickler
    }

    /// Queues a unit rebuilt from the stream for loading once the read succeeds.
    pub fn defer_load(&mut self, unit: Arc<Unit>) {
        self.pending_units.push(unit);
    }

    pub(crate) fn take_pending_units(&mut self) -> Vec<Arc<Unit>> {
        std::mem::take(&mut self.pending_units)
    }

    /// Where by-reference units are resolved and by-value units are loaded.
    pub fn target_context(&self) -> &'a UnitContext {
        self.pickler.get_target_context()
    }
}

impl<'a> TrailerHost for ReadContext<'a> {
    fn trailers(&mut self) -> &mut TrailerQueue<Self> {
        &mut self.trailers
    }
}
