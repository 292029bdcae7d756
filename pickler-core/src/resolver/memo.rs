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

use crate::buffer::Writer;
use crate::error::Error;
use crate::meta::unit::{Member, Unit};
use crate::types::Tag;
use crate::value::{ObjectId, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Write side of the memo table.
///
/// Maps the identity of every object already written to the stream offset of
/// its tag. Objects whose shape can only be registered after their children
/// (tuples, constructor records, boxes, strings, members) sit in an
/// in-progress map while their children are written; meeting one of them
/// again is a cycle the format cannot express.
///
/// ```rust
/// use pickler_core::buffer::Writer;
/// use pickler_core::resolver::memo::MemoWriter;
/// use pickler_core::value::Value;
///
/// let mut memo = MemoWriter::new();
/// let mut bytes = Vec::new();
/// let mut writer = Writer::new(&mut bytes);
/// let s = Value::str("shared");
/// let id = s.identity().unwrap();
///
/// assert!(!memo.maybe_write_memo(&mut writer, id).unwrap());
/// memo.add_memo(0, id);
/// assert!(memo.maybe_write_memo(&mut writer, id).unwrap());
/// ```
#[derive(Default)]
pub struct MemoWriter {
    memo: HashMap<ObjectId, u64>,
    in_progress: HashMap<ObjectId, u64>,
    #[cfg(debug_assertions)]
    offsets: HashSet<u64>,
}

impl MemoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a back reference if `id` was already written.
    ///
    /// Returns true if a back reference was written and the caller must not
    /// write the object again.
    pub fn maybe_write_memo(&self, writer: &mut Writer, id: ObjectId) -> Result<bool, Error> {
        if let Some(&offset) = self.memo.get(&id) {
            writer.write_u8(Tag::BackRef.into())?;
            writer.write_varint(offset as i64)?;
            return Ok(true);
        }
        if let Some(&offset) = self.in_progress.get(&id) {
            return Err(Error::dangling_reference(
                offset,
                "object is reachable from its own constructor arguments",
            ));
        }
        Ok(false)
    }

    /// Registers `id` as written at `offset`.
    pub fn add_memo(&mut self, offset: u64, id: ObjectId) {
        #[cfg(debug_assertions)]
        debug_assert!(
            self.offsets.insert(offset),
            "two identities registered at offset {}",
            offset
        );
        let previous = self.memo.insert(id, offset);
        debug_assert!(previous.is_none(), "identity registered twice");
    }

    /// Marks a late-registered object as being written at `offset`.
    pub fn begin(&mut self, offset: u64, id: ObjectId) {
        self.in_progress.insert(id, offset);
    }

    /// Completes a late-registered object: it leaves the in-progress map and
    /// becomes referable.
    pub fn finish(&mut self, id: ObjectId) {
        if let Some(offset) = self.in_progress.remove(&id) {
            self.add_memo(offset, id);
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.memo.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Returns true if no two identities share an offset and nothing is
    /// left in progress.
    pub fn is_consistent(&self) -> bool {
        let distinct: HashSet<u64> = self.memo.values().copied().collect();
        distinct.len() == self.memo.len() && self.in_progress.is_empty()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
        self.in_progress.clear();
        #[cfg(debug_assertions)]
        self.offsets.clear();
    }
}

/// Something the reader has materialized and can hand out again.
#[derive(Clone, Debug)]
pub enum MemoEntry {
    Value(Value),
    Unit(Arc<Unit>),
    Member(Member),
}

impl MemoEntry {
    fn describe(&self) -> &'static str {
        match self {
            MemoEntry::Value(_) => "value",
            MemoEntry::Unit(_) => "unit",
            MemoEntry::Member(_) => "member",
        }
    }
}

/// Read side of the memo table, keyed by the offset of each object's tag.
#[derive(Default)]
pub struct MemoReader {
    entries: HashMap<u64, MemoEntry>,
    pending: HashSet<u64>,
}

impl MemoReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_memo(&mut self, offset: u64, entry: MemoEntry) -> Result<(), Error> {
        self.pending.remove(&offset);
        if self.entries.insert(offset, entry).is_some() {
            return Err(Error::format(format!(
                "two objects registered at offset {}",
                offset
            )));
        }
        Ok(())
    }

    /// Notes that a late-registered object starts at `offset`.
    pub fn begin(&mut self, offset: u64) {
        self.pending.insert(offset);
    }

    pub fn maybe_resolve_memo(&self, offset: u64) -> Result<&MemoEntry, Error> {
        if let Some(entry) = self.entries.get(&offset) {
            return Ok(entry);
        }
        if self.pending.contains(&offset) {
            return Err(Error::dangling_reference(
                offset,
                "back reference into an object that is still being constructed",
            ));
        }
        Err(Error::dangling_reference(
            offset,
            "no object registered at this offset",
        ))
    }

    pub fn resolve_value(&self, offset: u64) -> Result<Value, Error> {
        match self.maybe_resolve_memo(offset)? {
            MemoEntry::Value(value) => Ok(value.clone()),
            other => Err(Error::format(format!(
                "offset {} holds a {}, expected a value",
                offset,
                other.describe()
            ))),
        }
    }

    pub fn resolve_unit(&self, offset: u64) -> Result<Arc<Unit>, Error> {
        match self.maybe_resolve_memo(offset)? {
            MemoEntry::Unit(unit) => Ok(unit.clone()),
            other => Err(Error::format(format!(
                "offset {} holds a {}, expected a unit",
                offset,
                other.describe()
            ))),
        }
    }

    pub fn resolve_member(&self, offset: u64) -> Result<Member, Error> {
        match self.maybe_resolve_memo(offset)? {
            MemoEntry::Member(member) => Ok(member.clone()),
            other => Err(Error::format(format!(
                "offset {} holds a {}, expected a member",
                offset,
                other.describe()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
    }
}
