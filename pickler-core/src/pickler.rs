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
use crate::config::Config;
use crate::ensure;
use crate::error::Error;
use crate::meta::context::UnitContext;
use crate::policy::{Policy, PolicyTable};
use crate::provider::{RegistryProvider, TypeProvider};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::trailer::run_with_trailers;
use crate::serializer::{read_value, write_value};
use crate::types::MAGIC_NUMBER;
use crate::value::Value;
use std::io::{Read, Write};
use std::sync::Arc;

/// Entry point for pickling object graphs.
///
/// A `Pickler` holds configuration only. Every call builds its own
/// `WriteContext` or `ReadContext`, so one pickler can be shared by any number
/// of threads. The only state shared between calls is the [`UnitContext`].
///
/// # Examples
///
/// ```rust
/// use pickler_core::{Pickler, Value};
///
/// let pickler = Pickler::default();
/// let shared = Value::str("shared");
/// let root = Value::tuple(vec![shared.clone(), shared]);
///
/// let bytes = pickler.serialize(&root).unwrap();
/// let copy = pickler.deserialize(&bytes).unwrap();
/// let items = copy.as_tuple().unwrap().items();
/// assert!(Value::ptr_eq(&items[0], &items[1]));
/// ```
///
/// Custom configuration:
///
/// ```rust
/// use pickler_core::meta::UnitContext;
/// use pickler_core::policy::PolicyTable;
/// use pickler_core::Pickler;
/// use std::sync::Arc;
///
/// let table = PolicyTable::builder().by_value("scratch").build().unwrap();
/// let pickler = Pickler::default()
///     .context(Arc::new(UnitContext::new()))
///     .policy_table(table)
///     .home_unit("app");
/// ```
#[derive(Clone)]
pub struct Pickler {
    config: Config,
    policy: Policy,
    context: Option<Arc<UnitContext>>,
    target_context: Option<Arc<UnitContext>>,
    provider: Arc<dyn TypeProvider>,
}

impl Default for Pickler {
    fn default() -> Self {
        Pickler {
            config: Config::default(),
            policy: Policy::Default,
            context: None,
            target_context: None,
            provider: Arc::new(RegistryProvider::new()),
        }
    }
}

impl Pickler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy_table(mut self, table: PolicyTable) -> Self {
        self.policy = Policy::Table(table);
        self
    }

    /// Units written by reference are checked for ambiguity here, and unit
    /// descriptors are cached here. Defaults to [`UnitContext::global`].
    pub fn context(mut self, context: Arc<UnitContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Where the reader resolves by-reference units and loads by-value ones.
    /// Defaults to the source context.
    pub fn target_context(mut self, context: Arc<UnitContext>) -> Self {
        self.target_context = Some(context);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn TypeProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn home_unit(mut self, name: impl Into<String>) -> Self {
        self.config.home_unit = Some(name.into());
        self
    }

    pub fn check_trailing_bytes(mut self, check: bool) -> Self {
        self.config.check_trailing_bytes = check;
        self
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_policy(&self) -> &Policy {
        &self.policy
    }

    pub fn get_context(&self) -> &UnitContext {
        match &self.context {
            Some(context) => context,
            None => UnitContext::global(),
        }
    }

    pub fn get_target_context(&self) -> &UnitContext {
        match &self.target_context {
            Some(context) => context,
            None => self.get_context(),
        }
    }

    pub fn get_provider(&self) -> &dyn TypeProvider {
        self.provider.as_ref()
    }

    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();
        {
            let mut context = WriteContext::new(self, Writer::new(&mut bytes));
            self.write_head(&mut context.writer)?;
            run_with_trailers(&mut context, |context| write_value(context, value))?;
            debug_assert!(context.memo.is_consistent());
            tracing::debug!(
                bytes = context.writer.position(),
                objects = context.memo.len(),
                "serialized value"
            );
        }
        Ok(bytes)
    }

    /// Pickles `value` into `sink`. The whole pickle is built in memory
    /// first, so a failed call writes nothing.
    pub fn serialize_to(&self, value: &Value, sink: &mut dyn Write) -> Result<(), Error> {
        let bytes = self.serialize(value)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value, Error> {
        let mut source = bytes;
        self.read_root(&mut source, self.config.is_check_trailing_bytes())
    }

    /// Reads one pickle from `source`. Bytes after it are left unread, so
    /// several pickles can be read back to back from one stream.
    pub fn deserialize_from(&self, source: &mut dyn Read) -> Result<Value, Error> {
        self.read_root(source, false)
    }

    /// Units rebuilt from the stream become visible in the target context
    /// only once the whole pickle has been read.
    fn read_root(&self, source: &mut dyn Read, check_trailing: bool) -> Result<Value, Error> {
        let mut context = ReadContext::new(self, Reader::new(source));
        self.read_head(&mut context.reader)?;
        let value = run_with_trailers(&mut context, read_value)?;
        let consumed = context.reader.position();
        if check_trailing {
            ensure!(
                context.reader.at_end()?,
                Error::format(format!("unexpected bytes after offset {}", consumed))
            );
        }
        let target = self.get_target_context();
        for unit in context.take_pending_units() {
            target.load(unit);
        }
        tracing::debug!(
            bytes = consumed,
            objects = context.memo.len(),
            "deserialized value"
        );
        Ok(value)
    }

    fn write_head(&self, writer: &mut Writer) -> Result<(), Error> {
        writer.write_u16(MAGIC_NUMBER)?;
        writer.write_u8(self.config.format_version)
    }

    fn read_head(&self, reader: &mut Reader) -> Result<(), Error> {
        let magic = reader.read_u16()?;
        ensure!(
            magic == MAGIC_NUMBER,
            Error::format(format!(
                "stream must start with magic number {:#06x}, found {:#06x}",
                MAGIC_NUMBER, magic
            ))
        );
        let version = reader.read_u8()?;
        ensure!(
            version == self.config.format_version,
            Error::format(format!(
                "unsupported format version {}, expected {}",
                version, self.config.format_version
            ))
        );
        Ok(())
    }
}
