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

use crate::error::Error;
use crate::meta::descriptor::UnitDescriptor;
use crate::meta::unit::{Unit, UnitId};
use crate::provider::TypeProvider;
use crate::value::ObjectId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

struct CacheEntry {
    // Keeps the unit alive so its address cannot be reused by another unit.
    _unit: Arc<Unit>,
    descriptor: Arc<OnceLock<Arc<UnitDescriptor>>>,
}

/// Registry of live units shared by every pickler that points at it.
///
/// Units registered here can be resolved by name when a stream refers to them
/// by reference, and by-value units read from a stream are added here. The
/// descriptor cache guarantees each unit is described at most once no matter
/// how many threads race on their first serialization.
#[derive(Default)]
pub struct UnitContext {
    units: RwLock<Vec<Arc<Unit>>>,
    descriptors: Mutex<HashMap<ObjectId, CacheEntry>>,
}

impl UnitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide context used when a pickler is not given one.
    pub fn global() -> &'static UnitContext {
        static GLOBAL: OnceLock<UnitContext> = OnceLock::new();
        GLOBAL.get_or_init(UnitContext::new)
    }

    /// Registers `unit`. Loading the same unit twice is a no-op.
    pub fn load(&self, unit: Arc<Unit>) {
        let mut units = self.units.write();
        if units.iter().any(|u| Arc::ptr_eq(u, &unit)) {
            return;
        }
        tracing::debug!(unit = %unit.id(), origin = ?unit.origin(), "unit loaded");
        units.push(unit);
    }

    pub fn units(&self) -> Vec<Arc<Unit>> {
        self.units.read().clone()
    }

    pub fn candidates(&self, name: &str) -> Vec<Arc<Unit>> {
        self.units
            .read()
            .iter()
            .filter(|u| u.id().name() == name)
            .cloned()
            .collect()
    }

    /// Resolves a unit by name. More than one live unit with that name is an
    /// ambiguity, reported with every candidate's identity string.
    pub fn resolve(&self, id: &UnitId) -> Result<Arc<Unit>, Error> {
        let mut candidates = self.candidates(id.name());
        match candidates.len() {
            0 => Err(Error::unknown_unit(format!(
                "no live unit named '{}'",
                id.full_name()
            ))),
            1 => {
                let unit = candidates.remove(0);
                if unit.id().version() != id.version() {
                    tracing::debug!(
                        requested = %id,
                        found = %unit.id(),
                        "resolved unit by name with a different version"
                    );
                }
                Ok(unit)
            }
            _ => Err(ambiguity(id.name(), &candidates)),
        }
    }

    /// Fails if more than one live unit carries `name`.
    pub fn check_unambiguous(&self, name: &str) -> Result<(), Error> {
        let candidates = self.candidates(name);
        if candidates.len() > 1 {
            return Err(ambiguity(name, &candidates));
        }
        Ok(())
    }

    /// The descriptor of `unit`, computed by `provider` on first use only.
    pub fn describe(&self, unit: &Arc<Unit>, provider: &dyn TypeProvider) -> Arc<UnitDescriptor> {
        let cell = {
            let mut cache = self.descriptors.lock();
            cache
                .entry(ObjectId::of_arc(unit))
                .or_insert_with(|| CacheEntry {
                    _unit: unit.clone(),
                    descriptor: Arc::new(OnceLock::new()),
                })
                .descriptor
                .clone()
        };
        cell.get_or_init(|| {
            tracing::debug!(unit = %unit.id(), "computing unit descriptor");
            Arc::new(provider.describe_unit(unit))
        })
        .clone()
    }
}

fn ambiguity(name: &str, candidates: &[Arc<Unit>]) -> Error {
    let mut names: Vec<String> = candidates.iter().map(|u| u.id().full_name()).collect();
    names.sort();
    tracing::warn!(unit = name, candidates = ?names, "ambiguous unit reference");
    Error::ambiguous_reference(name, names)
}
