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
use crate::meta::context::UnitContext;
use crate::meta::descriptor::UnitDescriptor;
use crate::meta::unit::{NativeFn, Unit, UnitBuilder};
use std::collections::HashMap;
use std::sync::Arc;

/// Discovers the structure of units and fabricates new ones from descriptors.
///
/// The pickler never inspects a unit's definitions directly when writing it
/// by value; it asks the provider. Implementations must be thread safe since
/// one provider is shared by every pickler built from the same configuration.
pub trait TypeProvider: Send + Sync {
    fn describe_unit(&self, unit: &Unit) -> UnitDescriptor;

    /// Builds a live unit from `descriptor`. The caller loads it into
    /// `context` afterwards.
    fn materialize(
        &self,
        descriptor: UnitDescriptor,
        context: &UnitContext,
    ) -> Result<Arc<Unit>, Error>;
}

/// Describes units structurally and rebuilds native code from a registry of
/// host functions.
#[derive(Clone, Default)]
pub struct RegistryProvider {
    natives: HashMap<String, NativeFn>,
}

impl RegistryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_native(mut self, symbol: impl Into<String>, f: NativeFn) -> Self {
        self.natives.insert(symbol.into(), f);
        self
    }

    pub fn is_registered(&self, symbol: &str) -> bool {
        self.natives.contains_key(symbol)
    }
}

impl TypeProvider for RegistryProvider {
    fn describe_unit(&self, unit: &Unit) -> UnitDescriptor {
        UnitDescriptor::of(unit)
    }

    fn materialize(
        &self,
        descriptor: UnitDescriptor,
        _context: &UnitContext,
    ) -> Result<Arc<Unit>, Error> {
        UnitBuilder::from_descriptor(descriptor, &self.natives)?.build()
    }
}
