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
use crate::meta::unit::{Unit, UnitId, UnitOrigin};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// How the definitions of a unit are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitMode {
    /// By value for the home unit and for dynamic units, by reference otherwise.
    Default,
    /// Inline the whole unit descriptor so the reader can rebuild it.
    ByValue,
    /// Write the unit identity only; the reader resolves it by name.
    ByReference,
}

pub type PolicyFn = Arc<dyn Fn(&UnitId) -> UnitMode + Send + Sync>;

/// Decides per unit whether its definitions travel by value or by reference.
#[derive(Clone, Default)]
pub enum Policy {
    #[default]
    Default,
    Callback(PolicyFn),
    Table(PolicyTable),
}

impl Policy {
    pub fn callback<F>(f: F) -> Policy
    where
        F: Fn(&UnitId) -> UnitMode + Send + Sync + 'static,
    {
        Policy::Callback(Arc::new(f))
    }

    /// The configured mode, before `Default` is resolved.
    pub fn mode(&self, id: &UnitId) -> UnitMode {
        match self {
            Policy::Default => UnitMode::Default,
            Policy::Callback(f) => f(id),
            Policy::Table(table) => table.mode(id.name()),
        }
    }

    /// Resolves the mode for `unit` to `ByValue` or `ByReference`.
    pub fn resolve(&self, unit: &Unit, home_unit: Option<&str>) -> UnitMode {
        match self.mode(unit.id()) {
            UnitMode::Default => {
                if unit.origin() == UnitOrigin::Dynamic || home_unit == Some(unit.id().name()) {
                    UnitMode::ByValue
                } else {
                    UnitMode::ByReference
                }
            }
            explicit => explicit,
        }
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Default => f.write_str("Policy::Default"),
            Policy::Callback(_) => f.write_str("Policy::Callback(..)"),
            Policy::Table(table) => f.debug_tuple("Policy::Table").field(table).finish(),
        }
    }
}

/// Explicit per-unit verdicts keyed by unit name.
///
/// ```rust
/// use pickler_core::policy::{PolicyTable, UnitMode};
///
/// let table = PolicyTable::builder()
///     .by_value("scratch")
///     .by_reference("stdlib")
///     .build()
///     .unwrap();
/// assert_eq!(table.mode("scratch"), UnitMode::ByValue);
/// assert_eq!(table.mode("other"), UnitMode::Default);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PolicyTable {
    modes: HashMap<String, UnitMode>,
}

impl PolicyTable {
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::default()
    }

    pub fn mode(&self, name: &str) -> UnitMode {
        self.modes.get(name).copied().unwrap_or(UnitMode::Default)
    }
}

#[derive(Debug, Default)]
pub struct PolicyTableBuilder {
    by_value: Vec<String>,
    by_reference: Vec<String>,
}

impl PolicyTableBuilder {
    pub fn by_value(mut self, name: impl Into<String>) -> Self {
        self.by_value.push(name.into());
        self
    }

    pub fn by_reference(mut self, name: impl Into<String>) -> Self {
        self.by_reference.push(name.into());
        self
    }

    pub fn build(self) -> Result<PolicyTable, Error> {
        let by_value: HashSet<&String> = self.by_value.iter().collect();
        if let Some(name) = self.by_reference.iter().find(|n| by_value.contains(n)) {
            return Err(Error::config(format!(
                "unit '{}' is listed both by value and by reference",
                name
            )));
        }
        let mut modes = HashMap::new();
        for name in self.by_value {
            modes.insert(name, UnitMode::ByValue);
        }
        for name in self.by_reference {
            modes.insert(name, UnitMode::ByReference);
        }
        Ok(PolicyTable { modes })
    }
}

/// Per-call memo of resolved verdicts, so a callback runs once per unit.
#[derive(Default)]
pub(crate) struct PolicyCache {
    verdicts: HashMap<UnitId, UnitMode>,
}

impl PolicyCache {
    pub(crate) fn resolve(
        &mut self,
        policy: &Policy,
        unit: &Unit,
        home_unit: Option<&str>,
    ) -> UnitMode {
        if let Some(&mode) = self.verdicts.get(unit.id()) {
            return mode;
        }
        let mode = policy.resolve(unit, home_unit);
        tracing::trace!(unit = %unit.id(), ?mode, "policy verdict");
        self.verdicts.insert(unit.id().clone(), mode);
        mode
    }
}
