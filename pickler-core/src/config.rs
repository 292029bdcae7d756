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

use crate::types::FORMAT_VERSION;

/// Configuration for a [`Pickler`](crate::pickler::Pickler).
///
/// Shared between the pickler and every `WriteContext`/`ReadContext` it
/// creates so one call sees one consistent set of options.
#[derive(Clone, Debug)]
pub struct Config {
    /// Name of the unit whose definitions are written by value under the
    /// default policy.
    pub home_unit: Option<String>,
    /// Version byte written after the magic number. Only one version exists.
    pub format_version: u8,
    /// Whether `deserialize` rejects bytes left over after the root value.
    pub check_trailing_bytes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            home_unit: None,
            format_version: FORMAT_VERSION,
            check_trailing_bytes: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn home_unit(&self) -> Option<&str> {
        self.home_unit.as_deref()
    }

    #[inline(always)]
    pub fn is_check_trailing_bytes(&self) -> bool {
        self.check_trailing_bytes
    }
}
