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

//! # Pickler
//!
//! Pickler writes arbitrary object graphs to a compact binary stream and reads
//! them back with every shared reference and every cycle intact.
//!
//! ## Key Features
//!
//! - **Identity preserving**: an object reachable along several paths is
//!   written once and comes back as one object
//! - **Cycle tolerant**: arrays, field-filled records and closures may
//!   reach themselves
//! - **Deterministic**: the same graph always produces the same bytes
//! - **Unit aware**: definitions travel by name or by value, chosen per unit
//!   through a [`Policy`]
//!
//! ## Quick Start
//!
//! ```rust
//! use pickler::{Construction, FieldDef, Pickler, Record, Unit, UnitContext, Value};
//! use std::sync::Arc;
//!
//! let context = Arc::new(UnitContext::new());
//! let unit = Unit::builder("geometry", "1.0")
//!     .record("Point", vec![FieldDef::any("x"), FieldDef::any("y")], Construction::Fields)
//!     .build()
//!     .unwrap();
//! context.load(unit.clone());
//!
//! let point = Value::record(
//!     Record::new(unit.record("Point").unwrap(), vec![Value::I32(1), Value::I32(2)]).unwrap(),
//! );
//! let pickler = Pickler::default().context(context);
//! let bytes = pickler.serialize(&point).unwrap();
//! assert_eq!(pickler.deserialize(&bytes).unwrap(), point);
//! ```
//!
//! ## By-value units
//!
//! A unit written by value carries its whole descriptor. A reader with a fresh
//! [`UnitContext`] rebuilds it through its [`TypeProvider`], restores its
//! static cells and loads it into the target context.

pub use pickler_core::{
    config::Config,
    error::Error,
    meta::{
        Code, CodeBody, Construction, EnumShape, FieldDef, Member, NativeFn, RecordShape, Unit,
        UnitBuilder, UnitContext, UnitDescriptor, UnitId, UnitOrigin,
    },
    pickler::Pickler,
    policy::{Policy, PolicyTable, UnitMode},
    provider::{RegistryProvider, TypeProvider},
    types::{ElementType, FieldType, IntKind, PrimitiveKind},
    value::{Array, Dimension, EnumValue, Function, NativeHandle, Record, Tuple, Value},
};
