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

//! # Pickler Core
//!
//! The engine behind the `pickler` crate: a binary serializer for arbitrary,
//! possibly cyclic object graphs that preserves reference identity.
//!
//! ## Architecture
//!
//! - **`pickler`**: the [`Pickler`] entry point and its builder-style options
//! - **`buffer`** / **`stream`**: little-endian codec over a position-tracking stream
//! - **`value`**: the dynamic object model that gets pickled
//! - **`descriptor`**: shallow classification of one value
//! - **`serializer`**: the graph walker, one module per shape
//! - **`resolver`**: memo table, trailer queue and per-call contexts
//! - **`meta`**: units, their shapes and code, and the shared unit registry
//! - **`policy`** / **`provider`**: by-value versus by-reference decisions and
//!   the collaborator that describes and rebuilds units
//! - **`types`**: wire tags and kinds
//! - **`error`** / **`config`**
//!
//! ## Key Concepts
//!
//! ### Identity
//!
//! Every reference-typed value is written at most once per call. The first
//! occurrence records the stream offset of its tag; later occurrences are a
//! back reference to that offset. Arrays, field-filled records and closures
//! are registered before their children, so cycles through them round-trip.
//! Tuples, constructor-built records, boxes and strings are registered after
//! their children; a cycle back into one of them fails with
//! [`Error::DanglingReference`](error::Error::DanglingReference).
//!
//! ### Units
//!
//! Record shapes, enum shapes and code belong to a [`Unit`](meta::Unit). The
//! policy decides per unit whether the stream names the unit (by reference)
//! or carries its full descriptor (by value), in which case the reader
//! rebuilds it through the [`TypeProvider`](provider::TypeProvider) and
//! restores its static cells from trailers.
//!
//! ## Usage
//!
//! ```rust
//! use pickler_core::types::ElementType;
//! use pickler_core::value::Array;
//! use pickler_core::{Pickler, Value};
//!
//! let array = Value::array(
//!     Array::vector(ElementType::Any, vec![Value::Null, Value::I32(7)]).unwrap(),
//! );
//! // Make the array contain itself.
//! array.as_array().unwrap().write().set_flat(0, array.clone()).unwrap();
//!
//! let pickler = Pickler::default();
//! let copy = pickler.deserialize(&pickler.serialize(&array).unwrap()).unwrap();
//! let inner = copy.as_array().unwrap().read().items()[0].clone();
//! assert!(Value::ptr_eq(&inner, &copy));
//! ```

pub mod buffer;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod meta;
pub mod pickler;
pub mod policy;
pub mod provider;
pub mod resolver;
pub mod serializer;
pub mod stream;
pub mod types;
pub mod value;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::pickler::Pickler;
pub use crate::value::Value;
