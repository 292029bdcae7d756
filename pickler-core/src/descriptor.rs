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

//! Shallow classification of a value into the shape the graph walker writes.

use crate::error::Error;
use crate::meta::unit::Construction;
use crate::types::{PrimitiveKind, Tag};
use crate::value::{ArrayRef, EnumValue, FunctionRef, RecordRef, Tuple, Value};
use std::sync::Arc;

/// When an object becomes referable relative to its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// Value types. Never memoized.
    None,
    /// Registered as soon as the shell exists, before any child. Cycles
    /// through the object resolve to a back reference.
    Early,
    /// Registered only after every child has been written or read.
    Late,
}

/// One value seen by the walker: its shape plus a borrow of the parts the
/// shape's serializer needs. Children are not visited.
#[derive(Clone, Copy, Debug)]
pub enum TypeDescriptor<'v> {
    Null,
    Primitive(PrimitiveKind),
    Str(&'v Arc<str>),
    Boxed(&'v Arc<Value>),
    Enum(&'v EnumValue),
    Array(&'v ArrayRef),
    Tuple(&'v Arc<Tuple>),
    Record {
        record: &'v RecordRef,
        construction: Construction,
    },
    Function(&'v FunctionRef),
}

impl<'v> TypeDescriptor<'v> {
    /// Classifies `value`. Shapes that cannot be pickled fail here, before
    /// anything about the value is written.
    pub fn classify(value: &'v Value) -> Result<TypeDescriptor<'v>, Error> {
        let descriptor = match value {
            Value::Null => TypeDescriptor::Null,
            Value::Bool(_) => TypeDescriptor::Primitive(PrimitiveKind::Bool),
            Value::I8(_) => TypeDescriptor::Primitive(PrimitiveKind::I8),
            Value::U8(_) => TypeDescriptor::Primitive(PrimitiveKind::U8),
            Value::I16(_) => TypeDescriptor::Primitive(PrimitiveKind::I16),
            Value::U16(_) => TypeDescriptor::Primitive(PrimitiveKind::U16),
            Value::I32(_) => TypeDescriptor::Primitive(PrimitiveKind::I32),
            Value::U32(_) => TypeDescriptor::Primitive(PrimitiveKind::U32),
            Value::I64(_) => TypeDescriptor::Primitive(PrimitiveKind::I64),
            Value::U64(_) => TypeDescriptor::Primitive(PrimitiveKind::U64),
            Value::F32(_) => TypeDescriptor::Primitive(PrimitiveKind::F32),
            Value::F64(_) => TypeDescriptor::Primitive(PrimitiveKind::F64),
            Value::Char(_) => TypeDescriptor::Primitive(PrimitiveKind::Char),
            Value::Timestamp(_) => TypeDescriptor::Primitive(PrimitiveKind::Timestamp),
            Value::Date(_) => TypeDescriptor::Primitive(PrimitiveKind::Date),
            Value::Str(s) => TypeDescriptor::Str(s),
            Value::Boxed(inner) => TypeDescriptor::Boxed(inner),
            Value::Enum(e) => TypeDescriptor::Enum(e),
            Value::Array(array) => TypeDescriptor::Array(array),
            Value::Tuple(tuple) => TypeDescriptor::Tuple(tuple),
            Value::Record(record) => TypeDescriptor::Record {
                record,
                construction: record.read().shape().construction(),
            },
            Value::Function(function) => TypeDescriptor::Function(function),
            Value::Pointer(address) => {
                return Err(Error::unsupported_type(format!(
                    "raw pointer {:#x} cannot be pickled",
                    address
                )))
            }
            Value::Handle(handle) => {
                return Err(Error::unsupported_type(format!(
                    "native handle of kind '{}' cannot be pickled",
                    handle.kind
                )))
            }
        };
        Ok(descriptor)
    }

    pub fn tag(&self) -> Tag {
        match self {
            TypeDescriptor::Null => Tag::Null,
            TypeDescriptor::Primitive(kind) => kind.tag(),
            TypeDescriptor::Str(_) => Tag::Str,
            TypeDescriptor::Boxed(_) => Tag::Boxed,
            TypeDescriptor::Enum(_) => Tag::Enum,
            TypeDescriptor::Array(_) => Tag::Array,
            TypeDescriptor::Tuple(_) => Tag::Tuple,
            TypeDescriptor::Record { .. } => Tag::Record,
            TypeDescriptor::Function(_) => Tag::Function,
        }
    }

    pub fn registration(&self) -> Registration {
        match self {
            TypeDescriptor::Null | TypeDescriptor::Primitive(_) | TypeDescriptor::Enum(_) => {
                Registration::None
            }
            TypeDescriptor::Array(_) | TypeDescriptor::Function(_) => Registration::Early,
            TypeDescriptor::Record { construction, .. } => match construction {
                Construction::Fields => Registration::Early,
                Construction::Constructor => Registration::Late,
            },
            TypeDescriptor::Str(_) | TypeDescriptor::Boxed(_) | TypeDescriptor::Tuple(_) => {
                Registration::Late
            }
        }
    }
}
