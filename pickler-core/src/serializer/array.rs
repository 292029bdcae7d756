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

//! `[Array][element][rank][(lower, len) per dimension][elements]`
//!
//! Elements are written row-major. `Any` elements are full values with their
//! own tags and identities; primitive elements are raw payloads.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::memo::MemoEntry;
use crate::serializer::{primitive, read_value, write_value};
use crate::types::{ElementType, Tag};
use crate::value::{Array, ArrayRef, Dimension, Value};
use parking_lot::RwLock;
use std::sync::Arc;

pub const MAX_RANK: usize = 32;

pub fn write(context: &mut WriteContext, array: &ArrayRef) -> Result<(), Error> {
    // Snapshot so no lock is held while children are written; a child may be
    // this very array.
    let (element, dims, items) = {
        let array = array.read();
        (array.element(), array.dims().to_vec(), array.items().to_vec())
    };

    context.writer.write_u8(Tag::Array.into())?;
    context.writer.write_u8(element.to_byte())?;
    context.writer.write_varint(dims.len() as i64)?;
    for dim in &dims {
        context.writer.write_varint(dim.lower)?;
        context.writer.write_varint(dim.len as i64)?;
    }
    match element {
        ElementType::Any => {
            for item in &items {
                write_value(context, item)?;
            }
        }
        ElementType::Primitive(_) => {
            for item in &items {
                primitive::write_payload(&mut context.writer, item)?;
            }
        }
    }
    Ok(())
}

pub fn read(context: &mut ReadContext, offset: u64) -> Result<Value, Error> {
    let element = ElementType::from_byte(context.reader.read_u8()?)?;
    let rank = context.reader.read_varint_len()?;
    if rank == 0 || rank > MAX_RANK {
        return Err(Error::format(format!("array rank {} out of range", rank)));
    }
    let mut dims = Vec::with_capacity(rank);
    for _ in 0..rank {
        let lower = context.reader.read_varint()?;
        let len = context.reader.read_varint_len()?;
        dims.push(Dimension::new(lower, len));
    }

    let (shell, total) =
        Array::unfilled(element, dims).map_err(|e| Error::format(e.to_string()))?;
    let array: ArrayRef = Arc::new(RwLock::new(shell));
    let value = Value::Array(array.clone());
    context
        .memo
        .add_memo(offset, MemoEntry::Value(value.clone()))?;

    for _ in 0..total {
        let item = match element {
            ElementType::Any => read_value(context)?,
            ElementType::Primitive(kind) => primitive::read_payload(&mut context.reader, kind)?,
        };
        array.write().push_loaded(item)?;
    }
    Ok(value)
}
