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

//! The graph walker.
//!
//! Every value goes through [`write_value`]: classify, check the memo, note
//! the offset of the tag, register early or mark in progress, write the tag,
//! header and children, and finally register late shapes. [`read_value`]
//! mirrors it: early shapes get a shell that is registered before any child is
//! read, late shapes are built from their children and registered afterwards.

use crate::bail;
use crate::buffer::Reader;
use crate::descriptor::{Registration, TypeDescriptor};
use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::{PrimitiveKind, Tag};
use crate::value::Value;

pub mod array;
pub mod boxed;
pub mod enum_;
pub mod function;
pub mod member;
pub mod primitive;
pub mod record;
pub mod string;
pub mod tuple;

pub fn write_value(context: &mut WriteContext, value: &Value) -> Result<(), Error> {
    let descriptor = TypeDescriptor::classify(value)?;
    let identity = value.identity();
    if let Some(id) = identity {
        if context.memo.maybe_write_memo(&mut context.writer, id)? {
            return Ok(());
        }
    }

    let offset = context.writer.position();
    let registration = descriptor.registration();
    match (registration, identity) {
        (Registration::Early, Some(id)) => context.memo.add_memo(offset, id),
        (Registration::Late, Some(id)) => context.memo.begin(offset, id),
        _ => {}
    }

    match descriptor {
        TypeDescriptor::Null => context.writer.write_u8(Tag::Null.into())?,
        TypeDescriptor::Primitive(kind) => {
            context.writer.write_u8(kind.tag().into())?;
            primitive::write_payload(&mut context.writer, value)?;
        }
        TypeDescriptor::Str(s) => string::write(context, s)?,
        TypeDescriptor::Boxed(inner) => boxed::write(context, inner)?,
        TypeDescriptor::Enum(e) => enum_::write(context, e)?,
        TypeDescriptor::Array(array) => array::write(context, array)?,
        TypeDescriptor::Tuple(tuple) => tuple::write(context, tuple)?,
        TypeDescriptor::Record { record, .. } => record::write(context, record)?,
        TypeDescriptor::Function(function) => function::write(context, function)?,
    }

    if let (Registration::Late, Some(id)) = (registration, identity) {
        context.memo.finish(id);
    }
    Ok(())
}

pub fn read_value(context: &mut ReadContext) -> Result<Value, Error> {
    let offset = context.reader.position();
    let tag = Tag::from_byte(context.reader.read_u8()?)?;
    match tag {
        Tag::Null => Ok(Value::Null),
        Tag::BackRef => {
            let target = read_offset(&mut context.reader)?;
            context.memo.resolve_value(target)
        }
        Tag::Bool
        | Tag::I8
        | Tag::U8
        | Tag::I16
        | Tag::U16
        | Tag::I32
        | Tag::U32
        | Tag::I64
        | Tag::U64
        | Tag::F32
        | Tag::F64
        | Tag::Char
        | Tag::Timestamp
        | Tag::Date => match PrimitiveKind::from_tag(tag) {
            Some(kind) => primitive::read_payload(&mut context.reader, kind),
            None => bail!("{:?} at offset {} has no scalar kind", tag, offset),
        },
        Tag::Str => string::read(context, offset),
        Tag::Boxed => boxed::read(context, offset),
        Tag::Array => array::read(context, offset),
        Tag::Tuple => tuple::read(context, offset),
        Tag::Record => record::read(context, offset),
        Tag::Enum => enum_::read(context),
        Tag::Function => function::read(context, offset),
        Tag::MemberRef | Tag::MemberDef | Tag::UnitRef | Tag::UnitDef => {
            bail!("{:?} at offset {} where a value was expected", tag, offset)
        }
    }
}

/// Reads the target offset of a back reference.
pub(crate) fn read_offset(reader: &mut Reader) -> Result<u64, Error> {
    let raw = reader.read_varint()?;
    u64::try_from(raw).map_err(|_| Error::format(format!("negative back reference {}", raw)))
}
