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
use crate::meta::unit::Member;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::member::{read_member, write_member};
use crate::types::{IntKind, Tag};
use crate::value::{EnumValue, Value};

/// `[Enum][shape member][underlying kind][value]`
pub fn write(context: &mut WriteContext, value: &EnumValue) -> Result<(), Error> {
    context.writer.write_u8(Tag::Enum.into())?;
    write_member(context, &Member::Enum(value.shape().clone()))?;
    context.writer.write_u8(value.shape().underlying().into())?;
    context.writer.write_varint(value.value())
}

pub fn read(context: &mut ReadContext) -> Result<Value, Error> {
    let shape = match read_member(context)? {
        Member::Enum(shape) => shape,
        other => {
            return Err(Error::format(format!(
                "enum refers to {:?} '{}'",
                other.kind(),
                other.path()
            )))
        }
    };
    let written = IntKind::from_byte(context.reader.read_u8()?)?;
    if written != shape.underlying() {
        return Err(Error::shape_mismatch(format!(
            "enum {} is {:?} in the stream but {:?} here",
            shape.name(),
            written,
            shape.underlying()
        )));
    }
    let raw = context.reader.read_varint()?;
    Ok(Value::Enum(EnumValue::new(shape, raw)?))
}
