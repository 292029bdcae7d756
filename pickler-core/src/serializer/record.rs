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
use crate::meta::unit::{Construction, Member, RecordShape};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::memo::MemoEntry;
use crate::serializer::member::{read_member, write_member};
use crate::serializer::{read_value, write_value};
use crate::types::Tag;
use crate::value::{Record, RecordRef, Value};
use parking_lot::RwLock;
use std::sync::Arc;

/// `[Record][shape member][field count][fields in declared order]`
pub fn write(context: &mut WriteContext, record: &RecordRef) -> Result<(), Error> {
    let (shape, fields) = {
        let record = record.read();
        (record.shape().clone(), record.fields().to_vec())
    };
    context.writer.write_u8(Tag::Record.into())?;
    write_member(context, &Member::Record(shape))?;
    context.writer.write_varint(fields.len() as i64)?;
    for field in &fields {
        write_value(context, field)?;
    }
    Ok(())
}

pub fn read(context: &mut ReadContext, offset: u64) -> Result<Value, Error> {
    let shape = read_shape(context)?;
    let count = context.reader.read_varint_len()?;
    if count != shape.fields().len() {
        return Err(Error::shape_mismatch(format!(
            "{} has {} fields but the stream holds {}",
            shape.name(),
            shape.fields().len(),
            count
        )));
    }

    match shape.construction() {
        Construction::Fields => {
            let record: RecordRef = Arc::new(RwLock::new(Record::empty(shape)));
            let value = Value::Record(record.clone());
            context
                .memo
                .add_memo(offset, MemoEntry::Value(value.clone()))?;
            for index in 0..count {
                let field = read_value(context)?;
                record.write().set_index(index, field)?;
            }
            Ok(value)
        }
        Construction::Constructor => {
            context.memo.begin(offset);
            let mut fields = Vec::with_capacity(count);
            for _ in 0..count {
                fields.push(read_value(context)?);
            }
            let value = Value::record(Record::new(shape, fields)?);
            context
                .memo
                .add_memo(offset, MemoEntry::Value(value.clone()))?;
            Ok(value)
        }
    }
}

fn read_shape(context: &mut ReadContext) -> Result<Arc<RecordShape>, Error> {
    match read_member(context)? {
        Member::Record(shape) => Ok(shape),
        other => Err(Error::format(format!(
            "record refers to {:?} '{}'",
            other.kind(),
            other.path()
        ))),
    }
}
