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
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::memo::MemoEntry;
use crate::serializer::{read_value, write_value};
use crate::types::Tag;
use crate::value::Value;
use std::sync::Arc;

pub fn write(context: &mut WriteContext, inner: &Arc<Value>) -> Result<(), Error> {
    context.writer.write_u8(Tag::Boxed.into())?;
    write_value(context, inner)
}

pub fn read(context: &mut ReadContext, offset: u64) -> Result<Value, Error> {
    context.memo.begin(offset);
    let inner = read_value(context)?;
    let value = Value::boxed(inner).map_err(|_| Error::format("box holds a reference value"))?;
    context
        .memo
        .add_memo(offset, MemoEntry::Value(value.clone()))?;
    Ok(value)
}
