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
use crate::resolver::memo::MemoEntry;
use crate::serializer::member::{read_member, write_member};
use crate::serializer::{read_value, write_value};
use crate::types::Tag;
use crate::value::{Function, FunctionRef, Value};
use std::sync::Arc;

/// `[Function][code member][env count][captured values in capture order]`
///
/// A closure is registered before its environment is read, so it may capture
/// itself.
pub fn write(context: &mut WriteContext, function: &FunctionRef) -> Result<(), Error> {
    let env = function.env();
    context.writer.write_u8(Tag::Function.into())?;
    write_member(context, &Member::Code(function.code().clone()))?;
    context.writer.write_varint(env.len() as i64)?;
    for value in &env {
        write_value(context, value)?;
    }
    Ok(())
}

pub fn read(context: &mut ReadContext, offset: u64) -> Result<Value, Error> {
    let code = match read_member(context)? {
        Member::Code(code) => code,
        other => {
            return Err(Error::format(format!(
                "function refers to {:?} '{}'",
                other.kind(),
                other.path()
            )))
        }
    };
    let count = context.reader.read_varint_len()?;
    let function: FunctionRef = Arc::new(Function::new(code, Vec::new()));
    let value = Value::Function(function.clone());
    context
        .memo
        .add_memo(offset, MemoEntry::Value(value.clone()))?;

    let mut env = Vec::new();
    for _ in 0..count {
        env.push(read_value(context)?);
    }
    function.set_env(env);
    Ok(value)
}
