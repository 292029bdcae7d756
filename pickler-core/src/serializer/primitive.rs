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

//! Fixed-width scalar payloads. The tag, when there is one, is written by the
//! caller; primitive array elements are written without it.

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::types::PrimitiveKind;
use crate::value::Value;
use chrono::{DateTime, Datelike, NaiveDate};

pub fn write_payload(writer: &mut Writer, value: &Value) -> Result<(), Error> {
    match value {
        Value::Bool(v) => writer.write_bool(*v),
        Value::I8(v) => writer.write_i8(*v),
        Value::U8(v) => writer.write_u8(*v),
        Value::I16(v) => writer.write_i16(*v),
        Value::U16(v) => writer.write_u16(*v),
        Value::I32(v) => writer.write_i32(*v),
        Value::U32(v) => writer.write_u32(*v),
        Value::I64(v) => writer.write_i64(*v),
        Value::U64(v) => writer.write_u64(*v),
        Value::F32(v) => writer.write_f32(*v),
        Value::F64(v) => writer.write_f64(*v),
        Value::Char(v) => writer.write_u32(*v as u32),
        // Seconds since the Unix epoch, then the nanosecond remainder.
        Value::Timestamp(v) => {
            let stamp = v.and_utc();
            writer.write_i64(stamp.timestamp())?;
            writer.write_u32(stamp.timestamp_subsec_nanos())
        }
        // Days since 0001-01-01.
        Value::Date(v) => writer.write_i32(v.num_days_from_ce()),
        other => Err(Error::unsupported_type(format!(
            "{} is not a scalar",
            other.kind_name()
        ))),
    }
}

pub fn read_payload(reader: &mut Reader, kind: PrimitiveKind) -> Result<Value, Error> {
    let value = match kind {
        PrimitiveKind::Bool => Value::Bool(reader.read_bool()?),
        PrimitiveKind::I8 => Value::I8(reader.read_i8()?),
        PrimitiveKind::U8 => Value::U8(reader.read_u8()?),
        PrimitiveKind::I16 => Value::I16(reader.read_i16()?),
        PrimitiveKind::U16 => Value::U16(reader.read_u16()?),
        PrimitiveKind::I32 => Value::I32(reader.read_i32()?),
        PrimitiveKind::U32 => Value::U32(reader.read_u32()?),
        PrimitiveKind::I64 => Value::I64(reader.read_i64()?),
        PrimitiveKind::U64 => Value::U64(reader.read_u64()?),
        PrimitiveKind::F32 => Value::F32(reader.read_f32()?),
        PrimitiveKind::F64 => Value::F64(reader.read_f64()?),
        PrimitiveKind::Char => {
            let raw = reader.read_u32()?;
            Value::Char(
                char::from_u32(raw)
                    .ok_or_else(|| Error::format(format!("{:#x} is not a char", raw)))?,
            )
        }
        PrimitiveKind::Timestamp => {
            let secs = reader.read_i64()?;
            let nanos = reader.read_u32()?;
            let stamp = DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
                Error::format(format!("timestamp {}s {}ns out of range", secs, nanos))
            })?;
            Value::Timestamp(stamp.naive_utc())
        }
        PrimitiveKind::Date => {
            let days = reader.read_i32()?;
            Value::Date(
                NaiveDate::from_num_days_from_ce_opt(days)
                    .ok_or_else(|| Error::format(format!("date {} out of range", days)))?,
            )
        }
    };
    Ok(value)
}
