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

use chrono::NaiveDate;
use pickler::{Error, Pickler, Value};

fn round_trip(value: &Value) -> Value {
    let pickler = Pickler::default();
    let bytes = pickler.serialize(value).unwrap();
    pickler.deserialize(&bytes).unwrap()
}

#[test]
fn test_scalars() {
    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::I8(-128),
        Value::U8(255),
        Value::I16(-12345),
        Value::U16(54321),
        Value::I32(i32::MIN),
        Value::U32(u32::MAX),
        Value::I64(-1),
        Value::U64(u64::MAX),
        Value::F32(1.5),
        Value::F64(-0.0),
        Value::F64(f64::NAN),
        Value::Char('λ'),
        Value::Date(date),
        Value::Timestamp(date.and_hms_milli_opt(12, 30, 45, 678).unwrap()),
        Value::Timestamp(date.and_hms_nano_opt(1, 2, 3, 123_456_789).unwrap()),
    ];
    for value in values {
        assert_eq!(round_trip(&value), value, "{:?}", value);
    }
}

#[test]
fn test_strings() {
    let long = "x".repeat(100_000);
    for s in ["", "hello", "ünïcødé ✓", long.as_str()] {
        let value = Value::str(s);
        let copy = round_trip(&value);
        assert_eq!(copy.as_str(), Some(s));
    }
}

#[test]
fn test_stream_header() {
    let bytes = Pickler::default().serialize(&Value::I32(7)).unwrap();
    assert_eq!(bytes, [0x49, 0x50, 1, 7, 7, 0, 0, 0]);
}

#[test]
fn test_bad_magic() {
    let result = Pickler::default().deserialize(&[0, 0, 1, 0]);
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_unknown_format_version() {
    let result = Pickler::default().deserialize(&[0x49, 0x50, 2, 0]);
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_truncated_input() {
    let pickler = Pickler::default();
    assert!(matches!(pickler.deserialize(&[]), Err(Error::Format(_))));
    let bytes = pickler.serialize(&Value::I64(42)).unwrap();
    let result = pickler.deserialize(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_unknown_tag() {
    let result = Pickler::default().deserialize(&[0x49, 0x50, 1, 0xEE]);
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_back_reference_to_nothing() {
    // BackRef to offset 99, which holds no object.
    let result = Pickler::default().deserialize(&[0x49, 0x50, 1, 1, 99, 0]);
    match result {
        Err(Error::DanglingReference { offset, .. }) => assert_eq!(offset, 99),
        other => panic!("expected a dangling reference, got {:?}", other),
    }
}

#[test]
fn test_trailing_bytes() {
    let pickler = Pickler::default();
    let mut bytes = pickler.serialize(&Value::Bool(true)).unwrap();
    bytes.push(0);
    assert!(matches!(pickler.deserialize(&bytes), Err(Error::Format(_))));
    let lenient = Pickler::default().check_trailing_bytes(false);
    assert_eq!(lenient.deserialize(&bytes).unwrap(), Value::Bool(true));
}

#[test]
fn test_invalid_bool_byte() {
    let result = Pickler::default().deserialize(&[0x49, 0x50, 1, 2, 7]);
    assert!(matches!(result, Err(Error::Format(_))));
}
