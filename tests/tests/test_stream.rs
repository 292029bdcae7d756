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

use pickler::{Array, ElementType, Error, NativeHandle, Pickler, Value};
use pickler_core::stream::PositionStream;
use std::io::{Cursor, SeekFrom};

#[test]
fn test_serialize_to_stream() {
    let pickler = Pickler::default();
    let value = Value::tuple(vec![Value::str("a"), Value::U16(2)]);
    let mut sink = PositionStream::new(Vec::new());
    pickler.serialize_to(&value, &mut sink).unwrap();
    let written = sink.position();
    let bytes = sink.into_inner();
    assert_eq!(written, bytes.len() as u64);
    assert_eq!(bytes, pickler.serialize(&value).unwrap());
}

#[test]
fn test_deserialize_from_stream() {
    let pickler = Pickler::default();
    let value = Value::tuple(vec![Value::I64(-5), Value::Null]);
    let bytes = pickler.serialize(&value).unwrap();
    let mut source = PositionStream::new(Cursor::new(bytes.clone()));
    assert_eq!(pickler.deserialize_from(&mut source).unwrap(), value);
    // Nothing past the pickle is read.
    assert_eq!(source.position(), bytes.len() as u64);
}

#[test]
fn test_consecutive_pickles_on_one_stream() {
    let pickler = Pickler::default();
    let first = Value::I32(7);
    let second = Value::tuple(vec![Value::str("next"), Value::Bool(true)]);
    let mut sink = Vec::new();
    pickler.serialize_to(&first, &mut sink).unwrap();
    let boundary = sink.len() as u64;
    pickler.serialize_to(&second, &mut sink).unwrap();

    let mut source = PositionStream::new(Cursor::new(sink));
    assert_eq!(pickler.deserialize_from(&mut source).unwrap(), first);
    assert_eq!(source.position(), boundary);
    assert_eq!(pickler.deserialize_from(&mut source).unwrap(), second);
}

#[test]
fn test_failed_serialize_writes_nothing() {
    let value = Value::array(
        Array::vector(
            ElementType::Any,
            vec![
                Value::str("hello"),
                Value::Handle(NativeHandle {
                    kind: "file".into(),
                    raw: 4,
                }),
            ],
        )
        .unwrap(),
    );
    let mut sink = Vec::new();
    let result = Pickler::default().serialize_to(&value, &mut sink);
    assert!(matches!(result, Err(Error::UnsupportedType(_))));
    assert!(sink.is_empty());
}

#[test]
fn test_stream_cannot_seek() {
    let mut stream = PositionStream::new(Cursor::new(vec![1u8, 2, 3]));
    assert!(matches!(
        stream.seek(SeekFrom::Start(0)),
        Err(Error::NotSupported(_))
    ));
    assert!(matches!(stream.len(), Err(Error::NotSupported(_))));
}
