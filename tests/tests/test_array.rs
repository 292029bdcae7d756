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

use pickler::{Array, Dimension, ElementType, Error, NativeHandle, Pickler, PrimitiveKind, Value};
use pickler_core::buffer::Writer;
use pickler_core::types::{Tag, FORMAT_VERSION, MAGIC_NUMBER};

fn round_trip(value: &Value) -> Value {
    let pickler = Pickler::default();
    let bytes = pickler.serialize(value).unwrap();
    pickler.deserialize(&bytes).unwrap()
}

#[test]
fn test_primitive_vector() {
    let value = Value::array(
        Array::vector(
            ElementType::Primitive(PrimitiveKind::I32),
            vec![Value::I32(1), Value::I32(-2), Value::I32(3)],
        )
        .unwrap(),
    );
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_multi_rank_with_lower_bounds() {
    let dims = vec![Dimension::new(-2, 2), Dimension::new(1, 3)];
    let mut array = Array::new(ElementType::Primitive(PrimitiveKind::I64), dims.clone()).unwrap();
    for i in -2..0 {
        for j in 1..4 {
            array.set(&[i, j], Value::I64(i * 10 + j)).unwrap();
        }
    }
    let value = Value::array(array);
    let copy = round_trip(&value);
    assert_eq!(copy, value);

    let copy = copy.as_array().unwrap().read();
    assert_eq!(copy.dims(), dims.as_slice());
    assert_eq!(copy.get(&[-1, 3]), Some(&Value::I64(-7)));
    assert_eq!(copy.get(&[-2, 1]), Some(&Value::I64(-19)));
}

#[test]
fn test_any_matrix_of_strings() {
    let dims = vec![Dimension::new(0, 2), Dimension::new(5, 2)];
    let items = vec![
        Value::str("a"),
        Value::Null,
        Value::str("c"),
        Value::I8(4),
    ];
    let value = Value::array(Array::from_items(ElementType::Any, dims, items).unwrap());
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_empty_two_by_zero() {
    let dims = vec![Dimension::new(0, 2), Dimension::new(0, 0)];
    let value = Value::array(Array::new(ElementType::Any, dims.clone()).unwrap());
    let copy = round_trip(&value);
    let copy = copy.as_array().unwrap().read();
    assert!(copy.is_empty());
    assert_eq!(copy.rank(), 2);
    assert_eq!(copy.dims(), dims.as_slice());
}

#[test]
fn test_self_referential_array() {
    let value = Value::array(Array::vector(ElementType::Any, vec![Value::Null, Value::U8(9)]).unwrap());
    value
        .as_array()
        .unwrap()
        .write()
        .set_flat(0, value.clone())
        .unwrap();

    let copy = round_trip(&value);
    let items = copy.as_array().unwrap().read().items().to_vec();
    assert!(Value::ptr_eq(&items[0], &copy));
    assert_eq!(items[1], Value::U8(9));
}

#[test]
fn test_shared_boxed_scalars() {
    let five = Value::boxed(Value::I32(5)).unwrap();
    let other_five = Value::boxed(Value::I32(5)).unwrap();
    let value = Value::array(
        Array::vector(
            ElementType::Any,
            vec![five.clone(), five, other_five],
        )
        .unwrap(),
    );
    let copy = round_trip(&value);
    let items = copy.as_array().unwrap().read().items().to_vec();
    assert!(Value::ptr_eq(&items[0], &items[1]));
    assert!(!Value::ptr_eq(&items[0], &items[2]));
    assert_eq!(**items[2].as_boxed().unwrap(), Value::I32(5));
}

#[test]
fn test_primitive_elements_are_smaller_than_boxes() {
    let pickler = Pickler::default();
    let ints = Value::array(
        Array::vector(
            ElementType::Primitive(PrimitiveKind::I32),
            vec![Value::I32(1), Value::I32(2), Value::I32(3)],
        )
        .unwrap(),
    );
    let boxes = Value::array(
        Array::vector(
            ElementType::Any,
            (1..=3).map(|i| Value::boxed(Value::I32(i)).unwrap()).collect(),
        )
        .unwrap(),
    );
    let int_bytes = pickler.serialize(&ints).unwrap();
    let box_bytes = pickler.serialize(&boxes).unwrap();
    // header 3, array header 8, then 4 bytes per int or 6 per box
    assert_eq!(int_bytes.len(), 23);
    assert_eq!(box_bytes.len(), 29);
    assert!(int_bytes.len() < box_bytes.len());
}

#[test]
fn test_primitive_array_rejects_other_values() {
    let result = Array::vector(
        ElementType::Primitive(PrimitiveKind::F64),
        vec![Value::F64(1.0), Value::I32(2)],
    );
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
}

#[test]
fn test_unsupported_element() {
    let value = Value::array(
        Array::vector(
            ElementType::Any,
            vec![Value::Handle(NativeHandle {
                kind: "file".into(),
                raw: 4,
            })],
        )
        .unwrap(),
    );
    let result = Pickler::default().serialize(&value);
    assert!(matches!(result, Err(Error::UnsupportedType(_))));
}

#[test]
fn test_determinism() {
    let shared = Value::str("shared");
    let value = Value::array(
        Array::vector(
            ElementType::Any,
            vec![shared.clone(), Value::tuple(vec![shared, Value::F32(0.25)])],
        )
        .unwrap(),
    );
    let first = Pickler::default().serialize(&value).unwrap();
    let second = Pickler::new().serialize(&value).unwrap();
    assert_eq!(first, second);
    let copy = Pickler::new().deserialize(&first).unwrap();
    assert_eq!(Pickler::new().serialize(&copy).unwrap(), first);
}

/// Header of a pickled `Any` array with the given `(lower, len)` dimensions
/// and no elements.
fn any_array_header(dims: &[(i64, i64)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut writer = Writer::new(&mut bytes);
        writer.write_u16(MAGIC_NUMBER).unwrap();
        writer.write_u8(FORMAT_VERSION).unwrap();
        writer.write_u8(Tag::Array.into()).unwrap();
        writer.write_u8(ElementType::Any.to_byte()).unwrap();
        writer.write_varint(dims.len() as i64).unwrap();
        for (lower, len) in dims {
            writer.write_varint(*lower).unwrap();
            writer.write_varint(*len).unwrap();
        }
    }
    bytes
}

#[test]
fn test_huge_declared_length_is_a_format_error() {
    let bytes = any_array_header(&[(0, 1 << 61)]);
    let result = Pickler::default().deserialize(&bytes);
    assert!(matches!(result, Err(Error::Format(_))));

    // Two real elements do not make the rest of the declared length appear.
    let mut bytes = any_array_header(&[(0, 1 << 40)]);
    bytes.extend_from_slice(&[u8::from(Tag::I32), 1, 0, 0, 0]);
    bytes.extend_from_slice(&[u8::from(Tag::I32), 2, 0, 0, 0]);
    let result = Pickler::default().deserialize(&bytes);
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_overflowing_dimensions_are_a_format_error() {
    let bytes = any_array_header(&[(0, 1 << 40), (0, 1 << 40)]);
    let result = Pickler::default().deserialize(&bytes);
    assert!(matches!(result, Err(Error::Format(_))));
}
