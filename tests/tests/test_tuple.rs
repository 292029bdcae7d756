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

use pickler::{Array, ElementType, Error, Pickler, Value};

#[test]
fn test_tuple_round_trip() {
    let pickler = Pickler::default();
    let value = Value::tuple(vec![Value::I32(1), Value::str("two"), Value::tuple(vec![])]);
    let copy = pickler.deserialize(&pickler.serialize(&value).unwrap()).unwrap();
    assert_eq!(copy, value);
    assert_eq!(copy.as_tuple().unwrap().arity(), 3);
}

#[test]
fn test_shared_tuple_inside_tuple() {
    let pickler = Pickler::default();
    let inner = Value::tuple(vec![Value::I32(1), Value::Bool(true)]);
    let outer = Value::tuple(vec![inner.clone(), inner]);
    let copy = pickler.deserialize(&pickler.serialize(&outer).unwrap()).unwrap();
    let items = copy.as_tuple().unwrap().items();
    assert!(Value::ptr_eq(&items[0], &items[1]));
    assert_eq!(
        items[0],
        Value::tuple(vec![Value::I32(1), Value::Bool(true)])
    );
}

#[test]
fn test_cycle_through_tuple_is_dangling() {
    let array = Value::array(Array::vector(ElementType::Any, vec![Value::Null]).unwrap());
    let tuple = Value::tuple(vec![array.clone()]);
    array
        .as_array()
        .unwrap()
        .write()
        .set_flat(0, tuple.clone())
        .unwrap();

    match Pickler::default().serialize(&tuple) {
        // The tuple's tag follows the 3-byte header.
        Err(Error::DanglingReference { offset, .. }) => assert_eq!(offset, 3),
        other => panic!("expected a dangling reference, got {:?}", other),
    }
}

#[test]
fn test_cycle_rooted_at_array_round_trips() {
    let array = Value::array(Array::vector(ElementType::Any, vec![Value::Null]).unwrap());
    let tuple = Value::tuple(vec![array.clone()]);
    array
        .as_array()
        .unwrap()
        .write()
        .set_flat(0, tuple)
        .unwrap();

    // The array is registered before the tuple, so the tuple's item is a
    // back reference to it.
    let pickler = Pickler::default();
    let copy = pickler.deserialize(&pickler.serialize(&array).unwrap()).unwrap();
    let tuple = copy.as_array().unwrap().read().items()[0].clone();
    assert!(Value::ptr_eq(&tuple.as_tuple().unwrap().items()[0], &copy));
}
