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

use pickler::{
    Array, Construction, ElementType, Error, FieldDef, FieldType, Pickler, PrimitiveKind, Record,
    Unit, UnitContext, Value,
};
use std::sync::Arc;

fn shapes() -> (Pickler, Arc<Unit>) {
    let context = Arc::new(UnitContext::new());
    let unit = Unit::builder("shapes", "1.0")
        .record(
            "Point",
            vec![
                FieldDef::new("x", FieldType::Primitive(PrimitiveKind::I32)),
                FieldDef::new("y", FieldType::Primitive(PrimitiveKind::I32)),
                FieldDef::any("label"),
            ],
            Construction::Fields,
        )
        .record("Node", vec![FieldDef::any("value"), FieldDef::any("next")], Construction::Fields)
        .record("Sealed", vec![FieldDef::any("inner")], Construction::Constructor)
        .record("Empty", vec![], Construction::Fields)
        .build()
        .unwrap();
    context.load(unit.clone());
    (Pickler::default().context(context), unit)
}

#[test]
fn test_record_round_trip() {
    let (pickler, unit) = shapes();
    let point = Value::record(
        Record::new(
            unit.record("Point").unwrap(),
            vec![Value::I32(3), Value::I32(-4), Value::str("p")],
        )
        .unwrap(),
    );
    let copy = pickler.deserialize(&pickler.serialize(&point).unwrap()).unwrap();
    assert_eq!(copy, point);
    let copy = copy.as_record().unwrap().read();
    assert!(Arc::ptr_eq(copy.shape(), &unit.record("Point").unwrap()));
    assert_eq!(copy.get("y"), Some(&Value::I32(-4)));
}

#[test]
fn test_zero_field_record() {
    let (pickler, unit) = shapes();
    let empty = Value::record(Record::empty(unit.record("Empty").unwrap()));
    let copy = pickler.deserialize(&pickler.serialize(&empty).unwrap()).unwrap();
    assert_eq!(copy, empty);
    assert!(copy.as_record().unwrap().read().fields().is_empty());
}

#[test]
fn test_cyclic_records() {
    let (pickler, unit) = shapes();
    let node = unit.record("Node").unwrap();
    let a = Value::record(Record::new(node.clone(), vec![Value::I32(1), Value::Null]).unwrap());
    let b = Value::record(Record::new(node, vec![Value::I32(2), a.clone()]).unwrap());
    a.as_record().unwrap().write().set("next", b.clone()).unwrap();

    let copy = pickler.deserialize(&pickler.serialize(&a).unwrap()).unwrap();
    let next = copy.as_record().unwrap().read().get("next").unwrap().clone();
    let back = next.as_record().unwrap().read().get("next").unwrap().clone();
    assert!(Value::ptr_eq(&back, &copy));
    assert_eq!(
        next.as_record().unwrap().read().get("value"),
        Some(&Value::I32(2))
    );
}

#[test]
fn test_constructor_record_shares_without_cycles() {
    let (pickler, unit) = shapes();
    let sealed = Value::record(
        Record::new(unit.record("Sealed").unwrap(), vec![Value::str("payload")]).unwrap(),
    );
    let pair = Value::tuple(vec![sealed.clone(), sealed]);
    let copy = pickler.deserialize(&pickler.serialize(&pair).unwrap()).unwrap();
    let items = copy.as_tuple().unwrap().items();
    assert!(Value::ptr_eq(&items[0], &items[1]));
}

#[test]
fn test_constructor_record_cycle_is_dangling() {
    let (pickler, unit) = shapes();
    let holder = Value::array(Array::vector(ElementType::Any, vec![Value::Null]).unwrap());
    let sealed = Value::record(
        Record::new(unit.record("Sealed").unwrap(), vec![holder.clone()]).unwrap(),
    );
    holder
        .as_array()
        .unwrap()
        .write()
        .set_flat(0, sealed.clone())
        .unwrap();

    match pickler.serialize(&sealed) {
        Err(Error::DanglingReference { offset, .. }) => assert_eq!(offset, 3),
        other => panic!("expected a dangling reference, got {:?}", other),
    }
}

#[test]
fn test_typed_field_rejects_other_values() {
    let (_, unit) = shapes();
    let mut point = Record::empty(unit.record("Point").unwrap());
    assert!(matches!(
        point.set("x", Value::str("nope")),
        Err(Error::ShapeMismatch(_))
    ));
    assert!(point.set("missing", Value::Null).is_err());
}

#[test]
fn test_by_reference_shape_mismatch() {
    let (writer, unit) = shapes();
    let point = Value::record(
        Record::new(
            unit.record("Point").unwrap(),
            vec![Value::I32(1), Value::I32(2), Value::Null],
        )
        .unwrap(),
    );
    let bytes = writer.serialize(&point).unwrap();

    let other = Arc::new(UnitContext::new());
    other.load(
        Unit::builder("shapes", "1.0")
            .record(
                "Point",
                vec![
                    FieldDef::new("x", FieldType::Primitive(PrimitiveKind::I32)),
                    FieldDef::new("z", FieldType::Primitive(PrimitiveKind::I32)),
                    FieldDef::any("label"),
                ],
                Construction::Fields,
            )
            .build()
            .unwrap(),
    );
    let reader = Pickler::default().context(other);
    assert!(matches!(
        reader.deserialize(&bytes),
        Err(Error::ShapeMismatch(_))
    ));
}

#[test]
fn test_unknown_unit_on_read() {
    let (writer, unit) = shapes();
    let empty = Value::record(Record::empty(unit.record("Empty").unwrap()));
    let bytes = writer.serialize(&empty).unwrap();
    let reader = Pickler::default().context(Arc::new(UnitContext::new()));
    assert!(matches!(
        reader.deserialize(&bytes),
        Err(Error::UnknownUnit(_))
    ));
}

#[test]
fn test_shape_is_written_once() {
    let (pickler, unit) = shapes();
    let empty = unit.record("Empty").unwrap();
    let one = pickler
        .serialize(&Value::tuple(vec![Value::record(Record::empty(empty.clone()))]))
        .unwrap();
    let two = pickler
        .serialize(&Value::tuple(vec![
            Value::record(Record::empty(empty.clone())),
            Value::record(Record::empty(empty)),
        ]))
        .unwrap();
    // The second record costs its tag, a back reference to the shape and a
    // field count: 1 + (1 + 2) + 2 bytes.
    assert_eq!(two.len() - one.len(), 6);
}
