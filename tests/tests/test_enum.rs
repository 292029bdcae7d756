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

use pickler::{EnumValue, Error, IntKind, Pickler, Unit, UnitContext, Value};
use std::sync::Arc;

fn colors(underlying: IntKind) -> (Arc<UnitContext>, Arc<Unit>) {
    let context = Arc::new(UnitContext::new());
    let unit = Unit::builder("colors", "1.0")
        .enumeration(
            "Color",
            underlying,
            vec![("Red".into(), 0), ("Green".into(), 1), ("Blue".into(), 200)],
        )
        .build()
        .unwrap();
    context.load(unit.clone());
    (context, unit)
}

#[test]
fn test_enum_round_trip() {
    let (context, unit) = colors(IntKind::U8);
    let pickler = Pickler::default().context(context);
    let blue = Value::Enum(EnumValue::of(unit.enum_shape("Color").unwrap(), "Blue").unwrap());
    let copy = pickler.deserialize(&pickler.serialize(&blue).unwrap()).unwrap();
    assert_eq!(copy, blue);
    assert_eq!(copy.as_enum().unwrap().variant(), Some("Blue"));
    assert_eq!(copy.as_enum().unwrap().value(), 200);
}

#[test]
fn test_boxed_enum_keeps_identity() {
    let (context, unit) = colors(IntKind::I16);
    let pickler = Pickler::default().context(context);
    let green = Value::Enum(EnumValue::of(unit.enum_shape("Color").unwrap(), "Green").unwrap());
    let boxed = Value::boxed(green).unwrap();
    let pair = Value::tuple(vec![boxed.clone(), boxed]);
    let copy = pickler.deserialize(&pickler.serialize(&pair).unwrap()).unwrap();
    let items = copy.as_tuple().unwrap().items();
    assert!(Value::ptr_eq(&items[0], &items[1]));
}

#[test]
fn test_enum_width_mismatch() {
    let (source, unit) = colors(IntKind::U8);
    let red = Value::Enum(EnumValue::new(unit.enum_shape("Color").unwrap(), 0).unwrap());
    let bytes = Pickler::default().context(source).serialize(&red).unwrap();

    let (target, _) = colors(IntKind::I32);
    let result = Pickler::default().context(target).deserialize(&bytes);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
}

#[test]
fn test_enum_value_out_of_range() {
    let (_, unit) = colors(IntKind::U8);
    let result = EnumValue::new(unit.enum_shape("Color").unwrap(), 256);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
}
