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
    Error, Pickler, PolicyTable, RegistryProvider, Unit, UnitContext, UnitOrigin, Value,
};
use std::sync::Arc;

fn add_captured(env: &[Value], args: &[Value]) -> Result<Value, Error> {
    match (env.first(), args.first()) {
        (Some(Value::I32(a)), Some(Value::I32(b))) => Ok(Value::I32(a + b)),
        _ => Err(Error::shape_mismatch("add_captured expects i32 values")),
    }
}

fn math() -> (Arc<UnitContext>, Arc<Unit>) {
    let context = Arc::new(UnitContext::new());
    let unit = Unit::builder("math", "1.0")
        .native("add", 1, "math::add_captured", add_captured)
        .bytecode("opaque", 0, vec![0xCA, 0xFE])
        .build()
        .unwrap();
    context.load(unit.clone());
    (context, unit)
}

#[test]
fn test_closure_round_trip() {
    let (context, unit) = math();
    let pickler = Pickler::default().context(context);
    let add_ten = Value::function(unit.function("add").unwrap(), vec![Value::I32(10)]);
    let copy = pickler.deserialize(&pickler.serialize(&add_ten).unwrap()).unwrap();
    let function = copy.as_function().unwrap();
    assert!(Arc::ptr_eq(function.code(), &unit.function("add").unwrap()));
    assert_eq!(function.call(&[Value::I32(5)]).unwrap(), Value::I32(15));
}

#[test]
fn test_closure_capturing_itself() {
    let (context, unit) = math();
    let pickler = Pickler::default().context(context);
    let f = Value::function(unit.function("opaque").unwrap(), vec![]);
    f.as_function().unwrap().set_env(vec![f.clone(), Value::str("state")]);

    let copy = pickler.deserialize(&pickler.serialize(&f).unwrap()).unwrap();
    let env = copy.as_function().unwrap().env();
    assert!(Value::ptr_eq(&env[0], &copy));
    assert_eq!(env[1].as_str(), Some("state"));
}

#[test]
fn test_native_code_by_value_in_fresh_context() {
    let (context, unit) = math();
    let table = PolicyTable::builder().by_value("math").build().unwrap();
    let writer = Pickler::default().context(context).policy_table(table);
    let add_ten = Value::function(unit.function("add").unwrap(), vec![Value::I32(10)]);
    let bytes = writer.serialize(&add_ten).unwrap();

    let fresh = Arc::new(UnitContext::new());
    let reader = Pickler::default()
        .context(fresh.clone())
        .provider(Arc::new(
            RegistryProvider::new().register_native("math::add_captured", add_captured),
        ));
    let copy = reader.deserialize(&bytes).unwrap();
    assert_eq!(
        copy.as_function().unwrap().call(&[Value::I32(1)]).unwrap(),
        Value::I32(11)
    );
    let rebuilt = fresh.units();
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt[0].origin(), UnitOrigin::Dynamic);
    assert!(!Arc::ptr_eq(&rebuilt[0], &unit));
}

#[test]
fn test_unregistered_native_is_unsupported() {
    let (context, unit) = math();
    let table = PolicyTable::builder().by_value("math").build().unwrap();
    let writer = Pickler::default().context(context).policy_table(table);
    let f = Value::function(unit.function("add").unwrap(), vec![Value::I32(1)]);
    let bytes = writer.serialize(&f).unwrap();

    let reader = Pickler::default().context(Arc::new(UnitContext::new()));
    assert!(matches!(
        reader.deserialize(&bytes),
        Err(Error::UnsupportedType(_))
    ));
}
