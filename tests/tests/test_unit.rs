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
    Construction, Error, FieldDef, Pickler, Policy, PolicyTable, Record, Unit, UnitContext,
    UnitMode, UnitOrigin, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scratch() -> (Arc<UnitContext>, Arc<Unit>) {
    let context = Arc::new(UnitContext::new());
    let unit = Unit::builder("scratch", "1.0")
        .record("Counter", vec![FieldDef::any("count")], Construction::Fields)
        .static_cell("total", Value::I32(41))
        .static_cell("last", Value::Null)
        .initialized(true)
        .build()
        .unwrap();
    context.load(unit.clone());
    (context, unit)
}

fn counter(unit: &Unit, count: i32) -> Value {
    Value::record(Record::new(unit.record("Counter").unwrap(), vec![Value::I32(count)]).unwrap())
}

#[test]
fn test_by_value_unit_in_fresh_context() {
    let (context, unit) = scratch();
    let root = counter(&unit, 7);
    unit.set_static("last", root.clone()).unwrap();

    let writer = Pickler::default().context(context).home_unit("scratch");
    let bytes = writer.serialize(&root).unwrap();

    let fresh = Arc::new(UnitContext::new());
    let reader = Pickler::default().context(fresh.clone());
    let copy = reader.deserialize(&bytes).unwrap();

    let units = fresh.units();
    assert_eq!(units.len(), 1);
    let rebuilt = &units[0];
    assert_eq!(rebuilt.id(), unit.id());
    assert_eq!(rebuilt.origin(), UnitOrigin::Dynamic);
    assert!(rebuilt.is_initialized());
    assert_eq!(rebuilt.static_value("total"), Some(Value::I32(41)));

    // The static cell pointed at the root, so it still does.
    let last = rebuilt.static_value("last").unwrap();
    assert!(Value::ptr_eq(&last, &copy));

    let record = copy.as_record().unwrap().read();
    assert!(Arc::ptr_eq(&record.shape().unit().unwrap(), rebuilt));
    assert_eq!(record.get("count"), Some(&Value::I32(7)));
}

#[test]
fn test_uninitialized_flag_travels() {
    let context = Arc::new(UnitContext::new());
    let unit = Unit::builder("lazy", "1.0")
        .record("Cell", vec![], Construction::Fields)
        .build()
        .unwrap();
    context.load(unit.clone());
    let value = Value::record(Record::empty(unit.record("Cell").unwrap()));
    let bytes = Pickler::default()
        .context(context)
        .home_unit("lazy")
        .serialize(&value)
        .unwrap();

    let fresh = Arc::new(UnitContext::new());
    Pickler::default()
        .context(fresh.clone())
        .deserialize(&bytes)
        .unwrap();
    assert!(!fresh.units()[0].is_initialized());
}

#[test]
fn test_unit_descriptor_written_once() {
    let (context, unit) = scratch();
    let writer = Pickler::default().context(context).home_unit("scratch");
    let one = writer
        .serialize(&Value::tuple(vec![counter(&unit, 1)]))
        .unwrap();
    let two = writer
        .serialize(&Value::tuple(vec![counter(&unit, 1), counter(&unit, 2)]))
        .unwrap();
    // record tag, shape back reference, field count, i32 field
    assert_eq!(two.len() - one.len(), 1 + 3 + 2 + 5);
}

#[test]
fn test_repeated_materialization_is_ambiguous() {
    let (context, unit) = scratch();
    let bytes = Pickler::default()
        .context(context)
        .home_unit("scratch")
        .serialize(&counter(&unit, 1))
        .unwrap();

    let target = Arc::new(UnitContext::new());
    let reader = Pickler::default().context(target.clone());
    let first = reader.deserialize(&bytes).unwrap();
    reader.deserialize(&bytes).unwrap();
    assert_eq!(target.units().len(), 2);

    // Dynamic units default to by value, which never needs a name lookup.
    assert!(reader.serialize(&first).is_ok());

    let by_name = PolicyTable::builder().by_reference("scratch").build().unwrap();
    let strict = Pickler::default().context(target).policy_table(by_name);
    match strict.serialize(&first) {
        Err(Error::AmbiguousReference { name, candidates }) => {
            assert_eq!(name, "scratch");
            assert_eq!(
                candidates,
                ["scratch, Version=1.0", "scratch, Version=1.0"]
            );
        }
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn test_ambiguous_reference_on_read() {
    let source = Arc::new(UnitContext::new());
    let unit = Unit::builder("geometry", "1.0")
        .record("Origin", vec![], Construction::Fields)
        .build()
        .unwrap();
    source.load(unit.clone());
    let bytes = Pickler::default()
        .context(source)
        .serialize(&Value::record(Record::empty(unit.record("Origin").unwrap())))
        .unwrap();

    let target = Arc::new(UnitContext::new());
    for version in ["1.0", "2.0"] {
        target.load(
            Unit::builder("geometry", version)
                .record("Origin", vec![], Construction::Fields)
                .build()
                .unwrap(),
        );
    }
    match Pickler::default().context(target).deserialize(&bytes) {
        Err(Error::AmbiguousReference { candidates, .. }) => assert_eq!(
            candidates,
            ["geometry, Version=1.0", "geometry, Version=2.0"]
        ),
        other => panic!("expected ambiguity, got {:?}", other),
    }
}

#[test]
fn test_target_context_separate_from_source() {
    let (context, unit) = scratch();
    let target = Arc::new(UnitContext::new());
    let pickler = Pickler::default()
        .context(context.clone())
        .target_context(target.clone())
        .home_unit("scratch");
    let bytes = pickler.serialize(&counter(&unit, 3)).unwrap();
    pickler.deserialize(&bytes).unwrap();
    assert_eq!(context.units().len(), 1);
    assert_eq!(target.units().len(), 1);
}

#[test]
fn test_policy_table_conflict() {
    let result = PolicyTable::builder()
        .by_value("scratch")
        .by_reference("scratch")
        .build();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_policy_callback_consulted_once_per_call() {
    let (context, unit) = scratch();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let pickler = Pickler::default().context(context).policy(Policy::callback(move |id| {
        seen.fetch_add(1, Ordering::SeqCst);
        if id.name() == "scratch" {
            UnitMode::ByValue
        } else {
            UnitMode::Default
        }
    }));
    let graph = Value::tuple(vec![counter(&unit, 1), counter(&unit, 2)]);
    pickler.serialize(&graph).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    pickler.serialize(&graph).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_by_reference_is_smaller_than_by_value() {
    let (context, unit) = scratch();
    let value = counter(&unit, 1);
    let by_ref = Pickler::default().context(context.clone()).serialize(&value).unwrap();
    let by_value = Pickler::default()
        .context(context)
        .home_unit("scratch")
        .serialize(&value)
        .unwrap();
    assert!(by_ref.len() < by_value.len());
}

#[test]
fn test_unsupported_pointer() {
    let result = Pickler::default().serialize(&Value::Pointer(0x1000));
    assert!(matches!(result, Err(Error::UnsupportedType(_))));
}

#[test]
fn test_failed_read_loads_no_unit() {
    let (context, unit) = scratch();
    let bytes = Pickler::default()
        .context(context)
        .home_unit("scratch")
        .serialize(&counter(&unit, 3))
        .unwrap();

    let target = Arc::new(UnitContext::new());
    let reader = Pickler::default().context(target.clone());
    // The last byte is the initialized flag, read after the unit is rebuilt.
    let result = reader.deserialize(&bytes[..bytes.len() - 1]);
    assert!(matches!(result, Err(Error::Format(_))));
    assert!(target.units().is_empty());

    reader.deserialize(&bytes).unwrap();
    let units = target.units();
    assert_eq!(units.len(), 1);
    assert!(units[0].is_initialized());
    assert_eq!(units[0].static_value("total"), Some(Value::I32(41)));
    target.check_unambiguous("scratch").unwrap();
    assert!(Arc::ptr_eq(&target.resolve(unit.id()).unwrap(), &units[0]));
}
